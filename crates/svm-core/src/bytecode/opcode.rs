//! Bytecode Opcode Definitions
//!
//! Defines the opcode set and the table mapping each opcode byte to its
//! name and arity. Codes are dense and follow declaration order.
//! This file contains no execution semantics.

use std::fmt;

/// Name and arity of one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub name: &'static str,
    /// Whether the opcode is followed by one operand byte
    pub has_arg: bool,
}

/// Bytecode opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    ConstInt = 0,
    Pop      = 1,
    Add      = 2,
    Return   = 3,
    JumpIf   = 4,
    Dup      = 5,
    Sub      = 6,
    NewStr   = 7,
}

/// Opcode table, indexed by opcode byte.
pub static OPCODES: [OpInfo; 8] = [
    OpInfo { name: "CONST_INT", has_arg: true },
    OpInfo { name: "POP",       has_arg: false },
    OpInfo { name: "ADD",       has_arg: false },
    OpInfo { name: "RETURN",    has_arg: false },
    OpInfo { name: "JUMP_IF",   has_arg: true },
    OpInfo { name: "DUP",       has_arg: false },
    OpInfo { name: "SUB",       has_arg: false },
    OpInfo { name: "NEWSTR",    has_arg: true },
];

impl OpCode {
    pub const ALL: [OpCode; 8] = [
        OpCode::ConstInt,
        OpCode::Pop,
        OpCode::Add,
        OpCode::Return,
        OpCode::JumpIf,
        OpCode::Dup,
        OpCode::Sub,
        OpCode::NewStr,
    ];

    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Look up an opcode by its table name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    pub fn info(self) -> &'static OpInfo {
        &OPCODES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn has_arg(self) -> bool {
        self.info().has_arg
    }

    /// Encoded length in bytes, including the operand
    pub fn width(self) -> usize {
        if self.has_arg() { 2 } else { 1 }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
