//! SVM Error Types
//!
//! Defines the recoverable error conditions produced by the stack VM.
//!
//! Malformed bytecode reaching the interpreter (unknown opcode, stack
//! overflow or underflow, running off the end) is not represented here:
//! those are internal invariant faults and panic. Use
//! [`BytecodeLoader`](crate::loader::BytecodeLoader) to reject such programs
//! before running them.

use std::io;

use thiserror::Error;

/// A value operation was applied to an operand of the wrong variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported operand types for {op}: {lhs} and {rhs}")]
pub struct OperationError {
    pub op: &'static str,
    pub lhs: &'static str,
    pub rhs: &'static str,
}

#[derive(Debug, Error)]
pub enum SvmError {
    // Execution errors
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("step budget of {limit} instructions exhausted")]
    StepBudgetExhausted { limit: u64 },

    // Bytecode errors
    #[error("bytecode is empty")]
    EmptyProgram,

    #[error("invalid opcode 0x{byte:02X} at offset {offset}")]
    InvalidOpcode { offset: usize, byte: u8 },

    #[error("offset {offset} is outside bytecode of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("{opcode} at offset {offset} is missing its operand")]
    MissingOperand { offset: usize, opcode: &'static str },

    #[error("JUMP_IF at offset {offset} targets {target}, which is not an instruction boundary")]
    InvalidJumpTarget { offset: usize, target: usize },

    #[error("{opcode} at offset {offset} can run past the end of the bytecode")]
    FallsOffEnd { offset: usize, opcode: &'static str },

    // Assembler errors
    #[error("line {line}: cannot parse token `{token}`")]
    InvalidToken { line: usize, token: String },

    #[error("token {value} at position {position} does not fit in a byte")]
    TokenOutOfRange { position: usize, value: i64 },

    // IO boundary
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type SvmResult<T> = Result<T, SvmError>;
