//! Bytecode Instruction Representation
//!
//! Decoded form of one instruction, used for disassembly and structural
//! checks. The interpreter reads raw bytes directly and does not go
//! through this type.

use std::fmt;

use crate::error::{SvmError, SvmResult};
use super::opcode::OpCode;

/// Decoded bytecode instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Option<u8>,
}

impl Instruction {
    /// Create an instruction with no operand
    pub fn new(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: None,
        }
    }

    /// Create an instruction with a single operand
    pub fn with_operand(opcode: OpCode, operand: u8) -> Self {
        Instruction {
            opcode,
            operand: Some(operand),
        }
    }

    /// Decode the instruction starting at `pc`
    pub fn decode(code: &[u8], pc: usize) -> SvmResult<Self> {
        let byte = *code.get(pc).ok_or(SvmError::OffsetOutOfRange {
            offset: pc,
            len: code.len(),
        })?;
        let opcode = OpCode::from_u8(byte)
            .ok_or(SvmError::InvalidOpcode { offset: pc, byte })?;

        if !opcode.has_arg() {
            return Ok(Instruction::new(opcode));
        }
        let operand = *code.get(pc + 1).ok_or(SvmError::MissingOperand {
            offset: pc,
            opcode: opcode.name(),
        })?;
        Ok(Instruction::with_operand(opcode, operand))
    }

    /// Append the encoded bytes to `out`
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode as u8);
        if let Some(operand) = self.operand {
            out.push(operand);
        }
    }

    pub fn width(&self) -> usize {
        self.opcode.width()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{} {}", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}

/// Human-readable location of the instruction at `pc`, e.g. `0: CONST_INT 5`.
pub fn printable_location(code: &[u8], pc: usize) -> SvmResult<String> {
    let instr = Instruction::decode(code, pc)?;
    Ok(format!("{}: {}", pc, instr))
}

/// Decode every instruction in order, yielding `(offset, instruction)`.
pub fn decode_all(code: &[u8]) -> SvmResult<Vec<(usize, Instruction)>> {
    let mut out = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let instr = Instruction::decode(code, pc)?;
        out.push((pc, instr));
        pc += instr.width();
    }
    Ok(out)
}

/// One printable location per instruction.
pub fn disassemble(code: &[u8]) -> SvmResult<Vec<String>> {
    Ok(decode_all(code)?
        .into_iter()
        .map(|(pc, instr)| format!("{}: {}", pc, instr))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_leading_const_int() {
        let code = [OpCode::ConstInt as u8, 5, OpCode::Return as u8];
        assert_eq!(printable_location(&code, 0).unwrap(), "0: CONST_INT 5");
        assert_eq!(printable_location(&code, 2).unwrap(), "2: RETURN");
    }

    #[test]
    fn decoded_listing_reconstructs_encoding() {
        let program = [
            Instruction::new(OpCode::Dup),
            Instruction::with_operand(OpCode::JumpIf, 6),
            Instruction::with_operand(OpCode::ConstInt, 0),
            Instruction::new(OpCode::Return),
            Instruction::with_operand(OpCode::NewStr, b'A'),
            Instruction::new(OpCode::Return),
        ];
        let mut code = Vec::new();
        for instr in &program {
            instr.encode(&mut code);
        }

        let decoded: Vec<_> = decode_all(&code).unwrap().into_iter().map(|(_, i)| i).collect();
        assert_eq!(decoded, program);
        assert_eq!(
            disassemble(&code).unwrap(),
            ["0: DUP", "1: JUMP_IF 6", "3: CONST_INT 0", "5: RETURN", "6: NEWSTR 65", "8: RETURN"]
        );
    }

    #[test]
    fn decode_reports_malformed_bytes() {
        assert!(matches!(
            Instruction::decode(&[0x2A], 0),
            Err(SvmError::InvalidOpcode { offset: 0, byte: 0x2A })
        ));
        assert!(matches!(
            Instruction::decode(&[OpCode::Pop as u8, OpCode::ConstInt as u8], 1),
            Err(SvmError::MissingOperand { offset: 1, opcode: "CONST_INT" })
        ));
    }
}
