//! Bytecode Loader
//!
//! Loads and validates raw bytecode before it reaches the interpreter.
//! This layer performs structural validation only: it checks the encoding
//! invariants the dispatch loop assumes, not what the program computes.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::bytecode::instruction::decode_all;
use crate::bytecode::{Bytecode, OpCode};
use crate::error::{SvmError, SvmResult};

/// Bytecode loader
pub struct BytecodeLoader;

impl BytecodeLoader {
    /// Validate raw bytes and take ownership of them
    ///
    /// Rejects empty input, unknown opcodes, truncated operands, `JUMP_IF`
    /// targets that do not land on an instruction boundary, and programs
    /// whose last instruction is not `RETURN`. Stack depth is not checked:
    /// a program that pops an empty stack still loads and panics when run.
    pub fn load(bytes: &[u8]) -> SvmResult<Bytecode> {
        Self::verify(bytes)?;
        Ok(Bytecode::from(bytes))
    }

    /// Read and validate a bytecode file
    pub fn load_file(path: impl AsRef<Path>) -> SvmResult<Bytecode> {
        let bytes = fs::read(path.as_ref())?;
        Self::verify(&bytes)?;
        Ok(Bytecode::from(bytes))
    }

    /// Run the checks listed on [`load`](Self::load) without copying the bytes
    pub fn verify(bytes: &[u8]) -> SvmResult<()> {
        if bytes.is_empty() {
            return Err(SvmError::EmptyProgram);
        }

        let instructions = decode_all(bytes)?;

        let mut boundaries = vec![false; bytes.len()];
        for (offset, _) in &instructions {
            boundaries[*offset] = true;
        }

        for (offset, instr) in &instructions {
            if instr.opcode != OpCode::JumpIf {
                continue;
            }
            let target = usize::from(instr.operand.unwrap_or_default());
            if !boundaries.get(target).copied().unwrap_or(false) {
                return Err(SvmError::InvalidJumpTarget {
                    offset: *offset,
                    target,
                });
            }
        }

        if let Some((offset, last)) = instructions.last() {
            if last.opcode != OpCode::Return {
                return Err(SvmError::FallsOffEnd {
                    offset: *offset,
                    opcode: last.opcode.name(),
                });
            }
        }

        debug!(
            len = bytes.len(),
            instructions = instructions.len(),
            "bytecode verified"
        );
        Ok(())
    }
}
