//! Listing Assembler
//!
//! Turns a flat list of integer tokens into raw bytecode, one byte per
//! token. A textual listing may spell opcodes by name:
//!
//! ```text
//! # countdown
//! [CONST_INT, 1, SUB, DUP, JUMP_IF, 0, RETURN]
//! ```
//!
//! The output is not verified; run it through
//! [`BytecodeLoader`](crate::loader::BytecodeLoader) for that.

use crate::bytecode::{Bytecode, OpCode};
use crate::error::{SvmError, SvmResult};

/// Encode each token as one byte
pub fn assemble(tokens: &[i64]) -> SvmResult<Bytecode> {
    let bytes = tokens
        .iter()
        .enumerate()
        .map(|(position, &value)| {
            u8::try_from(value).map_err(|_| SvmError::TokenOutOfRange { position, value })
        })
        .collect::<SvmResult<Vec<u8>>>()?;
    Ok(Bytecode::from(bytes))
}

/// Tokenize a listing into integers
///
/// Tokens are separated by whitespace or commas; `[`, `]` are ignored and
/// `#` starts a comment running to the end of the line.
pub fn parse_listing(source: &str) -> SvmResult<Vec<i64>> {
    let mut tokens = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line = match line.find('#') {
            Some(start) => &line[..start],
            None => line,
        };

        let words = line
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']'))
            .filter(|word| !word.is_empty());

        for word in words {
            tokens.push(parse_token(word).ok_or_else(|| SvmError::InvalidToken {
                line: idx + 1,
                token: word.to_owned(),
            })?);
        }
    }

    Ok(tokens)
}

pub fn assemble_listing(source: &str) -> SvmResult<Bytecode> {
    assemble(&parse_listing(source)?)
}

fn parse_token(word: &str) -> Option<i64> {
    if let Ok(value) = word.parse::<i64>() {
        return Some(value);
    }
    OpCode::from_name(word).map(|op| op as i64)
}
