//! Immutable Bytecode
//!
//! Owned byte sequence produced by an assembler and executed any number of
//! times. Nothing here checks the encoding; see `loader` for that.

use std::fmt;
use std::ops::Deref;

/// Identity of a byte sequence, used to key trace hooks.
///
/// Two sequences with equal contents at different addresses have different
/// ids, and a cloned `Bytecode` gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BytecodeId(usize);

impl BytecodeId {
    pub fn of(code: &[u8]) -> Self {
        BytecodeId(code.as_ptr() as usize)
    }
}

impl fmt::Display for BytecodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Immutable program bytes
#[derive(Clone, PartialEq, Eq)]
pub struct Bytecode {
    bytes: Box<[u8]>,
}

impl Bytecode {
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Bytecode { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn id(&self) -> BytecodeId {
        BytecodeId::of(&self.bytes)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
}

impl Deref for Bytecode {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Bytecode {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(bytes: Vec<u8>) -> Self {
        Bytecode::new(bytes)
    }
}

impl From<&[u8]> for Bytecode {
    fn from(bytes: &[u8]) -> Self {
        Bytecode::new(bytes)
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bytecode").field(&&*self.bytes).finish()
    }
}
