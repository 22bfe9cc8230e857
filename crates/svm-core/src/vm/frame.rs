//! Execution Frame
//!
//! Bytecode being run plus a fixed-capacity operand stack.
//! No execution semantics.
//!
//! `push` and `pop` are the only stack operations. Overflow and underflow
//! mean the bytecode is malformed and panic instead of returning an error.

use crate::bytecode::BytecodeId;
use crate::config::DEFAULT_STACK_CAPACITY;
use super::value::Value;

/// Execution context for one `run`
#[derive(Debug)]
pub struct Frame<'code> {
    code: &'code [u8],
    slots: Box<[Option<Value>]>,
    /// Next free slot
    cursor: usize,
}

impl<'code> Frame<'code> {
    /// Create a frame with the default stack capacity
    pub fn new(code: &'code [u8]) -> Self {
        Self::with_capacity(code, DEFAULT_STACK_CAPACITY)
    }

    pub fn with_capacity(code: &'code [u8], capacity: usize) -> Self {
        Frame {
            code,
            slots: vec![None; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    pub fn code(&self) -> &'code [u8] {
        self.code
    }

    pub fn code_id(&self) -> BytecodeId {
        BytecodeId::of(self.code)
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) {
        let Some(slot) = self.slots.get_mut(self.cursor) else {
            panic!(
                "operand stack overflow: capacity {} exceeded",
                self.slots.len()
            );
        };
        *slot = Some(value);
        self.cursor += 1;
    }

    /// Pop value from stack, clearing the vacated slot
    pub fn pop(&mut self) -> Value {
        let Some(top) = self.cursor.checked_sub(1) else {
            panic!("operand stack underflow");
        };
        self.cursor = top;
        match self.slots[top].take() {
            Some(value) => value,
            None => panic!("operand stack slot {} below cursor is empty", top),
        }
    }

    /// Number of live values on the stack
    pub fn depth(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
