//! Stack VM - Core Library
//!
//! Public API surface for the stack VM: tagged values, the opcode table,
//! execution frames and the dispatch loop, plus the listing assembler and
//! structural loader that produce bytecode for it.

pub mod error;
pub mod config;
pub mod bytecode;
pub mod vm;
pub mod loader;
pub mod assembler;

// Re-export commonly used types
pub use error::{OperationError, SvmError, SvmResult};
pub use config::SvmConfig;
pub use bytecode::{Bytecode, BytecodeId, Instruction, OpCode};
pub use vm::{run, HotLoopCounter, MergeKey, NoopObserver, TraceObserver, Value, VirtualMachine};
pub use loader::BytecodeLoader;
