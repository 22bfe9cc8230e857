pub mod bytecode;
pub mod instruction;
pub mod opcode;

pub use bytecode::{Bytecode, BytecodeId};
pub use instruction::{decode_all, disassemble, printable_location, Instruction};
pub use opcode::{OpCode, OpInfo, OPCODES};
