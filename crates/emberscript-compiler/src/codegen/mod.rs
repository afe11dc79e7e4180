//! AST-to-bytecode lowering.
//!
//! Scripts lower to labeled [`Block`]s of stack-machine [`Instruction`]s.
//! Everything here is deterministic: labels and local slots are numbered
//! sequentially per script, so the same input always yields the same
//! output.

mod block;
mod generator;
mod local;
mod opcode;

pub use block::{Block, BlockMap, Instruction, Label, LabelGenerator, Operand};
pub use generator::{CodeGenerator, CodegenError, GeneratedScript};
pub use local::LocalMap;
pub use opcode::{CoreOpcode, Opcode};
