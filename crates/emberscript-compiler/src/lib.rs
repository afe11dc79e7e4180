//! The EmberScript back end: trigger registry, symbol table, semantic
//! checker, and bytecode code generator.
//!
//! The phases are deliberately separable: the checker is pure (AST in,
//! errors out) and the code generator re-derives expression types from
//! the same symbol and local tables, so an editor can run checking alone
//! and a batch compiler can run the whole pipeline.

pub mod codegen;
pub mod semantic;
pub mod symbol;
pub mod trigger;

pub use codegen::{
    Block, BlockMap, CodeGenerator, CodegenError, CoreOpcode, GeneratedScript, Instruction, Label,
    LabelGenerator, LocalMap, Opcode, Operand,
};
pub use semantic::SemanticChecker;
pub use symbol::{
    CommandFlags, CommandInfo, ConstantInfo, ScriptInfo, SymbolTable, VarDomain, VariableInfo,
};
pub use trigger::{CompilerEnvironment, TriggerType};
