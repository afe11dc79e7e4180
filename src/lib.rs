//! EmberScript: a compiler for an event/procedure scripting language.
//!
//! Scripts are declared under host-registered triggers, carry typed
//! parameters and returns, and compile to stack-machine bytecode. The
//! pipeline is lexer, recursive-descent parser, two-pass semantic
//! checker, then code generation, with all findings collected into one
//! diagnostic list per batch.
//!
//! ```
//! use emberscript::prelude::*;
//!
//! let mut compiler = Compiler::new();
//! compiler.register_trigger(TriggerType::new("proc"));
//!
//! let result = compiler.compile(
//!     "[proc,double](int $n)(int) return $n * 2;",
//! );
//! assert!(!result.has_errors());
//! assert_eq!(result.scripts[0].name, "[proc,double]");
//! ```

mod compiler;

pub use compiler::{CompileResult, Compiler};

pub mod prelude {
    pub use crate::compiler::{CompileResult, Compiler};
    pub use emberscript_compiler::{
        CommandFlags, CommandInfo, ConstantInfo, CoreOpcode, GeneratedScript, Instruction, Opcode,
        Operand, TriggerType, VarDomain, VariableInfo,
    };
    pub use emberscript_core::{
        Diagnostic, PrimitiveType, Severity, Span, Type, Value,
    };
}
