//! The batch compiler driver.

use bumpalo::Bump;

use emberscript_compiler::{
    CodeGenerator, CommandInfo, CompilerEnvironment, ConstantInfo, GeneratedScript,
    SemanticChecker, SymbolTable, TriggerType, VariableInfo,
};
use emberscript_core::{Diagnostic, Severity};
use emberscript_parser::parse_all;

/// The outcome of compiling one source batch.
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Generated bytecode, one entry per script, in source order. Empty
    /// when the batch had errors.
    pub scripts: Vec<GeneratedScript>,
    /// Every finding from every phase, lexical through generation.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    /// Whether any diagnostic is error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// A reusable compiler holding the host's registered surface: triggers,
/// commands, runtime constants, and host-scoped variables.
///
/// One `Compiler` can compile any number of batches; script signatures
/// are re-derived from source each time, host registrations persist.
#[derive(Debug, Default)]
pub struct Compiler {
    env: CompilerEnvironment,
    symbols: SymbolTable,
}

impl Compiler {
    /// Create a compiler with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger kind scripts may be declared under.
    pub fn register_trigger(&mut self, trigger: TriggerType) {
        self.env.register_trigger(trigger);
    }

    /// Register a host command.
    pub fn register_command(&mut self, info: CommandInfo) {
        self.symbols.define_command(info);
    }

    /// Register a runtime constant.
    pub fn register_constant(&mut self, info: ConstantInfo) {
        self.symbols.define_constant(info);
    }

    /// Register a host-scoped variable.
    pub fn register_variable(&mut self, info: VariableInfo) {
        self.symbols.define_variable(info);
    }

    /// Check a batch without generating code. Suited to editor
    /// integrations that only want diagnostics.
    pub fn check(&mut self, source: &str) -> Vec<Diagnostic> {
        let arena = Bump::new();
        let (scripts, lex_errors, parse_errors) = parse_all(source, &arena);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        diagnostics.extend(lex_errors.iter().map(Diagnostic::from));
        diagnostics.extend(parse_errors.iter().map(Diagnostic::from));

        self.symbols.clear_scripts();
        let mut checker = SemanticChecker::new(&self.env, &mut self.symbols);
        checker.run_pre(&scripts);
        checker.run(&scripts);
        diagnostics.extend(checker.take_errors().iter().map(Diagnostic::from));

        diagnostics
    }

    /// Compile a batch of scripts from one source buffer.
    ///
    /// Code generation only runs when the batch produced no
    /// error-severity diagnostics; a partially broken batch yields
    /// diagnostics and no bytecode.
    pub fn compile(&mut self, source: &str) -> CompileResult {
        let arena = Bump::new();
        let (scripts, lex_errors, parse_errors) = parse_all(source, &arena);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        diagnostics.extend(lex_errors.iter().map(Diagnostic::from));
        diagnostics.extend(parse_errors.iter().map(Diagnostic::from));

        self.symbols.clear_scripts();
        let mut checker = SemanticChecker::new(&self.env, &mut self.symbols);
        checker.run_pre(&scripts);
        checker.run(&scripts);
        diagnostics.extend(checker.take_errors().iter().map(Diagnostic::from));

        let mut generated = Vec::new();
        if !diagnostics.iter().any(|d| d.severity == Severity::Error) {
            let mut generator = CodeGenerator::new(&self.symbols);
            for script in &scripts {
                match generator.generate(script) {
                    Ok(bytecode) => generated.push(bytecode),
                    Err(error) => {
                        diagnostics.push(Diagnostic::error(error.span(), error.to_string()));
                    }
                }
            }
        }

        CompileResult {
            scripts: generated,
            diagnostics,
        }
    }
}
