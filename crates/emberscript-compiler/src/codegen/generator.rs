//! The code generator: one pass over a checked script.
//!
//! Lowering re-derives types from the symbol table and the local map
//! rather than consuming checker output, so the generator only depends on
//! the AST and the registered host surface. Errors here mean the script
//! was not checked first; a checked script always lowers.

use thiserror::Error;

use emberscript_core::{Span, StackType, Type, Value};
use emberscript_parser::ast::{
    AssignStmt, BinaryExpr, BinaryOp, Expr, IfStmt, LiteralExpr, LiteralKind, Script, Stmt,
    SwitchStmt, VarDeclStmt, VarTarget, WhileStmt,
};

use crate::codegen::block::{Block, BlockMap, Instruction, Label, LabelGenerator, Operand};
use crate::codegen::local::LocalMap;
use crate::codegen::opcode::{CoreOpcode, Opcode};
use crate::symbol::{CommandFlags, SymbolTable, VarDomain};

/// An error raised during lowering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("unresolved local variable '{name}'")]
    UnresolvedLocal { name: String, span: Span },

    #[error("unresolved symbol '{name}'")]
    UnresolvedSymbol { name: String, span: Span },

    #[error("case key is not a constant")]
    NonConstantCaseKey { span: Span },

    #[error("'{keyword}' outside of a loop")]
    OrphanControlFlow { keyword: &'static str, span: Span },

    #[error("no {stack:?}-stack form for this operation")]
    UnsupportedArithmetic { stack: StackType, span: Span },

    #[error("cannot determine the operand stack of this expression")]
    UnknownOperandStack { span: Span },
}

impl CodegenError {
    /// The source location the error points at.
    pub fn span(&self) -> Span {
        match self {
            CodegenError::UnresolvedLocal { span, .. }
            | CodegenError::UnresolvedSymbol { span, .. }
            | CodegenError::NonConstantCaseKey { span }
            | CodegenError::OrphanControlFlow { span, .. }
            | CodegenError::UnsupportedArithmetic { span, .. }
            | CodegenError::UnknownOperandStack { span } => *span,
        }
    }
}

/// The lowered form of one script.
#[derive(Debug, Clone)]
pub struct GeneratedScript {
    /// The `[trigger,name]` entry name.
    pub name: String,
    /// Labeled blocks in generation order; adjacent blocks fall through.
    pub blocks: Vec<Block>,
    /// Int-stack local slots used (parameters included).
    pub int_locals: u32,
    /// String-stack local slots used.
    pub string_locals: u32,
    /// Long-stack local slots used.
    pub long_locals: u32,
}

impl GeneratedScript {
    /// All instructions in block order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }
}

/// The break and continue targets of the innermost enclosing loop.
#[derive(Debug, Clone)]
struct LoopContext {
    continue_label: Label,
    break_label: Label,
}

/// Lowers checked scripts against a registered host surface.
pub struct CodeGenerator<'sym> {
    symbols: &'sym SymbolTable,
    labels: LabelGenerator,
    blocks: BlockMap,
    locals: LocalMap,
    loops: Vec<LoopContext>,
}

impl<'sym> CodeGenerator<'sym> {
    /// Create a generator resolving against `symbols`.
    pub fn new(symbols: &'sym SymbolTable) -> Self {
        Self {
            symbols,
            labels: LabelGenerator::new(),
            blocks: BlockMap::new(),
            locals: LocalMap::new(),
            loops: Vec::new(),
        }
    }

    /// Lower one script. Labels and local slots restart from zero.
    pub fn generate(&mut self, script: &Script<'_>) -> Result<GeneratedScript, CodegenError> {
        self.labels.reset();
        self.blocks.reset();
        self.locals.reset();
        self.loops.clear();

        let name = format!("[{},{}]", script.trigger.name, script.name.name);
        let entry = self.labels.generate_named(name.clone());
        self.blocks.generate(entry);

        for param in script.params {
            self.locals.register_parameter(param.name.name, param.ty);
        }

        for stmt in script.body.stmts {
            self.lower_stmt(stmt)?;
        }
        // Implicit return for scripts that run off the end.
        self.emit(CoreOpcode::Return, Operand::Value(Value::Int(0)));

        Ok(GeneratedScript {
            name,
            blocks: std::mem::take(&mut self.blocks).into_blocks(),
            int_locals: self.locals.int_count(),
            string_locals: self.locals.string_count(),
            long_locals: self.locals.long_count(),
        })
    }

    // ==================== statements ====================

    fn lower_stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), CodegenError> {
        match stmt {
            Stmt::VarDecl(decl) => self.lower_var_decl(decl),
            Stmt::Assign(assign) => self.lower_assign(assign),
            Stmt::Expr(expr_stmt) => self.lower_expr(&expr_stmt.expr),
            Stmt::Return(ret) => {
                for expr in ret.exprs {
                    self.lower_expr(expr)?;
                }
                self.emit(CoreOpcode::Return, Operand::Value(Value::Int(0)));
                Ok(())
            }
            Stmt::Block(block) => {
                let label = self.labels.generate();
                self.blocks.generate(label);
                for inner in block.stmts {
                    self.lower_stmt(inner)?;
                }
                Ok(())
            }
            Stmt::If(if_stmt) => self.lower_if(if_stmt),
            Stmt::While(while_stmt) => self.lower_while(while_stmt),
            Stmt::Switch(switch_stmt) => self.lower_switch(switch_stmt),
            Stmt::Break(break_stmt) => {
                let target = match self.loops.last() {
                    Some(context) => context.break_label.clone(),
                    None => {
                        return Err(CodegenError::OrphanControlFlow {
                            keyword: "break",
                            span: break_stmt.keyword,
                        });
                    }
                };
                self.emit(CoreOpcode::Jump, Operand::Label(target));
                Ok(())
            }
            Stmt::Continue(continue_stmt) => {
                let target = match self.loops.last() {
                    Some(context) => context.continue_label.clone(),
                    None => {
                        return Err(CodegenError::OrphanControlFlow {
                            keyword: "continue",
                            span: continue_stmt.keyword,
                        });
                    }
                };
                self.emit(CoreOpcode::Jump, Operand::Label(target));
                Ok(())
            }
        }
    }

    fn lower_var_decl(&mut self, decl: &VarDeclStmt<'_>) -> Result<(), CodegenError> {
        match &decl.init {
            Some(init) => self.lower_expr(init)?,
            None => self.push_constant(decl.ty.default_value()),
        }
        let slot = self.locals.register_variable(decl.name.name, decl.ty);
        self.emit(pop_local_opcode(decl.ty.stack_type()), Operand::Local(slot));
        Ok(())
    }

    fn lower_assign(&mut self, assign: &AssignStmt<'_>) -> Result<(), CodegenError> {
        self.lower_expr(&assign.value)?;
        match assign.target {
            VarTarget::Local(ident) => {
                let (slot, ty) =
                    self.locals
                        .lookup(ident.name)
                        .ok_or_else(|| CodegenError::UnresolvedLocal {
                            name: ident.name.to_owned(),
                            span: ident.span,
                        })?;
                self.emit(pop_local_opcode(ty.stack_type()), Operand::Local(slot));
            }
            VarTarget::Global(ident) => {
                let symbols = self.symbols;
                let info = symbols.lookup_variable(ident.name).ok_or_else(|| {
                    CodegenError::UnresolvedSymbol {
                        name: ident.name.to_owned(),
                        span: ident.span,
                    }
                })?;
                let opcode = match info.domain {
                    VarDomain::Player => CoreOpcode::PopVarp,
                    VarDomain::PlayerBit => CoreOpcode::PopVarpBit,
                    VarDomain::ClientInt => CoreOpcode::PopVarcInt,
                    VarDomain::ClientString => CoreOpcode::PopVarcString,
                    VarDomain::Local => {
                        return Err(CodegenError::UnresolvedSymbol {
                            name: ident.name.to_owned(),
                            span: ident.span,
                        });
                    }
                };
                self.emit(opcode, Operand::Variable(ident.name.to_owned()));
            }
        }
        Ok(())
    }

    fn lower_if(&mut self, stmt: &IfStmt<'_>) -> Result<(), CodegenError> {
        let then_label = self.labels.generate();
        let else_label = stmt.else_stmt.map(|_| self.labels.generate());
        let end_label = self.labels.generate();

        let false_target = else_label.clone().unwrap_or_else(|| end_label.clone());
        self.lower_condition(&stmt.condition, &then_label, &false_target)?;

        self.blocks.generate(then_label);
        self.lower_stmt(stmt.then_stmt)?;
        if let (Some(else_label), Some(else_stmt)) = (else_label, stmt.else_stmt) {
            self.emit(CoreOpcode::Jump, Operand::Label(end_label.clone()));
            self.blocks.generate(else_label);
            self.lower_stmt(else_stmt)?;
        }
        self.blocks.generate(end_label);
        Ok(())
    }

    fn lower_while(&mut self, stmt: &WhileStmt<'_>) -> Result<(), CodegenError> {
        let cond_label = self.labels.generate();
        let body_label = self.labels.generate();
        let end_label = self.labels.generate();

        self.emit(CoreOpcode::Jump, Operand::Label(cond_label.clone()));
        self.blocks.generate(cond_label.clone());
        self.lower_condition(&stmt.condition, &body_label, &end_label)?;

        self.blocks.generate(body_label);
        self.loops.push(LoopContext {
            continue_label: cond_label.clone(),
            break_label: end_label.clone(),
        });
        let body = self.lower_stmt(stmt.body);
        self.loops.pop();
        body?;

        self.emit(CoreOpcode::Jump, Operand::Label(cond_label));
        self.blocks.generate(end_label);
        Ok(())
    }

    fn lower_switch(&mut self, stmt: &SwitchStmt<'_>) -> Result<(), CodegenError> {
        self.lower_expr(&stmt.scrutinee)?;

        let end_label = self.labels.generate();
        let mut table = Vec::new();
        let mut arms = Vec::with_capacity(stmt.cases.len());
        let mut default_label = None;
        for case in stmt.cases {
            let label = self.labels.generate();
            if case.is_default() {
                default_label = Some(label.clone());
            } else {
                for key in case.keys {
                    table.push((self.resolve_case_key(key)?, label.clone()));
                }
            }
            arms.push((label, case));
        }

        self.emit(CoreOpcode::Switch, Operand::Table(table));
        let fallthrough = default_label.unwrap_or_else(|| end_label.clone());
        self.emit(CoreOpcode::Jump, Operand::Label(fallthrough));

        for (label, case) in arms {
            self.blocks.generate(label);
            for inner in case.body.stmts {
                self.lower_stmt(inner)?;
            }
            self.emit(CoreOpcode::Jump, Operand::Label(end_label.clone()));
        }
        self.blocks.generate(end_label);
        Ok(())
    }

    fn resolve_case_key(&self, key: &Expr<'_>) -> Result<i32, CodegenError> {
        match key {
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::Int(value) | LiteralKind::Coord(value) => Ok(value),
                LiteralKind::Bool(value) => Ok(value as i32),
                LiteralKind::Null => Ok(-1),
                _ => Err(CodegenError::NonConstantCaseKey { span: lit.span }),
            },
            Expr::Constant(var) => match self.symbols.lookup_constant(var.name.name) {
                Some(constant) => match constant.value {
                    Value::Int(value) => Ok(value),
                    _ => Err(CodegenError::NonConstantCaseKey { span: var.span }),
                },
                None => Err(CodegenError::UnresolvedSymbol {
                    name: var.name.name.to_owned(),
                    span: var.span,
                }),
            },
            Expr::Dynamic(ident) => match self.symbols.lookup_constant(ident.name) {
                Some(constant) => match constant.value {
                    Value::Int(value) => Ok(value),
                    _ => Err(CodegenError::NonConstantCaseKey { span: ident.span }),
                },
                None => Err(CodegenError::NonConstantCaseKey { span: ident.span }),
            },
            _ => Err(CodegenError::NonConstantCaseKey { span: key.span() }),
        }
    }

    // ==================== conditions ====================

    /// Lower a conditional expression into branches: control reaches
    /// `if_true` when it holds and `if_false` otherwise. Logical
    /// connectives short-circuit through freshly labeled blocks.
    fn lower_condition(
        &mut self,
        condition: &Expr<'_>,
        if_true: &Label,
        if_false: &Label,
    ) -> Result<(), CodegenError> {
        if let Expr::Binary(binary) = condition {
            if let Some(branch) = branch_opcode(binary.op) {
                self.lower_expr(binary.left)?;
                self.lower_expr(binary.right)?;
                self.emit(branch, Operand::Label(if_true.clone()));
                self.emit(CoreOpcode::Jump, Operand::Label(if_false.clone()));
                return Ok(());
            }
            match binary.op {
                BinaryOp::And => {
                    let next = self.labels.generate();
                    self.lower_condition(binary.left, &next, if_false)?;
                    self.blocks.generate(next);
                    return self.lower_condition(binary.right, if_true, if_false);
                }
                BinaryOp::Or => {
                    let next = self.labels.generate();
                    self.lower_condition(binary.left, if_true, &next)?;
                    self.blocks.generate(next);
                    return self.lower_condition(binary.right, if_true, if_false);
                }
                _ => {}
            }
        }

        // A boolean-valued expression: branch on equality with true.
        self.lower_expr(condition)?;
        self.emit(CoreOpcode::PushIntConstant, Operand::Value(Value::Int(1)));
        self.emit(CoreOpcode::BranchEquals, Operand::Label(if_true.clone()));
        self.emit(CoreOpcode::Jump, Operand::Label(if_false.clone()));
        Ok(())
    }

    /// Lower a comparison or logical expression in value position by
    /// branching into blocks that push 1 or 0.
    fn materialize_condition(&mut self, expr: &Expr<'_>) -> Result<(), CodegenError> {
        let true_label = self.labels.generate();
        let false_label = self.labels.generate();
        let end_label = self.labels.generate();

        self.lower_condition(expr, &true_label, &false_label)?;
        self.blocks.generate(true_label);
        self.emit(CoreOpcode::PushIntConstant, Operand::Value(Value::Int(1)));
        self.emit(CoreOpcode::Jump, Operand::Label(end_label.clone()));
        self.blocks.generate(false_label);
        self.emit(CoreOpcode::PushIntConstant, Operand::Value(Value::Int(0)));
        self.blocks.generate(end_label);
        Ok(())
    }

    // ==================== expressions ====================

    fn lower_expr(&mut self, expr: &Expr<'_>) -> Result<(), CodegenError> {
        match expr {
            Expr::Literal(lit) => {
                self.push_literal(lit);
                Ok(())
            }
            Expr::LocalVar(var) => {
                let (slot, ty) =
                    self.locals
                        .lookup(var.name.name)
                        .ok_or_else(|| CodegenError::UnresolvedLocal {
                            name: var.name.name.to_owned(),
                            span: var.span,
                        })?;
                self.emit(push_local_opcode(ty.stack_type()), Operand::Local(slot));
                Ok(())
            }
            Expr::GlobalVar(var) => {
                let symbols = self.symbols;
                let info = symbols.lookup_variable(var.name.name).ok_or_else(|| {
                    CodegenError::UnresolvedSymbol {
                        name: var.name.name.to_owned(),
                        span: var.span,
                    }
                })?;
                let opcode = match info.domain {
                    VarDomain::Player => CoreOpcode::PushVarp,
                    VarDomain::PlayerBit => CoreOpcode::PushVarpBit,
                    VarDomain::ClientInt => CoreOpcode::PushVarcInt,
                    VarDomain::ClientString => CoreOpcode::PushVarcString,
                    VarDomain::Local => {
                        return Err(CodegenError::UnresolvedSymbol {
                            name: var.name.name.to_owned(),
                            span: var.span,
                        });
                    }
                };
                self.emit(opcode, Operand::Variable(var.name.name.to_owned()));
                Ok(())
            }
            Expr::Constant(var) => {
                let value = self
                    .symbols
                    .lookup_constant(var.name.name)
                    .ok_or_else(|| CodegenError::UnresolvedSymbol {
                        name: var.name.name.to_owned(),
                        span: var.span,
                    })?
                    .value
                    .clone();
                self.push_constant(value);
                Ok(())
            }
            Expr::Dynamic(ident) => {
                let symbols = self.symbols;
                if let Some(constant) = symbols.lookup_constant(ident.name) {
                    let value = constant.value.clone();
                    self.push_constant(value);
                    return Ok(());
                }
                if let Some(command) = symbols.lookup_command(ident.name) {
                    let opcode = command.opcode;
                    let alternative = command.flags.contains(CommandFlags::ALTERNATIVE);
                    self.emit_command(opcode, alternative);
                    return Ok(());
                }
                Err(CodegenError::UnresolvedSymbol {
                    name: ident.name.to_owned(),
                    span: ident.span,
                })
            }
            Expr::Command(call) => {
                for arg in call.args {
                    self.lower_expr(arg)?;
                }
                let symbols = self.symbols;
                let info = symbols.lookup_command(call.name.name).ok_or_else(|| {
                    CodegenError::UnresolvedSymbol {
                        name: call.name.name.to_owned(),
                        span: call.span,
                    }
                })?;
                let opcode = info.opcode;
                let alternative = info.flags.contains(CommandFlags::ALTERNATIVE);
                self.emit_command(opcode, alternative);
                Ok(())
            }
            Expr::Gosub(call) => {
                for arg in call.args {
                    self.lower_expr(arg)?;
                }
                if self.symbols.lookup_script("proc", call.name.name).is_none() {
                    return Err(CodegenError::UnresolvedSymbol {
                        name: call.name.name.to_owned(),
                        span: call.span,
                    });
                }
                self.emit(
                    CoreOpcode::GosubWithParams,
                    Operand::Script {
                        trigger: "proc".to_owned(),
                        name: call.name.name.to_owned(),
                    },
                );
                Ok(())
            }
            Expr::Hook(hook) => {
                for arg in hook.args {
                    self.lower_expr(arg)?;
                }
                self.emit(
                    CoreOpcode::PushStringConstant,
                    Operand::Value(Value::String(hook.name.name.to_owned())),
                );
                self.emit(
                    CoreOpcode::PushIntConstant,
                    Operand::Value(Value::Int(hook.transmits.len() as i32)),
                );
                Ok(())
            }
            Expr::Concat(concat) => {
                for part in concat.parts {
                    self.lower_expr(part)?;
                }
                self.emit(
                    CoreOpcode::JoinString,
                    Operand::Value(Value::Int(concat.parts.len() as i32)),
                );
                Ok(())
            }
            Expr::Index(index) => {
                self.lower_expr(index.index)?;
                let (slot, _) =
                    self.locals
                        .lookup(index.name.name)
                        .ok_or_else(|| CodegenError::UnresolvedLocal {
                            name: index.name.name.to_owned(),
                            span: index.span,
                        })?;
                self.emit(CoreOpcode::PushIntArray, Operand::Local(slot));
                Ok(())
            }
            Expr::Binary(binary) => {
                if binary.op.is_arithmetic() {
                    self.lower_arithmetic(binary)
                } else {
                    self.materialize_condition(expr)
                }
            }
        }
    }

    fn lower_arithmetic(&mut self, binary: &BinaryExpr<'_>) -> Result<(), CodegenError> {
        self.lower_expr(binary.left)?;
        self.lower_expr(binary.right)?;
        let stack = self
            .expr_stack_type(binary.left)
            .ok_or(CodegenError::UnknownOperandStack { span: binary.span })?;
        let opcode = arithmetic_opcode(binary.op, stack)
            .ok_or(CodegenError::UnsupportedArithmetic { stack, span: binary.span })?;
        self.emit(opcode, Operand::Value(Value::Int(0)));
        Ok(())
    }

    /// The operand stack an expression's value lands on, resolved from
    /// the local map and symbol table. `None` for unresolved names and
    /// for hooks, which have no value of their own.
    fn expr_stack_type(&self, expr: &Expr<'_>) -> Option<StackType> {
        match expr {
            Expr::Literal(lit) => Some(match lit.kind {
                LiteralKind::Long(_) => StackType::Long,
                LiteralKind::String(_) => StackType::String,
                _ => StackType::Int,
            }),
            Expr::LocalVar(var) => self
                .locals
                .lookup(var.name.name)
                .map(|(_, ty)| ty.stack_type()),
            Expr::GlobalVar(var) => self
                .symbols
                .lookup_variable(var.name.name)
                .map(|info| info.ty.stack_type()),
            Expr::Constant(var) => self
                .symbols
                .lookup_constant(var.name.name)
                .map(|info| info.ty.stack_type()),
            Expr::Dynamic(ident) => {
                if let Some(constant) = self.symbols.lookup_constant(ident.name) {
                    return Some(constant.ty.stack_type());
                }
                self.symbols
                    .lookup_command(ident.name)
                    .and_then(|info| info.return_type.stack_type())
            }
            Expr::Command(call) => self
                .symbols
                .lookup_command(call.name.name)
                .and_then(|info| info.return_type.stack_type()),
            Expr::Gosub(call) => self
                .symbols
                .lookup_script("proc", call.name.name)
                .and_then(|info| Type::from_list(info.returns.clone()).stack_type()),
            Expr::Hook(_) => None,
            Expr::Concat(_) => Some(StackType::String),
            Expr::Index(index) => self
                .locals
                .lookup(index.name.name)
                .map(|(_, ty)| ty.stack_type()),
            Expr::Binary(binary) => {
                if binary.op.is_arithmetic() {
                    self.expr_stack_type(binary.left)
                } else {
                    Some(StackType::Int)
                }
            }
        }
    }

    // ==================== emit helpers ====================

    fn emit(&mut self, opcode: impl Into<Opcode>, operand: Operand) {
        self.blocks.push(Instruction::new(opcode, operand));
    }

    /// Commands carry 1 as their operand when called through the
    /// alternative form, 0 otherwise.
    fn emit_command(&mut self, opcode: u16, alternative: bool) {
        let flag = if alternative { 1 } else { 0 };
        self.blocks.push(Instruction::new(
            Opcode::Command(opcode),
            Operand::Value(Value::Int(flag)),
        ));
    }

    fn push_constant(&mut self, value: Value) {
        let opcode = match value.stack_type() {
            StackType::Int => CoreOpcode::PushIntConstant,
            StackType::String => CoreOpcode::PushStringConstant,
            StackType::Long => CoreOpcode::PushLongConstant,
        };
        self.emit(opcode, Operand::Value(value));
    }

    fn push_literal(&mut self, lit: &LiteralExpr<'_>) {
        match lit.kind {
            LiteralKind::Int(value) | LiteralKind::Coord(value) => {
                self.push_constant(Value::Int(value));
            }
            LiteralKind::Bool(value) => self.push_constant(Value::Int(value as i32)),
            LiteralKind::Null => self.push_constant(Value::Int(-1)),
            LiteralKind::Long(value) => self.push_constant(Value::Long(value)),
            LiteralKind::String(text) => self.push_constant(Value::String(text.to_owned())),
        }
    }
}

fn push_local_opcode(stack: StackType) -> CoreOpcode {
    match stack {
        StackType::Int => CoreOpcode::PushIntLocal,
        StackType::String => CoreOpcode::PushStringLocal,
        StackType::Long => CoreOpcode::PushLongLocal,
    }
}

fn pop_local_opcode(stack: StackType) -> CoreOpcode {
    match stack {
        StackType::Int => CoreOpcode::PopIntLocal,
        StackType::String => CoreOpcode::PopStringLocal,
        StackType::Long => CoreOpcode::PopLongLocal,
    }
}

fn branch_opcode(op: BinaryOp) -> Option<CoreOpcode> {
    Some(match op {
        BinaryOp::Equal => CoreOpcode::BranchEquals,
        BinaryOp::NotEqual => CoreOpcode::BranchNot,
        BinaryOp::Less => CoreOpcode::BranchLessThan,
        BinaryOp::LessEqual => CoreOpcode::BranchLessThanOrEquals,
        BinaryOp::Greater => CoreOpcode::BranchGreaterThan,
        BinaryOp::GreaterEqual => CoreOpcode::BranchGreaterThanOrEquals,
        _ => return None,
    })
}

fn arithmetic_opcode(op: BinaryOp, stack: StackType) -> Option<CoreOpcode> {
    Some(match (stack, op) {
        (StackType::Int, BinaryOp::Add) => CoreOpcode::IntAdd,
        (StackType::Int, BinaryOp::Sub) => CoreOpcode::IntSub,
        (StackType::Int, BinaryOp::Mul) => CoreOpcode::IntMul,
        (StackType::Int, BinaryOp::Div) => CoreOpcode::IntDiv,
        (StackType::Int, BinaryOp::Mod) => CoreOpcode::IntMod,
        (StackType::Long, BinaryOp::Add) => CoreOpcode::LongAdd,
        (StackType::Long, BinaryOp::Sub) => CoreOpcode::LongSub,
        (StackType::Long, BinaryOp::Mul) => CoreOpcode::LongMul,
        (StackType::Long, BinaryOp::Div) => CoreOpcode::LongDiv,
        (StackType::Long, BinaryOp::Mod) => CoreOpcode::LongMod,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{CommandInfo, ConstantInfo, ScriptInfo, VariableInfo};
    use bumpalo::Bump;
    use emberscript_core::PrimitiveType;

    fn generate(source: &str, symbols: &SymbolTable) -> GeneratedScript {
        let arena = Bump::new();
        let (scripts, lex_errors, parse_errors) = emberscript_parser::parse_all(source, &arena);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        let mut generator = CodeGenerator::new(symbols);
        generator.generate(scripts[0]).unwrap()
    }

    fn opcodes(script: &GeneratedScript) -> Vec<Opcode> {
        script.instructions().map(|i| i.opcode).collect()
    }

    fn core(ops: &[CoreOpcode]) -> Vec<Opcode> {
        ops.iter().map(|&op| Opcode::Core(op)).collect()
    }

    #[test]
    fn declaration_and_read_share_a_slot() {
        let symbols = SymbolTable::new();
        let script = generate("[proc,test] def_int $x = 5; $x = $x + 1;", &symbols);

        assert_eq!(script.name, "[proc,test]");
        assert_eq!(script.int_locals, 1);
        let instructions: Vec<_> = script.instructions().cloned().collect();
        assert_eq!(
            instructions[0],
            Instruction::new(CoreOpcode::PushIntConstant, Operand::Value(Value::Int(5)))
        );
        assert_eq!(
            instructions[1],
            Instruction::new(CoreOpcode::PopIntLocal, Operand::Local(0))
        );
        assert_eq!(
            instructions[2],
            Instruction::new(CoreOpcode::PushIntLocal, Operand::Local(0))
        );
        assert_eq!(
            opcodes(&script),
            core(&[
                CoreOpcode::PushIntConstant,
                CoreOpcode::PopIntLocal,
                CoreOpcode::PushIntLocal,
                CoreOpcode::PushIntConstant,
                CoreOpcode::IntAdd,
                CoreOpcode::PopIntLocal,
                CoreOpcode::Return,
            ])
        );
    }

    #[test]
    fn declaration_without_initializer_pushes_the_default() {
        let symbols = SymbolTable::new();
        let script = generate("[proc,test] def_string $s;", &symbols);

        let first = script.instructions().next().unwrap();
        assert_eq!(
            *first,
            Instruction::new(
                CoreOpcode::PushStringConstant,
                Operand::Value(Value::String(String::new()))
            )
        );
        assert_eq!(script.string_locals, 1);
    }

    #[test]
    fn parameters_take_the_first_slots() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test](int $a, string $s) def_int $b = $a; return $s;",
            &symbols,
        );

        assert_eq!(script.int_locals, 2);
        assert_eq!(script.string_locals, 1);
        let instructions: Vec<_> = script.instructions().cloned().collect();
        // $a reads int slot 0, $b pops int slot 1, $s reads string slot 0.
        assert_eq!(
            instructions[0],
            Instruction::new(CoreOpcode::PushIntLocal, Operand::Local(0))
        );
        assert_eq!(
            instructions[1],
            Instruction::new(CoreOpcode::PopIntLocal, Operand::Local(1))
        );
        assert_eq!(
            instructions[2],
            Instruction::new(CoreOpcode::PushStringLocal, Operand::Local(0))
        );
    }

    #[test]
    fn command_arguments_precede_the_command() {
        let mut symbols = SymbolTable::new();
        symbols.define_command(CommandInfo {
            opcode: 100,
            name: "mes".into(),
            return_type: Type::unit(),
            arguments: vec![PrimitiveType::String.into()],
            flags: CommandFlags::empty(),
            transmit_type: None,
        });
        let script = generate("[proc,test] mes(\"hi\");", &symbols);

        let instructions: Vec<_> = script.instructions().cloned().collect();
        assert_eq!(
            instructions[0],
            Instruction::new(
                CoreOpcode::PushStringConstant,
                Operand::Value(Value::String("hi".into()))
            )
        );
        assert_eq!(
            instructions[1],
            Instruction::new(Opcode::Command(100), Operand::Value(Value::Int(0)))
        );
    }

    #[test]
    fn alternative_command_carries_operand_one() {
        let mut symbols = SymbolTable::new();
        symbols.define_command(CommandInfo {
            opcode: 207,
            name: "p_delay".into(),
            return_type: Type::unit(),
            arguments: vec![],
            flags: CommandFlags::ALTERNATIVE,
            transmit_type: None,
        });
        let script = generate("[proc,test] p_delay;", &symbols);

        let first = script.instructions().next().unwrap();
        assert_eq!(
            *first,
            Instruction::new(Opcode::Command(207), Operand::Value(Value::Int(1)))
        );
    }

    #[test]
    fn constants_lower_to_pushes() {
        let mut symbols = SymbolTable::new();
        symbols.define_constant(ConstantInfo {
            name: "max_stack".into(),
            ty: PrimitiveType::Int,
            value: Value::Int(2147483647),
        });
        let script = generate("[proc,test] def_int $x = ^max_stack;", &symbols);

        let first = script.instructions().next().unwrap();
        assert_eq!(
            *first,
            Instruction::new(
                CoreOpcode::PushIntConstant,
                Operand::Value(Value::Int(2147483647))
            )
        );
    }

    #[test]
    fn global_assignment_selects_the_domain_opcode() {
        let mut symbols = SymbolTable::new();
        symbols.define_variable(VariableInfo {
            domain: VarDomain::Player,
            name: "energy".into(),
            ty: PrimitiveType::Int,
        });
        let script = generate("[proc,test] %energy = 100; def_int $e = %energy;", &symbols);

        let instructions: Vec<_> = script.instructions().cloned().collect();
        assert_eq!(
            instructions[1],
            Instruction::new(CoreOpcode::PopVarp, Operand::Variable("energy".into()))
        );
        assert_eq!(
            instructions[2],
            Instruction::new(CoreOpcode::PushVarp, Operand::Variable("energy".into()))
        );
    }

    #[test]
    fn gosub_emits_a_script_operand() {
        let mut symbols = SymbolTable::new();
        symbols.define_script(ScriptInfo {
            trigger: "proc".into(),
            name: "helper".into(),
            arguments: vec![PrimitiveType::Int.into()],
            returns: vec![],
        });
        let script = generate("[proc,test] ~helper(1);", &symbols);

        let instructions: Vec<_> = script.instructions().cloned().collect();
        assert_eq!(
            instructions[1],
            Instruction::new(
                CoreOpcode::GosubWithParams,
                Operand::Script {
                    trigger: "proc".into(),
                    name: "helper".into(),
                }
            )
        );
    }

    #[test]
    fn while_loop_jumps_back_to_the_condition() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test] def_int $i = 0; while ($i < 10) { $i = $i + 1; }",
            &symbols,
        );

        // Entry jumps to the condition block; the body jumps back to it.
        let entry = &script.blocks[0];
        let cond_label = match &entry.instructions.last().unwrap().operand {
            Operand::Label(label) => label.clone(),
            other => panic!("expected a label operand, got {:?}", other),
        };
        let cond_block = script
            .blocks
            .iter()
            .find(|b| b.label == cond_label)
            .unwrap();
        assert_eq!(
            cond_block.instructions[2].opcode,
            Opcode::Core(CoreOpcode::BranchLessThan)
        );

        let back_edge = script
            .blocks
            .iter()
            .flat_map(|b| b.instructions.iter())
            .filter(|i| i.operand == Operand::Label(cond_label.clone()))
            .count();
        // One entry jump, one back edge.
        assert_eq!(back_edge, 2);
    }

    #[test]
    fn break_and_continue_target_the_loop_labels() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test] while (true) { if (1 > 2) { break; } continue; }",
            &symbols,
        );

        let jumps: Vec<_> = script
            .instructions()
            .filter(|i| i.opcode == Opcode::Core(CoreOpcode::Jump))
            .collect();
        assert!(!jumps.is_empty());
        // No lowering error means both statements found their loop.
        assert!(opcodes(&script).contains(&Opcode::Core(CoreOpcode::BranchGreaterThan)));
    }

    #[test]
    fn orphan_break_is_rejected() {
        let symbols = SymbolTable::new();
        let arena = Bump::new();
        let (scripts, _, parse_errors) =
            emberscript_parser::parse_all("[proc,test] break;", &arena);
        assert!(parse_errors.is_empty());
        let mut generator = CodeGenerator::new(&symbols);
        let err = generator.generate(scripts[0]).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::OrphanControlFlow { keyword: "break", .. }
        ));
    }

    #[test]
    fn switch_builds_a_jump_table() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test](int $x) switch_int ($x) { case 1, 2 : return; case default : return; }",
            &symbols,
        );

        let switch = script
            .instructions()
            .find(|i| i.opcode == Opcode::Core(CoreOpcode::Switch))
            .unwrap();
        match &switch.operand {
            Operand::Table(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].0, 1);
                assert_eq!(entries[1].0, 2);
                // Both keys share one case label.
                assert_eq!(entries[0].1, entries[1].1);
            }
            other => panic!("expected a jump table, got {:?}", other),
        }
    }

    #[test]
    fn switch_without_default_falls_through_to_the_end() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test](int $x) switch_int ($x) { case 1 : return; } return;",
            &symbols,
        );

        let instructions: Vec<_> = script.instructions().cloned().collect();
        let switch_pos = instructions
            .iter()
            .position(|i| i.opcode == Opcode::Core(CoreOpcode::Switch))
            .unwrap();
        // The fallthrough jump targets the end label, which opens the
        // last block.
        let end_label = script.blocks.last().unwrap().label.clone();
        assert_eq!(
            instructions[switch_pos + 1],
            Instruction::new(CoreOpcode::Jump, Operand::Label(end_label))
        );
    }

    #[test]
    fn concat_joins_its_fragments() {
        let symbols = SymbolTable::new();
        let script = generate("[proc,test](int $n) return \"count: <$n>\";", &symbols);

        let instructions: Vec<_> = script.instructions().cloned().collect();
        assert_eq!(
            instructions[0].opcode,
            Opcode::Core(CoreOpcode::PushStringConstant)
        );
        assert_eq!(
            instructions[1],
            Instruction::new(CoreOpcode::PushIntLocal, Operand::Local(0))
        );
        assert_eq!(
            instructions[2],
            Instruction::new(CoreOpcode::JoinString, Operand::Value(Value::Int(2)))
        );
    }

    #[test]
    fn long_arithmetic_uses_the_long_opcodes() {
        let symbols = SymbolTable::new();
        let script = generate("[proc,test] def_long $t = 100L + 20L;", &symbols);

        assert!(opcodes(&script).contains(&Opcode::Core(CoreOpcode::LongAdd)));
        assert_eq!(script.long_locals, 1);
    }

    #[test]
    fn comparison_in_value_position_materializes_a_flag() {
        let symbols = SymbolTable::new();
        let script = generate("[proc,test] def_bool $b = 1 < 2;", &symbols);

        let ops = opcodes(&script);
        assert!(ops.contains(&Opcode::Core(CoreOpcode::BranchLessThan)));
        // A 1-push and a 0-push in separate blocks, popped once.
        let pushes = script
            .instructions()
            .filter(|i| i.opcode == Opcode::Core(CoreOpcode::PushIntConstant))
            .count();
        assert_eq!(pushes, 4);
        assert_eq!(
            script
                .instructions()
                .filter(|i| i.opcode == Opcode::Core(CoreOpcode::PopIntLocal))
                .count(),
            1
        );
    }

    #[test]
    fn array_read_pushes_through_the_index() {
        let symbols = SymbolTable::new();
        let script = generate(
            "[proc,test] def_int $scores; def_int $x = $scores(0);",
            &symbols,
        );

        let ops = opcodes(&script);
        assert!(ops.contains(&Opcode::Core(CoreOpcode::PushIntArray)));
    }
}
