//! The semantic checker.
//!
//! Checking runs in two passes over a batch: a registration pass that
//! records every script signature in the symbol table, then a main pass
//! that resolves names and checks types. Scripts in one batch can
//! therefore reference each other regardless of order.
//!
//! The checker is pure with respect to the AST: it reads the tree,
//! accumulates [`SemanticError`]s, and writes nothing but symbol table
//! registrations. An expression that fails to resolve yields no type, and
//! checks over a missing type are skipped so one broken name does not
//! cascade into a column of follow-on errors.

use rustc_hash::FxHashMap;

use emberscript_core::{PrimitiveType, SemanticError, StackType, Type};
use emberscript_parser::ast::{
    AssignStmt, Expr, HookExpr, LiteralKind, ReturnStmt, Script, Stmt, SwitchStmt, VarDeclStmt,
    VarTarget,
};

use crate::symbol::{CommandFlags, CommandInfo, ScriptInfo, SymbolTable};
use crate::trigger::CompilerEnvironment;

/// Per-script checking state.
struct ScriptContext {
    locals: FxHashMap<String, PrimitiveType>,
    /// The script's declared return type, used against return statements.
    expected_return: Type,
    loop_depth: u32,
}

/// Checks a batch of parsed scripts against a trigger environment and a
/// symbol table.
pub struct SemanticChecker<'a> {
    env: &'a CompilerEnvironment,
    symbols: &'a mut SymbolTable,
    errors: Vec<SemanticError>,
}

impl<'a> SemanticChecker<'a> {
    /// Create a checker over `env` and `symbols`.
    pub fn new(env: &'a CompilerEnvironment, symbols: &'a mut SymbolTable) -> Self {
        Self {
            env,
            symbols,
            errors: Vec::new(),
        }
    }

    /// Registration pass: record every script signature so the main pass
    /// can resolve references between scripts in the same batch.
    ///
    /// A second script under an already-taken (trigger, name) key is
    /// reported and not registered; the first registration wins.
    pub fn run_pre(&mut self, scripts: &[&Script<'_>]) {
        for script in scripts {
            let info = ScriptInfo {
                trigger: script.trigger.name.to_owned(),
                name: script.name.name.to_owned(),
                arguments: script.params.iter().map(|p| p.ty.into()).collect(),
                returns: script.returns.iter().map(|r| r.ty.into()).collect(),
            };
            if !self.symbols.define_script(info) {
                self.error(SemanticError::DuplicateScript {
                    trigger: script.trigger.name.to_owned(),
                    name: script.name.name.to_owned(),
                    span: script.name.span,
                });
            }
        }
    }

    /// Main pass: check every script body.
    pub fn run(&mut self, scripts: &[&Script<'_>]) {
        for script in scripts {
            self.check_script(script);
        }
    }

    /// The errors accumulated so far, in source order per script.
    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Take ownership of the accumulated errors.
    pub fn take_errors(&mut self) -> Vec<SemanticError> {
        std::mem::take(&mut self.errors)
    }

    fn error(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    // ==================== scripts ====================

    fn check_script(&mut self, script: &Script<'_>) {
        let header_span = script.trigger.span.merge(script.name.span);
        let trigger = match self.env.lookup_trigger(script.trigger.name) {
            Some(trigger) => trigger.clone(),
            None => {
                self.error(SemanticError::UnknownTrigger {
                    trigger: script.trigger.name.to_owned(),
                    span: script.trigger.span,
                });
                return;
            }
        };

        let declared_params =
            Type::from_list(script.params.iter().map(|p| Type::from(p.ty)).collect());
        if let Some(expected) = trigger.argument_types() {
            let expected = Type::from_list(expected.to_vec());
            if declared_params != expected {
                self.error(SemanticError::ParameterMismatch {
                    trigger: trigger.name().to_owned(),
                    expected: expected.representation(),
                    actual: declared_params.representation(),
                    span: header_span,
                });
            }
        }

        let declared_returns =
            Type::from_list(script.returns.iter().map(|r| Type::from(r.ty)).collect());
        if let Some(expected) = trigger.return_types() {
            let expected = Type::from_list(expected.to_vec());
            if declared_returns != expected {
                self.error(SemanticError::ReturnMismatch {
                    expected: expected.representation(),
                    actual: declared_returns.representation(),
                    span: header_span,
                });
            }
        }

        let mut ctx = ScriptContext {
            locals: FxHashMap::default(),
            expected_return: declared_returns,
            loop_depth: 0,
        };
        for param in script.params {
            if ctx.locals.contains_key(param.name.name) {
                self.error(SemanticError::DuplicateLocal {
                    name: param.name.name.to_owned(),
                    span: param.name.span,
                });
                continue;
            }
            ctx.locals.insert(param.name.name.to_owned(), param.ty);
        }

        for stmt in script.body.stmts {
            self.check_stmt(&mut ctx, stmt);
        }
    }

    // ==================== statements ====================

    fn check_stmt(&mut self, ctx: &mut ScriptContext, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::VarDecl(decl) => self.check_var_decl(ctx, decl),
            Stmt::Assign(assign) => self.check_assign(ctx, assign),
            Stmt::Expr(expr_stmt) => {
                if let Some(ty) = self.check_expr(ctx, &expr_stmt.expr) {
                    if !ty.is_unit() {
                        self.error(SemanticError::DiscardedValue {
                            actual: ty.representation(),
                            span: expr_stmt.span,
                        });
                    }
                }
            }
            Stmt::Return(ret) => self.check_return(ctx, ret),
            Stmt::Block(block) => {
                for inner in block.stmts {
                    self.check_stmt(ctx, inner);
                }
            }
            Stmt::If(if_stmt) => {
                self.check_condition(ctx, &if_stmt.condition);
                self.check_stmt(ctx, if_stmt.then_stmt);
                if let Some(else_stmt) = if_stmt.else_stmt {
                    self.check_stmt(ctx, else_stmt);
                }
            }
            Stmt::While(while_stmt) => {
                self.check_condition(ctx, &while_stmt.condition);
                ctx.loop_depth += 1;
                self.check_stmt(ctx, while_stmt.body);
                ctx.loop_depth -= 1;
            }
            Stmt::Switch(switch_stmt) => self.check_switch(ctx, switch_stmt),
            Stmt::Break(break_stmt) => {
                if ctx.loop_depth == 0 {
                    self.error(SemanticError::OutsideLoop {
                        keyword: "break".to_owned(),
                        span: break_stmt.keyword,
                    });
                }
            }
            Stmt::Continue(continue_stmt) => {
                if ctx.loop_depth == 0 {
                    self.error(SemanticError::OutsideLoop {
                        keyword: "continue".to_owned(),
                        span: continue_stmt.keyword,
                    });
                }
            }
        }
    }

    fn check_var_decl(&mut self, ctx: &mut ScriptContext, decl: &VarDeclStmt<'_>) {
        if ctx.locals.contains_key(decl.name.name) {
            self.error(SemanticError::DuplicateLocal {
                name: decl.name.name.to_owned(),
                span: decl.name.span,
            });
        } else {
            ctx.locals.insert(decl.name.name.to_owned(), decl.ty);
        }

        if let Some(init) = &decl.init {
            if let Some(actual) = self.check_expr(ctx, init) {
                let expected: Type = decl.ty.into();
                if actual != expected {
                    self.error(SemanticError::TypeMismatch {
                        expected: expected.representation(),
                        actual: actual.representation(),
                        span: init.span(),
                    });
                }
            }
        }
    }

    fn check_assign(&mut self, ctx: &mut ScriptContext, assign: &AssignStmt<'_>) {
        let value_ty = self.check_expr(ctx, &assign.value);
        let ident = assign.target.name();
        let target_ty: Option<Type> = match assign.target {
            VarTarget::Local(_) => ctx.locals.get(ident.name).map(|&ty| ty.into()),
            VarTarget::Global(_) => self
                .symbols
                .lookup_variable(ident.name)
                .map(|info| info.ty.into()),
        };
        let Some(target_ty) = target_ty else {
            self.error(SemanticError::UnresolvedVariable {
                name: ident.name.to_owned(),
                span: ident.span,
            });
            return;
        };
        if let Some(value_ty) = value_ty {
            if value_ty != target_ty {
                self.error(SemanticError::TypeMismatch {
                    expected: target_ty.representation(),
                    actual: value_ty.representation(),
                    span: assign.value.span(),
                });
            }
        }
    }

    fn check_return(&mut self, ctx: &mut ScriptContext, ret: &ReturnStmt<'_>) {
        let mut types = Vec::with_capacity(ret.exprs.len());
        for expr in ret.exprs {
            match self.check_expr(ctx, expr) {
                Some(ty) => types.push(ty),
                // An unresolved operand already reported; skip the
                // contract comparison.
                None => return,
            }
        }
        let actual = Type::from_list(types);
        if actual != ctx.expected_return {
            self.error(SemanticError::ReturnMismatch {
                expected: ctx.expected_return.representation(),
                actual: actual.representation(),
                span: ret.span,
            });
        }
    }

    fn check_condition(&mut self, ctx: &mut ScriptContext, condition: &Expr<'_>) {
        if let Some(ty) = self.check_expr(ctx, condition) {
            if ty != PrimitiveType::Bool.into() {
                self.error(SemanticError::TypeMismatch {
                    expected: "bool".to_owned(),
                    actual: ty.representation(),
                    span: condition.span(),
                });
            }
        }
    }

    fn check_switch(&mut self, ctx: &mut ScriptContext, stmt: &SwitchStmt<'_>) {
        let expected: Type = stmt.ty.into();
        if stmt.ty.stack_type() != StackType::Int {
            self.error(SemanticError::TypeMismatch {
                expected: "int".to_owned(),
                actual: expected.representation(),
                span: stmt.scrutinee.span(),
            });
        }
        if let Some(actual) = self.check_expr(ctx, &stmt.scrutinee) {
            if actual != expected {
                self.error(SemanticError::TypeMismatch {
                    expected: expected.representation(),
                    actual: actual.representation(),
                    span: stmt.scrutinee.span(),
                });
            }
        }

        for case in stmt.cases {
            for key in case.keys {
                if !self.is_constant_key(key) {
                    self.error(SemanticError::NonConstantCaseKey { span: key.span() });
                    continue;
                }
                if matches!(key, Expr::Literal(lit) if lit.kind == LiteralKind::Null) {
                    continue;
                }
                if let Some(key_ty) = self.check_expr(ctx, key) {
                    if key_ty != expected {
                        self.error(SemanticError::TypeMismatch {
                            expected: expected.representation(),
                            actual: key_ty.representation(),
                            span: key.span(),
                        });
                    }
                }
            }
            for inner in case.body.stmts {
                self.check_stmt(ctx, inner);
            }
        }
    }

    fn is_constant_key(&self, key: &Expr<'_>) -> bool {
        match key {
            Expr::Literal(lit) => !matches!(lit.kind, LiteralKind::String(_)),
            Expr::Constant(var) => self.symbols.lookup_constant(var.name.name).is_some(),
            Expr::Dynamic(ident) => self.symbols.lookup_constant(ident.name).is_some(),
            _ => false,
        }
    }

    // ==================== expressions ====================

    /// Resolve an expression's type, reporting on failure. `None` means
    /// the expression did not resolve and its consumers should stay
    /// quiet.
    fn check_expr(&mut self, ctx: &mut ScriptContext, expr: &Expr<'_>) -> Option<Type> {
        match expr {
            Expr::Literal(lit) => Some(
                match lit.kind {
                    LiteralKind::Int(_) => PrimitiveType::Int,
                    LiteralKind::Long(_) => PrimitiveType::Long,
                    LiteralKind::Coord(_) => PrimitiveType::Coord,
                    LiteralKind::Bool(_) => PrimitiveType::Bool,
                    LiteralKind::String(_) => PrimitiveType::String,
                    // Null is the int -1 at runtime.
                    LiteralKind::Null => PrimitiveType::Int,
                }
                .into(),
            ),
            Expr::LocalVar(var) => match ctx.locals.get(var.name.name) {
                Some(&ty) => Some(ty.into()),
                None => {
                    self.error(SemanticError::UnresolvedVariable {
                        name: var.name.name.to_owned(),
                        span: var.span,
                    });
                    None
                }
            },
            Expr::GlobalVar(var) => match self.symbols.lookup_variable(var.name.name) {
                Some(info) => Some(info.ty.into()),
                None => {
                    self.error(SemanticError::UnresolvedVariable {
                        name: var.name.name.to_owned(),
                        span: var.span,
                    });
                    None
                }
            },
            Expr::Constant(var) => match self.symbols.lookup_constant(var.name.name) {
                Some(info) => Some(info.ty.into()),
                None => {
                    self.error(SemanticError::UnresolvedConstant {
                        name: var.name.name.to_owned(),
                        span: var.span,
                    });
                    None
                }
            },
            Expr::Dynamic(ident) => {
                if let Some(constant) = self.symbols.lookup_constant(ident.name) {
                    return Some(constant.ty.into());
                }
                if let Some(command) = self.symbols.lookup_command(ident.name) {
                    let command = command.clone();
                    if !command.arguments.is_empty() {
                        let expected = Type::from_list(command.arguments.clone());
                        self.error(SemanticError::ArgumentMismatch {
                            name: ident.name.to_owned(),
                            expected: expected.representation(),
                            actual: String::new(),
                            span: ident.span,
                        });
                        return None;
                    }
                    return Some(command.return_type);
                }
                self.error(SemanticError::UnresolvedReference {
                    name: ident.name.to_owned(),
                    span: ident.span,
                });
                None
            }
            Expr::Command(call) => {
                let info = match self.symbols.lookup_command(call.name.name) {
                    Some(info) => info.clone(),
                    None => {
                        self.error(SemanticError::UnresolvedCommand {
                            name: call.name.name.to_owned(),
                            span: call.name.span,
                        });
                        // Still visit the arguments for their own errors.
                        for arg in call.args {
                            self.check_expr(ctx, arg);
                        }
                        return None;
                    }
                };
                self.check_command_args(ctx, call.args, &info, call.span);
                Some(info.return_type)
            }
            Expr::Gosub(call) => {
                let info = match self.symbols.lookup_script("proc", call.name.name) {
                    Some(info) => info.clone(),
                    None => {
                        self.error(SemanticError::UnresolvedScript {
                            name: call.name.name.to_owned(),
                            span: call.name.span,
                        });
                        for arg in call.args {
                            self.check_expr(ctx, arg);
                        }
                        return None;
                    }
                };
                self.check_plain_args(ctx, call.name.name, call.args, &info.arguments, call.span);
                Some(Type::from_list(info.returns))
            }
            // A hook only makes sense as an argument to a hookable
            // command; those are handled in check_command_args.
            Expr::Hook(hook) => {
                self.error(SemanticError::IllegalHook { span: hook.span });
                None
            }
            Expr::Concat(concat) => {
                for part in concat.parts {
                    if let Some(ty) = self.check_expr(ctx, part) {
                        if ty != PrimitiveType::String.into() {
                            self.error(SemanticError::TypeMismatch {
                                expected: "string".to_owned(),
                                actual: ty.representation(),
                                span: part.span(),
                            });
                        }
                    }
                }
                Some(PrimitiveType::String.into())
            }
            Expr::Index(index) => {
                if let Some(ty) = self.check_expr(ctx, index.index) {
                    if ty != PrimitiveType::Int.into() {
                        self.error(SemanticError::TypeMismatch {
                            expected: "int".to_owned(),
                            actual: ty.representation(),
                            span: index.index.span(),
                        });
                    }
                }
                match ctx.locals.get(index.name.name) {
                    Some(&ty) => Some(ty.into()),
                    None => {
                        self.error(SemanticError::UnresolvedVariable {
                            name: index.name.name.to_owned(),
                            span: index.span,
                        });
                        None
                    }
                }
            }
            Expr::Binary(binary) => {
                let left = self.check_expr(ctx, binary.left);
                let right = self.check_expr(ctx, binary.right);
                let (left, right) = (left?, right?);

                if binary.op.is_arithmetic() {
                    let int_ty: Type = PrimitiveType::Int.into();
                    let long_ty: Type = PrimitiveType::Long.into();
                    if left != right || (left != int_ty && left != long_ty) {
                        self.error(SemanticError::TypeMismatch {
                            expected: left.representation(),
                            actual: right.representation(),
                            span: binary.span,
                        });
                        return None;
                    }
                    return Some(left);
                }
                if binary.op.is_comparison() {
                    if left != right || left.stack_type().is_none() {
                        self.error(SemanticError::TypeMismatch {
                            expected: left.representation(),
                            actual: right.representation(),
                            span: binary.span,
                        });
                        return None;
                    }
                    return Some(PrimitiveType::Bool.into());
                }
                // Logical connectives take booleans.
                let bool_ty: Type = PrimitiveType::Bool.into();
                if left != bool_ty || right != bool_ty {
                    self.error(SemanticError::TypeMismatch {
                        expected: "bool".to_owned(),
                        actual: if left != bool_ty { &left } else { &right }.representation(),
                        span: binary.span,
                    });
                    return None;
                }
                Some(PrimitiveType::Bool.into())
            }
        }
    }

    /// Check command arguments, giving hook arguments their special
    /// treatment: only hookable commands accept them, and a transmit list
    /// is only legal when the command declares a transmit type.
    fn check_command_args(
        &mut self,
        ctx: &mut ScriptContext,
        args: &[Expr<'_>],
        info: &CommandInfo,
        span: emberscript_core::Span,
    ) {
        let mut actual = Vec::with_capacity(args.len());
        for arg in args {
            if let Expr::Hook(hook) = arg {
                if !info.flags.contains(CommandFlags::HOOKABLE) {
                    self.error(SemanticError::IllegalHook { span: hook.span });
                }
                if !hook.transmits.is_empty() && info.transmit_type.is_none() {
                    self.error(SemanticError::IllegalTransmitList {
                        name: info.name.clone(),
                        span: hook.span,
                    });
                }
                self.check_hook(ctx, hook);
                // Hooks occupy a string slot in the argument contract.
                actual.push(Some(PrimitiveType::String.into()));
            } else {
                actual.push(self.check_expr(ctx, arg));
            }
        }

        let Some(types) = actual.into_iter().collect::<Option<Vec<Type>>>() else {
            return;
        };
        let expected = Type::from_list(info.arguments.clone());
        let actual = Type::from_list(types);
        if actual != expected {
            self.error(SemanticError::ArgumentMismatch {
                name: info.name.clone(),
                expected: expected.representation(),
                actual: actual.representation(),
                span,
            });
        }
    }

    /// Check a positional argument list against a declared contract.
    fn check_plain_args(
        &mut self,
        ctx: &mut ScriptContext,
        name: &str,
        args: &[Expr<'_>],
        expected: &[Type],
        span: emberscript_core::Span,
    ) {
        let mut actual = Vec::with_capacity(args.len());
        for arg in args {
            match self.check_expr(ctx, arg) {
                Some(ty) => actual.push(ty),
                None => return,
            }
        }
        let expected = Type::from_list(expected.to_vec());
        let actual = Type::from_list(actual);
        if actual != expected {
            self.error(SemanticError::ArgumentMismatch {
                name: name.to_owned(),
                expected: expected.representation(),
                actual: actual.representation(),
                span,
            });
        }
    }

    fn check_hook(&mut self, ctx: &mut ScriptContext, hook: &HookExpr<'_>) {
        let info = match self.symbols.lookup_script("proc", hook.name.name) {
            Some(info) => info.clone(),
            None => {
                self.error(SemanticError::UnresolvedScript {
                    name: hook.name.name.to_owned(),
                    span: hook.name.span,
                });
                for arg in hook.args {
                    self.check_expr(ctx, arg);
                }
                return;
            }
        };
        self.check_plain_args(ctx, hook.name.name, hook.args, &info.arguments, hook.span);
    }
}
