//! Statement AST nodes for EmberScript.

use crate::ast::Ident;
use crate::ast::expr::Expr;
use emberscript_core::{PrimitiveType, Span};

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Variable declaration: `def_int $x = 5;`
    VarDecl(&'ast VarDeclStmt<'ast>),
    /// Assignment: `$x = expr;` or `%x = expr;`
    Assign(&'ast AssignStmt<'ast>),
    /// Expression statement: `expr;`
    Expr(ExprStmt<'ast>),
    /// Return statement: `return expr, expr;`
    Return(&'ast ReturnStmt<'ast>),
    /// Braced block.
    Block(Block<'ast>),
    /// If statement.
    If(&'ast IfStmt<'ast>),
    /// While loop.
    While(&'ast WhileStmt<'ast>),
    /// Switch statement.
    Switch(&'ast SwitchStmt<'ast>),
    /// Break statement.
    Break(BreakStmt),
    /// Continue statement.
    Continue(ContinueStmt),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::VarDecl(s) => s.span,
            Self::Assign(s) => s.span,
            Self::Expr(s) => s.span,
            Self::Return(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::Switch(s) => s.span,
            Self::Break(s) => s.span,
            Self::Continue(s) => s.span,
        }
    }
}

/// A local variable declaration.
///
/// Without an initializer the declared type's default value is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclStmt<'ast> {
    /// Declared type (from the `def_<type>` keyword).
    pub ty: PrimitiveType,
    /// Variable name (without the `$` sigil).
    pub name: Ident<'ast>,
    /// Optional initializer.
    pub init: Option<Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

/// An assignment statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    /// The assignment target.
    pub target: VarTarget<'ast>,
    /// The assigned value.
    pub value: Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// What an assignment writes to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarTarget<'ast> {
    /// `$name = ...`
    Local(Ident<'ast>),
    /// `%name = ...`
    Global(Ident<'ast>),
}

impl<'ast> VarTarget<'ast> {
    /// The target's name.
    pub fn name(&self) -> Ident<'ast> {
        match self {
            VarTarget::Local(ident) | VarTarget::Global(ident) => *ident,
        }
    }
}

/// An expression statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    /// The expression.
    pub expr: Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// A return statement with an ordered expression list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    /// Returned expressions, left to right. Empty for `return;`.
    pub exprs: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// A block of statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    /// Statements in the block.
    pub stmts: &'ast [Stmt<'ast>],
    /// Source location.
    pub span: Span,
}

/// An if statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    /// Condition.
    pub condition: Expr<'ast>,
    /// Then branch.
    pub then_stmt: &'ast Stmt<'ast>,
    /// Optional else branch.
    pub else_stmt: Option<&'ast Stmt<'ast>>,
    /// Source location.
    pub span: Span,
}

/// A while loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    /// Condition.
    pub condition: Expr<'ast>,
    /// Loop body.
    pub body: &'ast Stmt<'ast>,
    /// Source location.
    pub span: Span,
}

/// A switch statement: `switch_<type> (scrutinee) { cases }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchStmt<'ast> {
    /// The switched-over type (from the `switch_<type>` keyword).
    pub ty: PrimitiveType,
    /// The scrutinee expression.
    pub scrutinee: Expr<'ast>,
    /// Ordered case list.
    pub cases: &'ast [SwitchCase<'ast>],
    /// Source location.
    pub span: Span,
}

/// One switch case.
///
/// An empty key list denotes the default case (`case default :`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchCase<'ast> {
    /// Constant key expressions; empty for the default case.
    pub keys: &'ast [Expr<'ast>],
    /// The case body.
    pub body: Block<'ast>,
    /// Source location.
    pub span: Span,
}

impl SwitchCase<'_> {
    /// Whether this is the default case.
    pub fn is_default(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A break statement.
///
/// The keyword span is kept separately so diagnostics can point at the
/// control keyword itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakStmt {
    /// Span of the `break` keyword.
    pub keyword: Span,
    /// Source location of the whole statement.
    pub span: Span,
}

/// A continue statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinueStmt {
    /// Span of the `continue` keyword.
    pub keyword: Span,
    /// Source location of the whole statement.
    pub span: Span,
}
