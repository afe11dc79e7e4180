//! Arena-allocated AST for EmberScript.
//!
//! Every node is a small `Copy` struct whose children live behind `&'ast`
//! references or `&'ast [T]` slices in the bump arena. The tree is built
//! once by the parser and never mutated; there are no parent back-links —
//! anything that needs enclosing-construct context threads it through the
//! walk instead.

mod error;
mod expr;
mod parser;
mod stmt;

pub use error::{ParseError, ParseErrorKind};
pub use expr::{
    BinaryExpr, BinaryOp, CallExpr, ConcatExpr, Expr, HookExpr, IndexExpr, LiteralExpr,
    LiteralKind, VarExpr,
};
pub use parser::Parser;
pub use stmt::{
    AssignStmt, Block, BreakStmt, ContinueStmt, ExprStmt, IfStmt, ReturnStmt, Stmt, SwitchCase,
    SwitchStmt, VarDeclStmt, VarTarget, WhileStmt,
};

use emberscript_core::{PrimitiveType, Span};

/// An identifier with its source location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    /// The identifier text (allocated in arena).
    pub name: &'ast str,
    /// Source location.
    pub span: Span,
}

/// A primitive type keyword as written in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeRef {
    /// The named primitive type.
    pub ty: PrimitiveType,
    /// Source location.
    pub span: Span,
}

/// A single `type $name` parameter in a script header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter<'ast> {
    /// Declared parameter type.
    pub ty: PrimitiveType,
    /// Parameter name (without the `$` sigil).
    pub name: Ident<'ast>,
    /// Source location covering type and name.
    pub span: Span,
}

/// One complete script: `[trigger,name](params)(returns) body`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Script<'ast> {
    /// The trigger keyword from the header.
    pub trigger: Ident<'ast>,
    /// The script name from the header.
    pub name: Ident<'ast>,
    /// Ordered parameter list.
    pub params: &'ast [Parameter<'ast>],
    /// Ordered declared return types.
    pub returns: &'ast [TypeRef],
    /// The script body.
    pub body: Block<'ast>,
    /// Source location of the whole script.
    pub span: Span,
}
