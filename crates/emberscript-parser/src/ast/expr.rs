//! Expression AST nodes for EmberScript.

use crate::ast::Ident;
use emberscript_core::Span;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// A literal value.
    Literal(LiteralExpr<'ast>),
    /// Local variable reference: `$name`.
    LocalVar(VarExpr<'ast>),
    /// Host-scoped variable reference: `%name`.
    GlobalVar(VarExpr<'ast>),
    /// Runtime constant reference: `^name`.
    Constant(VarExpr<'ast>),
    /// A bare identifier, resolved by the checker as a constant or a
    /// zero-argument command.
    Dynamic(Ident<'ast>),
    /// Command call: `name(args)`.
    Command(&'ast CallExpr<'ast>),
    /// Procedure call: `~name(args)`.
    Gosub(&'ast CallExpr<'ast>),
    /// Hook expression: `&name(args){transmits}`.
    Hook(&'ast HookExpr<'ast>),
    /// String concatenation from an interpolated string literal.
    Concat(&'ast ConcatExpr<'ast>),
    /// Array element read: `$name(index)`.
    Index(&'ast IndexExpr<'ast>),
    /// Binary operation.
    Binary(&'ast BinaryExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::LocalVar(e) | Self::GlobalVar(e) | Self::Constant(e) => e.span,
            Self::Dynamic(ident) => ident.span,
            Self::Command(e) | Self::Gosub(e) => e.span,
            Self::Hook(e) => e.span,
            Self::Concat(e) => e.span,
            Self::Index(e) => e.span,
            Self::Binary(e) => e.span,
        }
    }
}

/// A literal expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    /// The literal value.
    pub kind: LiteralKind<'ast>,
    /// Source location.
    pub span: Span,
}

/// The value carried by a literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// `42`
    Int(i32),
    /// `42L`
    Long(i64),
    /// `0_50_50_20_20`, packed into an i32.
    Coord(i32),
    /// `true` / `false`
    Bool(bool),
    /// `"text"`, escapes already processed.
    String(&'ast str),
    /// `null` (the integer -1 at runtime).
    Null,
}

/// A sigil-prefixed variable or constant reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarExpr<'ast> {
    /// The referenced name (without the sigil).
    pub name: Ident<'ast>,
    /// Source location including the sigil.
    pub span: Span,
}

/// A call with an ordered argument list (command or gosub).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    /// The callee name.
    pub name: Ident<'ast>,
    /// Arguments, left to right.
    pub args: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// A hook expression: `&name(args){transmits}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookExpr<'ast> {
    /// The hooked script name.
    pub name: Ident<'ast>,
    /// Arguments, left to right.
    pub args: &'ast [Expr<'ast>],
    /// Optional transmit identifier list.
    pub transmits: &'ast [Ident<'ast>],
    /// Source location.
    pub span: Span,
}

/// String concatenation of mixed literal/expression fragments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcatExpr<'ast> {
    /// Fragments, left to right. Literal fragments are string literals.
    pub parts: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// An array element read: `$name(index)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    /// The local array name (without the sigil).
    pub name: Ident<'ast>,
    /// The index expression.
    pub index: &'ast Expr<'ast>,
    /// Source location.
    pub span: Span,
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    /// Left operand.
    pub left: &'ast Expr<'ast>,
    /// The operator.
    pub op: BinaryOp,
    /// Right operand.
    pub right: &'ast Expr<'ast>,
    /// Source location covering both operands.
    pub span: Span,
}

/// Binary operators, lowest to highest precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `|`
    Or,
    /// `&`
    And,
    /// `=`
    Equal,
    /// `!`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl BinaryOp {
    /// Whether this operator compares its operands.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    /// Whether this operator is arithmetic.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// Whether this operator is a short-circuit logical connective.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}
