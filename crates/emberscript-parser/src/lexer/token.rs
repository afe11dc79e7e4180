//! Token types and definitions for the EmberScript lexer.

use emberscript_core::{PrimitiveType, Span};
use std::fmt;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is
/// allocated. This allows the source string to be freed after lexing,
/// since all string content is copied into the arena.
///
/// Sigil-prefixed tokens (`$x`, `%x`, `^x`, `&x`) carry the bare name as
/// their lexeme; the span still covers the sigil.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token (allocated in arena).
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types in EmberScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal: `42`
    IntLiteral,
    /// Long literal: `42L`
    LongLiteral,
    /// Coordinate literal: `0_50_50_20_20` (level_x_z_localx_localz)
    CoordLiteral,
    /// String literal with escapes already processed: `"hello"`
    StringLiteral,

    // =========================================
    // Interpolated strings
    // =========================================
    /// Start of an interpolated string: `"text <expr> ..."`
    ConcatBegin,
    /// A literal fragment inside an interpolated string.
    StringPart,
    /// End of an interpolated string.
    ConcatEnd,

    // =========================================
    // Identifiers and sigils
    // =========================================
    /// Bare identifier (dynamic reference or command name).
    Identifier,
    /// Local variable reference: `$name`
    LocalVar,
    /// Host-scoped variable reference: `%name`
    GlobalVar,
    /// Runtime constant reference: `^name`
    ConstantRef,
    /// Hook reference: `&name`
    Hook,
    /// Gosub sigil: `~`
    Tilde,

    // =========================================
    // Keywords
    // =========================================
    /// A primitive type keyword: `int`, `string`, `long`, `bool`, `coord`.
    TypeName,
    /// Local declaration: `def_int`, `def_string`, ...
    Define,
    /// Switch over a given type: `switch_int`, ...
    Switch,
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `return`
    Return,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // =========================================
    // Operators
    // =========================================
    /// `=` (assignment in statement position, equality in expressions)
    Equal,
    /// `!` (not-equal comparison)
    Bang,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%` (modulo; `%name` is a variable reference instead)
    Percent,
    /// `&` (logical and; `&name` is a hook reference instead)
    Amp,
    /// `|` (logical or)
    Pipe,

    // =========================================
    // Delimiters
    // =========================================
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,

    // =========================================
    // Special
    // =========================================
    /// End of file
    Eof,
    /// Lexer error (unrecognized input)
    Error,
}

impl TokenKind {
    /// Check if this token kind is a literal.
    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | LongLiteral | CoordLiteral | StringLiteral | True | False | Null
        )
    }

    /// Check if this token kind can start a statement's leading keyword.
    pub fn is_statement_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Define | If | While | Switch | Return | Break | Continue
        )
    }

    /// Get the string representation of this token kind for error
    /// messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            LongLiteral => "long literal",
            CoordLiteral => "coordinate literal",
            StringLiteral => "string literal",
            ConcatBegin => "interpolated string",
            StringPart => "string fragment",
            ConcatEnd => "end of interpolated string",
            Identifier => "identifier",
            LocalVar => "local variable",
            GlobalVar => "host variable",
            ConstantRef => "constant reference",
            Hook => "hook reference",
            Tilde => "'~'",
            TypeName => "type name",
            Define => "variable declaration",
            Switch => "'switch'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            Case => "'case'",
            Default => "'default'",
            Break => "'break'",
            Continue => "'continue'",
            Return => "'return'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Equal => "'='",
            Bang => "'!'",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Amp => "'&'",
            Pipe => "'|'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Colon => "':'",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

/// Look up the token kind for an identifier-shaped lexeme.
///
/// Returns `None` for plain identifiers. `def_<type>` and `switch_<type>`
/// only count as keywords when the suffix is a real primitive type, so
/// `def_thing` stays an ordinary identifier.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    if let Some(suffix) = ident.strip_prefix("def_") {
        if PrimitiveType::from_keyword(suffix).is_some() {
            return Some(TokenKind::Define);
        }
    }
    if let Some(suffix) = ident.strip_prefix("switch_") {
        if PrimitiveType::from_keyword(suffix).is_some() {
            return Some(TokenKind::Switch);
        }
    }
    if PrimitiveType::from_keyword(ident).is_some() {
        return Some(TokenKind::TypeName);
    }
    Some(match ident {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    })
}
