//! The compiler's error taxonomy.
//!
//! Each phase reports through its own error type: [`LexError`] for the
//! tokenizer, the parser's own error type for syntax, and
//! [`SemanticError`] for the checker. Everything converts into a
//! [`Diagnostic`] so the driver can hand back one ordered list per batch;
//! the compiler itself never prints.

use crate::span::Span;
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single reportable finding: source range, severity, message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Create an error-severity diagnostic.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a warning-severity diagnostic.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.span, self.message)
    }
}

/// An error produced while tokenizing source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("unterminated embedded expression in string literal")]
    UnterminatedInterpolation { span: Span },

    #[error("invalid numeric literal: {detail}")]
    InvalidNumber { detail: String, span: Span },

    #[error("expected a name after '{sigil}'")]
    MissingSigilName { sigil: char, span: Span },
}

impl LexError {
    /// The source range the error applies to.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::UnterminatedInterpolation { span }
            | LexError::InvalidNumber { span, .. }
            | LexError::MissingSigilName { span, .. } => *span,
        }
    }
}

impl From<&LexError> for Diagnostic {
    fn from(error: &LexError) -> Self {
        Diagnostic::error(error.span(), error.to_string())
    }
}

/// An error produced by the semantic checker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("duplicate script '[{trigger},{name}]'")]
    DuplicateScript {
        trigger: String,
        name: String,
        span: Span,
    },

    #[error("unknown trigger '{trigger}'")]
    UnknownTrigger { trigger: String, span: Span },

    #[error("trigger '{trigger}' expects parameters ({expected}) but the script declares ({actual})")]
    ParameterMismatch {
        trigger: String,
        expected: String,
        actual: String,
        span: Span,
    },

    #[error("expected return of ({expected}) but found ({actual})")]
    ReturnMismatch {
        expected: String,
        actual: String,
        span: Span,
    },

    #[error("duplicate local variable '${name}'")]
    DuplicateLocal { name: String, span: Span },

    #[error("unresolved script '~{name}'")]
    UnresolvedScript { name: String, span: Span },

    #[error("unresolved command '{name}'")]
    UnresolvedCommand { name: String, span: Span },

    #[error("unresolved constant '^{name}'")]
    UnresolvedConstant { name: String, span: Span },

    #[error("unresolved variable '{name}'")]
    UnresolvedVariable { name: String, span: Span },

    #[error("unresolved reference '{name}'")]
    UnresolvedReference { name: String, span: Span },

    #[error("'{name}' expects arguments ({expected}) but was given ({actual})")]
    ArgumentMismatch {
        name: String,
        expected: String,
        actual: String,
        span: Span,
    },

    #[error("type mismatch: expected '{expected}' but found '{actual}'")]
    TypeMismatch {
        expected: String,
        actual: String,
        span: Span,
    },

    #[error("hook expressions are only legal as arguments to hook commands")]
    IllegalHook { span: Span },

    #[error("command '{name}' does not accept a transmit list")]
    IllegalTransmitList { name: String, span: Span },

    #[error("'{keyword}' outside of a loop")]
    OutsideLoop { keyword: String, span: Span },

    #[error("switch case key must be a constant expression")]
    NonConstantCaseKey { span: Span },

    #[error("expression result of type '{actual}' is discarded")]
    DiscardedValue { actual: String, span: Span },
}

impl SemanticError {
    /// The source range the error applies to.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DuplicateScript { span, .. }
            | SemanticError::UnknownTrigger { span, .. }
            | SemanticError::ParameterMismatch { span, .. }
            | SemanticError::ReturnMismatch { span, .. }
            | SemanticError::DuplicateLocal { span, .. }
            | SemanticError::UnresolvedScript { span, .. }
            | SemanticError::UnresolvedCommand { span, .. }
            | SemanticError::UnresolvedConstant { span, .. }
            | SemanticError::UnresolvedVariable { span, .. }
            | SemanticError::UnresolvedReference { span, .. }
            | SemanticError::ArgumentMismatch { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::IllegalHook { span }
            | SemanticError::IllegalTransmitList { span, .. }
            | SemanticError::OutsideLoop { span, .. }
            | SemanticError::NonConstantCaseKey { span }
            | SemanticError::DiscardedValue { span, .. } => *span,
        }
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(error: &SemanticError) -> Self {
        Diagnostic::error(error.span(), error.to_string())
    }
}
