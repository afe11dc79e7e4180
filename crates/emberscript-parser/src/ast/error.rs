//! Parse error types for the EmberScript parser.

use emberscript_core::{Diagnostic, Span};
use std::fmt;

/// A parse error with location and diagnostic information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The type of error that occurred.
    pub kind: ParseErrorKind,
    /// The location in source where the error occurred.
    pub span: Span,
    /// Additional context or message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {:?}{}",
            self.kind,
            self.span,
            if self.message.is_empty() {
                String::new()
            } else {
                format!(": {}", self.message)
            }
        )
    }
}

impl std::error::Error for ParseError {}

impl From<&ParseError> for Diagnostic {
    fn from(error: &ParseError) -> Self {
        Diagnostic::error(
            error.span,
            if error.message.is_empty() {
                error.kind.to_string()
            } else {
                format!("{}: {}", error.kind, error.message)
            },
        )
    }
}

/// The kind of parse error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Expected a specific token but found something else.
    ExpectedToken,
    /// Unexpected token in this context.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// Expected an expression.
    ExpectedExpression,
    /// Expected a statement.
    ExpectedStatement,
    /// Expected a type keyword.
    ExpectedType,
    /// Expected an identifier.
    ExpectedIdentifier,
    /// Expected a script header (`[trigger,name]`).
    ExpectedScriptHeader,
    /// Invalid syntax.
    InvalidSyntax,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseErrorKind::*;
        let msg = match self {
            ExpectedToken => "expected token",
            UnexpectedToken => "unexpected token",
            UnexpectedEof => "unexpected end of file",
            ExpectedExpression => "expected expression",
            ExpectedStatement => "expected statement",
            ExpectedType => "expected type",
            ExpectedIdentifier => "expected identifier",
            ExpectedScriptHeader => "expected script header",
            InvalidSyntax => "invalid syntax",
        };
        write!(f, "{}", msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let error = ParseError::new(
            ParseErrorKind::ExpectedToken,
            Span::new(1, 6, 3),
            "expected ';'",
        );
        let display = format!("{}", error);
        assert!(display.contains("expected token"));
        assert!(display.contains("expected ';'"));
    }

    #[test]
    fn error_to_diagnostic() {
        let error = ParseError::new(ParseErrorKind::ExpectedExpression, Span::new(2, 3, 1), "");
        let diagnostic = Diagnostic::from(&error);
        assert_eq!(diagnostic.span, Span::new(2, 3, 1));
        assert_eq!(diagnostic.message, "expected expression");
    }
}
