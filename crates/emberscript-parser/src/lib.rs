//! The EmberScript front end: lexer and recursive-descent parser.
//!
//! Source text is tokenized into arena-backed [`lexer::Token`]s, then
//! parsed into the `Copy` AST in [`ast`]. One source buffer may hold any
//! number of independent scripts; [`ast::Parser::remaining`] lets a batch
//! loop keep pulling scripts until the token stream is exhausted.

pub mod ast;
pub mod lexer;

use bumpalo::Bump;
use emberscript_core::LexError;

use ast::{ParseError, Parser, Script};
use lexer::Lexer;

/// Tokenize and parse every script in `source`.
///
/// Always returns the scripts that parsed, alongside any lexical and
/// syntax errors; a broken script does not suppress the ones after it.
pub fn parse_all<'ast>(
    source: &str,
    arena: &'ast Bump,
) -> (Vec<&'ast Script<'ast>>, Vec<LexError>, Vec<ParseError>) {
    let mut lexer = Lexer::new(source, arena);
    let tokens = lexer.tokenize();
    let lex_errors = lexer.take_errors();

    let mut parser = Parser::new(tokens, arena);
    let mut scripts = Vec::new();
    while parser.remaining() > 0 {
        if let Some(script) = parser.parse_script() {
            scripts.push(script);
        }
    }
    let parse_errors = parser.take_errors();

    (scripts, lex_errors, parse_errors)
}
