//! Tokenization of EmberScript source text.

mod cursor;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, lookup_keyword};
