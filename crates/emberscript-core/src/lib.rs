//! Shared infrastructure for the EmberScript compiler.
//!
//! This crate carries everything the front end and back end agree on:
//! source spans, the diagnostic and error taxonomy, the flattening tuple
//! type system, and runtime values.

pub mod error;
pub mod span;
pub mod types;
pub mod value;

pub use error::{Diagnostic, LexError, SemanticError, Severity};
pub use span::Span;
pub use types::{PrimitiveType, StackType, TupleType, Type};
pub use value::Value;
