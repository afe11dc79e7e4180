//! The EmberScript type system.
//!
//! Types come in two shapes: [`PrimitiveType`]s, each carrying a stack-type
//! classification and a default value, and [`TupleType`]s, ordered
//! composites whose flattened primitive sequence is computed once at
//! construction. All type equality is defined over flattened sequences, so
//! a singleton tuple compares equal to its lone primitive in both
//! directions.

use crate::value::Value;
use std::fmt;

/// The runtime stack a value lives on.
///
/// The virtual machine keeps three operand stacks; every primitive type
/// maps onto exactly one of them (booleans and coordinates are packed
/// into the int stack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackType {
    Int,
    String,
    Long,
}

/// A primitive script type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    String,
    Long,
    Bool,
    Coord,
}

impl PrimitiveType {
    /// The keyword spelling of this type in source code.
    pub fn representation(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::String => "string",
            PrimitiveType::Long => "long",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Coord => "coord",
        }
    }

    /// The runtime stack values of this type occupy.
    pub fn stack_type(self) -> StackType {
        match self {
            PrimitiveType::Int | PrimitiveType::Bool | PrimitiveType::Coord => StackType::Int,
            PrimitiveType::String => StackType::String,
            PrimitiveType::Long => StackType::Long,
        }
    }

    /// The value a declaration of this type takes when no initializer is
    /// given.
    pub fn default_value(self) -> Value {
        match self {
            PrimitiveType::Int | PrimitiveType::Bool => Value::Int(0),
            PrimitiveType::Coord => Value::Int(-1),
            PrimitiveType::String => Value::String(String::new()),
            PrimitiveType::Long => Value::Long(0),
        }
    }

    /// Resolve a type keyword (`int`, `string`, ...) to a primitive type.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "int" => PrimitiveType::Int,
            "string" => PrimitiveType::String,
            "long" => PrimitiveType::Long,
            "bool" => PrimitiveType::Bool,
            "coord" => PrimitiveType::Coord,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.representation())
    }
}

/// An ordered composite of types.
///
/// The flattened primitive sequence is computed eagerly when the tuple is
/// built: a primitive child contributes itself, a tuple child contributes
/// its own flattened sequence, left to right.
#[derive(Debug, Clone)]
pub struct TupleType {
    children: Vec<Type>,
    flattened: Vec<PrimitiveType>,
}

impl TupleType {
    /// Build a tuple from its direct children, flattening eagerly.
    pub fn new(children: Vec<Type>) -> Self {
        let mut flattened = Vec::with_capacity(children.len());
        for child in &children {
            flattened.extend_from_slice(child.flattened());
        }
        Self {
            children,
            flattened,
        }
    }

    /// The direct child types, nested tuples intact.
    pub fn children(&self) -> &[Type] {
        &self.children
    }

    /// The memoized flattened primitive sequence.
    pub fn flattened(&self) -> &[PrimitiveType] {
        &self.flattened
    }
}

/// A script type: a primitive or a tuple of types.
#[derive(Debug, Clone)]
pub enum Type {
    Primitive(PrimitiveType),
    Tuple(TupleType),
}

impl Type {
    /// The unit type: an empty tuple, used for commands and procedures
    /// that return nothing.
    pub fn unit() -> Self {
        Type::Tuple(TupleType::new(Vec::new()))
    }

    /// Build a type from an ordered list: empty becomes unit, a single
    /// entry stays primitive, anything longer becomes a tuple.
    pub fn from_list(types: Vec<Type>) -> Self {
        match types.len() {
            1 => types.into_iter().next().unwrap_or_else(Type::unit),
            _ => Type::Tuple(TupleType::new(types)),
        }
    }

    /// The flattened primitive sequence of this type.
    pub fn flattened(&self) -> &[PrimitiveType] {
        match self {
            Type::Primitive(primitive) => std::slice::from_ref(primitive),
            Type::Tuple(tuple) => tuple.flattened(),
        }
    }

    /// Whether this type flattens to nothing.
    pub fn is_unit(&self) -> bool {
        self.flattened().is_empty()
    }

    /// The runtime stack values of this type occupy, or `None` for
    /// tuples, which have no single stack slot.
    pub fn stack_type(&self) -> Option<StackType> {
        match self {
            Type::Primitive(primitive) => Some(primitive.stack_type()),
            Type::Tuple(_) => None,
        }
    }

    /// The declaration default for this type, or `None` for tuples.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Type::Primitive(primitive) => Some(primitive.default_value()),
            Type::Tuple(_) => None,
        }
    }

    /// The textual rendering: flattened primitive names joined by commas.
    /// Nested tuple structure is never rendered.
    pub fn representation(&self) -> String {
        let mut out = String::new();
        for (index, primitive) in self.flattened().iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(primitive.representation());
        }
        out
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.flattened() == other.flattened()
    }
}

impl Eq for Type {}

impl From<PrimitiveType> for Type {
    fn from(primitive: PrimitiveType) -> Self {
        Type::Primitive(primitive)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.representation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(children: Vec<Type>) -> Type {
        Type::Tuple(TupleType::new(children))
    }

    #[test]
    fn flatten_nested() {
        // ((int, string), int, (string, bool)) flattens left-to-right.
        let nested = tuple(vec![
            tuple(vec![
                PrimitiveType::Int.into(),
                PrimitiveType::String.into(),
            ]),
            PrimitiveType::Int.into(),
            tuple(vec![
                PrimitiveType::String.into(),
                PrimitiveType::Bool.into(),
            ]),
        ]);
        assert_eq!(
            nested.flattened(),
            &[
                PrimitiveType::Int,
                PrimitiveType::String,
                PrimitiveType::Int,
                PrimitiveType::String,
                PrimitiveType::Bool,
            ]
        );
    }

    #[test]
    fn singleton_tuple_equals_primitive() {
        let singleton = tuple(vec![PrimitiveType::Int.into()]);
        let primitive: Type = PrimitiveType::Int.into();
        assert_eq!(singleton, primitive);
        assert_eq!(primitive, singleton);
    }

    #[test]
    fn tuples_equal_by_flattened_sequence() {
        let flat = tuple(vec![
            PrimitiveType::Int.into(),
            PrimitiveType::String.into(),
            PrimitiveType::Bool.into(),
        ]);
        let nested = tuple(vec![
            tuple(vec![
                PrimitiveType::Int.into(),
                PrimitiveType::String.into(),
            ]),
            PrimitiveType::Bool.into(),
        ]);
        assert_eq!(flat, nested);
    }

    #[test]
    fn tuples_unequal_when_sequences_differ() {
        let a = tuple(vec![PrimitiveType::Int.into(), PrimitiveType::Int.into()]);
        let b = tuple(vec![
            PrimitiveType::Int.into(),
            PrimitiveType::String.into(),
        ]);
        assert_ne!(a, b);
    }

    #[test]
    fn representation_joins_with_commas() {
        let ty = tuple(vec![PrimitiveType::Int.into(), PrimitiveType::Int.into()]);
        assert_eq!(ty.representation(), "int,int");

        let nested = tuple(vec![
            PrimitiveType::Int.into(),
            PrimitiveType::String.into(),
            tuple(vec![PrimitiveType::String.into()]),
        ]);
        assert_eq!(nested.representation(), "int,string,string");
    }

    #[test]
    fn tuple_has_no_stack_type_or_default() {
        let ty = tuple(vec![PrimitiveType::Int.into(), PrimitiveType::Int.into()]);
        assert_eq!(ty.stack_type(), None);
        assert_eq!(ty.default_value(), None);
    }

    #[test]
    fn primitive_defaults() {
        assert_eq!(PrimitiveType::Int.default_value(), Value::Int(0));
        assert_eq!(PrimitiveType::Coord.default_value(), Value::Int(-1));
        assert_eq!(
            PrimitiveType::String.default_value(),
            Value::String(String::new())
        );
        assert_eq!(PrimitiveType::Long.default_value(), Value::Long(0));
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(
            PrimitiveType::from_keyword("coord"),
            Some(PrimitiveType::Coord)
        );
        assert_eq!(PrimitiveType::from_keyword("float"), None);
    }

    #[test]
    fn unit_type() {
        assert!(Type::unit().is_unit());
        assert_eq!(Type::unit().representation(), "");
        assert_eq!(Type::from_list(vec![]).flattened().len(), 0);
    }

    #[test]
    fn from_list_single_stays_primitive() {
        let ty = Type::from_list(vec![PrimitiveType::Long.into()]);
        assert_eq!(ty.stack_type(), Some(StackType::Long));
    }
}
