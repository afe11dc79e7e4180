//! Per-script local slot allocation.
//!
//! Local variables get slots in the slot space of their stack type:
//! separate int, string, and long counters, mirroring the typed push/pop
//! opcode families. Parameters are registered first, in declaration
//! order, so their slots match the calling convention.

use rustc_hash::FxHashMap;

use emberscript_core::{PrimitiveType, StackType};

/// The locals of one script being generated.
#[derive(Debug, Default)]
pub struct LocalMap {
    slots: FxHashMap<String, (u32, PrimitiveType)>,
    int_count: u32,
    string_count: u32,
    long_count: u32,
}

impl LocalMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter; identical to a variable but named for the
    /// call sites that register the header.
    pub fn register_parameter(&mut self, name: &str, ty: PrimitiveType) -> u32 {
        self.register_variable(name, ty)
    }

    /// Register a local variable, allocating the next slot in its stack
    /// type's slot space.
    pub fn register_variable(&mut self, name: &str, ty: PrimitiveType) -> u32 {
        let counter = match ty.stack_type() {
            StackType::Int => &mut self.int_count,
            StackType::String => &mut self.string_count,
            StackType::Long => &mut self.long_count,
        };
        let slot = *counter;
        *counter += 1;
        self.slots.insert(name.to_owned(), (slot, ty));
        slot
    }

    /// Look up a registered local by name.
    pub fn lookup(&self, name: &str) -> Option<(u32, PrimitiveType)> {
        self.slots.get(name).copied()
    }

    /// Slots allocated on the int stack.
    pub fn int_count(&self) -> u32 {
        self.int_count
    }

    /// Slots allocated on the string stack.
    pub fn string_count(&self) -> u32 {
        self.string_count
    }

    /// Slots allocated on the long stack.
    pub fn long_count(&self) -> u32 {
        self.long_count
    }

    /// Drop everything for the next script.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.int_count = 0;
        self.string_count = 0;
        self.long_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_allocated_per_stack_type() {
        let mut locals = LocalMap::new();
        assert_eq!(locals.register_parameter("a", PrimitiveType::Int), 0);
        assert_eq!(locals.register_parameter("s", PrimitiveType::String), 0);
        assert_eq!(locals.register_variable("b", PrimitiveType::Int), 1);
        assert_eq!(locals.register_variable("l", PrimitiveType::Long), 0);
        // Bools pack into the int stack.
        assert_eq!(locals.register_variable("flag", PrimitiveType::Bool), 2);

        assert_eq!(locals.int_count(), 3);
        assert_eq!(locals.string_count(), 1);
        assert_eq!(locals.long_count(), 1);
    }

    #[test]
    fn lookup_and_reset() {
        let mut locals = LocalMap::new();
        locals.register_variable("x", PrimitiveType::Coord);
        assert_eq!(locals.lookup("x"), Some((0, PrimitiveType::Coord)));
        assert_eq!(locals.lookup("y"), None);

        locals.reset();
        assert_eq!(locals.lookup("x"), None);
        assert_eq!(locals.int_count(), 0);
    }
}
