//! Trigger types and the compiler environment.
//!
//! A trigger names an entry-point kind (`proc`, `label`, `clientscript`,
//! ...) and optionally constrains the parameter and return types every
//! script declared under it must carry. The host registers its trigger
//! set in a [`CompilerEnvironment`] before compiling.

use rustc_hash::FxHashMap;

use emberscript_core::Type;

/// One registered trigger kind.
#[derive(Debug, Clone)]
pub struct TriggerType {
    name: String,
    /// Argument types scripts under this trigger must declare, or `None`
    /// when the trigger takes no parameters.
    argument_types: Option<Vec<Type>>,
    /// Return types scripts under this trigger must produce, or `None`
    /// when the trigger returns nothing.
    return_types: Option<Vec<Type>>,
}

impl TriggerType {
    /// Create a trigger with no parameter or return contract.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument_types: None,
            return_types: None,
        }
    }

    /// Constrain the parameter types scripts under this trigger declare.
    pub fn with_arguments(mut self, types: Vec<Type>) -> Self {
        self.argument_types = Some(types);
        self
    }

    /// Constrain the return types scripts under this trigger produce.
    pub fn with_returns(mut self, types: Vec<Type>) -> Self {
        self.return_types = Some(types);
        self
    }

    /// The trigger keyword.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter contract, if any.
    pub fn argument_types(&self) -> Option<&[Type]> {
        self.argument_types.as_deref()
    }

    /// The return contract, if any.
    pub fn return_types(&self) -> Option<&[Type]> {
        self.return_types.as_deref()
    }
}

/// The set of triggers the host understands.
#[derive(Debug, Default)]
pub struct CompilerEnvironment {
    triggers: FxHashMap<String, TriggerType>,
}

impl CompilerEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Re-registering a name replaces the old entry.
    pub fn register_trigger(&mut self, trigger: TriggerType) {
        self.triggers.insert(trigger.name.clone(), trigger);
    }

    /// Look up a trigger by keyword.
    pub fn lookup_trigger(&self, name: &str) -> Option<&TriggerType> {
        self.triggers.get(name)
    }
}
