//! The symbol table: scripts, commands, runtime constants, and
//! host-scoped variables.
//!
//! Lookups fail by returning `None` from the kind-specific accessor, so
//! the checker can tell an unresolved script from an unresolved command
//! or constant. Purely local variables never land here — they live in the
//! per-script local map owned by code generation.

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use emberscript_core::{PrimitiveType, Type, Value};

bitflags! {
    /// Capability flags on a registered command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommandFlags: u8 {
        /// The command accepts hook expressions as arguments.
        const HOOKABLE = 1 << 0;
        /// The command has an alternative opcode form; calls through the
        /// alternative name emit operand 1 instead of 0.
        const ALTERNATIVE = 1 << 1;
    }
}

/// A registered script signature, keyed by (trigger, name).
#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub trigger: String,
    pub name: String,
    /// Declared parameter types, in order.
    pub arguments: Vec<Type>,
    /// Declared return types, in order.
    pub returns: Vec<Type>,
}

impl ScriptInfo {
    /// The `[trigger,name]` display form.
    pub fn full_name(&self) -> String {
        format!("[{},{}]", self.trigger, self.name)
    }
}

/// A registered host command.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// The command's fixed opcode in the host instruction table.
    pub opcode: u16,
    pub name: String,
    /// The command's return type (the unit tuple for none).
    pub return_type: Type,
    /// Expected argument types, in order.
    pub arguments: Vec<Type>,
    pub flags: CommandFlags,
    /// The hook-transmit element type, when the command accepts a
    /// transmit list on its hook arguments.
    pub transmit_type: Option<Type>,
}

/// A registered runtime constant.
#[derive(Debug, Clone)]
pub struct ConstantInfo {
    pub name: String,
    pub ty: PrimitiveType,
    pub value: Value,
}

/// Which storage family a host variable belongs to; selects the push/pop
/// opcode family during code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarDomain {
    Local,
    Player,
    PlayerBit,
    ClientInt,
    ClientString,
}

/// A registered host-scoped variable.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub domain: VarDomain,
    pub name: String,
    pub ty: PrimitiveType,
}

/// Keyed registries for everything the checker and code generator
/// resolve by name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scripts: FxHashMap<(String, String), ScriptInfo>,
    commands: FxHashMap<String, CommandInfo>,
    constants: FxHashMap<String, ConstantInfo>,
    variables: FxHashMap<String, VariableInfo>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script signature.
    ///
    /// Returns false (and keeps the existing entry) when a script with
    /// the same (trigger, name) key is already registered.
    pub fn define_script(&mut self, info: ScriptInfo) -> bool {
        let key = (info.trigger.clone(), info.name.clone());
        if self.scripts.contains_key(&key) {
            return false;
        }
        self.scripts.insert(key, info);
        true
    }

    /// Drop every registered script. Host registrations (commands,
    /// constants, variables) survive; script signatures are re-derived
    /// from source on every batch.
    pub fn clear_scripts(&mut self) {
        self.scripts.clear();
    }

    /// Look up a script by trigger and name.
    pub fn lookup_script(&self, trigger: &str, name: &str) -> Option<&ScriptInfo> {
        self.scripts
            .get(&(trigger.to_owned(), name.to_owned()))
    }

    /// Register a command. Re-registering a name replaces the old entry.
    pub fn define_command(&mut self, info: CommandInfo) {
        self.commands.insert(info.name.clone(), info);
    }

    /// Look up a command by name.
    pub fn lookup_command(&self, name: &str) -> Option<&CommandInfo> {
        self.commands.get(name)
    }

    /// Register a runtime constant.
    pub fn define_constant(&mut self, info: ConstantInfo) {
        self.constants.insert(info.name.clone(), info);
    }

    /// Look up a runtime constant by name.
    pub fn lookup_constant(&self, name: &str) -> Option<&ConstantInfo> {
        self.constants.get(name)
    }

    /// Register a host-scoped variable.
    pub fn define_variable(&mut self, info: VariableInfo) {
        self.variables.insert(info.name.clone(), info);
    }

    /// Look up a host-scoped variable by name.
    pub fn lookup_variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_script_keeps_first_registration() {
        let mut table = SymbolTable::new();
        assert!(table.define_script(ScriptInfo {
            trigger: "proc".into(),
            name: "test".into(),
            arguments: vec![PrimitiveType::Int.into()],
            returns: vec![],
        }));
        assert!(!table.define_script(ScriptInfo {
            trigger: "proc".into(),
            name: "test".into(),
            arguments: vec![],
            returns: vec![],
        }));

        let kept = table.lookup_script("proc", "test").expect("registered");
        assert_eq!(kept.arguments.len(), 1);
    }

    #[test]
    fn scripts_keyed_by_trigger_and_name() {
        let mut table = SymbolTable::new();
        table.define_script(ScriptInfo {
            trigger: "proc".into(),
            name: "x".into(),
            arguments: vec![],
            returns: vec![],
        });
        table.define_script(ScriptInfo {
            trigger: "label".into(),
            name: "x".into(),
            arguments: vec![],
            returns: vec![],
        });

        assert!(table.lookup_script("proc", "x").is_some());
        assert!(table.lookup_script("label", "x").is_some());
        assert!(table.lookup_script("clientscript", "x").is_none());
    }

    #[test]
    fn kind_distinguishable_lookups() {
        let mut table = SymbolTable::new();
        table.define_command(CommandInfo {
            opcode: 100,
            name: "mes".into(),
            return_type: Type::unit(),
            arguments: vec![PrimitiveType::String.into()],
            flags: CommandFlags::empty(),
            transmit_type: None,
        });
        table.define_constant(ConstantInfo {
            name: "max_stack".into(),
            ty: PrimitiveType::Int,
            value: Value::Int(2147483647),
        });
        table.define_variable(VariableInfo {
            domain: VarDomain::Player,
            name: "energy".into(),
            ty: PrimitiveType::Int,
        });

        assert!(table.lookup_command("mes").is_some());
        assert!(table.lookup_constant("mes").is_none());
        assert!(table.lookup_constant("max_stack").is_some());
        assert!(table.lookup_variable("energy").is_some());
        assert_eq!(
            table.lookup_variable("energy").map(|v| v.domain),
            Some(VarDomain::Player)
        );
    }

    #[test]
    fn full_name_display() {
        let info = ScriptInfo {
            trigger: "proc".into(),
            name: "test".into(),
            arguments: vec![],
            returns: vec![],
        };
        assert_eq!(info.full_name(), "[proc,test]");
    }
}
