//! Core opcodes for the EmberScript stack machine.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// The fixed core instruction set.
///
/// Every opcode is typed by the stack it touches; there is no generic
/// arithmetic or push dispatched on a runtime tag. Commands are not here
/// — each registered command carries its own opcode number in the host
/// instruction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum CoreOpcode {
    // Constants
    PushIntConstant,
    PushStringConstant,
    PushLongConstant,

    // Local variables, one slot space per stack
    PushIntLocal,
    PopIntLocal,
    PushStringLocal,
    PopStringLocal,
    PushLongLocal,
    PopLongLocal,

    // Local int arrays
    PushIntArray,
    PopIntArray,

    // Host-scoped variables
    PushVarp,
    PopVarp,
    PushVarpBit,
    PopVarpBit,
    PushVarcInt,
    PopVarcInt,
    PushVarcString,
    PopVarcString,

    // Control flow
    Jump,
    BranchEquals,
    BranchNot,
    BranchLessThan,
    BranchGreaterThan,
    BranchLessThanOrEquals,
    BranchGreaterThanOrEquals,
    Switch,

    // Calls
    GosubWithParams,
    Return,

    // Strings
    JoinString,

    // Int arithmetic
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    IntMod,

    // Long arithmetic
    LongAdd,
    LongSub,
    LongMul,
    LongDiv,
    LongMod,
}

impl fmt::Display for CoreOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An instruction's opcode: a core opcode or a host command's fixed
/// opcode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Core(CoreOpcode),
    Command(u16),
}

impl From<CoreOpcode> for Opcode {
    fn from(op: CoreOpcode) -> Self {
        Opcode::Core(op)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Core(op) => write!(f, "{}", op),
            Opcode::Command(num) => write!(f, "command({})", num),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_numbering_round_trips() {
        let num: u16 = CoreOpcode::GosubWithParams.into();
        assert_eq!(CoreOpcode::try_from(num), Ok(CoreOpcode::GosubWithParams));
    }

    #[test]
    fn unknown_number_is_rejected() {
        assert!(CoreOpcode::try_from(u16::MAX).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Opcode::Core(CoreOpcode::IntAdd).to_string(), "IntAdd");
        assert_eq!(Opcode::Command(42).to_string(), "command(42)");
    }
}
