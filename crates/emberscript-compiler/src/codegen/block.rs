//! Labels, instructions, and labeled blocks.
//!
//! Generated code is a flat list of blocks, each opened by a label and
//! joined by explicit jump instructions. Label ids and names are handed
//! out by a [`LabelGenerator`] that resets per script, so output is
//! deterministic for a given input.

use crate::codegen::opcode::Opcode;
use emberscript_core::Value;
use std::fmt;

/// A jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    /// Sequential id, unique within one script.
    pub id: u32,
    /// Display name (`label_<n>`, or the script entry name).
    pub name: String,
}

/// Hands out sequential labels; reset between scripts.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    next: u32,
}

impl LabelGenerator {
    /// Create a generator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next `label_<n>` label.
    pub fn generate(&mut self) -> Label {
        let id = self.next;
        self.next += 1;
        Label {
            id,
            name: format!("label_{}", id),
        }
    }

    /// Generate the next label with a custom display name.
    pub fn generate_named(&mut self, name: impl Into<String>) -> Label {
        let id = self.next;
        self.next += 1;
        Label {
            id,
            name: name.into(),
        }
    }

    /// Restart numbering for the next script.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// An immediate constant.
    Value(Value),
    /// A local slot index within the operand stack's slot space.
    Local(u32),
    /// A host-scoped variable, referenced by name; the opcode carries
    /// the domain.
    Variable(String),
    /// A jump target.
    Label(Label),
    /// A script reference for gosub.
    Script { trigger: String, name: String },
    /// A switch jump table: resolved integer keys to case labels.
    Table(Vec<(i32, Label)>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{}", value),
            Operand::Local(slot) => write!(f, "${}", slot),
            Operand::Variable(name) => write!(f, "%{}", name),
            Operand::Label(label) => write!(f, "{}", label.name),
            Operand::Script { trigger, name } => write!(f, "[{},{}]", trigger, name),
            Operand::Table(entries) => write!(f, "table({})", entries.len()),
        }
    }
}

/// One generated instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Operand,
}

impl Instruction {
    /// Create an instruction.
    pub fn new(opcode: impl Into<Opcode>, operand: Operand) -> Self {
        Self {
            opcode: opcode.into(),
            operand,
        }
    }
}

/// A labeled run of instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub label: Label,
    pub instructions: Vec<Instruction>,
}

impl Block {
    /// Create an empty block opened by `label`.
    pub fn new(label: Label) -> Self {
        Self {
            label,
            instructions: Vec::new(),
        }
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }
}

/// The blocks of one script, in generation order, with a current-block
/// cursor the generator appends through.
#[derive(Debug, Default)]
pub struct BlockMap {
    blocks: Vec<Block>,
    current: usize,
}

impl BlockMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new block for `label` and make it current.
    ///
    /// Returns the block's index for later reselection.
    pub fn generate(&mut self, label: Label) -> usize {
        self.blocks.push(Block::new(label));
        self.current = self.blocks.len() - 1;
        self.current
    }

    /// Reselect a previously generated block.
    pub fn select(&mut self, index: usize) {
        debug_assert!(index < self.blocks.len());
        self.current = index;
    }

    /// Append an instruction to the current block.
    pub fn push(&mut self, instruction: Instruction) {
        if let Some(block) = self.blocks.get_mut(self.current) {
            block.push(instruction);
        }
    }

    /// The blocks generated so far.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consume the map, yielding the blocks in generation order.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Drop all blocks for the next script.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::opcode::CoreOpcode;

    #[test]
    fn labels_are_sequential_and_resettable() {
        let mut labels = LabelGenerator::new();
        assert_eq!(labels.generate().name, "label_0");
        assert_eq!(labels.generate().name, "label_1");
        let named = labels.generate_named("entry");
        assert_eq!(named.id, 2);
        assert_eq!(named.name, "entry");

        labels.reset();
        assert_eq!(labels.generate().id, 0);
    }

    #[test]
    fn block_map_appends_to_current() {
        let mut labels = LabelGenerator::new();
        let mut blocks = BlockMap::new();

        let first = blocks.generate(labels.generate());
        blocks.push(Instruction::new(
            CoreOpcode::PushIntConstant,
            Operand::Value(Value::Int(1)),
        ));
        blocks.generate(labels.generate());
        blocks.push(Instruction::new(
            CoreOpcode::Return,
            Operand::Value(Value::Int(0)),
        ));

        blocks.select(first);
        blocks.push(Instruction::new(
            CoreOpcode::PushIntConstant,
            Operand::Value(Value::Int(2)),
        ));

        let blocks = blocks.into_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].instructions.len(), 2);
        assert_eq!(blocks[1].instructions.len(), 1);
    }
}
