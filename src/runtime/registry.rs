use rustc_hash::FxHashMap;

use crate::ast::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEntry {
    Block { body: String, parameters: Vec<String> },
    Condition(Expression),
}

/// Named blocks and conditions of one session.
///
/// Both kinds share one name space; a later definition replaces an earlier
/// one of either kind.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    entries: FxHashMap<String, RegistryEntry>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_block(&mut self, name: &str, body: &str, parameters: &[String]) {
        self.entries.insert(
            name.to_string(),
            RegistryEntry::Block {
                body: body.to_string(),
                parameters: parameters.to_vec(),
            },
        );
    }

    pub fn define_condition(&mut self, name: &str, condition: Expression) {
        self.entries
            .insert(name.to_string(), RegistryEntry::Condition(condition));
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Body and parameters of the block `name`.
    pub fn block(&self, name: &str) -> Option<(&str, &[String])> {
        match self.entries.get(name)? {
            RegistryEntry::Block { body, parameters } => Some((body, parameters)),
            RegistryEntry::Condition(_) => None,
        }
    }

    pub fn condition(&self, name: &str) -> Option<&Expression> {
        match self.entries.get(name)? {
            RegistryEntry::Condition(condition) => Some(condition),
            RegistryEntry::Block { .. } => None,
        }
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.block(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
