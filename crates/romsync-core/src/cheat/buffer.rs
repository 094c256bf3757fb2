//! Runtime-facing cheat buffer.

use serde::{Deserialize, Serialize};

use super::model::CheatCode;

/// One (label, code) pair as the runtime expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatSlot {
    pub label: String,
    pub code: String,
}

impl CheatSlot {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            code: code.into(),
        }
    }
}

/// Ordered projection of a game's cheat list.
///
/// A buffer is only ever replaced as a whole: there is no way to push or
/// remove single slots, so a shrinking server list can never leave stale
/// entries behind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheatBuffer {
    slots: Vec<CheatSlot>,
}

impl CheatBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Converts a fetched cheat list, preserving order and length.
    pub fn from_cheats(cheats: &[CheatCode]) -> Self {
        Self {
            slots: cheats
                .iter()
                .map(|cheat| CheatSlot::new(cheat.name.clone(), cheat.code.clone()))
                .collect(),
        }
    }

    pub fn slots(&self) -> &[CheatSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots paired with the index the runtime's cheat table uses.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &CheatSlot)> {
        self.slots.iter().enumerate()
    }
}

impl FromIterator<CheatSlot> for CheatBuffer {
    fn from_iter<T: IntoIterator<Item = CheatSlot>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
