//! Property diffing
//!
//! Computes which keys a node update adds, changes or removes.

use crate::DomValueMap;

/// Result of diffing two property maps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropDiff {
    /// Keys added or whose value changed, with their new value
    pub updated: DomValueMap,
    /// Keys present before and absent now
    pub removed: Vec<String>,
}

impl PropDiff {
    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }

    /// Merge another diff into this one.
    ///
    /// Updates from `other` win on key collision; removals are concatenated.
    pub fn merge(mut self, other: PropDiff) -> Self {
        self.updated.extend(other.updated);
        self.removed.extend(other.removed);
        self
    }
}

/// Diff `old` against `new`
pub fn diff_props(old: &DomValueMap, new: &DomValueMap) -> PropDiff {
    let updated = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let removed = old
        .keys()
        .filter(|key| !new.contains_key(*key))
        .cloned()
        .collect();

    PropDiff { updated, removed }
}
