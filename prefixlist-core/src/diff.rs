//! Entry differ: minimal add/remove sets between current and desired members.
//!
//! The control plane has no in-place entry update. An entry whose cidr stays
//! but whose description changes is re-added with the new description; the
//! old pair is replaced by the add, so it is never listed for removal.

use std::collections::HashSet;

use crate::types::Entry;

/// Entries to add and remove in one modify call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDiff {
    /// Desired `(cidr, description)` pairs missing from current, in desired order.
    pub to_add: Vec<Entry>,
    /// Current entries whose cidr is not desired at all, in current order.
    pub to_remove: Vec<Entry>,
}

impl EntryDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the entry changes that move `current` to `desired`.
///
/// Additions compare the full `(cidr, description)` pair, removals compare
/// the cidr only.
pub fn diff_entries(current: &[Entry], desired: &[Entry]) -> EntryDiff {
    let current_pairs: HashSet<&Entry> = current.iter().collect();
    let desired_cidrs: HashSet<&str> = desired.iter().map(|e| e.cidr.as_str()).collect();

    let to_add = desired
        .iter()
        .filter(|entry| !current_pairs.contains(entry))
        .cloned()
        .collect();

    let to_remove = current
        .iter()
        .filter(|entry| !desired_cidrs.contains(entry.cidr.as_str()))
        .cloned()
        .collect();

    EntryDiff { to_add, to_remove }
}
