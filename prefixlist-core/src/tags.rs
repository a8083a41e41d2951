//! Tag reconciler: all-or-nothing tag replacement.
//!
//! Tags are never diffed incrementally. When the current and desired tag
//! multisets differ, every current tag is deleted and every desired tag is
//! created.

use crate::types::Tag;

/// Whether the tag multisets differ (order-independent, duplicates counted).
pub fn needs_replace(current: &[Tag], desired: &[Tag]) -> bool {
    if current.len() != desired.len() {
        return true;
    }
    let mut current_sorted: Vec<&Tag> = current.iter().collect();
    let mut desired_sorted: Vec<&Tag> = desired.iter().collect();
    current_sorted.sort();
    desired_sorted.sort();
    current_sorted != desired_sorted
}

/// Tag calls required to move a resource from its current tags to the desired ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
    delete: Vec<Tag>,
    create: Vec<Tag>,
}

impl TagPlan {
    pub fn new(current: &[Tag], desired: &[Tag]) -> Self {
        if !needs_replace(current, desired) {
            return Self {
                delete: Vec::new(),
                create: Vec::new(),
            };
        }
        Self {
            delete: current.to_vec(),
            create: desired.to_vec(),
        }
    }

    /// Tags for the delete call, `None` when no delete call is needed.
    pub fn tags_to_delete(&self) -> Option<&[Tag]> {
        (!self.delete.is_empty()).then_some(self.delete.as_slice())
    }

    /// Tags for the create call, `None` when no create call is needed.
    pub fn tags_to_create(&self) -> Option<&[Tag]> {
        (!self.create.is_empty()).then_some(self.create.as_slice())
    }

    pub fn is_noop(&self) -> bool {
        self.delete.is_empty() && self.create.is_empty()
    }
}
