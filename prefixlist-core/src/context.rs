//! Resumable invocation context.
//!
//! The context is the only state carried between invocations of one logical
//! operation. Its progress flags are one-way: they can be raised but never
//! lowered, so a resumed operation can only move forward. Handlers read it
//! through the phase enums rather than inspecting flag combinations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    #[serde(default)]
    mutation_started: bool,
    #[serde(default)]
    tags_updated: bool,
    #[serde(rename = "prefixListId", default, skip_serializing_if = "Option::is_none")]
    resource_id: Option<String>,
}

/// Progress of a single-mutation operation (create, delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    NotStarted,
    /// Mutation issued; poll until terminal.
    Issued,
}

/// Progress of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    NeedsTagSync,
    NeedsEntrySync,
    AwaitingCompletion,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a resumed operation, or a fresh one on the first call.
    pub fn resume(saved: Option<InvocationContext>) -> Self {
        saved.unwrap_or_default()
    }

    pub fn mutation_started(&self) -> bool {
        self.mutation_started
    }

    pub fn tags_updated(&self) -> bool {
        self.tags_updated
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn mark_mutation_started(&mut self) {
        self.mutation_started = true;
    }

    pub fn mark_tags_updated(&mut self) {
        self.tags_updated = true;
    }

    /// Record the resource id. A recorded id is never replaced.
    pub fn record_resource_id(&mut self, id: impl Into<String>) {
        if self.resource_id.is_none() {
            self.resource_id = Some(id.into());
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.record_resource_id(id);
        self
    }

    pub fn mutation_phase(&self) -> MutationPhase {
        if self.mutation_started {
            MutationPhase::Issued
        } else {
            MutationPhase::NotStarted
        }
    }

    /// Tags are reconciled before entries. Once the entry mutation is issued
    /// the update only polls, whatever the tag flag says.
    pub fn update_phase(&self) -> UpdatePhase {
        match (self.tags_updated, self.mutation_started) {
            (_, true) => UpdatePhase::AwaitingCompletion,
            (false, false) => UpdatePhase::NeedsTagSync,
            (true, false) => UpdatePhase::NeedsEntrySync,
        }
    }
}
