//! In-memory control plane.
//!
//! Simulates the asynchronous remote side: mutations leave a list in its
//! `*-in-progress` status for a configurable number of describes before they
//! settle, modifications bump the version, and listings paginate. Every call
//! is recorded so tests can assert on exactly which remote calls were made.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RemoteError;
use crate::status::{self, MutationKind};
use crate::store::{CreateRequest, ModifyRequest, RemoteStore};
use crate::types::{Entry, ManagedPrefixList, Page, Tag};

/// Knobs for the simulated control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Describes that still report in-progress after a mutation is issued.
    pub settle_after_polls: u32,
    /// Items per page for entry and list pagination.
    pub page_size: usize,
    pub owner_id: String,
    pub region: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            settle_after_polls: 1,
            page_size: 100,
            owner_id: "123456789012".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// A remote call as received by the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "call")]
pub enum RemoteCall {
    Create { name: String },
    Modify(ModifyRequest),
    Delete { id: String },
    Describe { id: String },
    ListEntries { id: String, token: Option<String> },
    ListAll { token: Option<String> },
    CreateTags { id: String, tags: Vec<Tag> },
    DeleteTags { id: String, tags: Vec<Tag> },
}

impl RemoteCall {
    /// Whether the call changes remote state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Create { .. }
                | Self::Modify(_)
                | Self::Delete { .. }
                | Self::CreateTags { .. }
                | Self::DeleteTags { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct PendingMutation {
    kind: MutationKind,
    polls_remaining: u32,
}

#[derive(Debug, Clone)]
struct StoredList {
    record: ManagedPrefixList,
    entries: Vec<Entry>,
    pending: Option<PendingMutation>,
}

#[derive(Debug, Default)]
struct Inner {
    lists: BTreeMap<String, StoredList>,
    next_id: u64,
    calls: Vec<RemoteCall>,
    injected_failure: Option<InjectedFailure>,
}

#[derive(Debug)]
struct InjectedFailure {
    mutations_only: bool,
    error: RemoteError,
}

impl Inner {
    fn record(&mut self, call: RemoteCall) -> Result<(), RemoteError> {
        let applies = self
            .injected_failure
            .as_ref()
            .is_some_and(|f| !f.mutations_only || call.is_mutating());
        self.calls.push(call);
        match self.injected_failure.take() {
            Some(injected) if applies => Err(injected.error),
            pending => {
                self.injected_failure = pending;
                Ok(())
            }
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut StoredList, RemoteError> {
        self.lists
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

/// Simulated prefix list control plane. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryRemoteStore {
    inner: Arc<RwLock<Inner>>,
    settings: SimulationSettings,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_settings(SimulationSettings::default())
    }

    pub fn with_settings(settings: SimulationSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            settings,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Create a list that has already settled (`create-complete`), without
    /// recording a call.
    pub async fn seed(&self, request: &CreateRequest) -> Result<ManagedPrefixList, RemoteError> {
        validate_entries(&request.entries, request.max_entries)?;
        let mut inner = self.inner.write().await;
        let stored = self.new_list(&mut inner, request, status::CREATE_COMPLETE);
        let record = stored.record.clone();
        inner.lists.insert(record.id.clone(), stored);
        Ok(record)
    }

    /// Overwrite a list's status and cancel any pending settlement.
    pub async fn force_state(&self, id: &str, state: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        let stored = inner.get_mut(id)?;
        stored.record.state = state.to_string();
        stored.pending = None;
        Ok(())
    }

    /// Make the next call (of any kind) fail with `err`.
    pub async fn fail_next(&self, err: RemoteError) {
        self.inner.write().await.injected_failure = Some(InjectedFailure {
            mutations_only: false,
            error: err,
        });
    }

    /// Make the next mutating call fail with `err`; reads pass through.
    pub async fn fail_next_mutation(&self, err: RemoteError) {
        self.inner.write().await.injected_failure = Some(InjectedFailure {
            mutations_only: true,
            error: err,
        });
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.inner.read().await.calls.clone()
    }

    pub async fn mutating_calls(&self) -> Vec<RemoteCall> {
        self.inner
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.inner.write().await.calls.clear();
    }

    /// Current entries of a list, bypassing pagination and the call log.
    pub async fn entries_of(&self, id: &str) -> Option<Vec<Entry>> {
        self.inner.read().await.lists.get(id).map(|s| s.entries.clone())
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.lists.contains_key(id)
    }

    fn new_list(&self, inner: &mut Inner, request: &CreateRequest, state: &str) -> StoredList {
        inner.next_id += 1;
        let id = format!("pl-{:016x}", inner.next_id);
        let arn = format!(
            "arn:aws:ec2:{}:{}:prefix-list/{}",
            self.settings.region, self.settings.owner_id, id
        );
        StoredList {
            record: ManagedPrefixList {
                id,
                name: request.name.clone(),
                max_entries: request.max_entries,
                address_family: request.address_family,
                version: 1,
                owner_id: self.settings.owner_id.clone(),
                arn,
                state: state.to_string(),
                tags: request.tags.clone(),
            },
            entries: request.entries.clone(),
            pending: None,
        }
    }

    fn pending(&self, kind: MutationKind) -> Option<PendingMutation> {
        Some(PendingMutation {
            kind,
            polls_remaining: self.settings.settle_after_polls,
        })
    }

    fn page<T: Clone>(&self, items: &[T], token: Option<&str>) -> Result<Page<T>, RemoteError> {
        let start = match token {
            None => 0,
            Some(t) => t
                .parse::<usize>()
                .ok()
                .filter(|n| *n <= items.len())
                .ok_or_else(|| RemoteError::rejected("InvalidNextToken", format!("bad token {t}")))?,
        };
        let page_size = self.settings.page_size.max(1);
        let end = (start + page_size).min(items.len());
        let slice = items[start..end].to_vec();
        if end < items.len() {
            Ok(Page::with_token(slice, end.to_string()))
        } else {
            Ok(Page::last(slice))
        }
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_entries(entries: &[Entry], max_entries: u32) -> Result<(), RemoteError> {
    if max_entries == 0 {
        return Err(RemoteError::rejected(
            "InvalidParameterValue",
            "max entries must be positive",
        ));
    }
    if entries.len() > max_entries as usize {
        return Err(RemoteError::rejected(
            "PrefixListMaxEntriesExceeded",
            format!("{} entries exceed the limit of {}", entries.len(), max_entries),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if !seen.insert(entry.cidr.as_str()) {
            return Err(RemoteError::rejected(
                "InvalidParameterValue",
                format!("duplicate cidr {}", entry.cidr),
            ));
        }
    }
    Ok(())
}

fn settled_state(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::Create => status::CREATE_COMPLETE,
        MutationKind::Modify => status::MODIFY_COMPLETE,
        MutationKind::Delete => "delete-complete",
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn create(&self, request: &CreateRequest) -> Result<ManagedPrefixList, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::Create {
            name: request.name.clone(),
        })?;
        validate_entries(&request.entries, request.max_entries)?;

        let mut stored = self.new_list(&mut inner, request, status::CREATE_IN_PROGRESS);
        if self.settings.settle_after_polls == 0 {
            stored.record.state = status::CREATE_COMPLETE.to_string();
        } else {
            stored.pending = self.pending(MutationKind::Create);
        }
        let record = stored.record.clone();
        debug!(prefix_list_id = %record.id, "simulator: create accepted");
        inner.lists.insert(record.id.clone(), stored);
        Ok(record)
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<ManagedPrefixList, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::Modify(request.clone()))?;
        let settle_now = self.settings.settle_after_polls == 0;
        let pending = self.pending(MutationKind::Modify);
        let stored = inner.get_mut(&request.id)?;

        if let Some(p) = &stored.pending {
            return Err(RemoteError::rejected(
                "IncorrectState",
                format!("{} has a {} in progress", request.id, p.kind),
            ));
        }

        if !request.changes_entries() {
            if let Some(name) = &request.name {
                stored.record.name = name.clone();
            }
            stored.record.state = status::MODIFY_COMPLETE.to_string();
            return Ok(stored.record.clone());
        }

        let expected = request.expected_version.ok_or_else(|| {
            RemoteError::rejected(
                "MissingParameter",
                "current version is required when modifying entries",
            )
        })?;
        if expected != stored.record.version {
            return Err(RemoteError::VersionConflict {
                id: request.id.clone(),
                expected,
                current: stored.record.version,
            });
        }

        let mut entries: Vec<Entry> = stored
            .entries
            .iter()
            .filter(|e| !request.remove_entries.iter().any(|r| r.cidr == e.cidr))
            .cloned()
            .collect();
        for added in &request.add_entries {
            match entries.iter_mut().find(|e| e.cidr == added.cidr) {
                Some(existing) => existing.description = added.description.clone(),
                None => entries.push(added.clone()),
            }
        }
        validate_entries(&entries, stored.record.max_entries)?;

        stored.entries = entries;
        stored.record.version += 1;
        if let Some(name) = &request.name {
            stored.record.name = name.clone();
        }
        if settle_now {
            stored.record.state = status::MODIFY_COMPLETE.to_string();
        } else {
            stored.record.state = status::MODIFY_IN_PROGRESS.to_string();
            stored.pending = pending;
        }
        debug!(prefix_list_id = %request.id, version = stored.record.version, "simulator: modify accepted");
        Ok(stored.record.clone())
    }

    async fn delete(&self, id: &str) -> Result<ManagedPrefixList, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::Delete { id: id.to_string() })?;
        let pending = self.pending(MutationKind::Delete);
        let stored = inner.get_mut(id)?;

        match &stored.pending {
            Some(p) if p.kind == MutationKind::Delete => return Ok(stored.record.clone()),
            Some(p) => {
                return Err(RemoteError::rejected(
                    "IncorrectState",
                    format!("{id} has a {} in progress", p.kind),
                ))
            }
            None => {}
        }

        stored.record.state = status::DELETE_IN_PROGRESS.to_string();
        let record = stored.record.clone();
        if self.settings.settle_after_polls == 0 {
            inner.lists.remove(id);
        } else {
            stored.pending = pending;
        }
        debug!(prefix_list_id = %id, "simulator: delete accepted");
        Ok(record)
    }

    async fn describe(&self, id: &str) -> Result<ManagedPrefixList, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::Describe { id: id.to_string() })?;
        let stored = inner.get_mut(id)?;

        let settled = match stored.pending.as_mut() {
            Some(p) if p.polls_remaining > 0 => {
                p.polls_remaining -= 1;
                None
            }
            Some(p) => Some(p.kind),
            None => None,
        };

        match settled {
            Some(MutationKind::Delete) => {
                inner.lists.remove(id);
                debug!(prefix_list_id = %id, "simulator: delete settled");
                Err(RemoteError::NotFound(id.to_string()))
            }
            Some(kind) => {
                stored.pending = None;
                stored.record.state = settled_state(kind).to_string();
                debug!(prefix_list_id = %id, %kind, "simulator: mutation settled");
                Ok(stored.record.clone())
            }
            None => Ok(stored.record.clone()),
        }
    }

    async fn list_entries(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> Result<Page<Entry>, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::ListEntries {
            id: id.to_string(),
            token: token.map(str::to_string),
        })?;
        let stored = inner.get_mut(id)?;
        let entries = stored.entries.clone();
        self.page(&entries, token)
    }

    async fn list_all(&self, token: Option<&str>) -> Result<Page<ManagedPrefixList>, RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::ListAll {
            token: token.map(str::to_string),
        })?;
        let records: Vec<ManagedPrefixList> =
            inner.lists.values().map(|s| s.record.clone()).collect();
        self.page(&records, token)
    }

    async fn create_tags(&self, id: &str, tags: &[Tag]) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::CreateTags {
            id: id.to_string(),
            tags: tags.to_vec(),
        })?;
        let stored = inner.get_mut(id)?;
        for tag in tags {
            match stored.record.tags.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value = tag.value.clone(),
                None => stored.record.tags.push(tag.clone()),
            }
        }
        Ok(())
    }

    async fn delete_tags(&self, id: &str, tags: &[Tag]) -> Result<(), RemoteError> {
        let mut inner = self.inner.write().await;
        inner.record(RemoteCall::DeleteTags {
            id: id.to_string(),
            tags: tags.to_vec(),
        })?;
        let stored = inner.get_mut(id)?;
        stored.record.tags.retain(|t| !tags.contains(t));
        Ok(())
    }
}
