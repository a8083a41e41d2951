use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::types::{AddressFamily, Entry, ManagedPrefixList, Page, Tag};

/// Request to create a prefix list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub max_entries: u32,
    pub address_family: AddressFamily,
    pub entries: Vec<Entry>,
    pub tags: Vec<Tag>,
}

/// Request to modify a prefix list's entries and/or name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub id: String,
    pub add_entries: Vec<Entry>,
    /// Removal is by cidr; descriptions here are informational.
    pub remove_entries: Vec<Entry>,
    pub name: Option<String>,
    /// Compare-and-set precondition on the list version. Required by the
    /// control plane whenever entries change.
    pub expected_version: Option<u64>,
}

impl ModifyRequest {
    pub fn rename(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            add_entries: Vec::new(),
            remove_entries: Vec::new(),
            name: Some(name.into()),
            expected_version: None,
        }
    }

    pub fn changes_entries(&self) -> bool {
        !self.add_entries.is_empty() || !self.remove_entries.is_empty()
    }
}

/// Control plane for prefix lists.
///
/// Mutations run in the background on the remote side; callers observe their
/// progress through `describe`. The handlers operate exclusively through this
/// trait, so any transport can be plugged in.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // ── Lifecycle ──

    async fn create(&self, request: &CreateRequest) -> Result<ManagedPrefixList, RemoteError>;
    async fn modify(&self, request: &ModifyRequest) -> Result<ManagedPrefixList, RemoteError>;

    /// Start deleting. Fails with `NotFound` if the id is already absent.
    async fn delete(&self, id: &str) -> Result<ManagedPrefixList, RemoteError>;

    // ── Reads ──

    /// Current state of one list. Fails with `NotFound` if the id is unknown.
    async fn describe(&self, id: &str) -> Result<ManagedPrefixList, RemoteError>;

    async fn list_entries(&self, id: &str, token: Option<&str>)
        -> Result<Page<Entry>, RemoteError>;

    async fn list_all(&self, token: Option<&str>) -> Result<Page<ManagedPrefixList>, RemoteError>;

    // ── Tags ──

    async fn create_tags(&self, id: &str, tags: &[Tag]) -> Result<(), RemoteError>;
    async fn delete_tags(&self, id: &str, tags: &[Tag]) -> Result<(), RemoteError>;
}
