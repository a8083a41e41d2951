//! Resumable reconciliation handlers.
//!
//! Each handler runs one invocation of a logical operation against the
//! injected [`RemoteStore`] and reports back a [`ProgressSignal`]. Handlers
//! never sleep; the caller re-invokes them with the returned context after
//! the requested delay.

mod create;
mod delete;
mod list;
mod read;
mod update;

use std::sync::Arc;

use crate::config::ReconcilerConfig;
use crate::context::InvocationContext;
use crate::error::{HandlerError, RemoteError};
use crate::pagination::{drain_pages, WalkError};
use crate::progress::{OperationKind, ProgressSignal};
use crate::store::RemoteStore;
use crate::types::{Entry, ManagedPrefixList, PrefixList};

/// Create/Update/Delete/Read/List handlers over one control plane.
#[derive(Clone)]
pub struct PrefixListHandlers {
    store: Arc<dyn RemoteStore>,
    config: ReconcilerConfig,
}

impl PrefixListHandlers {
    pub fn new(store: Arc<dyn RemoteStore>, config: ReconcilerConfig) -> Self {
        Self { store, config }
    }

    /// Suspend and poll again after the configured delay.
    fn poll_again<T>(&self, context: InvocationContext) -> ProgressSignal<T> {
        ProgressSignal::Continue {
            context,
            delay_seconds: self.config.poll_delay_seconds,
        }
    }

    /// All entries of one list, in page order.
    async fn drain_entries(
        &self,
        operation: OperationKind,
        id: &str,
    ) -> Result<Vec<Entry>, HandlerError> {
        let store = &self.store;
        drain_pages(self.config.max_pages, move |token| async move {
            store.list_entries(id, token.as_deref()).await
        })
        .await
        .map_err(|e| walk_error(operation, Some(id), e))
    }
}

impl std::fmt::Debug for PrefixListHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixListHandlers")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn walk_error(operation: OperationKind, id: Option<&str>, err: WalkError<RemoteError>) -> HandlerError {
    match err {
        WalkError::Fetch(source) => HandlerError::from_remote(operation, id, source),
        WalkError::LimitExceeded(limit) => HandlerError::PageLimitExceeded {
            operation,
            id: id.map(str::to_string),
            limit,
        },
    }
}

/// Desired model with the server-computed fields filled in.
fn with_computed(desired: &PrefixList, observed: &ManagedPrefixList) -> PrefixList {
    let mut model = desired.clone();
    model.id = Some(observed.id.clone());
    model.version = Some(observed.version);
    model.owner_id = Some(observed.owner_id.clone());
    model.arn = Some(observed.arn.clone());
    model
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::memory::{InMemoryRemoteStore, SimulationSettings};
    use crate::types::{AddressFamily, Tag};

    /// Handlers plus a shared handle on the simulator behind them.
    pub(crate) fn harness(settings: SimulationSettings) -> (PrefixListHandlers, InMemoryRemoteStore) {
        let store = InMemoryRemoteStore::with_settings(settings);
        let handlers = PrefixListHandlers::new(Arc::new(store.clone()), ReconcilerConfig::default());
        (handlers, store)
    }

    pub(crate) fn desired() -> PrefixList {
        PrefixList::new("office", 5, AddressFamily::Ipv4)
            .with_entries(vec![
                Entry::new("1.1.1.1/32", "A"),
                Entry::new("1.1.1.3/32", "A"),
            ])
            .with_tags(vec![Tag::new("Purpose", "Testing")])
    }

    pub(crate) fn create_request(model: &PrefixList) -> crate::store::CreateRequest {
        crate::store::CreateRequest {
            name: model.name.clone(),
            max_entries: model.max_entries,
            address_family: model.address_family,
            entries: model.entries.clone(),
            tags: model.tags.clone(),
        }
    }
}
