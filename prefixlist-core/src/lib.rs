//! Prefix list reconciler.
//!
//! Drives create/update/delete of a named, versioned, size-bounded CIDR
//! allowlist against an asynchronous control plane. Every handler invocation
//! does a bounded amount of work and returns a [`ProgressSignal`]; long
//! running mutations are resumed with the returned [`InvocationContext`].

pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod pagination;
pub mod progress;
pub mod status;
pub mod store;
pub mod tags;
pub mod types;

pub use config::ReconcilerConfig;
pub use context::{InvocationContext, MutationPhase, UpdatePhase};
pub use diff::{diff_entries, EntryDiff};
pub use error::{HandlerError, RemoteError};
pub use handlers::PrefixListHandlers;
pub use memory::{InMemoryRemoteStore, RemoteCall, SimulationSettings};
pub use progress::{Failure, FailureKind, OperationKind, ProgressSignal, NOT_UPDATABLE_MESSAGE};
pub use status::{classify, MutationKind, StatusOutcome};
pub use store::{CreateRequest, ModifyRequest, RemoteStore};
pub use tags::{needs_replace, TagPlan};
pub use types::{AddressFamily, Entry, ManagedPrefixList, Page, PrefixList, Tag};
