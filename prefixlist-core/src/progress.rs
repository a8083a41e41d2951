//! Progress signals returned by every handler invocation.

use serde::{Deserialize, Serialize};

use crate::context::InvocationContext;

/// Fixed message for an attempted change of an immutable field.
pub const NOT_UPDATABLE_MESSAGE: &str = "MaxEntries or AddressFamily is not updatable.";

/// Handler operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Read,
    List,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Read => "read",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an operation ended in a terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FailureKind {
    /// Capacity or address family differs from the live resource. Never retried.
    NotUpdatable,
    /// The control plane reported the failed status for the in-flight mutation.
    RemoteStatus { status: String },
}

/// Terminal failure reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub operation: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn not_updatable(operation: OperationKind, resource_id: Option<String>) -> Self {
        Self {
            operation,
            resource_id,
            kind: FailureKind::NotUpdatable,
            message: NOT_UPDATABLE_MESSAGE.to_string(),
        }
    }

    pub fn remote_status(
        operation: OperationKind,
        resource_id: Option<String>,
        status: impl Into<String>,
    ) -> Self {
        let status = status.into();
        let message = format!(
            "{} {} ended in status {}",
            operation,
            resource_id.as_deref().unwrap_or("<unassigned>"),
            status
        );
        Self {
            operation,
            resource_id,
            kind: FailureKind::RemoteStatus { status },
            message,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressSignal<T> {
    /// Persist `context` and invoke again after `delay_seconds`.
    Continue {
        context: InvocationContext,
        delay_seconds: u32,
    },
    /// Operation finished; the context is discarded.
    Done(T),
    /// Operation reached a terminal failure; the context is discarded.
    Failed(Failure),
}

impl<T> ProgressSignal<T> {
    pub fn continue_now(context: InvocationContext) -> Self {
        Self::Continue {
            context,
            delay_seconds: 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Continue { .. } => "continue",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    /// The context to persist, if the operation is still in flight.
    pub fn context(&self) -> Option<&InvocationContext> {
        match self {
            Self::Continue { context, .. } => Some(context),
            _ => None,
        }
    }
}
