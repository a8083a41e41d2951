use thiserror::Error;

use crate::progress::OperationKind;

/// Errors reported by a [`RemoteStore`](crate::store::RemoteStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The control plane does not know the prefix list id.
    #[error("prefix list not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency check on modify failed.
    #[error("version conflict on {id}: expected {expected}, current {current}")]
    VersionConflict {
        id: String,
        expected: u64,
        current: u64,
    },

    /// The control plane refused the request.
    #[error("request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Caller-visible handler error. Terminal outcomes that the control plane
/// reports are not errors; they come back as
/// [`ProgressSignal::Failed`](crate::progress::ProgressSignal::Failed).
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{operation} {id}: prefix list not found")]
    NotFound { operation: OperationKind, id: String },

    /// Any other remote failure, surfaced unmodified.
    #[error("{operation} {}: {source}", .id.as_deref().unwrap_or("<unassigned>"))]
    Remote {
        operation: OperationKind,
        id: Option<String>,
        #[source]
        source: RemoteError,
    },

    /// No id in the desired model nor in the resumed context.
    #[error("{operation}: no prefix list id available")]
    MissingResourceId { operation: OperationKind },

    #[error("{operation} {}: pagination exceeded {limit} pages", .id.as_deref().unwrap_or("*"))]
    PageLimitExceeded {
        operation: OperationKind,
        id: Option<String>,
        limit: usize,
    },
}

impl HandlerError {
    /// Lift a remote error, giving `NotFound` its own variant.
    pub fn from_remote(operation: OperationKind, id: Option<&str>, source: RemoteError) -> Self {
        match source {
            RemoteError::NotFound(missing) => Self::NotFound {
                operation,
                id: id.map(str::to_string).unwrap_or(missing),
            },
            source => Self::Remote {
                operation,
                id: id.map(str::to_string),
                source,
            },
        }
    }

    pub fn operation(&self) -> OperationKind {
        match self {
            Self::NotFound { operation, .. }
            | Self::Remote { operation, .. }
            | Self::MissingResourceId { operation }
            | Self::PageLimitExceeded { operation, .. } => *operation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
