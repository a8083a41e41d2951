//! Status classifier: maps control plane status strings to a tri-state outcome.
//!
//! Each mutation kind has exactly one in-progress and one failed status.
//! Every other string counts as success, including statuses this table does
//! not know about.

pub const CREATE_IN_PROGRESS: &str = "create-in-progress";
pub const CREATE_FAILED: &str = "create-failed";
pub const MODIFY_IN_PROGRESS: &str = "modify-in-progress";
pub const MODIFY_FAILED: &str = "modify-failed";
pub const DELETE_IN_PROGRESS: &str = "delete-in-progress";
pub const DELETE_FAILED: &str = "delete-failed";

pub const CREATE_COMPLETE: &str = "create-complete";
pub const MODIFY_COMPLETE: &str = "modify-complete";

/// Kind of background mutation whose status is being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Modify,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    pub fn in_progress_status(&self) -> &'static str {
        match self {
            Self::Create => CREATE_IN_PROGRESS,
            Self::Modify => MODIFY_IN_PROGRESS,
            Self::Delete => DELETE_IN_PROGRESS,
        }
    }

    pub fn failed_status(&self) -> &'static str {
        match self {
            Self::Create => CREATE_FAILED,
            Self::Modify => MODIFY_FAILED,
            Self::Delete => DELETE_FAILED,
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a polled status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Pending,
    Success,
    Failed,
}

/// Classify a raw status string for the given mutation kind.
pub fn classify(kind: MutationKind, raw_status: &str) -> StatusOutcome {
    if raw_status == kind.in_progress_status() {
        StatusOutcome::Pending
    } else if raw_status == kind.failed_status() {
        StatusOutcome::Failed
    } else {
        StatusOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MutationKind; 3] = [
        MutationKind::Create,
        MutationKind::Modify,
        MutationKind::Delete,
    ];

    #[test]
    fn in_progress_is_pending_for_its_own_kind() {
        assert_eq!(classify(MutationKind::Create, CREATE_IN_PROGRESS), StatusOutcome::Pending);
        assert_eq!(classify(MutationKind::Modify, MODIFY_IN_PROGRESS), StatusOutcome::Pending);
        assert_eq!(classify(MutationKind::Delete, DELETE_IN_PROGRESS), StatusOutcome::Pending);
    }

    #[test]
    fn failed_is_failed_for_its_own_kind() {
        assert_eq!(classify(MutationKind::Create, CREATE_FAILED), StatusOutcome::Failed);
        assert_eq!(classify(MutationKind::Modify, MODIFY_FAILED), StatusOutcome::Failed);
        assert_eq!(classify(MutationKind::Delete, DELETE_FAILED), StatusOutcome::Failed);
    }

    #[test]
    fn other_kinds_statuses_count_as_success() {
        assert_eq!(classify(MutationKind::Create, MODIFY_FAILED), StatusOutcome::Success);
        assert_eq!(classify(MutationKind::Modify, CREATE_IN_PROGRESS), StatusOutcome::Success);
        assert_eq!(classify(MutationKind::Delete, CREATE_FAILED), StatusOutcome::Success);
    }

    /// Unknown statuses are success. New control plane statuses would be
    /// silently treated as complete; this test keeps that visible.
    #[test]
    fn unknown_status_is_success() {
        for kind in KINDS {
            assert_eq!(classify(kind, "restore-in-progress"), StatusOutcome::Success);
            assert_eq!(classify(kind, ""), StatusOutcome::Success);
            assert_eq!(classify(kind, "CREATE-FAILED"), StatusOutcome::Success);
        }
    }

    #[test]
    fn complete_statuses_are_success() {
        assert_eq!(classify(MutationKind::Create, CREATE_COMPLETE), StatusOutcome::Success);
        assert_eq!(classify(MutationKind::Modify, MODIFY_COMPLETE), StatusOutcome::Success);
    }
}
