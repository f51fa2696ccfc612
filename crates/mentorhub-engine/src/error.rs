use std::time::Duration;

use mentorhub_core::errors::{CollaboratorError, CommitError, ValidationError};

use crate::workflow::WorkflowState;

/// Why a single step did not succeed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Some, but not all, of a step's deliveries failed.
    #[error("{failed} of {attempted} deliveries failed: {detail}")]
    Partial {
        failed: usize,
        attempted: usize,
        detail: String,
    },

    /// The step produced a usable value by falling back after a failure.
    #[error("fell back to default: {0}")]
    Fallback(String),

    #[error("step timed out after {0:?}")]
    Timeout(Duration),

    #[error("step panicked: {0}")]
    Panicked(String),
}

impl StepError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Commit(e) => e.error_kind(),
            Self::Collaborator(e) => e.error_kind(),
            Self::Partial { .. } => "partial",
            Self::Fallback(_) => "fallback",
            Self::Timeout(_) => "timeout",
            Self::Panicked(_) => "panicked",
        }
    }

    /// The commit error to surface when this failure aborted the commit step.
    pub fn into_commit_error(self) -> CommitError {
        match self {
            Self::Commit(e) => e,
            other => CommitError::Store(other.to_string()),
        }
    }
}

/// A fatal booking failure. Either the commit was never attempted or the
/// scheduling store refused it, so no session exists for the attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("invalid booking request: {0}")]
    Validation(#[from] ValidationError),

    #[error("requester identity could not be resolved: {0}")]
    IdentityResolution(String),

    #[error("booking could not be committed: {0}")]
    Commit(#[from] CommitError),
}

impl BookingError {
    /// The workflow state the attempt was in when it aborted.
    pub fn aborted_in(&self) -> WorkflowState {
        match self {
            Self::Validation(_) | Self::IdentityResolution(_) => WorkflowState::Validating,
            Self::Commit(_) => WorkflowState::Committing,
        }
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_kind(),
            Self::IdentityResolution(_) => "identity_resolution",
            Self::Commit(e) => e.error_kind(),
        }
    }

    pub fn is_slot_conflict(&self) -> bool {
        matches!(self, Self::Commit(CommitError::SlotConflict(_)))
    }
}
