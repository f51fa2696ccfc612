use std::time::Duration;

/// A booking request that cannot be committed as submitted.
/// Raised before any collaborator is called.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a session date is required")]
    MissingDate,
    #[error("a time slot is required")]
    MissingTimeSlot,
    #[error("a session type is required")]
    MissingSessionType,
    #[error("a mentor is required")]
    MissingMentor,
    #[error("invalid time slot: {0}")]
    InvalidTimeSlot(String),
}

impl ValidationError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingDate => "missing_date",
            Self::MissingTimeSlot => "missing_time_slot",
            Self::MissingSessionType => "missing_session_type",
            Self::MissingMentor => "missing_mentor",
            Self::InvalidTimeSlot(_) => "invalid_time_slot",
        }
    }
}

/// The scheduling store refused or failed the authoritative write.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// The slot is already held by another scheduled session.
    #[error("time slot already booked: {0}")]
    SlotConflict(String),
    #[error("booking rejected: {0}")]
    Rejected(String),
    #[error("scheduling store error: {0}")]
    Store(String),
}

impl CommitError {
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::SlotConflict(_) => "slot_conflict",
            Self::Rejected(_) => "rejected",
            Self::Store(_) => "store",
        }
    }
}

/// Failure reported by any downstream system after the commit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
}

impl CollaboratorError {
    /// Whether the same call might succeed later. Informational only: nothing retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Rejected(_) => "rejected",
            Self::Unavailable(_) => "unavailable",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Classify an HTTP status code from a remote collaborator.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => Self::NotFound(body),
            408 | 504 => Self::Timeout(Duration::ZERO),
            400..=499 => Self::Rejected(format!("{status}: {body}")),
            _ => Self::Unavailable(format!("{status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CollaboratorError::Unavailable("503".into()).is_transient());
        assert!(CollaboratorError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!CollaboratorError::Rejected("bad".into()).is_transient());
        assert!(!CollaboratorError::NotFound("x".into()).is_transient());
    }

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            CollaboratorError::from_status(404, "gone".into()),
            CollaboratorError::NotFound(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(422, "bad".into()),
            CollaboratorError::Rejected(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(504, "slow".into()),
            CollaboratorError::Timeout(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(500, "boom".into()),
            CollaboratorError::Unavailable(_)
        ));
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(ValidationError::MissingDate.error_kind(), "missing_date");
        assert_eq!(
            CommitError::SlotConflict("m1@10:00".into()).error_kind(),
            "slot_conflict"
        );
        assert_eq!(
            CollaboratorError::Timeout(Duration::ZERO).error_kind(),
            "timeout"
        );
    }

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            ValidationError::InvalidTimeSlot("25:00".into()).to_string(),
            "invalid time slot: 25:00"
        );
        assert_eq!(
            CommitError::SlotConflict("m1 2024-06-01 10:00".into()).to_string(),
            "time slot already booked: m1 2024-06-01 10:00"
        );
    }
}
