use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::AttemptId;

/// Every unit of work the booking workflow can execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Commit,
    SessionMetadata,
    MeetingLink,
    MenteeNotification,
    MentorNotification,
    AdminNotification,
    MentorEmail,
    MenteeEmail,
}

impl StepName {
    /// Post-commit steps that always appear in the status report.
    pub const TRACKED: [StepName; 5] = [
        StepName::MentorNotification,
        StepName::MenteeNotification,
        StepName::AdminNotification,
        StepName::MentorEmail,
        StepName::MenteeEmail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::SessionMetadata => "session_metadata",
            Self::MeetingLink => "meeting_link",
            Self::MenteeNotification => "mentee_notification",
            Self::MentorNotification => "mentor_notification",
            Self::AdminNotification => "admin_notification",
            Self::MentorEmail => "mentor_email",
            Self::MenteeEmail => "mentee_email",
        }
    }

    pub fn is_tracked(&self) -> bool {
        Self::TRACKED.contains(self)
    }

    /// How loudly a failure of this step should be alerted on.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Commit | Self::MentorNotification | Self::MenteeNotification => Severity::High,
            Self::MeetingLink | Self::MentorEmail | Self::MenteeEmail | Self::SessionMetadata => {
                Severity::Medium
            }
            Self::AdminNotification => Severity::Low,
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            Self::MentorNotification | Self::MenteeNotification | Self::AdminNotification
        )
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Self::MentorEmail | Self::MenteeEmail)
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Success,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Emitted exactly once per executed step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    pub attempt_id: AttemptId,
    pub name: StepName,
    pub status: StepStatus,
    pub error: Option<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Receives step events. Implementations must not block.
pub trait StepObserver: Send + Sync {
    fn on_step(&self, event: &StepEvent);
}

/// Serde helper for Duration as milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
