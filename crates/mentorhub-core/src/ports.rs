//! Boundaries to the systems the booking workflow drives.
//!
//! None of these calls are coordinated with each other. Only
//! [`SchedulingStore::commit`] is authoritative; everything else is a
//! best-effort side effect of a booking that has already happened.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::booking::{NewSession, ParticipantRole, SessionDetails};
use crate::errors::{CollaboratorError, CommitError};
use crate::ids::{NotificationId, SessionId, SessionTypeId, UserId};
use crate::notifications::NewNotification;

/// Reserves the slot and creates the session in one write.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn commit(&self, session: &NewSession) -> Result<SessionId, CommitError>;
}

/// Human-readable metadata for a session type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    pub id: SessionTypeId,
    pub label: String,
    pub duration_minutes: u32,
}

#[async_trait]
pub trait SessionTypeDirectory: Send + Sync {
    async fn lookup(&self, id: &SessionTypeId) -> Result<SessionType, CollaboratorError>;
}

/// Video-conferencing provisioning API.
#[async_trait]
pub trait MeetingProvisioner: Send + Sync {
    async fn create_link(&self, session_id: &SessionId) -> Result<String, CollaboratorError>;
}

/// The one post-commit write to the session record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn attach_meeting_link(
        &self,
        session_id: &SessionId,
        meet_link: &str,
    ) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &NewNotification)
        -> Result<NotificationId, CollaboratorError>;
}

/// Accounts holding the administrative role, as of the call.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn list_admins(&self) -> Result<Vec<UserId>, CollaboratorError>;
}

#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(
        &self,
        role: ParticipantRole,
        session_id: &SessionId,
        recipient_id: &UserId,
        details: &SessionDetails,
    ) -> Result<(), CollaboratorError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Destructive,
}

/// A transient message for the person who made the booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl UserMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }

    pub fn destructive(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Destructive,
            text: text.into(),
        }
    }
}

/// Transient user-facing messaging surface (toasts, banners).
pub trait UserMessenger: Send + Sync {
    fn show(&self, message: &UserMessage);
}
