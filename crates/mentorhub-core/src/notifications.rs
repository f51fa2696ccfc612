use serde::{Deserialize, Serialize};

use crate::ids::{NotificationId, UserId};

/// Type tag carried on every notification record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    SessionBooked,
    SessionRequested,
    AdminAlert,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionBooked => "session_booked",
            Self::SessionRequested => "session_requested",
            Self::AdminAlert => "admin_alert",
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session_booked" => Ok(Self::SessionBooked),
            "session_requested" => Ok(Self::SessionRequested),
            "admin_alert" => Ok(Self::AdminAlert),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// Category tag, used by clients to group notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Session,
    Admin,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for NotificationCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(Self::Session),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown notification category: {other}")),
        }
    }
}

/// Insert payload for the notification store. One per recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    pub action_url: String,
}

/// A stored notification. Never updated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub category: NotificationCategory,
    pub action_url: String,
    pub read: bool,
    pub created_at: String,
}
