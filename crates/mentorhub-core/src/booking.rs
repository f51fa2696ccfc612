use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{SessionId, SessionTypeId, UserId};

/// Where the mentoring session takes place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPlatform {
    #[default]
    GoogleMeet,
    Zoom,
    MicrosoftTeams,
    Phone,
    Whatsapp,
    InPerson,
}

impl MeetingPlatform {
    /// Platforms whose meeting link is generated by the provisioning API
    /// rather than supplied by a participant.
    pub fn requires_generated_link(&self) -> bool {
        matches!(self, Self::GoogleMeet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleMeet => "google_meet",
            Self::Zoom => "zoom",
            Self::MicrosoftTeams => "microsoft_teams",
            Self::Phone => "phone",
            Self::Whatsapp => "whatsapp",
            Self::InPerson => "in_person",
        }
    }
}

impl std::fmt::Display for MeetingPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MeetingPlatform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_meet" => Ok(Self::GoogleMeet),
            "zoom" => Ok(Self::Zoom),
            "microsoft_teams" => Ok(Self::MicrosoftTeams),
            "phone" => Ok(Self::Phone),
            "whatsapp" => Ok(Self::Whatsapp),
            "in_person" => Ok(Self::InPerson),
            other => Err(format!("unknown meeting platform: {other}")),
        }
    }
}

/// The caller's authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: UserId,
    pub display_name: Option<String>,
}

impl Requester {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A mentee's request to book a session with a mentor, as submitted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub mentor_id: UserId,
    /// Filled from the authenticated context, never from the request body.
    #[serde(skip)]
    pub requester: Option<Requester>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub session_type_id: Option<SessionTypeId>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub platform: MeetingPlatform,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub messaging_handle: Option<String>,
}

impl BookingRequest {
    /// Check the fields the commit depends on. Does not look at the requester.
    pub fn validate(&self) -> Result<ValidatedSlot, ValidationError> {
        let date = self.date.ok_or(ValidationError::MissingDate)?;
        let raw_slot = self
            .time_slot
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingTimeSlot)?;
        let session_type_id = self
            .session_type_id
            .clone()
            .filter(|id| !id.is_blank())
            .ok_or(ValidationError::MissingSessionType)?;
        if self.mentor_id.is_blank() {
            return Err(ValidationError::MissingMentor);
        }

        let time = parse_time_slot(raw_slot)?;
        Ok(ValidatedSlot {
            date,
            time_slot: raw_slot.to_string(),
            scheduled_at: date.and_time(time).and_utc(),
            session_type_id,
        })
    }
}

/// The parts of a request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedSlot {
    pub date: NaiveDate,
    pub time_slot: String,
    pub scheduled_at: DateTime<Utc>,
    pub session_type_id: SessionTypeId,
}

/// Accepts `HH:MM` or `HH:MM:SS` on a 24-hour clock.
pub fn parse_time_slot(raw: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeSlot(raw.to_string()))
}

/// Everything the scheduling store needs to create a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub session_type_id: SessionTypeId,
    pub platform: MeetingPlatform,
    pub note: String,
    pub phone: Option<String>,
    pub messaging_handle: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// A committed session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub scheduled_at: DateTime<Utc>,
    pub session_type_id: SessionTypeId,
    pub platform: MeetingPlatform,
    pub meeting_link: Option<String>,
    pub status: SessionStatus,
    pub note: String,
    pub phone: Option<String>,
    pub messaging_handle: Option<String>,
    pub created_at: String,
}

/// Which side of the session a message is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Mentor,
    Mentee,
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mentor => f.write_str("mentor"),
            Self::Mentee => f.write_str("mentee"),
        }
    }
}

/// Session facts handed to the email dispatch service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub session_type_label: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub scheduled_at: DateTime<Utc>,
    pub platform: MeetingPlatform,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub mentee_name: String,
    pub note: String,
    pub phone: Option<String>,
    pub messaging_handle: Option<String>,
}
