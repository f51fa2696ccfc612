//! The units of work a booking runs. Each returns `Result<_, StepError>`
//! and knows nothing about whether it is required.

pub mod commit;
pub mod email;
pub mod meeting_link;
pub mod metadata;
pub mod notifications;

use chrono::NaiveDate;

use mentorhub_core::booking::{MeetingPlatform, Requester, ValidatedSlot};
use mentorhub_core::ids::{AttemptId, SessionId, UserId};

/// Display name used when the requester has none.
pub const ANONYMOUS_MENTEE: &str = "A mentee";

/// Facts about a committed booking, shared read-only by the fan-out steps.
#[derive(Clone, Debug)]
pub struct BookingContext {
    pub attempt_id: AttemptId,
    pub session_id: SessionId,
    pub mentor_id: UserId,
    pub mentee_id: UserId,
    pub mentee_name: String,
    pub slot: ValidatedSlot,
    pub platform: MeetingPlatform,
    pub note: String,
    pub phone: Option<String>,
    pub messaging_handle: Option<String>,
}

impl BookingContext {
    pub fn date(&self) -> NaiveDate {
        self.slot.date
    }

    pub fn time_slot(&self) -> &str {
        &self.slot.time_slot
    }
}

pub fn mentee_display_name(requester: &Requester) -> String {
    requester
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_MENTEE)
        .to_string()
}
