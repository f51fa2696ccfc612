use tracing::debug;

use mentorhub_core::booking::{BookingRequest, NewSession, Requester, ValidatedSlot};
use mentorhub_core::ids::SessionId;
use mentorhub_core::ports::SchedulingStore;

use crate::error::StepError;

pub fn new_session(request: &BookingRequest, requester: &Requester, slot: &ValidatedSlot) -> NewSession {
    NewSession {
        mentor_id: request.mentor_id.clone(),
        mentee_id: requester.id.clone(),
        scheduled_at: slot.scheduled_at,
        session_type_id: slot.session_type_id.clone(),
        platform: request.platform,
        note: request.note.trim().to_string(),
        phone: non_empty(request.phone.as_deref()),
        messaging_handle: non_empty(request.messaging_handle.as_deref()),
    }
}

/// The one authoritative write. Exactly one session exists when this succeeds.
pub async fn commit(store: &dyn SchedulingStore, session: &NewSession) -> Result<SessionId, StepError> {
    let id = store.commit(session).await?;
    debug!(session_id = %id, mentor_id = %session.mentor_id, "booking committed");
    Ok(id)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
