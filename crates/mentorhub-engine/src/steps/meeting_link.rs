use tracing::debug;

use mentorhub_core::ids::SessionId;
use mentorhub_core::ports::{MeetingProvisioner, SessionStore};

use crate::error::StepError;

/// Generate a link, then attach it to the session. The write only happens
/// after generation succeeds; if it fails the session keeps no link.
pub async fn provision(
    provisioner: &dyn MeetingProvisioner,
    sessions: &dyn SessionStore,
    session_id: &SessionId,
) -> Result<String, StepError> {
    let link = provisioner.create_link(session_id).await?;
    sessions.attach_meeting_link(session_id, &link).await?;
    debug!(session_id = %session_id, "meeting link attached");
    Ok(link)
}
