use tracing::debug;

use mentorhub_core::booking::{ParticipantRole, SessionDetails};
use mentorhub_core::ports::EmailDispatcher;

use super::BookingContext;
use crate::error::StepError;

pub fn session_details(ctx: &BookingContext, label: &str) -> SessionDetails {
    SessionDetails {
        session_type_label: label.to_string(),
        date: ctx.date(),
        time_slot: ctx.time_slot().to_string(),
        scheduled_at: ctx.slot.scheduled_at,
        platform: ctx.platform,
        mentor_id: ctx.mentor_id.clone(),
        mentee_id: ctx.mentee_id.clone(),
        mentee_name: ctx.mentee_name.clone(),
        note: ctx.note.clone(),
        phone: ctx.phone.clone(),
        messaging_handle: ctx.messaging_handle.clone(),
    }
}

/// Send one confirmation to the participant holding `role`.
pub async fn send_confirmation(
    dispatcher: &dyn EmailDispatcher,
    role: ParticipantRole,
    ctx: &BookingContext,
    label: &str,
) -> Result<(), StepError> {
    let recipient = match role {
        ParticipantRole::Mentor => &ctx.mentor_id,
        ParticipantRole::Mentee => &ctx.mentee_id,
    };
    dispatcher
        .send(role, &ctx.session_id, recipient, &session_details(ctx, label))
        .await?;
    debug!(session_id = %ctx.session_id, %role, "confirmation email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmailDispatcher;
    use crate::steps::fixtures::context;

    #[tokio::test]
    async fn each_role_goes_to_its_participant() {
        let dispatcher = MockEmailDispatcher::new();
        let ctx = context();
        send_confirmation(&dispatcher, ParticipantRole::Mentor, &ctx, "Career Guidance")
            .await
            .unwrap();
        send_confirmation(&dispatcher, ParticipantRole::Mentee, &ctx, "Career Guidance")
            .await
            .unwrap();

        let sent = dispatcher.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, ParticipantRole::Mentor);
        assert_eq!(sent[0].recipient_id.as_str(), "m1");
        assert_eq!(sent[1].recipient_id.as_str(), "u1");
        assert_eq!(sent[1].details.session_type_label, "Career Guidance");
        assert_eq!(sent[1].details.messaging_handle.as_deref(), Some("@grace"));
    }

    #[tokio::test]
    async fn failing_role_is_independent() {
        let dispatcher = MockEmailDispatcher::new();
        dispatcher.fail_role(ParticipantRole::Mentor);
        let ctx = context();
        assert!(
            send_confirmation(&dispatcher, ParticipantRole::Mentor, &ctx, "x")
                .await
                .is_err()
        );
        assert!(
            send_confirmation(&dispatcher, ParticipantRole::Mentee, &ctx, "x")
                .await
                .is_ok()
        );
        assert_eq!(dispatcher.sent().len(), 1);
        assert_eq!(dispatcher.calls(), 2);
    }
}
