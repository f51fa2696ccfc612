use futures::future::join_all;
use tracing::debug;

use mentorhub_core::ids::{SessionId, UserId};
use mentorhub_core::notifications::{NewNotification, NotificationCategory, NotificationType};
use mentorhub_core::ports::{AdminDirectory, NotificationStore};

use super::BookingContext;
use crate::error::StepError;

pub fn participant_action_url(session_id: &SessionId) -> String {
    format!("/dashboard/sessions/{session_id}")
}

pub fn admin_action_url(session_id: &SessionId) -> String {
    format!("/admin/sessions/{session_id}")
}

pub fn for_mentor(ctx: &BookingContext, label: &str) -> NewNotification {
    NewNotification {
        recipient_id: ctx.mentor_id.clone(),
        title: "New Session Booked".into(),
        message: format!(
            "{} booked a {label} session with you on {} at {}.",
            ctx.mentee_name,
            ctx.date(),
            ctx.time_slot()
        ),
        notification_type: NotificationType::SessionBooked,
        category: NotificationCategory::Session,
        action_url: participant_action_url(&ctx.session_id),
    }
}

pub fn for_mentee(ctx: &BookingContext, label: &str) -> NewNotification {
    NewNotification {
        recipient_id: ctx.mentee_id.clone(),
        title: "Session Requested".into(),
        message: format!(
            "Your {label} session on {} at {} has been booked.",
            ctx.date(),
            ctx.time_slot()
        ),
        notification_type: NotificationType::SessionRequested,
        category: NotificationCategory::Session,
        action_url: participant_action_url(&ctx.session_id),
    }
}

pub fn for_admin(ctx: &BookingContext, admin: &UserId, label: &str) -> NewNotification {
    NewNotification {
        recipient_id: admin.clone(),
        title: "New Session Booking".into(),
        message: format!(
            "{} booked a {label} session with mentor {} on {} at {}.",
            ctx.mentee_name,
            ctx.mentor_id,
            ctx.date(),
            ctx.time_slot()
        ),
        notification_type: NotificationType::AdminAlert,
        category: NotificationCategory::Admin,
        action_url: admin_action_url(&ctx.session_id),
    }
}

pub async fn notify(store: &dyn NotificationStore, notification: NewNotification) -> Result<(), StepError> {
    let id = store.insert(&notification).await?;
    debug!(notification_id = %id, recipient_id = %notification.recipient_id, "notification stored");
    Ok(())
}

/// One insert per admin listed at call time, all issued together. No admins is a no-op.
pub async fn notify_admins(
    directory: &dyn AdminDirectory,
    store: &dyn NotificationStore,
    ctx: &BookingContext,
    label: &str,
) -> Result<(), StepError> {
    let admins = directory.list_admins().await?;
    if admins.is_empty() {
        debug!(session_id = %ctx.session_id, "no admin accounts, skipping admin notifications");
        return Ok(());
    }

    let results = join_all(
        admins
            .iter()
            .map(|admin| notify(store, for_admin(ctx, admin, label))),
    )
    .await;

    let failures: Vec<String> = admins
        .iter()
        .zip(results)
        .filter_map(|(admin, result)| result.err().map(|e| format!("{admin}: {e}")))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(StepError::Partial {
            failed: failures.len(),
            attempted: admins.len(),
            detail: failures.join("; "),
        })
    }
}
