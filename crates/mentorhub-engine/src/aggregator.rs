use tracing::{info, warn};

use mentorhub_core::ids::{AttemptId, SessionId};
use mentorhub_core::ports::{MessageKind, UserMessage, UserMessenger};
use mentorhub_core::steps::StepName;

use crate::report::WorkflowStatusReport;

pub const MEETING_LINK_DEGRADED: &str =
    "We couldn't create a meeting link for this session. It will be shared with you through another channel.";
pub const NOTIFICATIONS_DEGRADED: &str =
    "Your session is booked, but some notifications may be incomplete.";

const PARTICIPANT_STEPS: [StepName; 4] = [
    StepName::MentorNotification,
    StepName::MenteeNotification,
    StepName::MentorEmail,
    StepName::MenteeEmail,
];

/// Messages for the person who booked: one confirmation, then at most one
/// message per degradation they can act on.
pub fn user_messages(report: &WorkflowStatusReport, confirmation: &str) -> Vec<UserMessage> {
    let mut messages = vec![UserMessage::info(confirmation)];
    if report.failed(StepName::MeetingLink) {
        messages.push(UserMessage::destructive(MEETING_LINK_DEGRADED));
    }
    if PARTICIPANT_STEPS.iter().any(|step| report.failed(*step)) {
        messages.push(UserMessage::destructive(NOTIFICATIONS_DEGRADED));
    }
    messages
}

/// Log every failed step once, with its severity. Failures that produce no
/// user message are only visible here.
pub fn log_degradations(attempt_id: &AttemptId, session_id: &SessionId, report: &WorkflowStatusReport) {
    for outcome in report.outcomes().iter().filter(|o| !o.succeeded()) {
        warn!(
            attempt_id = %attempt_id,
            session_id = %session_id,
            step = %outcome.name,
            severity = ?outcome.name.severity(),
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "booking degraded"
        );
    }
}

/// Writes user messages to the log instead of a UI.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMessenger;

impl UserMessenger for LogMessenger {
    fn show(&self, message: &UserMessage) {
        match message.kind {
            MessageKind::Info => info!(text = %message.text, "user message"),
            MessageKind::Destructive => warn!(text = %message.text, "user message"),
        }
    }
}
