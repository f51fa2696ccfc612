use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use mentorhub_core::booking::{BookingRequest, ParticipantRole, Requester};
use mentorhub_core::errors::CommitError;
use mentorhub_core::ids::{AttemptId, SessionId};
use mentorhub_core::ports::{
    AdminDirectory, EmailDispatcher, MeetingProvisioner, NotificationStore, SchedulingStore,
    SessionStore, SessionTypeDirectory, UserMessage, UserMessenger,
};
use mentorhub_core::steps::{StepName, StepObserver};

use crate::aggregator;
use crate::error::BookingError;
use crate::observers::TracingObserver;
use crate::report::WorkflowStatusReport;
use crate::runner::{StepRunner, StepSpec, DEFAULT_STEP_TIMEOUT};
use crate::steps::metadata::{self, SharedLabel};
use crate::steps::{self, commit, email, meeting_link, notifications, BookingContext};

/// Where a booking attempt is. `Aborted` and `Settled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Validating,
    Committing,
    FanningOut,
    Aborted,
    Settled,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Committing => "committing",
            Self::FanningOut => "fanning_out",
            Self::Aborted => "aborted",
            Self::Settled => "settled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted | Self::Settled)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every external system a booking touches.
#[derive(Clone)]
pub struct Collaborators {
    pub scheduling: Arc<dyn SchedulingStore>,
    pub session_types: Arc<dyn SessionTypeDirectory>,
    pub meetings: Arc<dyn MeetingProvisioner>,
    pub sessions: Arc<dyn SessionStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub admins: Arc<dyn AdminDirectory>,
    pub email: Arc<dyn EmailDispatcher>,
}

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    pub step_timeout: Duration,
    pub fallback_session_label: String,
    pub confirmation_text: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            fallback_session_label: "Mentoring Session".into(),
            confirmation_text: "Your session has been booked.".into(),
        }
    }
}

/// A committed booking and how its side effects went.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub attempt_id: AttemptId,
    pub session_id: SessionId,
    pub report: WorkflowStatusReport,
    pub messages: Vec<UserMessage>,
}

pub struct BookingWorkflow {
    collaborators: Collaborators,
    runner: StepRunner,
    messenger: Arc<dyn UserMessenger>,
    config: WorkflowConfig,
}

impl BookingWorkflow {
    pub fn new(
        collaborators: Collaborators,
        messenger: Arc<dyn UserMessenger>,
        config: WorkflowConfig,
    ) -> Self {
        let runner = StepRunner::new(Arc::new(TracingObserver)).with_step_timeout(config.step_timeout);
        Self {
            collaborators,
            runner,
            messenger,
            config,
        }
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.runner = StepRunner::new(observer).with_step_timeout(self.config.step_timeout);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Invoke exactly one of `on_success` or `on_error`.
    pub async fn book_and_notify<S, E>(&self, request: &BookingRequest, on_success: S, on_error: E)
    where
        S: FnOnce(BookingOutcome),
        E: FnOnce(BookingError),
    {
        match self.book(request).await {
            Ok(outcome) => on_success(outcome),
            Err(error) => on_error(error),
        }
    }

    /// Validate, commit, then fan out. Returns `Err` only when nothing was written.
    #[instrument(skip_all, fields(attempt_id, mentor_id = %request.mentor_id))]
    pub async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome, BookingError> {
        let attempt_id = AttemptId::new();
        tracing::Span::current().record("attempt_id", tracing::field::display(&attempt_id));
        let mut state = WorkflowState::Validating;
        debug!(state = %state, "booking attempt started");

        let slot = match request.validate() {
            Ok(slot) => slot,
            Err(e) => return Err(self.abort(&mut state, e.into())),
        };
        let requester = match resolve_requester(request) {
            Ok(requester) => requester,
            Err(e) => return Err(self.abort(&mut state, e)),
        };

        transition(&mut state, WorkflowState::Committing);
        let new_session = commit::new_session(request, requester, &slot);
        // A late acknowledgement is still a commit, so the store decides when this ends.
        let commit_step = StepSpec::required(
            StepName::Commit,
            commit::commit(self.collaborators.scheduling.as_ref(), &new_session),
        )
        .unbounded();
        let session_id = match self.runner.run_phase(&attempt_id, vec![commit_step]).await {
            Ok(results) => match results.into_iter().find_map(|r| r.value) {
                Some(id) => id,
                None => {
                    let error = CommitError::Store("commit returned no session".into());
                    return Err(self.abort(&mut state, error.into()));
                }
            },
            Err(aborted) => {
                return Err(self.abort(&mut state, aborted.error.into_commit_error().into()));
            }
        };

        transition(&mut state, WorkflowState::FanningOut);
        let ctx = BookingContext {
            attempt_id: attempt_id.clone(),
            session_id: session_id.clone(),
            mentor_id: new_session.mentor_id.clone(),
            mentee_id: new_session.mentee_id.clone(),
            mentee_name: steps::mentee_display_name(requester),
            slot,
            platform: new_session.platform,
            note: new_session.note.clone(),
            phone: new_session.phone.clone(),
            messaging_handle: new_session.messaging_handle.clone(),
        };
        let report = self.fan_out(&ctx).await;

        aggregator::log_degradations(&attempt_id, &session_id, &report);
        let messages = aggregator::user_messages(&report, &self.config.confirmation_text);
        for message in &messages {
            self.messenger.show(message);
        }

        transition(&mut state, WorkflowState::Settled);
        info!(
            session_id = %session_id,
            failed_steps = report.failed_steps().len(),
            "booking settled"
        );

        Ok(BookingOutcome {
            attempt_id,
            session_id,
            report,
            messages,
        })
    }

    async fn fan_out(&self, ctx: &BookingContext) -> WorkflowStatusReport {
        let c = &self.collaborators;
        let label: SharedLabel<'_> = metadata::resolve_label(
            c.session_types.as_ref(),
            &ctx.slot.session_type_id,
            &self.config.fallback_session_label,
            self.config.step_timeout,
        )
        .boxed()
        .shared();

        let mut fan_out: Vec<StepSpec<'_, ()>> = vec![StepSpec::optional(
            StepName::SessionMetadata,
            metadata::check_label(label.clone()),
        )];

        if ctx.platform.requires_generated_link() {
            fan_out.push(StepSpec::optional(
                StepName::MeetingLink,
                meeting_link::provision(c.meetings.as_ref(), c.sessions.as_ref(), &ctx.session_id)
                    .map(|r| r.map(|_| ())),
            ));
        } else {
            debug!(platform = %ctx.platform, "platform needs no generated link");
        }

        let shared = label.clone();
        fan_out.push(StepSpec::optional(StepName::MentorNotification, async move {
            let label = shared.await.label;
            notifications::notify(c.notifications.as_ref(), notifications::for_mentor(ctx, &label)).await
        }));
        let shared = label.clone();
        fan_out.push(StepSpec::optional(StepName::MenteeNotification, async move {
            let label = shared.await.label;
            notifications::notify(c.notifications.as_ref(), notifications::for_mentee(ctx, &label)).await
        }));
        let shared = label.clone();
        fan_out.push(StepSpec::optional(StepName::AdminNotification, async move {
            let label = shared.await.label;
            notifications::notify_admins(c.admins.as_ref(), c.notifications.as_ref(), ctx, &label).await
        }));
        for role in [ParticipantRole::Mentor, ParticipantRole::Mentee] {
            let shared = label.clone();
            let name = match role {
                ParticipantRole::Mentor => StepName::MentorEmail,
                ParticipantRole::Mentee => StepName::MenteeEmail,
            };
            fan_out.push(StepSpec::optional(name, async move {
                let label = shared.await.label;
                email::send_confirmation(c.email.as_ref(), role, ctx, &label).await
            }));
        }

        let outcomes = match self.runner.run_phase(&ctx.attempt_id, fan_out).await {
            Ok(results) => results.into_iter().map(|r| r.outcome).collect::<Vec<_>>(),
            Err(aborted) => aborted.outcomes,
        };
        WorkflowStatusReport::from_outcomes(outcomes)
    }

    fn abort(&self, state: &mut WorkflowState, error: BookingError) -> BookingError {
        warn!(
            state = %state,
            error_kind = error.error_kind(),
            error = %error,
            "booking aborted"
        );
        transition(state, WorkflowState::Aborted);
        error
    }
}

fn resolve_requester(request: &BookingRequest) -> Result<&Requester, BookingError> {
    match &request.requester {
        Some(requester) if !requester.id.is_blank() => Ok(requester),
        Some(_) => Err(BookingError::IdentityResolution(
            "requester identifier is blank".into(),
        )),
        None => Err(BookingError::IdentityResolution(
            "no authenticated requester".into(),
        )),
    }
}

fn transition(state: &mut WorkflowState, next: WorkflowState) {
    debug!(from = %state, to = %next, "workflow state transition");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCollaborators, RecordingMessenger};
    use crate::observers::RecordingObserver;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use mentorhub_core::booking::MeetingPlatform;
    use mentorhub_core::errors::ValidationError;
    use mentorhub_core::ids::{SessionTypeId, UserId};
    use mentorhub_core::steps::StepStatus;

    fn request(platform: MeetingPlatform) -> BookingRequest {
        BookingRequest {
            mentor_id: UserId::from_raw("m1"),
            requester: Some(Requester::new(UserId::from_raw("u1")).with_display_name("Grace")),
            date: NaiveDate::from_ymd_opt(2024, 6, 1),
            time_slot: Some("10:00".into()),
            session_type_id: Some(SessionTypeId::from_raw("st1")),
            platform,
            ..Default::default()
        }
    }

    fn workflow(mocks: &MockCollaborators) -> (BookingWorkflow, Arc<RecordingMessenger>, Arc<RecordingObserver>) {
        let messenger = Arc::new(RecordingMessenger::new());
        let observer = Arc::new(RecordingObserver::new());
        let wf = BookingWorkflow::new(mocks.collaborators(), messenger.clone(), WorkflowConfig::default())
            .with_observer(observer.clone());
        (wf, messenger, observer)
    }

    #[tokio::test]
    async fn missing_requester_aborts_before_any_call() {
        let mocks = MockCollaborators::new();
        let (wf, messenger, observer) = workflow(&mocks);
        let mut req = request(MeetingPlatform::GoogleMeet);
        req.requester = None;

        let err = wf.book(&req).await.unwrap_err();
        assert_matches!(err, BookingError::IdentityResolution(_));
        assert_eq!(err.aborted_in(), WorkflowState::Validating);
        assert_eq!(mocks.total_calls(), 0);
        assert!(messenger.messages().is_empty());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn validation_runs_before_identity() {
        let mocks = MockCollaborators::new();
        let (wf, _, _) = workflow(&mocks);
        let mut req = request(MeetingPlatform::Zoom);
        req.requester = None;
        req.session_type_id = None;
        assert_eq!(
            wf.book(&req).await.unwrap_err(),
            BookingError::Validation(ValidationError::MissingSessionType)
        );
    }

    #[tokio::test]
    async fn anonymous_display_name_falls_back() {
        let mocks = MockCollaborators::new();
        let (wf, _, _) = workflow(&mocks);
        let mut req = request(MeetingPlatform::Zoom);
        req.requester = Some(Requester::new(UserId::from_raw("u1")));

        wf.book(&req).await.unwrap();
        let mentor = mocks.notifications.records_for(&UserId::from_raw("m1"));
        assert!(mentor[0].message.starts_with("A mentee booked a Career Guidance session"));
    }

    #[tokio::test]
    async fn commit_failure_is_fatal_and_skips_fan_out() {
        let mocks = MockCollaborators::new();
        mocks
            .scheduling
            .fail_with(CommitError::Rejected("mentor unavailable".into()));
        let (wf, _, observer) = workflow(&mocks);

        let err = wf.book(&request(MeetingPlatform::GoogleMeet)).await.unwrap_err();
        assert_eq!(err.aborted_in(), WorkflowState::Committing);
        assert_eq!(mocks.notifications.calls(), 0);
        assert_eq!(mocks.meetings.calls(), 0);
        assert_eq!(mocks.email.calls(), 0);
        assert_eq!(observer.events().len(), 1);
        assert_eq!(observer.status_of(StepName::Commit), Some(StepStatus::Failed));
    }

    #[tokio::test]
    async fn label_is_looked_up_once() {
        let mocks = MockCollaborators::new();
        let (wf, _, _) = workflow(&mocks);
        wf.book(&request(MeetingPlatform::GoogleMeet)).await.unwrap();
        assert_eq!(mocks.session_types.calls(), 1);
    }

    #[tokio::test]
    async fn metadata_failure_uses_fallback_silently() {
        let mocks = MockCollaborators::new();
        mocks.session_types.set_failing(true);
        let (wf, messenger, _) = workflow(&mocks);

        let outcome = wf.book(&request(MeetingPlatform::Zoom)).await.unwrap();
        assert!(outcome.report.failed(StepName::SessionMetadata));
        assert_eq!(messenger.messages().len(), 1);
        let mentee = mocks.notifications.records_for(&UserId::from_raw("u1"));
        assert!(mentee[0].message.contains("Mentoring Session"));
        assert_eq!(mocks.email.sent()[0].details.session_type_label, "Mentoring Session");
    }

    #[tokio::test]
    async fn book_and_notify_calls_exactly_one_callback() {
        let mocks = MockCollaborators::new();
        let (wf, _, _) = workflow(&mocks);

        let mut successes = 0;
        let mut errors = 0;
        wf.book_and_notify(&request(MeetingPlatform::Zoom), |_| successes += 1, |_| errors += 1)
            .await;
        assert_eq!((successes, errors), (1, 0));

        let mut req = request(MeetingPlatform::Zoom);
        req.date = None;
        let mut successes = 0;
        let mut errors = 0;
        wf.book_and_notify(&req, |_| successes += 1, |_| errors += 1).await;
        assert_eq!((successes, errors), (0, 1));
    }

    #[test]
    fn terminal_states() {
        assert!(WorkflowState::Aborted.is_terminal());
        assert!(WorkflowState::Settled.is_terminal());
        assert!(!WorkflowState::FanningOut.is_terminal());
        assert_eq!(WorkflowState::FanningOut.to_string(), "fanning_out");
    }
}
