//! End-to-end bookings against in-memory doubles and SQLite.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use mentorhub_core::booking::{BookingRequest, MeetingPlatform, ParticipantRole, Requester};
use mentorhub_core::errors::{CollaboratorError, CommitError, ValidationError};
use mentorhub_core::ids::{SessionTypeId, UserId};
use mentorhub_core::ports::{MessageKind, UserMessage};
use mentorhub_core::steps::{Severity, StepName, StepStatus};
use mentorhub_engine::aggregator::{MEETING_LINK_DEGRADED, NOTIFICATIONS_DEGRADED};
use mentorhub_engine::mock::{MockCollaborators, RecordingMessenger};
use mentorhub_engine::{
    BookingError, BookingWorkflow, Collaborators, MetricsObserver, RecordingObserver,
    WorkflowConfig, WorkflowState,
};
use mentorhub_telemetry::MetricsRecorder;

fn request_for(platform: MeetingPlatform) -> BookingRequest {
    BookingRequest {
        mentor_id: UserId::from_raw("m1"),
        requester: Some(Requester::new(UserId::from_raw("u1")).with_display_name("Grace")),
        date: NaiveDate::from_ymd_opt(2024, 6, 1),
        time_slot: Some("10:00".into()),
        session_type_id: Some(SessionTypeId::from_raw("st1")),
        note: "Looking for advice on switching careers".into(),
        platform,
        phone: None,
        messaging_handle: None,
    }
}

struct Harness {
    mocks: MockCollaborators,
    workflow: BookingWorkflow,
    messenger: Arc<RecordingMessenger>,
    observer: Arc<RecordingObserver>,
}

fn harness() -> Harness {
    harness_with(WorkflowConfig::default())
}

fn harness_with(config: WorkflowConfig) -> Harness {
    let mocks = MockCollaborators::new();
    let messenger = Arc::new(RecordingMessenger::new());
    let observer = Arc::new(RecordingObserver::new());
    let workflow = BookingWorkflow::new(mocks.collaborators(), messenger.clone(), config)
        .with_observer(observer.clone());
    Harness {
        mocks,
        workflow,
        messenger,
        observer,
    }
}

fn destructive(messages: &[UserMessage]) -> Vec<&UserMessage> {
    messages
        .iter()
        .filter(|m| m.kind == MessageKind::Destructive)
        .collect()
}

#[tokio::test]
async fn clean_booking_provisions_link_and_notifies_everyone() {
    let h = harness();
    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    let committed = h.mocks.scheduling.committed();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].0, outcome.session_id);
    assert!(h.mocks.sessions.link_for(&outcome.session_id).is_some());

    let records = h.mocks.notifications.records();
    assert_eq!(records.len(), 3);
    for recipient in ["m1", "u1", "a1"] {
        assert_eq!(
            h.mocks
                .notifications
                .records_for(&UserId::from_raw(recipient))
                .len(),
            1,
            "{recipient}"
        );
    }
    assert_eq!(h.mocks.email.sent().len(), 2);

    assert!(outcome.report.is_settled());
    assert!(outcome.report.is_clean());
    assert_eq!(
        h.messenger.messages(),
        vec![UserMessage::info("Your session has been booked.")]
    );
    assert!(destructive(&outcome.messages).is_empty());
}

#[tokio::test]
async fn failed_link_provisioning_books_and_warns_once() {
    let h = harness();
    h.mocks
        .meetings
        .fail_with(CollaboratorError::Unavailable("quota exceeded".into()));

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    assert_eq!(h.mocks.sessions.link_for(&outcome.session_id), None);
    assert_eq!(h.mocks.sessions.calls(), 0);
    assert!(outcome.report.failed(StepName::MeetingLink));

    let shown = h.messenger.messages();
    let bad = destructive(&shown);
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].text, MEETING_LINK_DEGRADED);
    assert_eq!(shown[0].kind, MessageKind::Info);

    assert_eq!(h.mocks.notifications.records().len(), 3);
    assert_eq!(h.mocks.email.sent().len(), 2);
}

#[tokio::test]
async fn missing_date_aborts_before_any_collaborator_call() {
    let h = harness();
    let mut request = request_for(MeetingPlatform::GoogleMeet);
    request.date = None;

    let mut got_error = None;
    let mut succeeded = false;
    h.workflow
        .book_and_notify(&request, |_| succeeded = true, |e| got_error = Some(e))
        .await;

    assert!(!succeeded);
    let error = got_error.unwrap();
    assert_eq!(error, BookingError::Validation(ValidationError::MissingDate));
    assert_eq!(error.aborted_in(), WorkflowState::Validating);
    assert_eq!(h.mocks.total_calls(), 0);
    assert!(h.mocks.notifications.records().is_empty());
    assert!(h.observer.events().is_empty());
}

#[tokio::test]
async fn no_admins_makes_admin_fan_out_a_no_op() {
    let h = harness();
    h.mocks.admins.set_admins(&[]);

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    assert_eq!(
        outcome.report.status(StepName::AdminNotification),
        Some(StepStatus::Success)
    );
    assert!(outcome
        .report
        .entry(StepName::AdminNotification)
        .unwrap()
        .error
        .is_none());
    assert_eq!(h.mocks.notifications.records().len(), 2);
    assert_eq!(h.mocks.email.sent().len(), 2);
    assert!(outcome.report.is_clean());
}

#[tokio::test]
async fn every_incomplete_request_is_rejected_without_writes() {
    let mutations: [fn(&mut BookingRequest); 3] = [
        |r| r.date = None,
        |r| r.time_slot = None,
        |r| r.session_type_id = None,
    ];
    for mutate in mutations {
        let h = harness();
        let mut request = request_for(MeetingPlatform::Zoom);
        mutate(&mut request);

        let err = h.workflow.book(&request).await.unwrap_err();
        assert_matches::assert_matches!(err, BookingError::Validation(_));
        assert_eq!(h.mocks.scheduling.calls(), 0);
        assert!(h.mocks.notifications.records().is_empty());
    }
}

#[tokio::test]
async fn non_generated_link_platforms_never_call_the_provisioner() {
    for platform in [
        MeetingPlatform::Zoom,
        MeetingPlatform::MicrosoftTeams,
        MeetingPlatform::Phone,
        MeetingPlatform::Whatsapp,
        MeetingPlatform::InPerson,
    ] {
        let h = harness();
        let outcome = h.workflow.book(&request_for(platform)).await.unwrap();
        assert_eq!(h.mocks.meetings.calls(), 0, "{platform}");
        assert_eq!(h.mocks.sessions.calls(), 0, "{platform}");
        assert!(outcome.report.outcome(StepName::MeetingLink).is_none());
        assert_eq!(h.observer.count_for(StepName::MeetingLink), 0);
    }
}

#[tokio::test]
async fn admin_failure_does_not_block_other_steps() {
    let h = harness();
    h.mocks.admins.set_failing(true);

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    assert!(outcome.report.failed(StepName::AdminNotification));
    for step in [
        StepName::MentorNotification,
        StepName::MenteeNotification,
        StepName::MentorEmail,
        StepName::MenteeEmail,
    ] {
        assert_eq!(outcome.report.status(step), Some(StepStatus::Success), "{step}");
    }
    assert_eq!(outcome.report.failures_at_least(Severity::High), vec![]);
    assert_eq!(
        outcome.report.failures_at_least(Severity::Low),
        vec![StepName::AdminNotification]
    );
    // Admin failures are logged, not shown.
    assert!(destructive(&h.messenger.messages()).is_empty());
}

#[tokio::test]
async fn participant_failures_show_one_incomplete_message() {
    let h = harness();
    h.mocks.notifications.fail_for(&UserId::from_raw("m1"));
    h.mocks.email.fail_role(ParticipantRole::Mentee);

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::Zoom))
        .await
        .unwrap();

    assert_eq!(
        outcome.report.failures_at_least(Severity::High),
        vec![StepName::MentorNotification]
    );
    assert!(outcome.report.failed(StepName::MenteeEmail));
    let shown = h.messenger.messages();
    let bad = destructive(&shown);
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].text, NOTIFICATIONS_DEGRADED);
    assert_eq!(
        shown.iter().filter(|m| m.kind == MessageKind::Info).count(),
        1
    );
}

#[tokio::test]
async fn success_survives_every_post_commit_failure() {
    let h = harness();
    h.mocks.session_types.set_failing(true);
    h.mocks
        .meetings
        .fail_with(CollaboratorError::Timeout(Duration::from_secs(5)));
    h.mocks.notifications.set_failing(true);
    h.mocks.email.fail_role(ParticipantRole::Mentor);
    h.mocks.email.fail_role(ParticipantRole::Mentee);

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    assert_eq!(h.mocks.scheduling.committed().len(), 1);
    assert!(outcome.report.is_settled());
    for step in StepName::TRACKED {
        assert!(outcome.report.failed(step), "{step}");
    }
    assert_eq!(destructive(&outcome.messages).len(), 2);
    assert_eq!(outcome.messages.len(), 3);
}

#[tokio::test]
async fn slot_conflict_is_fatal() {
    let h = harness();
    h.workflow
        .book(&request_for(MeetingPlatform::Zoom))
        .await
        .unwrap();
    let notifications_after_first = h.mocks.notifications.records().len();

    let err = h
        .workflow
        .book(&request_for(MeetingPlatform::Zoom))
        .await
        .unwrap_err();
    assert!(err.is_slot_conflict());
    assert_eq!(err.aborted_in(), WorkflowState::Committing);
    assert_eq!(h.mocks.scheduling.committed().len(), 1);
    assert_eq!(h.mocks.notifications.records().len(), notifications_after_first);
}

#[tokio::test]
async fn one_event_per_executed_step() {
    let h = harness();
    h.workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    let events = h.observer.events();
    assert_eq!(events.len(), 8);
    for step in [
        StepName::Commit,
        StepName::SessionMetadata,
        StepName::MeetingLink,
        StepName::MentorNotification,
        StepName::MenteeNotification,
        StepName::AdminNotification,
        StepName::MentorEmail,
        StepName::MenteeEmail,
    ] {
        assert_eq!(h.observer.count_for(step), 1, "{step}");
    }
    let attempt = &events[0].attempt_id;
    assert!(events.iter().all(|e| &e.attempt_id == attempt));
}

#[tokio::test(start_paused = true)]
async fn hung_provisioner_times_out_without_blocking_success() {
    let h = harness_with(WorkflowConfig {
        step_timeout: Duration::from_millis(200),
        ..WorkflowConfig::default()
    });
    h.mocks.meetings.set_delay(Duration::from_secs(60));

    let outcome = h
        .workflow
        .book(&request_for(MeetingPlatform::GoogleMeet))
        .await
        .unwrap();

    let link = outcome.report.outcome(StepName::MeetingLink).unwrap();
    assert_eq!(link.status, StepStatus::Failed);
    assert!(link.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(h.mocks.sessions.link_for(&outcome.session_id), None);
    assert_eq!(h.mocks.notifications.records().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_commit_acknowledgement_still_books() {
    let h = harness_with(WorkflowConfig {
        step_timeout: Duration::from_millis(200),
        ..WorkflowConfig::default()
    });
    h.mocks.scheduling.set_ack_delay(Duration::from_secs(30));

    let mut got_error = None;
    let mut outcome = None;
    h.workflow
        .book_and_notify(
            &request_for(MeetingPlatform::GoogleMeet),
            |o| outcome = Some(o),
            |e| got_error = Some(e),
        )
        .await;

    assert_eq!(got_error, None);
    let outcome = outcome.unwrap();
    let committed = h.mocks.scheduling.committed();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].0, outcome.session_id);
    assert_eq!(h.observer.status_of(StepName::Commit), Some(StepStatus::Success));
    assert_eq!(h.mocks.notifications.records().len(), 3);
    assert_eq!(h.mocks.email.sent().len(), 2);
}

#[tokio::test]
async fn metrics_observer_counts_steps() {
    let mocks = MockCollaborators::new();
    let metrics = Arc::new(MetricsRecorder::new());
    let workflow = BookingWorkflow::new(
        mocks.collaborators(),
        Arc::new(RecordingMessenger::new()),
        WorkflowConfig::default(),
    )
    .with_observer(Arc::new(MetricsObserver::new(metrics.clone())));
    mocks.email.fail_role(ParticipantRole::Mentor);

    workflow
        .book(&request_for(MeetingPlatform::Zoom))
        .await
        .unwrap();

    let failed = metrics.counter_get(
        MetricsObserver::STEPS_TOTAL,
        &[("step", "mentor_email"), ("status", "failed")],
    );
    let ok = metrics.counter_get(
        MetricsObserver::STEPS_TOTAL,
        &[("step", "commit"), ("status", "success")],
    );
    assert_eq!((failed, ok), (1, 1));
}

mod sqlite {
    use super::*;
    use mentorhub_engine::mock::{MockEmailDispatcher, MockMeetingProvisioner};
    use mentorhub_store::accounts::{AccountRepo, AccountRole};
    use mentorhub_store::notifications::NotificationRepo;
    use mentorhub_store::session_types::SessionTypeRepo;
    use mentorhub_store::sessions::SessionRepo;
    use mentorhub_store::Database;

    fn seeded() -> Database {
        let db = Database::in_memory().unwrap();
        let accounts = AccountRepo::new(db.clone());
        accounts
            .upsert(&UserId::from_raw("m1"), "Ada", None, AccountRole::Mentor)
            .unwrap();
        accounts
            .upsert(&UserId::from_raw("u1"), "Grace", None, AccountRole::Mentee)
            .unwrap();
        accounts
            .upsert(&UserId::from_raw("a1"), "Admin", None, AccountRole::Admin)
            .unwrap();
        SessionTypeRepo::new(db.clone())
            .upsert(&SessionTypeId::from_raw("st1"), "Career Guidance", 60)
            .unwrap();
        db
    }

    fn workflow(db: &Database, meetings: Arc<MockMeetingProvisioner>) -> BookingWorkflow {
        let sessions = Arc::new(SessionRepo::new(db.clone()));
        let collaborators = Collaborators {
            scheduling: sessions.clone(),
            session_types: Arc::new(SessionTypeRepo::new(db.clone())),
            meetings,
            sessions,
            notifications: Arc::new(NotificationRepo::new(db.clone())),
            admins: Arc::new(AccountRepo::new(db.clone())),
            email: Arc::new(MockEmailDispatcher::new()),
        };
        BookingWorkflow::new(
            collaborators,
            Arc::new(RecordingMessenger::new()),
            WorkflowConfig::default(),
        )
    }

    #[tokio::test]
    async fn booking_persists_session_link_and_notifications() {
        let db = seeded();
        let workflow = workflow(&db, Arc::new(MockMeetingProvisioner::new()));

        let outcome = workflow
            .book(&request_for(MeetingPlatform::GoogleMeet))
            .await
            .unwrap();

        let session = SessionRepo::new(db.clone()).get(&outcome.session_id).unwrap();
        assert_eq!(session.mentee_id.as_str(), "u1");
        assert!(session.meeting_link.unwrap().contains(outcome.session_id.as_str()));

        let notifications = NotificationRepo::new(db.clone());
        for recipient in ["m1", "u1", "a1"] {
            assert_eq!(
                notifications
                    .count_for_recipient(&UserId::from_raw(recipient))
                    .unwrap(),
                1
            );
        }
        let mentor_inbox = notifications
            .list_for_recipient(&UserId::from_raw("m1"), 10)
            .unwrap();
        assert!(mentor_inbox[0].message.contains("Career Guidance"));
    }

    #[tokio::test]
    async fn failed_provisioning_leaves_no_link() {
        let db = seeded();
        let meetings = Arc::new(MockMeetingProvisioner::new());
        meetings.fail_with(CollaboratorError::Unavailable("api down".into()));
        let workflow = workflow(&db, meetings);

        let outcome = workflow
            .book(&request_for(MeetingPlatform::GoogleMeet))
            .await
            .unwrap();
        let session = SessionRepo::new(db).get(&outcome.session_id).unwrap();
        assert_eq!(session.meeting_link, None);
    }

    #[tokio::test]
    async fn double_booking_returns_slot_conflict() {
        let db = seeded();
        let workflow = workflow(&db, Arc::new(MockMeetingProvisioner::new()));
        workflow
            .book(&request_for(MeetingPlatform::Zoom))
            .await
            .unwrap();

        let err = workflow
            .book(&request_for(MeetingPlatform::Zoom))
            .await
            .unwrap_err();
        assert_matches::assert_matches!(err, BookingError::Commit(CommitError::SlotConflict(_)));
        assert_eq!(
            SessionRepo::new(db)
                .list_for_participant(&UserId::from_raw("m1"))
                .unwrap()
                .len(),
            1
        );
    }
}
