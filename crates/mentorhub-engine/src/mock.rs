//! In-memory collaborator doubles for tests and local runs.
//!
//! Every double counts its calls and can be told to fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use mentorhub_core::booking::{NewSession, ParticipantRole, SessionDetails};
use mentorhub_core::errors::{CollaboratorError, CommitError};
use mentorhub_core::ids::{NotificationId, SessionId, SessionTypeId, UserId};
use mentorhub_core::notifications::NewNotification;
use mentorhub_core::ports::{
    AdminDirectory, EmailDispatcher, MeetingProvisioner, NotificationStore, SchedulingStore,
    SessionStore, SessionType, SessionTypeDirectory, UserMessage, UserMessenger,
};

use crate::workflow::Collaborators;

fn unavailable(what: &str) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{what} failure injected"))
}

/// Scheduling store that rejects a second scheduled session for the same mentor and instant.
#[derive(Default)]
pub struct MockSchedulingStore {
    committed: Mutex<Vec<(SessionId, NewSession)>>,
    fail_with: Mutex<Option<CommitError>>,
    ack_delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockSchedulingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: CommitError) {
        *self.fail_with.lock() = Some(error);
    }

    /// Record the session, then wait this long before acknowledging it.
    pub fn set_ack_delay(&self, delay: Duration) {
        *self.ack_delay.lock() = Some(delay);
    }

    pub fn committed(&self) -> Vec<(SessionId, NewSession)> {
        self.committed.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulingStore for MockSchedulingStore {
    async fn commit(&self, session: &NewSession) -> Result<SessionId, CommitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        let id = {
            let mut committed = self.committed.lock();
            if committed.iter().any(|(_, s)| {
                s.mentor_id == session.mentor_id && s.scheduled_at == session.scheduled_at
            }) {
                return Err(CommitError::SlotConflict(format!(
                    "mentor {} at {}",
                    session.mentor_id, session.scheduled_at
                )));
            }
            let id = SessionId::new();
            committed.push((id.clone(), session.clone()));
            id
        };
        let delay = *self.ack_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(id)
    }
}

#[derive(Default)]
pub struct MockSessionTypes {
    types: HashMap<SessionTypeId, SessionType>,
    delay: Option<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockSessionTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, id: &str, label: &str) -> Self {
        let id = SessionTypeId::from_raw(id);
        self.types.insert(
            id.clone(),
            SessionType {
                id,
                label: label.to_string(),
                duration_minutes: 60,
            },
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionTypeDirectory for MockSessionTypes {
    async fn lookup(&self, id: &SessionTypeId) -> Result<SessionType, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("session type directory"));
        }
        self.types
            .get(id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("session type {id}")))
    }
}

#[derive(Default)]
pub struct MockMeetingProvisioner {
    fail_with: Mutex<Option<CollaboratorError>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockMeetingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: CollaboratorError) {
        *self.fail_with.lock() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeetingProvisioner for MockMeetingProvisioner {
    async fn create_link(&self, session_id: &SessionId) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        Ok(format!("https://meet.example.com/{session_id}"))
    }
}

#[derive(Default)]
pub struct MockSessionStore {
    links: Mutex<HashMap<SessionId, String>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn link_for(&self, id: &SessionId) -> Option<String> {
        self.links.lock().get(id).cloned()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn attach_meeting_link(
        &self,
        session_id: &SessionId,
        meet_link: &str,
    ) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("session store"));
        }
        self.links
            .lock()
            .insert(session_id.clone(), meet_link.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNotificationStore {
    records: Mutex<Vec<NewNotification>>,
    failing_recipients: Mutex<HashSet<UserId>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail inserts addressed to `recipient` only.
    pub fn fail_for(&self, recipient: &UserId) {
        self.failing_recipients.lock().insert(recipient.clone());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<NewNotification> {
        self.records.lock().clone()
    }

    pub fn records_for(&self, recipient: &UserId) -> Vec<NewNotification> {
        self.records
            .lock()
            .iter()
            .filter(|n| &n.recipient_id == recipient)
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationStore for MockNotificationStore {
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationId, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst)
            || self
                .failing_recipients
                .lock()
                .contains(&notification.recipient_id)
        {
            return Err(unavailable("notification store"));
        }
        self.records.lock().push(notification.clone());
        Ok(NotificationId::new())
    }
}

#[derive(Default)]
pub struct MockAdminDirectory {
    admins: Mutex<Vec<UserId>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockAdminDirectory {
    pub fn with_admins(ids: &[&str]) -> Self {
        Self {
            admins: Mutex::new(ids.iter().map(|id| UserId::from_raw(*id)).collect()),
            ..Self::default()
        }
    }

    pub fn set_admins(&self, ids: &[&str]) {
        *self.admins.lock() = ids.iter().map(|id| UserId::from_raw(*id)).collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminDirectory for MockAdminDirectory {
    async fn list_admins(&self) -> Result<Vec<UserId>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("admin directory"));
        }
        Ok(self.admins.lock().clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    pub role: ParticipantRole,
    pub session_id: SessionId,
    pub recipient_id: UserId,
    pub details: SessionDetails,
}

#[derive(Default)]
pub struct MockEmailDispatcher {
    sent: Mutex<Vec<SentEmail>>,
    failing_roles: Mutex<HashSet<ParticipantRole>>,
    calls: AtomicUsize,
}

impl MockEmailDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_role(&self, role: ParticipantRole) {
        self.failing_roles.lock().insert(role);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailDispatcher for MockEmailDispatcher {
    async fn send(
        &self,
        role: ParticipantRole,
        session_id: &SessionId,
        recipient_id: &UserId,
        details: &SessionDetails,
    ) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_roles.lock().contains(&role) {
            return Err(unavailable("email dispatcher"));
        }
        self.sent.lock().push(SentEmail {
            role,
            session_id: session_id.clone(),
            recipient_id: recipient_id.clone(),
            details: details.clone(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    messages: Mutex<Vec<UserMessage>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<UserMessage> {
        self.messages.lock().clone()
    }
}

impl UserMessenger for RecordingMessenger {
    fn show(&self, message: &UserMessage) {
        self.messages.lock().push(message.clone());
    }
}

/// A full set of doubles. Session type `st1` ("Career Guidance") and one
/// admin, `a1`, exist by default.
pub struct MockCollaborators {
    pub scheduling: Arc<MockSchedulingStore>,
    pub session_types: Arc<MockSessionTypes>,
    pub meetings: Arc<MockMeetingProvisioner>,
    pub sessions: Arc<MockSessionStore>,
    pub notifications: Arc<MockNotificationStore>,
    pub admins: Arc<MockAdminDirectory>,
    pub email: Arc<MockEmailDispatcher>,
}

impl MockCollaborators {
    pub fn new() -> Self {
        Self {
            scheduling: Arc::new(MockSchedulingStore::new()),
            session_types: Arc::new(MockSessionTypes::new().with_type("st1", "Career Guidance")),
            meetings: Arc::new(MockMeetingProvisioner::new()),
            sessions: Arc::new(MockSessionStore::new()),
            notifications: Arc::new(MockNotificationStore::new()),
            admins: Arc::new(MockAdminDirectory::with_admins(&["a1"])),
            email: Arc::new(MockEmailDispatcher::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            scheduling: self.scheduling.clone(),
            session_types: self.session_types.clone(),
            meetings: self.meetings.clone(),
            sessions: self.sessions.clone(),
            notifications: self.notifications.clone(),
            admins: self.admins.clone(),
            email: self.email.clone(),
        }
    }

    /// Calls made to any collaborator.
    pub fn total_calls(&self) -> usize {
        self.scheduling.calls()
            + self.session_types.calls()
            + self.meetings.calls()
            + self.sessions.calls()
            + self.notifications.calls()
            + self.admins.calls()
            + self.email.calls()
    }
}

impl Default for MockCollaborators {
    fn default() -> Self {
        Self::new()
    }
}
