//! SQLite-backed implementations of the workflow's collaborator ports.
//!
//! The repos are synchronous and hold the connection mutex only for the
//! duration of one statement or transaction.

use async_trait::async_trait;

use mentorhub_core::booking::NewSession;
use mentorhub_core::errors::{CollaboratorError, CommitError};
use mentorhub_core::ids::{NotificationId, SessionId, SessionTypeId, UserId};
use mentorhub_core::notifications::NewNotification;
use mentorhub_core::ports::{
    AdminDirectory, NotificationStore, SchedulingStore, SessionStore, SessionType,
    SessionTypeDirectory,
};

use crate::accounts::{AccountRepo, AccountRole};
use crate::notifications::NotificationRepo;
use crate::session_types::SessionTypeRepo;
use crate::sessions::SessionRepo;

#[async_trait]
impl SchedulingStore for SessionRepo {
    async fn commit(&self, session: &NewSession) -> Result<SessionId, CommitError> {
        Ok(SessionRepo::commit(self, session)?.id)
    }
}

#[async_trait]
impl SessionStore for SessionRepo {
    async fn attach_meeting_link(
        &self,
        session_id: &SessionId,
        meet_link: &str,
    ) -> Result<(), CollaboratorError> {
        Ok(SessionRepo::attach_meeting_link(self, session_id, meet_link)?)
    }
}

#[async_trait]
impl SessionTypeDirectory for SessionTypeRepo {
    async fn lookup(&self, id: &SessionTypeId) -> Result<SessionType, CollaboratorError> {
        Ok(self.get(id)?)
    }
}

#[async_trait]
impl NotificationStore for NotificationRepo {
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationId, CollaboratorError> {
        Ok(NotificationRepo::insert(self, notification)?)
    }
}

#[async_trait]
impl AdminDirectory for AccountRepo {
    async fn list_admins(&self) -> Result<Vec<UserId>, CollaboratorError> {
        Ok(self
            .list_by_role(AccountRole::Admin)?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }
}
