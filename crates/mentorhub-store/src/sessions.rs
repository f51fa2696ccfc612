use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::{debug, instrument};

use mentorhub_core::booking::{NewSession, Session, SessionStatus};
use mentorhub_core::ids::{SessionId, SessionTypeId, UserId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const SESSION_COLUMNS: &str = "id, mentor_id, mentee_id, scheduled_at, session_type_id, platform, \
     meeting_link, status, note, phone, messaging_handle, created_at";

#[derive(Clone)]
pub struct SessionRepo {
    db: Database,
}

impl SessionRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a scheduled session in a single transaction.
    ///
    /// The mentor, mentee and session type must already exist. A second
    /// scheduled session for the same mentor and instant is a `Conflict`.
    #[instrument(skip_all, fields(mentor_id = %new.mentor_id, scheduled_at = %new.scheduled_at))]
    pub fn commit(&self, new: &NewSession) -> Result<Session, StoreError> {
        let id = SessionId::new();
        let now = Utc::now().to_rfc3339();
        let scheduled_at = new.scheduled_at.to_rfc3339();

        self.db.with_tx(|tx| {
            let mentor_role: Option<String> = tx
                .query_row(
                    "SELECT role FROM accounts WHERE id = ?1",
                    [new.mentor_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            match mentor_role.as_deref() {
                Some("mentor") => {}
                Some(other) => {
                    return Err(StoreError::NotFound(format!(
                        "mentor {} (account has role {other})",
                        new.mentor_id
                    )))
                }
                None => return Err(StoreError::NotFound(format!("mentor {}", new.mentor_id))),
            }
            if !exists(tx, "SELECT 1 FROM accounts WHERE id = ?1", new.mentee_id.as_str())? {
                return Err(StoreError::NotFound(format!("mentee {}", new.mentee_id)));
            }
            if !exists(
                tx,
                "SELECT 1 FROM session_types WHERE id = ?1",
                new.session_type_id.as_str(),
            )? {
                return Err(StoreError::NotFound(format!(
                    "session type {}",
                    new.session_type_id
                )));
            }

            let inserted = tx.execute(
                "INSERT INTO sessions (id, mentor_id, mentee_id, scheduled_at, session_type_id,
                    platform, status, note, phone, messaging_handle, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'scheduled', ?7, ?8, ?9, ?10, ?10)",
                rusqlite::params![
                    id.as_str(),
                    new.mentor_id.as_str(),
                    new.mentee_id.as_str(),
                    scheduled_at,
                    new.session_type_id.as_str(),
                    new.platform.as_str(),
                    new.note,
                    new.phone,
                    new.messaging_handle,
                    now,
                ],
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(e) if row_helpers::is_unique_violation(&e) => Err(StoreError::Conflict(
                    format!("mentor {} at {scheduled_at}", new.mentor_id),
                )),
                Err(e) => Err(e.into()),
            }
        })?;

        debug!(session_id = %id, "session committed");

        Ok(Session {
            id,
            mentor_id: new.mentor_id.clone(),
            mentee_id: new.mentee_id.clone(),
            scheduled_at: new.scheduled_at,
            session_type_id: new.session_type_id.clone(),
            platform: new.platform,
            meeting_link: None,
            status: SessionStatus::Scheduled,
            note: new.note.clone(),
            phone: new.phone.clone(),
            messaging_handle: new.messaging_handle.clone(),
            created_at: now,
        })
    }

    #[instrument(skip(self, link), fields(session_id = %id))]
    pub fn attach_meeting_link(&self, id: &SessionId, link: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE sessions SET meeting_link = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![link, now, id.as_str()],
            )?)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("session {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_session(row),
                None => Err(StoreError::NotFound(format!("session {id}"))),
            }
        })
    }

    /// Sessions where `user` is mentor or mentee, soonest first.
    #[instrument(skip(self), fields(user_id = %user))]
    pub fn list_for_participant(&self, user: &UserId) -> Result<Vec<Session>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE mentor_id = ?1 OR mentee_id = ?1
                 ORDER BY scheduled_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([user.as_str()])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
    }
}

fn exists(tx: &rusqlite::Transaction<'_>, sql: &str, id: &str) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(sql, [id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, StoreError> {
    let id: String = row_helpers::get(row, 0, "sessions", "id")?;
    let mentor_id: String = row_helpers::get(row, 1, "sessions", "mentor_id")?;
    let mentee_id: String = row_helpers::get(row, 2, "sessions", "mentee_id")?;
    let scheduled_at: String = row_helpers::get(row, 3, "sessions", "scheduled_at")?;
    let session_type_id: String = row_helpers::get(row, 4, "sessions", "session_type_id")?;
    let platform: String = row_helpers::get(row, 5, "sessions", "platform")?;
    let status: String = row_helpers::get(row, 7, "sessions", "status")?;

    Ok(Session {
        id: SessionId::from_raw(id),
        mentor_id: UserId::from_raw(mentor_id),
        mentee_id: UserId::from_raw(mentee_id),
        scheduled_at: row_helpers::parse_timestamp(&scheduled_at, "sessions", "scheduled_at")?,
        session_type_id: SessionTypeId::from_raw(session_type_id),
        platform: row_helpers::parse_enum(&platform, "sessions", "platform")?,
        meeting_link: row_helpers::get_opt(row, 6, "sessions", "meeting_link")?,
        status: row_helpers::parse_enum(&status, "sessions", "status")?,
        note: row_helpers::get(row, 8, "sessions", "note")?,
        phone: row_helpers::get_opt(row, 9, "sessions", "phone")?,
        messaging_handle: row_helpers::get_opt(row, 10, "sessions", "messaging_handle")?,
        created_at: row_helpers::get(row, 11, "sessions", "created_at")?,
    })
}
