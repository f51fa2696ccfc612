use chrono::Utc;
use tracing::instrument;

use mentorhub_core::ids::SessionTypeId;
use mentorhub_core::ports::SessionType;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

#[derive(Clone)]
pub struct SessionTypeRepo {
    db: Database,
}

impl SessionTypeRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, label), fields(session_type_id = %id))]
    pub fn upsert(
        &self,
        id: &SessionTypeId,
        label: &str,
        duration_minutes: u32,
    ) -> Result<SessionType, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_types (id, label, duration_minutes, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    label = excluded.label,
                    duration_minutes = excluded.duration_minutes",
                rusqlite::params![id.as_str(), label, duration_minutes, now],
            )?;
            Ok(())
        })?;
        Ok(SessionType {
            id: id.clone(),
            label: label.to_string(),
            duration_minutes,
        })
    }

    #[instrument(skip(self), fields(session_type_id = %id))]
    pub fn get(&self, id: &SessionTypeId) -> Result<SessionType, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, label, duration_minutes FROM session_types WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id.as_str()])?;
            let Some(row) = rows.next()? else {
                return Err(StoreError::NotFound(format!("session type {id}")));
            };
            let raw_id: String = row_helpers::get(row, 0, "session_types", "id")?;
            Ok(SessionType {
                id: SessionTypeId::from_raw(raw_id),
                label: row_helpers::get(row, 1, "session_types", "label")?,
                duration_minutes: row_helpers::get(row, 2, "session_types", "duration_minutes")?,
            })
        })
    }
}
