use chrono::Utc;
use tracing::instrument;

use mentorhub_core::ids::{NotificationId, UserId};
use mentorhub_core::notifications::{NewNotification, NotificationRecord};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Append-only notification inbox.
#[derive(Clone)]
pub struct NotificationRepo {
    db: Database,
}

impl NotificationRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(recipient_id = %n.recipient_id, kind = n.notification_type.as_str()))]
    pub fn insert(&self, n: &NewNotification) -> Result<NotificationId, StoreError> {
        let id = NotificationId::new();
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, recipient_id, title, message, type, category,
                    action_url, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
                rusqlite::params![
                    id.as_str(),
                    n.recipient_id.as_str(),
                    n.title,
                    n.message,
                    n.notification_type.as_str(),
                    n.category.as_str(),
                    n.action_url,
                    now,
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    /// Newest first.
    #[instrument(skip(self), fields(recipient_id = %recipient))]
    pub fn list_for_recipient(
        &self,
        recipient: &UserId,
        limit: u32,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient_id, title, message, type, category, action_url, read, created_at
                 FROM notifications WHERE recipient_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )?;
            let mut rows = stmt.query(rusqlite::params![recipient.as_str(), limit])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(row_to_notification(row)?);
            }
            Ok(out)
        })
    }

    pub fn count_for_recipient(&self, recipient: &UserId) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
                [recipient.as_str()],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> Result<NotificationRecord, StoreError> {
    let id: String = row_helpers::get(row, 0, "notifications", "id")?;
    let recipient: String = row_helpers::get(row, 1, "notifications", "recipient_id")?;
    let kind: String = row_helpers::get(row, 4, "notifications", "type")?;
    let category: String = row_helpers::get(row, 5, "notifications", "category")?;
    let read: i64 = row_helpers::get(row, 7, "notifications", "read")?;
    Ok(NotificationRecord {
        id: NotificationId::from_raw(id),
        recipient_id: UserId::from_raw(recipient),
        title: row_helpers::get(row, 2, "notifications", "title")?,
        message: row_helpers::get(row, 3, "notifications", "message")?,
        notification_type: row_helpers::parse_enum(&kind, "notifications", "type")?,
        category: row_helpers::parse_enum(&category, "notifications", "category")?,
        action_url: row_helpers::get(row, 6, "notifications", "action_url")?,
        read: read != 0,
        created_at: row_helpers::get(row, 8, "notifications", "created_at")?,
    })
}
