use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mentorhub_core::ids::UserId;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Mentee,
    Mentor,
    Admin,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mentee => write!(f, "mentee"),
            Self::Mentor => write!(f, "mentor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mentee" => Ok(Self::Mentee),
            "mentor" => Ok(Self::Mentor),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown account role: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: UserId,
    pub display_name: String,
    pub email: Option<String>,
    pub role: AccountRole,
    pub created_at: String,
}

#[derive(Clone)]
pub struct AccountRepo {
    db: Database,
}

impl AccountRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or update an account, keeping its original creation time.
    #[instrument(skip_all, fields(account_id = %id, role = %role))]
    pub fn upsert(
        &self,
        id: &UserId,
        display_name: &str,
        email: Option<&str>,
        role: AccountRole,
    ) -> Result<AccountRow, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (id, display_name, email, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    display_name = excluded.display_name,
                    email = excluded.email,
                    role = excluded.role",
                rusqlite::params![id.as_str(), display_name, email, role.to_string(), now],
            )?;
            Ok(())
        })?;
        self.get(id)
    }

    #[instrument(skip(self), fields(account_id = %id))]
    pub fn get(&self, id: &UserId) -> Result<AccountRow, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, email, role, created_at FROM accounts WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_account(row),
                None => Err(StoreError::NotFound(format!("account {id}"))),
            }
        })
    }

    /// Accounts holding `role`, oldest first.
    #[instrument(skip_all, fields(role = %role))]
    pub fn list_by_role(&self, role: AccountRole) -> Result<Vec<AccountRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, email, role, created_at FROM accounts
                 WHERE role = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([role.to_string()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_account(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> Result<AccountRow, StoreError> {
    let id: String = row_helpers::get(row, 0, "accounts", "id")?;
    let role: String = row_helpers::get(row, 3, "accounts", "role")?;
    Ok(AccountRow {
        id: UserId::from_raw(id),
        display_name: row_helpers::get(row, 1, "accounts", "display_name")?,
        email: row_helpers::get_opt(row, 2, "accounts", "email")?,
        role: row_helpers::parse_enum(&role, "accounts", "role")?,
        created_at: row_helpers::get(row, 4, "accounts", "created_at")?,
    })
}
