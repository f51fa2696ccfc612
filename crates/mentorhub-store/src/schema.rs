/// SQL DDL for the mentorhub database.
/// WAL mode + foreign keys enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    email TEXT,
    role TEXT NOT NULL CHECK (role IN ('mentee', 'mentor', 'admin')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session_types (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL DEFAULT 60,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    mentor_id TEXT NOT NULL REFERENCES accounts(id),
    mentee_id TEXT NOT NULL REFERENCES accounts(id),
    scheduled_at TEXT NOT NULL,
    session_type_id TEXT NOT NULL REFERENCES session_types(id),
    platform TEXT NOT NULL,
    meeting_link TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled',
    note TEXT NOT NULL DEFAULT '',
    phone TEXT,
    messaging_handle TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    recipient_id TEXT NOT NULL REFERENCES accounts(id),
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    type TEXT NOT NULL,
    category TEXT NOT NULL,
    action_url TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_mentor_slot
    ON sessions(mentor_id, scheduled_at) WHERE status = 'scheduled';
CREATE INDEX IF NOT EXISTS idx_sessions_mentee ON sessions(mentee_id);
CREATE INDEX IF NOT EXISTS idx_accounts_role ON accounts(role);
CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created_at);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
