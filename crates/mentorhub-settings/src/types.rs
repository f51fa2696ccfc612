//! Settings type definitions.
//!
//! JSON field names are camelCase. Every section is `#[serde(default)]`, so a
//! partial settings file only needs the values it changes.

use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MentorhubSettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub workflow: WorkflowSettings,
    pub integrations: IntegrationSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            request_timeout_ms: 60_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Absolute path, or relative to `~/.mentorhub`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "database/mentorhub.db".to_string(),
        }
    }
}

/// Booking workflow behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowSettings {
    /// Upper bound for any single step. A step that exceeds it is failed.
    pub step_timeout_ms: u64,
    /// Label used in notification text when the session type lookup fails.
    pub fallback_session_label: String,
    /// The single positive message shown on success.
    pub confirmation_text: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            step_timeout_ms: 15_000,
            fallback_session_label: "Mentoring Session".to_string(),
            confirmation_text: "Your session has been booked.".to_string(),
        }
    }
}

/// Remote services the workflow calls after the commit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_api_url: Option<String>,
    /// Bearer token sent to both services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            meeting_api_url: None,
            email_api_url: None,
            api_key: None,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}
