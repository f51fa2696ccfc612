//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::MentorhubSettings;

/// `~/.mentorhub`, or `/tmp/.mentorhub` when `HOME` is unset.
pub fn mentorhub_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".mentorhub")
}

pub fn settings_path() -> PathBuf {
    mentorhub_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<MentorhubSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load_settings_from_path(path: &Path) -> Result<MentorhubSettings> {
    let defaults = serde_json::to_value(MentorhubSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: MentorhubSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `MENTORHUB_*` overrides. Invalid values are ignored with a warning.
pub fn apply_overrides<F>(settings: &mut MentorhubSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read_string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let read_u64 = |name: &str, min: u64, max: u64| {
        let val = lookup(name)?;
        let parsed = parse_u64_range(&val, min, max);
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        parsed
    };

    if let Some(v) = read_string("MENTORHUB_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_u64("MENTORHUB_PORT", 1, 65_535) {
        settings.server.port = v as u16;
    }
    if let Some(v) = read_string("MENTORHUB_DB") {
        settings.database.path = v;
    }
    if let Some(v) = read_u64("MENTORHUB_STEP_TIMEOUT_MS", 1, 600_000) {
        settings.workflow.step_timeout_ms = v;
    }
    if let Some(v) = read_string("MENTORHUB_MEETING_API_URL") {
        settings.integrations.meeting_api_url = Some(v);
    }
    if let Some(v) = read_string("MENTORHUB_EMAIL_API_URL") {
        settings.integrations.email_api_url = Some(v);
    }
    if let Some(v) = read_string("MENTORHUB_API_KEY") {
        settings.integrations.api_key = Some(v);
    }
    if let Some(v) = read_string("MENTORHUB_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(val) = lookup("MENTORHUB_LOG_JSON") {
        match parse_bool(&val) {
            Some(v) => settings.logging.json = v,
            None => tracing::warn!(key = "MENTORHUB_LOG_JSON", value = %val, "invalid boolean env var, ignoring"),
        }
    }
}

fn validate(settings: &MentorhubSettings) -> Result<()> {
    if settings.workflow.step_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "workflow.stepTimeoutMs must be positive".into(),
        ));
    }
    if settings.workflow.fallback_session_label.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "workflow.fallbackSessionLabel must not be empty".into(),
        ));
    }
    Ok(())
}

/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
