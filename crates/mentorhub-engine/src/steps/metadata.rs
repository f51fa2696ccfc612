use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tracing::warn;

use mentorhub_core::errors::CollaboratorError;
use mentorhub_core::ids::SessionTypeId;
use mentorhub_core::ports::SessionTypeDirectory;

use crate::error::StepError;

/// A session-type label, plus the lookup error if the fallback was used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub label: String,
    pub error: Option<String>,
}

/// Resolved once per booking and awaited by every step that builds message text.
pub type SharedLabel<'a> = Shared<BoxFuture<'a, ResolvedLabel>>;

/// Never fails: lookup errors, blank labels and timeouts all yield `fallback`.
pub async fn resolve_label(
    directory: &dyn SessionTypeDirectory,
    id: &SessionTypeId,
    fallback: &str,
    timeout: Duration,
) -> ResolvedLabel {
    let looked_up = match tokio::time::timeout(timeout, directory.lookup(id)).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::Timeout(timeout)),
    };
    match looked_up {
        Ok(session_type) if !session_type.label.trim().is_empty() => ResolvedLabel {
            label: session_type.label,
            error: None,
        },
        Ok(_) => fallback_label(id, fallback, "session type has an empty label".into()),
        Err(e) => fallback_label(id, fallback, e.to_string()),
    }
}

fn fallback_label(id: &SessionTypeId, fallback: &str, error: String) -> ResolvedLabel {
    warn!(session_type_id = %id, error = %error, fallback, "session type lookup failed, using fallback label");
    ResolvedLabel {
        label: fallback.to_string(),
        error: Some(error),
    }
}

/// The metadata step: fails, without affecting anything else, when the fallback was used.
pub async fn check_label(label: SharedLabel<'_>) -> Result<(), StepError> {
    match label.await.error {
        Some(error) => Err(StepError::Fallback(error)),
        None => Ok(()),
    }
}
