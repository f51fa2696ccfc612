use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mentorhub_core::booking::{BookingRequest, Requester, Session};
use mentorhub_core::ids::{SessionId, UserId};
use mentorhub_core::notifications::NotificationRecord;
use mentorhub_engine::BookingOutcome;

use crate::error::ServerError;
use crate::server::AppState;

/// Authenticated caller id, set by the fronting auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;
const MAX_NOTIFICATION_LIMIT: u32 = 200;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `None` when the caller is anonymous; the workflow rejects that.
pub fn requester_from_headers(headers: &HeaderMap) -> Option<Requester> {
    let id = header_str(headers, USER_ID_HEADER)?;
    let requester = Requester::new(UserId::from_raw(id));
    Some(match header_str(headers, USER_NAME_HEADER) {
        Some(name) => requester.with_display_name(name),
        None => requester,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingOutcome>), ServerError> {
    request.requester = requester_from_headers(&headers);
    let outcome = state.workflow.book(&request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ServerError> {
    Ok(Json(state.sessions.get(&SessionId::from_raw(id))?))
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationRecord>>, ServerError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .min(MAX_NOTIFICATION_LIMIT);
    let records = state
        .notifications
        .list_for_recipient(&UserId::from_raw(user_id), limit)?;
    Ok(Json(records))
}

#[derive(Debug, Serialize)]
pub struct CounterSample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: u64,
}

pub async fn metrics(State(state): State<AppState>) -> Json<Vec<CounterSample>> {
    let samples = state
        .metrics
        .counters()
        .into_iter()
        .map(|(name, labels, value)| CounterSample {
            name,
            labels: labels.into_iter().collect(),
            value,
        })
        .collect();
    Json(samples)
}
