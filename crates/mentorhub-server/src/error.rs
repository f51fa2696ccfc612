use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use mentorhub_core::errors::CommitError;
use mentorhub_engine::BookingError;
use mentorhub_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("http client error: {0}")]
    HttpClient(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Booking(BookingError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Booking(BookingError::IdentityResolution(_)) => StatusCode::UNAUTHORIZED,
            Self::Booking(BookingError::Commit(CommitError::SlotConflict(_))) => {
                StatusCode::CONFLICT
            }
            Self::Booking(BookingError::Commit(_)) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::HttpClient(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Booking(e) => e.error_kind(),
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store",
            Self::HttpClient(_) => "http_client",
            Self::Io(_) => "io",
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(detail) => Self::NotFound(detail),
            other => Self::Store(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.error_kind(), "request failed");
        }
        let body = json!({
            "error": {
                "kind": self.error_kind(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentorhub_core::errors::ValidationError;

    #[test]
    fn booking_errors_map_to_statuses() {
        let cases = [
            (
                ServerError::from(BookingError::from(ValidationError::MissingDate)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServerError::from(BookingError::IdentityResolution("no requester".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ServerError::from(BookingError::from(CommitError::SlotConflict("m1".into()))),
                StatusCode::CONFLICT,
            ),
            (
                ServerError::from(BookingError::from(CommitError::Store("locked".into()))),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }

    #[test]
    fn store_not_found_is_404() {
        let e = ServerError::from(StoreError::NotFound("session x".into()));
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.error_kind(), "not_found");

        let e = ServerError::from(StoreError::Database("disk".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
