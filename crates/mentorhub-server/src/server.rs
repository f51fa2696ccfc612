use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use mentorhub_core::ports::{EmailDispatcher, MeetingProvisioner};
use mentorhub_engine::{BookingWorkflow, Collaborators};
use mentorhub_settings::ServerSettings;
use mentorhub_store::accounts::AccountRepo;
use mentorhub_store::notifications::NotificationRepo;
use mentorhub_store::session_types::SessionTypeRepo;
use mentorhub_store::sessions::SessionRepo;
use mentorhub_store::Database;
use mentorhub_telemetry::MetricsRecorder;

use crate::error::ServerError;
use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(s: &ServerSettings) -> Self {
        Self {
            host: s.host.clone(),
            port: s.port,
            request_timeout: Duration::from_millis(s.request_timeout_ms),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<BookingWorkflow>,
    pub sessions: SessionRepo,
    pub notifications: NotificationRepo,
    pub metrics: Arc<MetricsRecorder>,
}

impl AppState {
    pub fn new(workflow: Arc<BookingWorkflow>, db: Database, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            workflow,
            sessions: SessionRepo::new(db.clone()),
            notifications: NotificationRepo::new(db),
            metrics,
        }
    }
}

/// Wire the SQLite repos and the two HTTP services into workflow collaborators.
pub fn sqlite_collaborators(
    db: &Database,
    meetings: Arc<dyn MeetingProvisioner>,
    email: Arc<dyn EmailDispatcher>,
) -> Collaborators {
    let sessions = Arc::new(SessionRepo::new(db.clone()));
    Collaborators {
        scheduling: sessions.clone(),
        session_types: Arc::new(SessionTypeRepo::new(db.clone())),
        meetings,
        sessions,
        notifications: Arc::new(NotificationRepo::new(db.clone())),
        admins: Arc::new(AccountRepo::new(db.clone())),
        email,
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/v1/bookings", post(handlers::create_booking))
        .route("/v1/sessions/{id}", get(handlers::get_session))
        .route(
            "/v1/users/{id}/notifications",
            get(handlers::list_notifications),
        )
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and start serving. Port 0 picks a free port.
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, ServerError> {
    let router = build_router(state, config.request_timeout);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "mentorhub server started");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server exited");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        server,
    })
}

/// Handle returned by `start()`. Dropping it leaves the server running.
pub struct ServerHandle {
    pub port: u16,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) {
        self.server.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentorhub_engine::mock::MockCollaborators;
    use mentorhub_engine::{LogMessenger, WorkflowConfig};

    fn state() -> AppState {
        let db = Database::in_memory().unwrap();
        let workflow = BookingWorkflow::new(
            MockCollaborators::new().collaborators(),
            Arc::new(LogMessenger),
            WorkflowConfig::default(),
        );
        AppState::new(Arc::new(workflow), db, Arc::new(MetricsRecorder::new()))
    }

    #[test]
    fn config_from_settings() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 9000,
            request_timeout_ms: 1500,
        };
        let config = ServerConfig::from(&settings);
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let handle = start(config, state()).await.unwrap();
        let body: serde_json::Value = reqwest::get(format!("http://127.0.0.1:{}/health", handle.port))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        handle.shutdown();
    }
}
