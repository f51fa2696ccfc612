//! HTTP surface for the booking workflow plus the outbound service adapters.

pub mod error;
pub mod handlers;
pub mod integrations;
pub mod server;

pub use error::ServerError;
pub use integrations::{clients_from_settings, HttpEmailDispatcher, HttpMeetingProvisioner};
pub use server::{build_router, sqlite_collaborators, start, AppState, ServerConfig, ServerHandle};
