pub mod accounts;
pub mod database;
pub mod error;
pub mod notifications;
pub mod ports;
pub mod row_helpers;
pub mod schema;
pub mod session_types;
pub mod sessions;

pub use database::Database;
pub use error::StoreError;
