pub mod booking;
pub mod errors;
pub mod ids;
pub mod notifications;
pub mod ports;
pub mod steps;
