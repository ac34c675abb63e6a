//! HTTP surface for the reconciliation platform: admin endpoints behind a
//! bearer JWT, a phone-verified public portal, and the dashboard cache and
//! rate limiter that sit in front of the database for both.

pub mod auth;
pub mod cache;
pub mod dto;
pub mod error;
pub mod routes;
pub mod sinks;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppConfig, AppState};
