//! Operator area under `/admin`.

pub mod auth;
pub mod handler;

pub use auth::{AdminSession, AuthManager, AuthOutcome, RejectReason};
pub use handler::AdminHandler;
