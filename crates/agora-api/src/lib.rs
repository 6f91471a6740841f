// Typed REST client for the Agora HTTP API.
//
// Non-2xx responses are uniform failures: no retry, no backoff, no circuit
// breaking. Recovery is the caller's (ultimately the user's) problem.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod client;
pub mod dms;
pub mod error;
pub mod forum;
pub mod settings;
pub mod users;

pub use admin::Role;
pub use auth::{RegisterRequest, SessionInfo};
pub use client::ApiClient;
pub use error::{ApiError, FieldError};
pub use forum::TopicPage;
pub use settings::SettingEntry;
pub use users::UserSummary;
