//! Headless client for the Agora chat/forum service.
//!
//! This crate owns the client-side state a UI would render. The intended
//! wiring: a [`session::SessionGuard`] restores or establishes the session
//! and owns the live channel; each mounted view subscribes to the channel's
//! notifications, feeds `Event`s into its `apply()`, refetches on `Up`, and
//! calls `tick()` periodically so deadline-driven transients (typing
//! markers, delete fades, edit highlights) resolve.

pub mod config;
pub mod overlay;
pub mod session;
pub mod storage;
pub mod sync;
pub mod views;

pub use config::ClientConfig;
pub use session::{LogoutReason, SessionGuard};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise structured logging for an embedding application. Call once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("agora_client=debug,agora_live=debug,agora_api=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
