//! View-models for the three live surfaces.
//!
//! Each view follows the same shape: an async `mount`/`refresh` against the
//! REST API, a synchronous `apply` for push events, and a `tick` driven by
//! the caller's clock so transients expire deterministically.

pub mod inbox;
pub mod room;
pub mod thread;

pub use inbox::{InboxView, InboxError};
pub use room::{RoomView, RoomError};
pub use thread::{ThreadView, ThreadError};
