//! Client-side limits and animation delays.
//!
//! The length limits are enforced before any network call; the delays exist
//! only so a UI layer can play its transitions, they are not correctness
//! requirements.

use std::time::Duration;

/// Most recent chat messages held by the room view.
pub const CHAT_HISTORY_CAP: usize = 30;

/// Maximum chat message length in characters; longer input is silently
/// truncated, never sent to the server for validation.
pub const CHAT_MESSAGE_MAX_CHARS: usize = 512;

/// Forum posts held per page, and the bound on the thread view's window.
pub const POSTS_PER_PAGE: usize = 30;

/// Forum post content length bounds (plain text).
pub const POST_MIN_CHARS: usize = 3;
pub const POST_MAX_CHARS: usize = 1000;

/// Direct message content cap.
pub const DM_MAX_CHARS: usize = 2048;

/// Direct messages requested per page.
pub const DMS_PER_PAGE: usize = 30;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// How long a "user is typing" marker lives without a refreshing event.
pub const TYPING_MARKER_TTL: Duration = Duration::from_secs(3);

/// Fade-out before a deleted chat message is dropped from the list.
pub const CHAT_DELETE_FADE: Duration = Duration::from_millis(500);

/// Fade-out before a deleted forum post is dropped.
pub const POST_DELETE_FADE: Duration = Duration::from_millis(300);

/// Highlight on a freshly edited or freshly arrived forum post.
pub const POST_HIGHLIGHT_TTL: Duration = Duration::from_secs(1);
