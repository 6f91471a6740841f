//! Shared domain types for the Agora chat/forum client.

pub mod credential;
pub mod error;
pub mod events;
pub mod identity;
pub mod limits;
pub mod records;
pub mod types;

pub use credential::Credential;
pub use error::{CredentialError, EventError};
pub use events::{ClientEvent, EventName, ServerEvent};
pub use identity::{AuthorFragment, Identity, ModerationAction, ModerationUpdate};
pub use records::{Category, ChatMessage, DirectMessage, Page, Post, Subforum, Topic};
pub use types::{CategoryId, DmBox, DmId, MessageId, PostId, SubforumId, TopicId, UserId};
