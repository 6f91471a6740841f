//! The push-event vocabulary of the live channel.
//!
//! Event names drifted across server revisions (`message` vs `chat_message`,
//! `newDM` vs `newDirectMessage`). [`EventName`] is the one canonical
//! enumeration; the old names are accepted on decode as deprecated aliases
//! and are never produced.
//!
//! Two ban events exist on purpose: `notify_user_banned` is the broadcast
//! that patches cached records, `user_banned` is addressed to the banned
//! user's own connection and tears the session down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;
use crate::identity::{ModerationAction, ModerationUpdate};
use crate::records::{ChatMessage, DirectMessage, Post};
use crate::types::{DmId, MessageId, PostId, TopicId, UserId};

/// Canonical names of server-to-client push events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ChatMessage,
    ChatTyping,
    ChatUpdateUsers,
    ChatMessageDeleted,
    NotifyUserMuted,
    NotifyUserBanned,
    UserUnmuted,
    UserUnbanned,
    UserKicked,
    ForceLogout,
    UserBanned,
    NewDirectMessage,
    DirectMessageDeleted,
    NewPost,
    UpdatePost,
    DeletePost,
}

impl EventName {
    pub const fn wire_name(self) -> &'static str {
        match self {
            EventName::ChatMessage => "chat_message",
            EventName::ChatTyping => "chat_typing",
            EventName::ChatUpdateUsers => "chat_update_users",
            EventName::ChatMessageDeleted => "chat_message_deleted",
            EventName::NotifyUserMuted => "notify_user_muted",
            EventName::NotifyUserBanned => "notify_user_banned",
            EventName::UserUnmuted => "user_unmuted",
            EventName::UserUnbanned => "user_unbanned",
            EventName::UserKicked => "user_kicked",
            EventName::ForceLogout => "force_logout",
            EventName::UserBanned => "user_banned",
            EventName::NewDirectMessage => "newDirectMessage",
            EventName::DirectMessageDeleted => "directMessageDeleted",
            EventName::NewPost => "newPost",
            EventName::UpdatePost => "updatePost",
            EventName::DeletePost => "deletePost",
        }
    }

    /// Resolve a wire name, canonical or deprecated alias.
    pub fn from_wire(name: &str) -> Option<Self> {
        let resolved = match name {
            "chat_message" => EventName::ChatMessage,
            "chat_typing" => EventName::ChatTyping,
            "chat_update_users" => EventName::ChatUpdateUsers,
            "chat_message_deleted" => EventName::ChatMessageDeleted,
            "notify_user_muted" => EventName::NotifyUserMuted,
            "notify_user_banned" => EventName::NotifyUserBanned,
            "user_unmuted" => EventName::UserUnmuted,
            "user_unbanned" => EventName::UserUnbanned,
            "user_kicked" => EventName::UserKicked,
            "force_logout" => EventName::ForceLogout,
            "user_banned" => EventName::UserBanned,
            "newDirectMessage" => EventName::NewDirectMessage,
            "directMessageDeleted" => EventName::DirectMessageDeleted,
            "newPost" => EventName::NewPost,
            "updatePost" => EventName::UpdatePost,
            "deletePost" => EventName::DeletePost,
            // Deprecated aliases from older server revisions.
            "message" => {
                tracing::debug!(alias = "message", "Deprecated event name on the wire");
                EventName::ChatMessage
            }
            "newDM" => {
                tracing::debug!(alias = "newDM", "Deprecated event name on the wire");
                EventName::NewDirectMessage
            }
            _ => return None,
        };
        Some(resolved)
    }
}

/// A decoded server push event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    NewChatMessage(ChatMessage),
    Typing { username: String },
    PresenceUpdate { users: Vec<String> },
    ChatMessageDeleted { id: MessageId },
    /// Broadcast moderation change; patched onto cached author fragments.
    Moderation(ModerationUpdate),
    /// Addressed to this connection: the user was kicked.
    Kicked { reason: Option<String> },
    /// Addressed to this connection: logged in elsewhere.
    ForceLogout,
    /// Addressed to this connection: the user was banned.
    Banned {
        reason: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    NewDirectMessage(Box<DirectMessage>),
    DirectMessageDeleted { id: DmId },
    NewPost(Box<Post>),
    PostUpdated(Box<Post>),
    PostDeleted { id: PostId },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModerationPayload {
    user_id: UserId,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BanPayload {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostPayload {
    updated_post: Post,
}

impl ServerEvent {
    /// Decode one `{"event": ..., "data": ...}` text frame.
    pub fn from_frame(text: &str) -> Result<Self, EventError> {
        let frame: Value =
            serde_json::from_str(text).map_err(|e| EventError::Frame(e.to_string()))?;
        let name = frame
            .get("event")
            .and_then(Value::as_str)
            .ok_or_else(|| EventError::Frame("missing \"event\" field".into()))?;
        let data = frame.get("data").cloned().unwrap_or(Value::Null);
        Self::decode(name, data)
    }

    /// Decode an event by wire name and payload.
    pub fn decode(name: &str, data: Value) -> Result<Self, EventError> {
        let event =
            EventName::from_wire(name).ok_or_else(|| EventError::UnknownEvent(name.into()))?;

        fn payload<T: serde::de::DeserializeOwned>(
            event: EventName,
            data: Value,
        ) -> Result<T, EventError> {
            serde_json::from_value(data).map_err(|source| EventError::Payload {
                event: event.wire_name(),
                source,
            })
        }

        // Some revisions send ids as numbers, others as strings.
        fn id_payload(event: EventName, data: &Value) -> Result<i64, EventError> {
            let candidate = if data.is_object() { &data["id"] } else { data };
            match candidate {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }
            .ok_or_else(|| EventError::Payload {
                event: event.wire_name(),
                source: <serde_json::Error as serde::de::Error>::custom("expected an id"),
            })
        }

        let moderation = |action: ModerationAction, data: Value| -> Result<Self, EventError> {
            let p: ModerationPayload = payload(event, data)?;
            Ok(ServerEvent::Moderation(ModerationUpdate {
                user_id: p.user_id,
                action,
                reason: p.reason,
                expires_at: p.expires_at,
            }))
        };

        match event {
            EventName::ChatMessage => Ok(ServerEvent::NewChatMessage(payload(event, data)?)),
            EventName::ChatTyping => Ok(ServerEvent::Typing {
                username: payload(event, data)?,
            }),
            EventName::ChatUpdateUsers => Ok(ServerEvent::PresenceUpdate {
                users: payload(event, data)?,
            }),
            EventName::ChatMessageDeleted => Ok(ServerEvent::ChatMessageDeleted {
                id: MessageId(id_payload(event, &data)?),
            }),
            EventName::NotifyUserMuted => moderation(ModerationAction::Muted, data),
            EventName::NotifyUserBanned => moderation(ModerationAction::Banned, data),
            EventName::UserUnmuted => moderation(ModerationAction::Unmuted, data),
            EventName::UserUnbanned => moderation(ModerationAction::Unbanned, data),
            EventName::UserKicked => {
                let p: BanPayload = payload(event, data)?;
                Ok(ServerEvent::Kicked { reason: p.reason })
            }
            EventName::ForceLogout => Ok(ServerEvent::ForceLogout),
            EventName::UserBanned => {
                let p: BanPayload = payload(event, data)?;
                Ok(ServerEvent::Banned {
                    reason: p.reason,
                    expires_at: p.expires_at,
                })
            }
            EventName::NewDirectMessage => Ok(ServerEvent::NewDirectMessage(Box::new(
                payload(event, data)?,
            ))),
            EventName::DirectMessageDeleted => Ok(ServerEvent::DirectMessageDeleted {
                id: DmId(id_payload(event, &data)?),
            }),
            EventName::NewPost => Ok(ServerEvent::NewPost(Box::new(payload(event, data)?))),
            EventName::UpdatePost => {
                let p: UpdatePostPayload = payload(event, data)?;
                Ok(ServerEvent::PostUpdated(Box::new(p.updated_post)))
            }
            EventName::DeletePost => Ok(ServerEvent::PostDeleted {
                id: PostId(id_payload(event, &data)?),
            }),
        }
    }
}

/// A client-to-server emit on the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Presence announcement sent right after connecting.
    UserConnected { username: String },
    /// Announce entering the chat room.
    EnteredChat,
    Typing { username: String },
    JoinTopic(TopicId),
    LeaveTopic(TopicId),
    NewPost(Box<Post>),
    EditPost(Box<Post>),
    DeletePost(PostId),
}

impl ClientEvent {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ClientEvent::UserConnected { .. } => "user_connected",
            ClientEvent::EnteredChat => "entered_chat",
            ClientEvent::Typing { .. } => "chat_typing",
            ClientEvent::JoinTopic(_) => "joinTopic",
            ClientEvent::LeaveTopic(_) => "leaveTopic",
            ClientEvent::NewPost(_) => "newPost",
            ClientEvent::EditPost(_) => "editPost",
            ClientEvent::DeletePost(_) => "deletePost",
        }
    }

    /// Encode as a `{"event": ..., "data": ...}` text frame.
    pub fn to_frame(&self) -> String {
        let data = match self {
            ClientEvent::UserConnected { username } => Value::String(username.clone()),
            ClientEvent::EnteredChat => Value::Null,
            ClientEvent::Typing { username } => Value::String(username.clone()),
            ClientEvent::JoinTopic(id) | ClientEvent::LeaveTopic(id) => serde_json::json!(id),
            ClientEvent::NewPost(post) | ClientEvent::EditPost(post) => {
                serde_json::to_value(post).unwrap_or(Value::Null)
            }
            ClientEvent::DeletePost(id) => serde_json::json!(id),
        };
        Frame {
            event: self.wire_name(),
            data,
        }
        .encode()
    }
}

#[derive(Debug, Serialize)]
struct Frame<'a> {
    event: &'a str,
    data: Value,
}

impl Frame<'_> {
    fn encode(&self) -> String {
        // A struct of a &str and a Value cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
