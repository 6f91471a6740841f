//! The chat room: bounded history, presence, typing, moderation patches.
//!
//! Sent messages are rendered only when they come back over the live
//! channel; the REST send is fire-and-confirm with no local insert, so the
//! room shows exactly what every other connected client sees.

use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use agora_api::{ApiClient, ApiError};
use agora_live::{ChannelError, LiveChannel};
use agora_shared::limits::{CHAT_DELETE_FADE, CHAT_HISTORY_CAP, CHAT_MESSAGE_MAX_CHARS, TYPING_MARKER_TTL};
use agora_shared::{ClientEvent, Identity, MessageId, ServerEvent};

use crate::overlay::{Overlay, Transient};
use crate::sync::SyncedList;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("You are muted and cannot send messages")]
    Muted,

    #[error("Message is empty")]
    Empty,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Client-side state of the shared chat room.
pub struct RoomView {
    me: Identity,
    messages: SyncedList<agora_shared::ChatMessage>,
    online_users: Vec<String>,
    /// Who is typing, and until when the marker is shown.
    typing: Option<(String, Instant)>,
    overlay: Overlay<MessageId>,
    loaded: bool,
}

impl RoomView {
    pub fn new(me: Identity) -> Self {
        Self {
            me,
            messages: SyncedList::new(Some(CHAT_HISTORY_CAP)),
            online_users: Vec::new(),
            typing: None,
            overlay: Overlay::new(),
            loaded: false,
        }
    }

    /// Load history and announce presence in the room. Also the handler for
    /// a channel reconnect, when push delivery may have gapped.
    pub async fn mount(
        &mut self,
        api: &ApiClient,
        channel: &LiveChannel,
    ) -> Result<(), RoomError> {
        self.refresh(api).await?;
        channel.emit(ClientEvent::EnteredChat).await?;
        Ok(())
    }

    /// Refetch history; the snapshot replaces whatever push events built up.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), RoomError> {
        let history = api.messages().await?;
        self.messages.replace_all(history);
        self.loaded = true;
        Ok(())
    }

    /// Fold a push event into the room state.
    pub fn apply(&mut self, event: &ServerEvent, now: Instant) {
        match event {
            ServerEvent::NewChatMessage(message) => {
                self.messages.push_back(message.clone());
            }
            ServerEvent::ChatMessageDeleted { id } => {
                if self.messages.contains(*id) {
                    self.overlay.mark(*id, Transient::Fading, CHAT_DELETE_FADE, now);
                } else {
                    // Unknown id: tombstone it so a late push cannot land.
                    self.messages.remove(*id);
                }
            }
            ServerEvent::Typing { username } => {
                if *username != self.me.username {
                    self.typing = Some((username.clone(), now + TYPING_MARKER_TTL));
                }
            }
            ServerEvent::PresenceUpdate { users } => {
                self.online_users = users.clone();
            }
            ServerEvent::Moderation(update) => {
                self.messages.patch_all(|m| {
                    update.apply_to(&mut m.user);
                });
                if update.user_id == self.me.id {
                    use agora_shared::ModerationAction::*;
                    match update.action {
                        Muted => self.me.is_muted = true,
                        Unmuted => self.me.is_muted = false,
                        Banned => self.me.is_banned = true,
                        Unbanned => self.me.is_banned = false,
                    }
                }
            }
            other => debug!(?other, "Event not for the chat room"),
        }
    }

    /// Resolve expired transients: fading messages are removed for good and
    /// stale typing markers disappear.
    pub fn tick(&mut self, now: Instant) {
        for (id, transient) in self.overlay.take_expired(now) {
            if transient == Transient::Fading {
                self.messages.remove(id);
            }
        }
        if let Some((_, deadline)) = &self.typing {
            if *deadline <= now {
                self.typing = None;
            }
        }
    }

    /// Validate and normalize outgoing text: non-empty after trimming,
    /// truncated to the room's character limit.
    pub fn compose(&self, input: &str) -> Result<String, RoomError> {
        if self.me.is_muted {
            return Err(RoomError::Muted);
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RoomError::Empty);
        }
        Ok(trimmed.chars().take(CHAT_MESSAGE_MAX_CHARS).collect())
    }

    /// Send a message. It appears in the room when the server pushes it
    /// back, same as for everyone else.
    pub async fn send(&self, api: &ApiClient, input: &str) -> Result<(), RoomError> {
        let text = self.compose(input)?;
        api.send_message(&text).await?;
        Ok(())
    }

    pub async fn send_typing(&self, channel: &LiveChannel) -> Result<(), RoomError> {
        channel
            .emit(ClientEvent::Typing {
                username: self.me.username.clone(),
            })
            .await?;
        Ok(())
    }

    /// Delete a message (own, or any as admin). Removal arrives as a push
    /// broadcast and runs through the fade like everyone else's view.
    pub async fn delete(&self, api: &ApiClient, id: MessageId) -> Result<(), RoomError> {
        api.delete_message(id).await?;
        Ok(())
    }

    pub fn messages(&self) -> &[agora_shared::ChatMessage] {
        self.messages.items()
    }

    /// The transient presentation state of a message, if any.
    pub fn transient(&self, id: MessageId) -> Option<Transient> {
        self.overlay.state(id)
    }

    pub fn online_users(&self) -> &[String] {
        &self.online_users
    }

    pub fn typing_user(&self) -> Option<&str> {
        self.typing.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_muted(&self) -> bool {
        self.me.is_muted
    }
}
