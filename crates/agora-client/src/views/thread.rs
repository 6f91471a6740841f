//! A forum topic's discussion: paged posts with live updates.
//!
//! The thread mirrors the chat room's push-then-render rule for its own
//! writes: reply, edit and delete go to the REST API first, then the
//! corresponding socket event is emitted, and the local list changes only
//! when the push comes back.

use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use agora_api::{ApiClient, ApiError};
use agora_live::{ChannelError, LiveChannel};
use agora_shared::limits::{POSTS_PER_PAGE, POST_DELETE_FADE, POST_HIGHLIGHT_TTL, POST_MAX_CHARS, POST_MIN_CHARS};
use agora_shared::{ClientEvent, Identity, Post, PostId, ServerEvent, Topic, TopicId};

use crate::overlay::{Overlay, Transient};
use crate::sync::SyncedList;

#[derive(Error, Debug)]
pub enum ThreadError {
    #[error("You are muted and cannot post")]
    Muted,

    #[error("Posts must be between {POST_MIN_CHARS} and {POST_MAX_CHARS} characters")]
    Length,

    #[error("No such post in this thread")]
    UnknownPost,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Client-side state of one topic's discussion page.
pub struct ThreadView {
    topic_id: TopicId,
    topic: Option<Topic>,
    me: Identity,
    posts: SyncedList<Post>,
    current_page: usize,
    total_pages: usize,
    total_items: usize,
    items_per_page: usize,
    overlay: Overlay<PostId>,
}

impl ThreadView {
    pub fn new(topic_id: TopicId, me: Identity) -> Self {
        Self {
            topic_id,
            topic: None,
            me,
            posts: SyncedList::new(Some(POSTS_PER_PAGE)),
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            items_per_page: POSTS_PER_PAGE,
            overlay: Overlay::new(),
        }
    }

    /// Load the topic and join its socket room. Also the reconnect handler.
    pub async fn mount(
        &mut self,
        api: &ApiClient,
        channel: &LiveChannel,
    ) -> Result<(), ThreadError> {
        self.refresh(api).await?;
        channel.emit(ClientEvent::JoinTopic(self.topic_id)).await?;
        Ok(())
    }

    /// Leave the socket room on the way out.
    pub async fn unmount(&self, channel: &LiveChannel) -> Result<(), ThreadError> {
        channel.emit(ClientEvent::LeaveTopic(self.topic_id)).await?;
        Ok(())
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ThreadError> {
        let page = api
            .posts(self.topic_id, self.current_page, self.items_per_page)
            .await?;
        self.topic = Some(page.topic);
        self.posts.replace_all(page.posts.items);
        self.current_page = page.posts.current_page;
        self.total_pages = page.posts.total_pages;
        self.total_items = page.posts.total_items;
        Ok(())
    }

    /// Go to a page; same clamping and no-op rules as the inbox.
    pub async fn set_page(&mut self, api: &ApiClient, page: usize) -> Result<bool, ThreadError> {
        let clamped = page.clamp(1, self.total_pages.max(1));
        if clamped == self.current_page {
            return Ok(false);
        }
        self.current_page = clamped;
        self.refresh(api).await?;
        Ok(true)
    }

    /// Fold a push event into the thread.
    pub fn apply(&mut self, event: &ServerEvent, now: Instant) {
        match event {
            ServerEvent::NewPost(post) => {
                // The list cap silently evicts the oldest post when a full
                // page grows; the next refresh restores true paging.
                if self.posts.push_back((**post).clone()) {
                    self.total_items += 1;
                    self.recount_pages();
                    self.overlay
                        .mark(post.id, Transient::Arriving, POST_HIGHLIGHT_TTL, now);
                }
            }
            ServerEvent::PostUpdated(post) => {
                // An edit to a post outside the visible page is dropped; it
                // never inserts.
                if self.posts.replace_existing((**post).clone()) {
                    self.overlay
                        .mark(post.id, Transient::Edited, POST_HIGHLIGHT_TTL, now);
                }
            }
            ServerEvent::PostDeleted { id } => {
                if self.posts.contains(*id) {
                    self.total_items = self.total_items.saturating_sub(1);
                    self.recount_pages();
                    self.overlay.mark(*id, Transient::Fading, POST_DELETE_FADE, now);
                } else {
                    self.posts.remove(*id);
                }
            }
            ServerEvent::Moderation(update) => {
                self.posts.patch_all(|post| {
                    if let Some(author) = post.user.as_mut() {
                        update.apply_to(author);
                    }
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
            other => debug!(?other, "Event not for this thread"),
        }
    }

    /// Resolve expired transients.
    pub fn tick(&mut self, now: Instant) {
        for (id, transient) in self.overlay.take_expired(now) {
            if transient == Transient::Fading {
                self.posts.remove(id);
            }
        }
    }

    /// Validate reply text before any network traffic.
    pub fn compose_check(&self, content: &str) -> Result<(), ThreadError> {
        if self.me.is_muted {
            return Err(ThreadError::Muted);
        }
        let chars = content.trim().chars().count();
        if !(POST_MIN_CHARS..=POST_MAX_CHARS).contains(&chars) {
            return Err(ThreadError::Length);
        }
        Ok(())
    }

    /// Post a reply. The created post is emitted on the socket and rendered
    /// when the broadcast comes back.
    pub async fn reply(
        &self,
        api: &ApiClient,
        channel: &LiveChannel,
        content: &str,
    ) -> Result<(), ThreadError> {
        self.compose_check(content)?;
        let post = api.create_post(self.topic_id, content.trim()).await?;
        channel.emit(ClientEvent::NewPost(Box::new(post))).await?;
        Ok(())
    }

    /// Edit an own post (or any, as admin).
    pub async fn edit(
        &self,
        api: &ApiClient,
        channel: &LiveChannel,
        id: PostId,
        content: &str,
    ) -> Result<(), ThreadError> {
        self.compose_check(content)?;
        let mut patched = self.posts.get(id).cloned().ok_or(ThreadError::UnknownPost)?;
        api.update_post(id, content.trim()).await?;
        patched.content = content.trim().to_string();
        patched.updated_at = Some(chrono::Utc::now());
        channel.emit(ClientEvent::EditPost(Box::new(patched))).await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        api: &ApiClient,
        channel: &LiveChannel,
        id: PostId,
    ) -> Result<(), ThreadError> {
        api.delete_post(id).await?;
        channel.emit(ClientEvent::DeletePost(id)).await?;
        Ok(())
    }

    fn recount_pages(&mut self) {
        self.total_pages = self.total_items.div_ceil(self.items_per_page).max(1);
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    pub fn posts(&self) -> &[Post] {
        self.posts.items()
    }

    pub fn transient(&self, id: PostId) -> Option<Transient> {
        self.overlay.state(id)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn is_muted(&self) -> bool {
        self.me.is_muted
    }
}
