//! The direct-message inbox: two boxes, server-side pages, optimistic
//! local mutation.
//!
//! Unlike the chat room, the inbox mutates its own state on delete and
//! mark-viewed instead of waiting for a push; the only push it consumes is
//! new incoming mail and deletions made from another device.

use thiserror::Error;
use tracing::{debug, warn};

use agora_api::{ApiClient, ApiError};
use agora_shared::limits::DMS_PER_PAGE;
use agora_shared::{DirectMessage, DmBox, DmId, ServerEvent};

use crate::sync::SyncedList;

#[derive(Error, Debug)]
pub enum InboxError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client-side state of one DM box plus the open message, if any.
pub struct InboxView {
    dm_box: DmBox,
    items: SyncedList<DirectMessage>,
    current_page: usize,
    total_pages: usize,
    total_items: usize,
    items_per_page: usize,
    open: Option<DirectMessage>,
}

impl InboxView {
    pub fn new() -> Self {
        Self {
            dm_box: DmBox::Incoming,
            items: SyncedList::new(None),
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            items_per_page: DMS_PER_PAGE,
            open: None,
        }
    }

    /// Refetch the current page of the current box.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), InboxError> {
        let page = api
            .direct_messages(self.dm_box, self.current_page, self.items_per_page)
            .await?;
        self.items.replace_all(page.items);
        self.current_page = page.current_page;
        self.total_pages = page.total_pages;
        self.total_items = page.total_items;
        Ok(())
    }

    /// Switch boxes, resetting to the first page.
    pub async fn select_box(&mut self, api: &ApiClient, dm_box: DmBox) -> Result<(), InboxError> {
        self.dm_box = dm_box;
        self.current_page = 1;
        self.open = None;
        self.refresh(api).await
    }

    /// Go to a page. Out-of-range requests clamp to the valid range, and a
    /// request for the page already shown is a no-op with no network call.
    /// Returns whether a fetch happened.
    pub async fn set_page(&mut self, api: &ApiClient, page: usize) -> Result<bool, InboxError> {
        let clamped = page.clamp(1, self.total_pages.max(1));
        if clamped == self.current_page {
            return Ok(false);
        }
        self.current_page = clamped;
        self.refresh(api).await?;
        Ok(true)
    }

    /// Fold a push event into the inbox. Returns `true` when the open
    /// detail was closed underneath the user (it was deleted remotely) and
    /// the UI should navigate back to the list.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::NewDirectMessage(dm) => {
                // New mail lands at the top of the incoming list; the
                // outgoing box only changes through the user's own sends.
                if self.dm_box == DmBox::Incoming && self.items.prepend_unique((**dm).clone()) {
                    self.total_items += 1;
                    self.items.truncate_back(self.items_per_page);
                    self.recount_pages();
                }
                false
            }
            ServerEvent::DirectMessageDeleted { id } => self.remove_locally(*id),
            other => {
                debug!(?other, "Event not for the inbox");
                false
            }
        }
    }

    /// Open a message. Unviewed incoming mail is marked viewed on the
    /// server; the local flag flips once that call succeeds, so a failed
    /// mark leaves the message unread for the next attempt.
    pub async fn open(&mut self, api: &ApiClient, id: DmId) -> Result<&DirectMessage, InboxError> {
        let mut dm = api.direct_message(id).await?;

        if self.dm_box == DmBox::Incoming && !dm.viewed {
            match api.mark_viewed(id).await {
                Ok(()) => {
                    dm.viewed = true;
                    self.items.patch_all(|listed| {
                        if listed.id == id {
                            listed.viewed = true;
                        }
                    });
                }
                Err(e) => warn!(dm = %id, error = %e, "Could not mark message viewed"),
            }
        }

        Ok(&*self.open.insert(dm))
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Delete a message: the server call first, then the local list is
    /// updated without waiting for a push echo.
    pub async fn delete(&mut self, api: &ApiClient, id: DmId) -> Result<(), InboxError> {
        api.delete_direct_message(id).await?;
        self.remove_locally(id);
        Ok(())
    }

    /// Compose a new message. Length validation happens before any network
    /// traffic, inside the API layer.
    pub async fn send(
        &self,
        api: &ApiClient,
        recipient: &str,
        subject: &str,
        content: &str,
    ) -> Result<(), InboxError> {
        api.send_direct_message(recipient, subject, content).await?;
        Ok(())
    }

    fn remove_locally(&mut self, id: DmId) -> bool {
        if self.items.remove(id) {
            self.total_items = self.total_items.saturating_sub(1);
            self.recount_pages();
        }
        if self.open.as_ref().is_some_and(|dm| dm.id == id) {
            self.open = None;
            return true;
        }
        false
    }

    fn recount_pages(&mut self) {
        self.total_pages = self.total_items.div_ceil(self.items_per_page).max(1);
    }

    pub fn dm_box(&self) -> DmBox {
        self.dm_box
    }

    pub fn messages(&self) -> &[DirectMessage] {
        self.items.items()
    }

    pub fn open_message(&self) -> Option<&DirectMessage> {
        self.open.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }
}

impl Default for InboxView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_shared::{AuthorFragment, UserId};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dm(id: i64, subject: &str, viewed: bool) -> DirectMessage {
        DirectMessage {
            id: DmId(id),
            sender: Some(AuthorFragment {
                user_id: UserId(2),
                username: "bob".into(),
                is_muted: false,
                is_banned: false,
            }),
            recipient: None,
            subject: subject.into(),
            text: "<p>hi</p>".into(),
            viewed,
            created_at: chrono::Utc::now(),
        }
    }

    fn dm_json(id: i64, viewed: bool) -> serde_json::Value {
        json!({
            "id": id,
            "Sender": { "userId": 2, "username": "bob" },
            "subject": format!("subject {id}"),
            "text": "<p>hi</p>",
            "viewed": viewed,
            "createdAt": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_refresh_loads_page_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dmessages/incoming"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [dm_json(1, false), dm_json(2, true)],
                "currentPage": 1,
                "totalPages": 3,
                "totalItems": 65
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri());
        let mut inbox = InboxView::new();
        inbox.refresh(&api).await.unwrap();

        assert_eq!(inbox.messages().len(), 2);
        assert_eq!(inbox.total_pages(), 3);
        assert_eq!(inbox.total_items(), 65);
    }

    #[tokio::test]
    async fn test_set_page_clamps_and_skips_redundant_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dmessages/incoming"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [],
                "currentPage": 1,
                "totalPages": 1,
                "totalItems": 0
            })))
            .expect(0)
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri());
        let mut inbox = InboxView::new();
        // Already on page 1; both the same page and an out-of-range request
        // that clamps to it stay off the network.
        assert!(!inbox.set_page(&api, 1).await.unwrap());
        assert!(!inbox.set_page(&api, 99).await.unwrap());
    }

    #[test]
    fn test_new_mail_prepends_and_dedupes() {
        let mut inbox = InboxView::new();
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(1, "first", false))));
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(2, "second", false))));
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(2, "second", false))));

        assert_eq!(inbox.messages().len(), 2);
        assert_eq!(inbox.messages()[0].id, DmId(2));
        assert_eq!(inbox.total_items(), 2);
    }

    #[test]
    fn test_new_mail_is_ignored_in_the_outgoing_box() {
        let mut inbox = InboxView::new();
        inbox.dm_box = DmBox::Outgoing;
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(1, "first", false))));
        assert!(inbox.messages().is_empty());
    }

    #[test]
    fn test_remote_delete_closes_open_detail() {
        let mut inbox = InboxView::new();
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(5, "hello", false))));
        inbox.open = Some(dm(5, "hello", false));

        let closed = inbox.apply(&ServerEvent::DirectMessageDeleted { id: DmId(5) });
        assert!(closed);
        assert!(inbox.open_message().is_none());
        assert!(inbox.messages().is_empty());
    }

    #[tokio::test]
    async fn test_open_marks_incoming_mail_viewed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dmessages/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dm_json(7, false)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/dmessages/7/view"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri());
        let mut inbox = InboxView::new();
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(7, "subject 7", false))));

        let opened = inbox.open(&api, DmId(7)).await.unwrap();
        assert!(opened.viewed);
        assert!(inbox.messages()[0].viewed);
    }

    #[tokio::test]
    async fn test_failed_mark_viewed_leaves_message_unread() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dmessages/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dm_json(8, false)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/dmessages/8/view"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "unavailable"
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri());
        let mut inbox = InboxView::new();
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(8, "subject 8", false))));

        // Opening still works; the viewed flag stays down until a mark
        // succeeds.
        let opened = inbox.open(&api, DmId(8)).await.unwrap();
        assert!(!opened.viewed);
        assert!(!inbox.messages()[0].viewed);
    }

    #[tokio::test]
    async fn test_delete_mutates_locally_after_server_confirms() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/dmessages/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let api = ApiClient::new(server.uri());
        let mut inbox = InboxView::new();
        inbox.apply(&ServerEvent::NewDirectMessage(Box::new(dm(3, "bye", false))));

        inbox.delete(&api, DmId(3)).await.unwrap();
        assert!(inbox.messages().is_empty());
        assert_eq!(inbox.total_items(), 0);

        // The push echo of our own delete is now a no-op.
        assert!(!inbox.apply(&ServerEvent::DirectMessageDeleted { id: DmId(3) }));
    }
}
