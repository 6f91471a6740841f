//! Direct-message endpoints, paginated server-side.

use serde::Deserialize;

use agora_shared::limits::DM_MAX_CHARS;
use agora_shared::records::{DirectMessage, Page};
use agora_shared::types::{DmBox, DmId};

use crate::client::ApiClient;
use crate::error::{ApiError, FieldError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DmPageResponse {
    messages: Vec<DirectMessage>,
    #[serde(default)]
    current_page: Option<usize>,
    #[serde(default)]
    total_pages: Option<usize>,
    #[serde(default)]
    total_items: Option<usize>,
}

impl ApiClient {
    /// One page of the incoming or outgoing box.
    pub async fn direct_messages(
        &self,
        dm_box: DmBox,
        page: usize,
        limit: usize,
    ) -> Result<Page<DirectMessage>, ApiError> {
        let response: DmPageResponse = self
            .get_json(&format!(
                "dmessages/{}?page={page}&limit={limit}",
                dm_box.as_path()
            ))
            .await?;

        let total_items = response.total_items.unwrap_or(response.messages.len());
        Ok(Page {
            current_page: response.current_page.unwrap_or(page).max(1),
            total_pages: response.total_pages.unwrap_or(1).max(1),
            total_items,
            items_per_page: limit,
            items: response.messages,
        })
    }

    pub async fn direct_message(&self, id: DmId) -> Result<DirectMessage, ApiError> {
        self.get_json(&format!("dmessages/{id}")).await
    }

    /// Compose a new direct message. Content is length-checked locally; an
    /// oversize body never reaches the server.
    pub async fn send_direct_message(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
    ) -> Result<(), ApiError> {
        if content.chars().count() > DM_MAX_CHARS {
            return Err(ApiError::Validation(vec![FieldError {
                field: "content".into(),
                message: format!("Message must be at most {DM_MAX_CHARS} characters"),
            }]));
        }
        self.post_unit(
            "dmessages",
            &serde_json::json!({
                "recipient": recipient,
                "subject": subject,
                "content": content,
            }),
        )
        .await
    }

    pub async fn delete_direct_message(&self, id: DmId) -> Result<(), ApiError> {
        self.delete(&format!("dmessages/{id}")).await
    }

    /// Flag a message read on the server. The inbox flips its local flag as
    /// soon as this call is issued.
    pub async fn mark_viewed(&self, id: DmId) -> Result<(), ApiError> {
        self.post_empty(&format!("dmessages/{id}/view")).await
    }
}
