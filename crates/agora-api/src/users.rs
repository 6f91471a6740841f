//! User and profile endpoints.

use serde::Deserialize;

use agora_shared::identity::Identity;
use agora_shared::records::Page;
use agora_shared::types::UserId;

use crate::client::ApiClient;
use crate::error::ApiError;

/// A row in the admin user listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_banned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserListResponse {
    users: Vec<UserSummary>,
    #[serde(default)]
    current_page: Option<usize>,
    #[serde(default)]
    total_pages: Option<usize>,
    #[serde(default)]
    total_items: Option<usize>,
}

impl ApiClient {
    /// Confirm the current credential's identity. This is the call the
    /// session guard fails closed on.
    pub async fn current_user(&self) -> Result<Identity, ApiError> {
        self.get_json("user").await
    }

    pub async fn user(&self, id: UserId) -> Result<Identity, ApiError> {
        self.get_json(&format!("user/{id}")).await
    }

    pub async fn list_users(
        &self,
        page: usize,
        limit: usize,
        search: &str,
    ) -> Result<Page<UserSummary>, ApiError> {
        let response: UserListResponse = self
            .get_json(&format!(
                "user/list?page={page}&limit={limit}&search={search}"
            ))
            .await?;

        let total_items = response.total_items.unwrap_or(response.users.len());
        Ok(Page {
            current_page: response.current_page.unwrap_or(page).max(1),
            total_pages: response.total_pages.unwrap_or(1).max(1),
            total_items,
            items_per_page: limit,
            items: response.users,
        })
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.post_unit(
            "user/change-password",
            &serde_json::json!({
                "oldPassword": old_password,
                "newPassword": new_password,
            }),
        )
        .await
    }
}
