//! Moderation and role-management endpoints. Authorization is enforced by
//! the server; these calls simply fail with 403 for non-admins.

use serde::{Deserialize, Serialize};

use agora_shared::types::UserId;

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct SanctionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    /// Minutes; `None` means permanent.
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl ApiClient {
    pub async fn mute_user(
        &self,
        user: UserId,
        reason: Option<&str>,
        duration: Option<u32>,
    ) -> Result<(), ApiError> {
        self.post_unit(
            &format!("admin/mute/{user}"),
            &SanctionRequest { reason, duration },
        )
        .await
    }

    pub async fn unmute_user(&self, user: UserId) -> Result<(), ApiError> {
        self.post_empty(&format!("admin/unmute/{user}")).await
    }

    pub async fn ban_user(
        &self,
        user: UserId,
        reason: Option<&str>,
        duration: Option<u32>,
    ) -> Result<(), ApiError> {
        self.post_unit(
            &format!("admin/ban/{user}"),
            &SanctionRequest { reason, duration },
        )
        .await
    }

    pub async fn unban_user(&self, user: UserId) -> Result<(), ApiError> {
        self.post_empty(&format!("admin/unban/{user}")).await
    }

    pub async fn kick_user(&self, user: UserId) -> Result<(), ApiError> {
        self.post_empty(&format!("admin/kick/{user}")).await
    }

    pub async fn roles(&self) -> Result<Vec<Role>, ApiError> {
        self.get_json("admin/roles").await
    }

    pub async fn create_role(&self, name: &str) -> Result<Role, ApiError> {
        self.post_json("admin/roles", &serde_json::json!({ "name": name }))
            .await
    }

    pub async fn set_user_roles(&self, user: UserId, roles: &[String]) -> Result<(), ApiError> {
        self.post_unit(
            &format!("admin/users/{user}/roles"),
            &serde_json::json!({ "roles": roles }),
        )
        .await
    }

    pub async fn set_user_status(&self, user: UserId, status: &str) -> Result<(), ApiError> {
        self.post_unit(
            &format!("admin/users/{user}/status"),
            &serde_json::json!({ "status": status }),
        )
        .await
    }
}
