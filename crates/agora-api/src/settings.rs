//! Site settings endpoints (admin only). Settings are a flat list of
//! key/value entries.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingEntry {
    pub key: String,
    pub value: String,
}

impl ApiClient {
    pub async fn settings(&self) -> Result<Vec<SettingEntry>, ApiError> {
        self.get_json("settings").await
    }

    pub async fn update_settings(&self, entries: &[SettingEntry]) -> Result<(), ApiError> {
        self.put_unit("settings", &entries).await
    }
}
