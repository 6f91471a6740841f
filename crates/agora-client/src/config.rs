//! Client configuration loaded from environment variables.
//!
//! Both endpoints default to a local development server so the client runs
//! with zero configuration.

/// Where the client connects.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    /// Env: `AGORA_API_URL`
    /// Default: `http://localhost:5000`
    pub api_url: String,

    /// WebSocket endpoint of the live channel.
    /// Env: `AGORA_WS_URL`
    /// Default: derived from `api_url` (`http` → `ws`).
    pub ws_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api_url = "http://localhost:5000".to_string();
        let ws_url = derive_ws_url(&api_url);
        Self { api_url, ws_url }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("AGORA_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.ws_url = derive_ws_url(&url);
                config.api_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid AGORA_API_URL, using default");
            }
        }

        if let Ok(url) = std::env::var("AGORA_WS_URL") {
            if url.starts_with("ws://") || url.starts_with("wss://") {
                config.ws_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid AGORA_WS_URL, using default");
            }
        }

        config
    }
}

fn derive_ws_url(api_url: &str) -> String {
    let stripped = api_url.trim_end_matches('/');
    if let Some(rest) = stripped.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = stripped.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        stripped.to_string()
    }
}
