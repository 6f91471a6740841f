//! Login, registration and session management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_shared::limits::PASSWORD_MIN_CHARS;

use crate::client::ApiClient;
use crate::error::{ApiError, FieldError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    captcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Registration form. The captcha, if the site requires one, is verified by
/// the server; the token is carried opaquely.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub gender: String,
    pub birthdate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

impl RegisterRequest {
    /// Pre-flight checks mirrored from the registration form: anything
    /// caught here never reaches the server.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            errors.push(FieldError {
                field: "password".into(),
                message: format!(
                    "Password must be at least {PASSWORD_MIN_CHARS} characters long"
                ),
            });
        }
        if self.password != self.confirm_password {
            errors.push(FieldError {
                field: "confirmPassword".into(),
                message: "Passwords do not match".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// An active server-side session, as listed by `/api/auth/sessions`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: i64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ApiClient {
    /// Exchange credentials for a bearer token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> Result<String, ApiError> {
        let response: TokenResponse = self
            .post_json(
                "auth/login",
                &LoginRequest {
                    username,
                    password,
                    captcha_token,
                },
            )
            .await?;
        Ok(response.token)
    }

    /// Register a new account. Runs the client-side checks first; the call
    /// is skipped entirely when they fail.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        request.validate().map_err(ApiError::Validation)?;
        self.post_unit("auth/register", request).await
    }

    /// Tell the server to drop this session. Callers treat the outcome as
    /// best-effort: local teardown never waits on it.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_empty("auth/logout").await
    }

    pub async fn sessions(&self) -> Result<Vec<SessionInfo>, ApiError> {
        self.get_json("auth/sessions").await
    }

    pub async fn revoke_session(&self, id: i64) -> Result<(), ApiError> {
        self.post_unit("auth/sessions/revoke", &serde_json::json!({ "id": id }))
            .await
    }
}
