//! Session lifecycle: restore, login, logout, and forced teardown.
//!
//! The guard owns the credential, the authenticated [`ApiClient`] and the
//! [`LiveChannel`]. The channel exists exactly as long as a session does;
//! every path out of a session goes through [`SessionGuard::logout`].

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use agora_api::{ApiClient, ApiError};
use agora_live::{spawn_channel, ChannelConfig, LiveChannel};
use agora_shared::{Credential, CredentialError, Identity, ModerationAction, ServerEvent};

use crate::config::ClientConfig;
use crate::storage::{Storage, StorageError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Server issued an unusable token: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a session ended. Everything except `UserRequested` is imposed by
/// the server (or the clock) and is surfaced to the user on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The credential reached its expiry while the client was running.
    Expired,
    Kicked { reason: Option<String> },
    Banned { reason: Option<String> },
    /// The same account authenticated from another connection.
    LoggedInElsewhere,
}

struct ActiveSession {
    credential: Credential,
    identity: Identity,
    channel: LiveChannel,
}

/// Owns authentication state for the whole client.
pub struct SessionGuard {
    config: ClientConfig,
    api: ApiClient,
    storage: Storage,
    session: Option<ActiveSession>,
}

impl SessionGuard {
    pub fn new(config: ClientConfig, storage: Storage) -> Self {
        let api = ApiClient::new(config.api_url.clone());
        Self {
            config,
            api,
            storage,
            session: None,
        }
    }

    /// Try to resume the session persisted from a previous run.
    ///
    /// A missing, malformed or expired stored token resolves to `Ok(None)`
    /// without any network traffic; the token is cleared so the next start
    /// does not retry it. A token the server rejects is cleared too.
    pub async fn restore(&mut self) -> Result<Option<&Identity>, SessionError> {
        let Some(token) = self.storage.token().map(str::to_owned) else {
            return Ok(None);
        };

        let credential = match Credential::parse(&token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable stored token");
                self.storage.set_token(None)?;
                return Ok(None);
            }
        };
        if credential.is_expired(Utc::now()) {
            info!(username = %credential.username(), "Stored token expired, discarding");
            self.storage.set_token(None)?;
            return Ok(None);
        }

        match self.activate(credential).await {
            Ok(()) => Ok(self.identity()),
            Err(e) => {
                warn!(error = %e, "Stored token rejected by server, discarding");
                self.api.set_token(None);
                self.storage.set_token(None)?;
                Ok(None)
            }
        }
    }

    /// Authenticate with username and password.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        captcha_token: Option<&str>,
    ) -> Result<&Identity, SessionError> {
        let token = self.api.login(username, password, captcha_token).await?;
        let credential = Credential::parse(&token)?;
        self.activate(credential).await?;
        // Guaranteed by activate, but keep the signature honest.
        self.identity().ok_or(SessionError::Credential(CredentialError::MissingClaims))
    }

    /// Common tail of restore and login: confirm the credential against the
    /// server, open the live channel, persist the token.
    async fn activate(&mut self, credential: Credential) -> Result<(), SessionError> {
        self.api.set_token(Some(credential.token().to_string()));
        let identity = self.api.current_user().await?;

        if let Some(previous) = self.session.take() {
            previous.channel.shutdown().await;
        }

        let channel = spawn_channel(ChannelConfig::new(
            self.config.ws_url.clone(),
            credential.token(),
            identity.username.clone(),
        ));

        self.storage.set_token(Some(credential.token().to_string()))?;

        info!(username = %identity.username, user_id = %identity.id, "Session established");
        self.session = Some(ActiveSession {
            credential,
            identity,
            channel,
        });
        Ok(())
    }

    /// End the session. The live channel is closed and the stored token
    /// cleared before this returns; the server-side logout call is
    /// fire-and-forget and only made for a user-requested logout.
    pub async fn logout(&mut self, reason: LogoutReason) -> Result<(), SessionError> {
        if self.session.is_none() {
            return Ok(());
        }

        if reason == LogoutReason::UserRequested {
            let api = self.api.clone();
            tokio::spawn(async move {
                if let Err(e) = api.logout().await {
                    warn!(error = %e, "Server-side logout failed");
                }
            });
        }

        self.api.set_token(None);
        self.storage.set_token(None)?;

        if let Some(session) = self.session.take() {
            info!(username = %session.identity.username, ?reason, "Session ended");
            session.channel.shutdown().await;
        }
        Ok(())
    }

    /// Map a push event onto a forced logout, if it is one.
    ///
    /// `Kicked`, `ForceLogout` and `Banned` are addressed to this
    /// connection. A broadcast moderation ban naming the current user ends
    /// the session too; callers pass the returned reason to
    /// [`logout`](Self::logout).
    pub fn forced_logout(&self, event: &ServerEvent) -> Option<LogoutReason> {
        let session = self.session.as_ref()?;
        match event {
            ServerEvent::Kicked { reason } => Some(LogoutReason::Kicked {
                reason: reason.clone(),
            }),
            ServerEvent::ForceLogout => Some(LogoutReason::LoggedInElsewhere),
            ServerEvent::Banned { reason, .. } => Some(LogoutReason::Banned {
                reason: reason.clone(),
            }),
            ServerEvent::Moderation(update)
                if update.user_id == session.identity.id
                    && update.action == ModerationAction::Banned =>
            {
                Some(LogoutReason::Banned {
                    reason: update.reason.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    /// The live channel for the current session, for views to subscribe
    /// and emit on.
    pub fn channel(&self) -> Option<&LiveChannel> {
        self.session.as_ref().map(|s| &s.channel)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Time until the credential expires; drives the embedding
    /// application's expiry timer ([`LogoutReason::Expired`]).
    pub fn time_to_expiry(&self) -> Option<std::time::Duration> {
        self.session
            .as_ref()
            .and_then(|s| s.credential.time_to_expiry(Utc::now()))
    }

    pub fn dark_mode(&self) -> bool {
        self.storage.dark_mode()
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) -> Result<(), StorageError> {
        self.storage.set_dark_mode(dark_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_token(id: i64, username: &str, exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"id":{id},"username":"{username}","exp":{exp}}}"#
        ));
        format!("{header}.{payload}.sig")
    }

    fn storage_at(name: &str) -> Storage {
        let path = std::env::temp_dir().join(format!(
            "agora-session-{name}-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Storage::open(path).unwrap()
    }

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            api_url: server.uri(),
            // Unroutable; the channel task retries in the background and is
            // torn down by logout.
            ws_url: "ws://127.0.0.1:9".into(),
        }
    }

    #[tokio::test]
    async fn test_restore_without_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut guard = SessionGuard::new(config_for(&server), storage_at("no-token"));
        assert!(guard.restore().await.unwrap().is_none());
        assert!(!guard.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_discards_expired_token_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut storage = storage_at("expired");
        storage
            .set_token(Some(make_token(1, "alice", 1_000_000_000)))
            .unwrap();

        let mut guard = SessionGuard::new(config_for(&server), storage);
        assert!(guard.restore().await.unwrap().is_none());
        assert_eq!(guard.api().base_url(), server.uri());
    }

    #[tokio::test]
    async fn test_restore_with_valid_token_establishes_session() {
        let server = MockServer::start().await;
        let token = make_token(7, "alice", 4_102_444_800);
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .and(header("authorization", format!("Bearer {token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "username": "alice",
                "roles": ["member"],
                "isMuted": false,
                "isBanned": false
            })))
            .mount(&server)
            .await;

        let mut storage = storage_at("valid");
        storage.set_token(Some(token)).unwrap();

        let mut guard = SessionGuard::new(config_for(&server), storage);
        let identity = guard.restore().await.unwrap().cloned().unwrap();
        assert_eq!(identity.username, "alice");
        assert!(guard.is_authenticated());
        assert!(guard.channel().is_some());
        assert!(guard.time_to_expiry().is_some());

        guard.logout(LogoutReason::UserRequested).await.unwrap();
        assert!(!guard.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_clears_token_the_server_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid token"
            })))
            .mount(&server)
            .await;

        let mut storage = storage_at("rejected");
        storage
            .set_token(Some(make_token(1, "alice", 4_102_444_800)))
            .unwrap();

        let mut guard = SessionGuard::new(config_for(&server), storage);
        assert!(guard.restore().await.unwrap().is_none());
        assert!(!guard.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_persists_token_and_forced_logout_maps_events() {
        let server = MockServer::start().await;
        let token = make_token(3, "bob", 4_102_444_800);
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "token": token })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3,
                "username": "bob"
            })))
            .mount(&server)
            .await;

        let mut guard = SessionGuard::new(config_for(&server), storage_at("login"));
        let identity = guard.login("bob", "hunter22", None).await.unwrap().clone();
        assert_eq!(identity.id, agora_shared::UserId(3));

        assert_eq!(
            guard.forced_logout(&ServerEvent::ForceLogout),
            Some(LogoutReason::LoggedInElsewhere)
        );
        assert_eq!(
            guard.forced_logout(&ServerEvent::Kicked {
                reason: Some("spam".into())
            }),
            Some(LogoutReason::Kicked {
                reason: Some("spam".into())
            })
        );
        // Broadcast moderation targeting someone else is not a teardown.
        assert_eq!(
            guard.forced_logout(&ServerEvent::Moderation(agora_shared::ModerationUpdate {
                user_id: agora_shared::UserId(99),
                action: ModerationAction::Banned,
                reason: None,
                expires_at: None,
            })),
            None
        );
        // One naming the current user is.
        assert!(matches!(
            guard.forced_logout(&ServerEvent::Moderation(agora_shared::ModerationUpdate {
                user_id: agora_shared::UserId(3),
                action: ModerationAction::Banned,
                reason: Some("rules".into()),
                expires_at: None,
            })),
            Some(LogoutReason::Banned { .. })
        ));

        guard.logout(LogoutReason::UserRequested).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_when_not_authenticated_is_a_no_op() {
        let server = MockServer::start().await;
        let mut guard = SessionGuard::new(config_for(&server), storage_at("noop"));
        guard.logout(LogoutReason::Expired).await.unwrap();
        assert!(!guard.is_authenticated());
    }
}
