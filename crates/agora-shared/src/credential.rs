//! Bearer credential with locally decodable identity claims.
//!
//! The token is a JWT issued by the server. The client never verifies the
//! signature (it has no key and the server is the authority on every call);
//! it only decodes the payload to learn who the token claims to be and when
//! it expires, so expiry can be enforced locally without a round trip.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::error::CredentialError;
use crate::types::UserId;

/// Identity claims embedded in the token payload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Claims {
    pub id: UserId,
    pub username: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

/// An opaque bearer token plus its decoded claims.
///
/// Exactly one valid credential exists per client session; parsing a new one
/// is how the session guard invalidates the previous.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    token: String,
    claims: Claims,
}

impl Credential {
    /// Decode a raw token. Fails closed: anything that is not a three-part
    /// JWT with a JSON payload carrying `id`, `username` and `exp` is
    /// rejected.
    pub fn parse(token: &str) -> Result<Self, CredentialError> {
        let mut parts = token.split('.');
        let (_header, payload) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(_sig), None) if !h.is_empty() && !p.is_empty() => (h, p),
            _ => return Err(CredentialError::Malformed),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| CredentialError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&bytes).map_err(|_| CredentialError::MissingClaims)?;

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    /// The raw token, for `Authorization: Bearer` headers and the live
    /// channel auth frame.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> UserId {
        self.claims.id
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        // exp values outside chrono's representable range collapse to the
        // epoch, which reads as long expired.
        Utc.timestamp_opt(self.claims.exp, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }

    /// Time left until expiry, or `None` when already expired. Drives the
    /// session guard's local teardown timer.
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at() - now;
        remaining.to_std().ok().filter(|d| !d.is_zero())
    }
}
