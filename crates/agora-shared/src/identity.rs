//! Server-confirmed user profiles and the moderation flags projected onto
//! cached records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// The server-confirmed profile resolved from a credential.
///
/// Read-only from the client's perspective: it is refreshed by re-fetching
/// `/api/user`, never mutated locally (moderation pushes addressed to the
/// current user are tracked by the session, not written back here).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_banned: bool,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

/// The author object embedded in message and post records (the `User` field
/// in the server's JSON). Carries a snapshot of the author's moderation
/// flags taken when the record was fetched; push events patch it in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorFragment {
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_banned: bool,
}

/// What a moderation push event did to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Muted,
    Unmuted,
    Banned,
    Unbanned,
}

/// A moderation push event, normalized across the four event names.
///
/// Applied incrementally to every cached record whose author matches; there
/// is no bulk fetch, so moderation state stays unknown for users with no
/// visible records.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationUpdate {
    pub user_id: UserId,
    pub action: ModerationAction,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ModerationUpdate {
    /// Patch an author fragment in place if it belongs to the affected user.
    /// Returns whether the fragment matched.
    pub fn apply_to(&self, author: &mut AuthorFragment) -> bool {
        if author.user_id != self.user_id {
            return false;
        }
        match self.action {
            ModerationAction::Muted => author.is_muted = true,
            ModerationAction::Unmuted => author.is_muted = false,
            ModerationAction::Banned => author.is_banned = true,
            ModerationAction::Unbanned => author.is_banned = false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: i64) -> AuthorFragment {
        AuthorFragment {
            user_id: UserId(id),
            username: format!("user{id}"),
            is_muted: false,
            is_banned: false,
        }
    }

    #[test]
    fn test_is_admin() {
        let mut identity = Identity {
            id: UserId(1),
            username: "mod".into(),
            roles: vec!["user".into()],
            is_muted: false,
            is_banned: false,
        };
        assert!(!identity.is_admin());

        identity.roles.push("admin".into());
        assert!(identity.is_admin());
    }

    #[test]
    fn test_moderation_applies_only_to_matching_author() {
        let update = ModerationUpdate {
            user_id: UserId(7),
            action: ModerationAction::Banned,
            reason: Some("spam".into()),
            expires_at: None,
        };

        let mut other = author(3);
        assert!(!update.apply_to(&mut other));
        assert!(!other.is_banned);

        let mut target = author(7);
        assert!(update.apply_to(&mut target));
        assert!(target.is_banned);
    }

    #[test]
    fn test_unmute_clears_flag() {
        let mut target = author(5);
        target.is_muted = true;

        let update = ModerationUpdate {
            user_id: UserId(5),
            action: ModerationAction::Unmuted,
            reason: None,
            expires_at: None,
        };
        update.apply_to(&mut target);
        assert!(!target.is_muted);
    }

    #[test]
    fn test_author_fragment_parses_server_json() {
        let json = r#"{"userId": 12, "username": "alice", "isMuted": true}"#;
        let author: AuthorFragment = serde_json::from_str(json).unwrap();
        assert_eq!(author.user_id, UserId(12));
        assert!(author.is_muted);
        assert!(!author.is_banned);
    }
}
