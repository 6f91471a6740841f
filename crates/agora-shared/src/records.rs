//! Server-state records as the REST collaborator returns them.
//!
//! These are pure mirrors of server state: transient UI flags (fading,
//! just-edited, deleting) live in the client's presentation overlay, never
//! on the records themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::AuthorFragment;
use crate::types::{CategoryId, DmId, MessageId, PostId, SubforumId, TopicId, UserId};

/// A chat room message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    #[serde(rename = "User")]
    pub user: AuthorFragment,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A direct message. `text` is HTML-bearing; rendering it safely is the UI
/// layer's problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: DmId,
    #[serde(rename = "Sender", default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<AuthorFragment>,
    #[serde(rename = "Recipient", default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<AuthorFragment>,
    pub subject: String,
    pub text: String,
    #[serde(default)]
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

/// A forum category with its subforums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "Subforums", alias = "subforums", default)]
    pub subforums: Vec<Subforum>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subforum {
    pub id: SubforumId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A forum post inside a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthorFragment>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One server-side page of a collection, with the bookkeeping the paginated
/// views maintain.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_parses_server_json() {
        let json = r#"{
            "id": 101,
            "User": {"userId": 4, "username": "carol", "isMuted": false, "isBanned": false},
            "text": "hello",
            "createdAt": "2025-03-01T12:00:00Z"
        }"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, MessageId(101));
        assert_eq!(msg.user.username, "carol");
    }

    #[test]
    fn test_direct_message_sides_are_optional() {
        let json = r#"{
            "id": 7,
            "Sender": {"userId": 2, "username": "dave"},
            "subject": "hi",
            "text": "<p>hey</p>",
            "createdAt": "2025-03-01T12:00:00Z"
        }"#;
        let dm: DirectMessage = serde_json::from_str(json).unwrap();
        assert!(dm.sender.is_some());
        assert!(dm.recipient.is_none());
        assert!(!dm.viewed);
    }

    #[test]
    fn test_post_without_author_fragment() {
        let json = r#"{
            "id": 3,
            "userId": 9,
            "content": "<p>reply</p>",
            "createdAt": "2025-03-01T12:00:00Z"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.user_id, UserId(9));
        assert!(post.user.is_none());
        assert!(post.updated_at.is_none());
    }
}
