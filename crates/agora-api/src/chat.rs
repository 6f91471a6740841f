//! Chat room endpoints. The room renders its own sends when the push event
//! loops back, so sending returns nothing.

use agora_shared::records::ChatMessage;
use agora_shared::types::MessageId;

use crate::client::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    /// The most recent page of chat history.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>, ApiError> {
        self.get_json("messages").await
    }

    pub async fn send_message(&self, text: &str) -> Result<(), ApiError> {
        self.post_unit("messages", &serde_json::json!({ "text": text }))
            .await
    }

    pub async fn delete_message(&self, id: MessageId) -> Result<(), ApiError> {
        self.delete(&format!("messages/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_and_send_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 1,
                "User": {"userId": 2, "username": "eve"},
                "text": "hi",
                "createdAt": "2025-03-01T10:00:00Z"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .and(body_json(serde_json::json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let messages = client.messages().await.unwrap();
        assert_eq!(messages.len(), 1);
        client.send_message("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_message_hits_id_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/messages/7"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        client.delete_message(MessageId(7)).await.unwrap();
    }
}
