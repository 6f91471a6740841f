//! Forum hierarchy endpoints: categories, subforums, topics, posts.

use serde::Deserialize;

use agora_shared::records::{Category, Page, Post, Subforum, Topic};
use agora_shared::types::{CategoryId, PostId, SubforumId, TopicId};

use crate::client::ApiClient;
use crate::error::ApiError;

/// Topic header plus one page of its posts.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicPage {
    pub topic: Topic,
    pub posts: Page<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicPostsResponse {
    topic: Topic,
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    current_page: Option<usize>,
    #[serde(default)]
    total_pages: Option<usize>,
    #[serde(default)]
    total_items: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicListResponse {
    #[serde(default)]
    subforum: Option<Subforum>,
    #[serde(default)]
    topics: Vec<Topic>,
}

impl ApiClient {
    // -- Categories and subforums --

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("forum/categories").await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        self.post_json("forum/categories", &serde_json::json!({ "name": name }))
            .await
    }

    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<(), ApiError> {
        self.put_unit(
            &format!("forum/categories/{id}"),
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.delete(&format!("forum/categories/{id}")).await
    }

    pub async fn create_subforum(
        &self,
        category: CategoryId,
        name: &str,
        description: &str,
    ) -> Result<Subforum, ApiError> {
        self.post_json(
            &format!("forum/categories/{category}/subforums"),
            &serde_json::json!({ "name": name, "description": description }),
        )
        .await
    }

    pub async fn delete_subforum(
        &self,
        category: CategoryId,
        subforum: SubforumId,
    ) -> Result<(), ApiError> {
        self.delete(&format!("forum/categories/{category}/subforums/{subforum}"))
            .await
    }

    // -- Topics --

    pub async fn topics(&self, subforum: SubforumId) -> Result<(Option<Subforum>, Vec<Topic>), ApiError> {
        let response: TopicListResponse = self.get_json(&format!("forum/topics/{subforum}")).await?;
        Ok((response.subforum, response.topics))
    }

    pub async fn create_topic(&self, subforum: SubforumId, title: &str) -> Result<Topic, ApiError> {
        self.post_json(
            &format!("forum/subforums/{subforum}/topics"),
            &serde_json::json!({ "title": title }),
        )
        .await
    }

    pub async fn rename_topic(&self, id: TopicId, title: &str) -> Result<(), ApiError> {
        self.put_unit(
            &format!("forum/topics/{id}"),
            &serde_json::json!({ "title": title }),
        )
        .await
    }

    pub async fn delete_topic(&self, id: TopicId) -> Result<(), ApiError> {
        self.delete(&format!("forum/topics/{id}")).await
    }

    // -- Posts --

    /// One page of a topic's posts plus the topic header.
    pub async fn posts(
        &self,
        topic: TopicId,
        page: usize,
        limit: usize,
    ) -> Result<TopicPage, ApiError> {
        let response: TopicPostsResponse = self
            .get_json(&format!("forum/topics/{topic}/posts?page={page}&limit={limit}"))
            .await?;

        let total_items = response.total_items.unwrap_or(response.posts.len());
        Ok(TopicPage {
            topic: response.topic,
            posts: Page {
                current_page: response.current_page.unwrap_or(page).max(1),
                total_pages: response.total_pages.unwrap_or(1).max(1),
                total_items,
                items_per_page: limit,
                items: response.posts,
            },
        })
    }

    /// Create a reply; the created post comes back so the caller can emit
    /// the corresponding socket event.
    pub async fn create_post(&self, topic: TopicId, content: &str) -> Result<Post, ApiError> {
        self.post_json(
            &format!("forum/topics/{topic}/posts"),
            &serde_json::json!({ "content": content }),
        )
        .await
    }

    pub async fn update_post(&self, id: PostId, content: &str) -> Result<(), ApiError> {
        self.put_unit(
            &format!("forum/posts/{id}"),
            &serde_json::json!({ "content": content }),
        )
        .await
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        self.delete(&format!("forum/posts/{id}")).await
    }
}
