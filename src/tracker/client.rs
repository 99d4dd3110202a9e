//! Pivotal Tracker v5 REST client.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::tracker::types::{Story, StoryState, TrackerId};

const TOKEN_HEADER: &str = "X-TrackerToken";

#[async_trait]
pub trait StoryTracker: Send + Sync {
    /// `Ok(None)` when the tracker has no story with this id.
    async fn fetch_story(&self, id: &TrackerId) -> BridgeResult<Option<Story>>;
    async fn update_state(&self, story: &Story, state: StoryState) -> BridgeResult<()>;
    async fn add_comment(&self, story: &Story, text: &str) -> BridgeResult<()>;
    async fn add_label(&self, story: &Story, label: &str) -> BridgeResult<()>;
}

pub struct PivotalClient {
    http: Client,
    base_url: String,
    token: String,
}

impl PivotalClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn story_endpoint(&self, story: &Story) -> String {
        format!(
            "{}/projects/{}/stories/{}",
            self.base_url, story.project_id, story.id
        )
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        request: reqwest::RequestBuilder,
        body: &T,
    ) -> BridgeResult<Response> {
        request
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| BridgeError::TrackerError(format!("failed to call Pivotal Tracker: {}", e)))
    }

    async fn ensure_success(response: Response, what: &str) -> BridgeResult<()> {
        let status = response.status();
        info!("{} -> {}", what, status);
        if status.is_success() {
            return Ok(());
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        warn!("Pivotal Tracker rejected {}: {}", what, text);
        Err(BridgeError::TrackerError(format!(
            "Pivotal Tracker responded with {}: {}",
            status, text
        )))
    }
}

#[async_trait]
impl StoryTracker for PivotalClient {
    async fn fetch_story(&self, id: &TrackerId) -> BridgeResult<Option<Story>> {
        let url = format!("{}/stories/{}", self.base_url, id.as_str());
        debug!("Fetching story {}", id);

        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| BridgeError::TrackerError(format!("failed to call Pivotal Tracker: {}", e)))?;

        let status = response.status();
        info!("GET story {} -> {}", id, status);

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(BridgeError::TrackerError(format!(
                "Pivotal Tracker responded with {}: {}",
                status, text
            )));
        }

        let story = response.json::<Story>().await.map_err(|e| {
            BridgeError::TrackerError(format!("failed to parse story {}: {}", id, e))
        })?;
        Ok(Some(story))
    }

    async fn update_state(&self, story: &Story, state: StoryState) -> BridgeResult<()> {
        let request = self.http.put(self.story_endpoint(story));
        let response = self
            .send_json(request, &json!({ "current_state": state }))
            .await?;
        Self::ensure_success(response, &format!("state update of story #{}", story.id)).await
    }

    async fn add_comment(&self, story: &Story, text: &str) -> BridgeResult<()> {
        let request = self
            .http
            .post(format!("{}/comments", self.story_endpoint(story)));
        let response = self.send_json(request, &json!({ "text": text })).await?;
        Self::ensure_success(response, &format!("comment on story #{}", story.id)).await
    }

    async fn add_label(&self, story: &Story, label: &str) -> BridgeResult<()> {
        let request = self
            .http
            .post(format!("{}/labels", self.story_endpoint(story)));
        let response = self.send_json(request, &json!({ "name": label })).await?;
        Self::ensure_success(response, &format!("label on story #{}", story.id)).await
    }
}
