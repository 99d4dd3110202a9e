use async_trait::async_trait;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
    Client,
};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{BridgeError, BridgeResult};

/// Write access to pull requests on the hosting service.
#[async_trait]
pub trait PullRequestEditor: Send + Sync {
    /// Replaces the description of the pull request at `pull_request_url`
    /// (its API url, not the html one).
    async fn update_body(&self, pull_request_url: &str, body: &str) -> BridgeResult<()>;
}

pub struct GitHubClient {
    http: Client,
    oauth_token: String,
    user_agent: String,
}

impl GitHubClient {
    pub fn new(oauth_token: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            oauth_token: oauth_token.into(),
            user_agent: user_agent.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.oauth_token)
    }
}

#[async_trait]
impl PullRequestEditor for GitHubClient {
    async fn update_body(&self, pull_request_url: &str, body: &str) -> BridgeResult<()> {
        let response = self
            .http
            .patch(pull_request_url)
            .header(AUTHORIZATION, self.auth_header())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| BridgeError::GitHubError(format!("failed to call GitHub: {}", e)))?;

        let status = response.status();
        info!("PATCH {} -> {}", pull_request_url, status);

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            warn!("GitHub rejected description update: {}", text);
            return Err(BridgeError::GitHubError(format!(
                "GitHub responded with {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}
