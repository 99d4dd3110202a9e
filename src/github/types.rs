use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `pull_request` webhook delivery. Only the fields the bridge reads are
/// modelled; everything else in the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    #[serde(default)]
    pub action: String,
    pub pull_request: Option<PullRequest>,
    pub repository: Option<Repository>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub number: u64,
    /// API url, target of the description PATCH.
    pub url: String,
    pub html_url: String,
    pub body: Option<String>,
    pub head: BranchRef,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

impl PullRequestEvent {
    pub fn repo_name(&self) -> &str {
        self.repository
            .as_ref()
            .map(|r| r.full_name.as_str())
            .unwrap_or("unknown")
    }
}
