//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use axum::{body::Body, http::Request};
use serde_json::{json, Value};

use pivotal_bridge::github::signature::{sign, SIGNATURE_HEADER};

pub const SECRET: &str = "test-webhook-secret";
pub const STORY_URL: &str = "https://www.pivotaltracker.com/story/show/123456789";

/// Pull request delivery whose API url points at `api_base`.
pub fn pull_request_payload(
    api_base: &str,
    action: &str,
    branch: &str,
    merged_at: Option<&str>,
) -> Value {
    json!({
        "action": action,
        "number": 5,
        "pull_request": {
            "number": 5,
            "url": format!("{}/repos/acme/web/pulls/5", api_base),
            "html_url": "https://github.com/acme/web/pull/5",
            "body": "Adds the login form.",
            "merged_at": merged_at,
            "head": { "ref": branch, "sha": "abc123def456" },
            "base": { "ref": "main", "sha": "def456abc123" }
        },
        "repository": { "full_name": "acme/web", "name": "web" }
    })
}

pub fn story_json(id: u64, story_type: &str, state: &str) -> Value {
    json!({
        "kind": "story",
        "id": id,
        "project_id": 42,
        "name": "Add login",
        "story_type": story_type,
        "current_state": state,
        "url": format!("https://www.pivotaltracker.com/story/show/{}", id)
    })
}

/// `POST /github` signed with [`SECRET`].
pub fn signed_request(payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).unwrap();
    let signature = sign(SECRET, &body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/github")
        .header("Content-Type", "application/json")
        .header("X-GitHub-Event", "pull_request")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap()
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn response_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
