use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::github::GitHubClient;
use crate::tracker::PivotalClient;
use crate::webhooks::{self, EventRouter};

pub const LIVENESS_MESSAGE: &str = "Give me your pull requests!";

/// Shared handler state. Clients are built once at startup and handed in.
#[derive(Clone)]
pub struct AppState {
    pub webhook_secret: Arc<str>,
    pub router: Arc<EventRouter>,
}

impl AppState {
    pub fn new(webhook_secret: impl Into<Arc<str>>, router: EventRouter) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            router: Arc::new(router),
        }
    }

    /// Wires the real Pivotal Tracker and GitHub clients from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let tracker = Arc::new(PivotalClient::new(
            config.pivotal_tracker_api_token.clone(),
            config.tracker_api_url.clone(),
        ));
        let github = Arc::new(GitHubClient::new(
            config.github_oauth_token.clone(),
            config.github_user_agent.clone(),
        ));
        Self::new(
            config.webhook_secret.as_str(),
            EventRouter::new(tracker, github),
        )
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health_check))
        .route("/github", post(webhooks::github::handle_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pivotal-bridge",
        "timestamp": chrono::Utc::now()
    }))
}
