use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{BridgeError, BridgeResult};

pub const DEFAULT_TRACKER_API_URL: &str = "https://www.pivotaltracker.com/services/v5";
pub const DEFAULT_USER_AGENT: &str = "pivotal-bridge";

const REQUIRED_VARS: [&str; 3] = [
    "PIVOTAL_TRACKER_API_TOKEN",
    "SECRET_TOKEN",
    "GITHUB_OAUTH_TOKEN",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub pivotal_tracker_api_token: String,
    pub webhook_secret: String,
    pub github_oauth_token: String,
    pub tracker_api_url: String,
    pub github_user_agent: String,
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn load() -> BridgeResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> BridgeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BridgeError::missing_env(&missing));
        }

        let server_port = match get("SERVER_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                BridgeError::ConfigError(format!("Invalid SERVER_PORT {:?}: {}", raw, e))
            })?,
            None => 4567,
        };

        Ok(AppConfig {
            pivotal_tracker_api_token: get("PIVOTAL_TRACKER_API_TOKEN").unwrap_or_default(),
            webhook_secret: get("SECRET_TOKEN").unwrap_or_default(),
            github_oauth_token: get("GITHUB_OAUTH_TOKEN").unwrap_or_default(),
            tracker_api_url: get("PIVOTAL_TRACKER_API_URL")
                .unwrap_or_else(|| DEFAULT_TRACKER_API_URL.to_string()),
            github_user_agent: get("GITHUB_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
