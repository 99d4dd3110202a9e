use thiserror::Error;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::PayloadError(format!("JSON error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Signature verification failed: {0}")]
    SignatureError(String),

    #[error("Webhook payload error: {0}")]
    PayloadError(String),

    #[error("Pivotal Tracker API error: {0}")]
    TrackerError(String),

    #[error("GitHub API error: {0}")]
    GitHubError(String),
}

impl BridgeError {
    /// Builds the startup error for unset environment variables, one
    /// `export VAR=` hint per line.
    pub fn missing_env(vars: &[&str]) -> Self {
        let hints = vars
            .iter()
            .map(|var| format!("export {}=", var))
            .collect::<Vec<_>>()
            .join("\n");
        Self::ConfigError(format!(
            "missing required environment variables:\n{}",
            hints
        ))
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
