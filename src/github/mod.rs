pub mod client;
pub mod signature;
pub mod types;

pub use client::{GitHubClient, PullRequestEditor};
pub use types::{PullRequest, PullRequestEvent};
