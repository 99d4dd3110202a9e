pub mod branch;
pub mod classifier;
pub mod description;
pub mod github;
pub mod pull_request;

pub use pull_request::{EventRouter, SyncOutcome, SyncStep};
