pub mod config;
pub mod error;
pub mod github;
pub mod server;
pub mod tracker;
pub mod webhooks;

pub use error::BridgeError;
