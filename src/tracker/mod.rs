//! Pivotal Tracker side of the bridge: story model and REST client.

pub mod client;
pub mod types;

pub use client::{PivotalClient, StoryTracker};
pub use types::{Story, StoryState, StoryType, TrackerId};
