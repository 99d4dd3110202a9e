use serde::{Deserialize, Serialize};
use std::fmt;

/// Pivotal Tracker story id as found in a branch name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackerId(String);

impl TrackerId {
    /// Wraps an all-digit string. Returns `None` for anything else.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(id))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    Feature,
    Bug,
    Chore,
    Release,
}

impl StoryType {
    /// Only estimable work moves to `finished` when a pull request opens.
    pub fn finishes_on_open(&self) -> bool {
        matches!(self, StoryType::Feature | StoryType::Bug)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    Unscheduled,
    Unstarted,
    Planned,
    Started,
    Finished,
    Delivered,
    Accepted,
    Rejected,
}

impl StoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Unscheduled => "unscheduled",
            StoryState::Unstarted => "unstarted",
            StoryState::Planned => "planned",
            StoryState::Started => "started",
            StoryState::Finished => "finished",
            StoryState::Delivered => "delivered",
            StoryState::Accepted => "accepted",
            StoryState::Rejected => "rejected",
        }
    }

    /// True once the story has reached `finished` or moved past it.
    pub fn is_finished_or_later(&self) -> bool {
        matches!(
            self,
            StoryState::Finished | StoryState::Delivered | StoryState::Accepted
        )
    }
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub project_id: u64,
    pub story_type: StoryType,
    pub current_state: StoryState,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}
