use std::fmt;

use crate::github::{PullRequest, PullRequestEvent};

/// Why a delivery produced no tracker activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    MalformedPayload,
    MissingPullRequest,
    UnsupportedAction(String),
    ClosedWithoutMerge,
    NoTrackerId(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::MalformedPayload => write!(f, "payload is not a pull request event"),
            IgnoreReason::MissingPullRequest => write!(f, "no pull_request in payload"),
            IgnoreReason::UnsupportedAction(action) => write!(f, "action {:?} not handled", action),
            IgnoreReason::ClosedWithoutMerge => write!(f, "closed without merge"),
            IgnoreReason::NoTrackerId(branch) => write!(f, "no tracker ID in branch {}", branch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Merged,
}

/// Decides whether a delivery is actionable and how.
pub fn classify(event: &PullRequestEvent) -> Result<(PullRequestAction, &PullRequest), IgnoreReason> {
    let pr = event
        .pull_request
        .as_ref()
        .ok_or(IgnoreReason::MissingPullRequest)?;

    match event.action.as_str() {
        "opened" => Ok((PullRequestAction::Opened, pr)),
        "closed" if pr.merged_at.is_some() => Ok((PullRequestAction::Merged, pr)),
        "closed" => Err(IgnoreReason::ClosedWithoutMerge),
        other => Err(IgnoreReason::UnsupportedAction(other.to_string())),
    }
}
