//! Pull request event handling: maps an authenticated delivery onto
//! Pivotal Tracker story updates and a pull request description link.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::github::{PullRequest, PullRequestEditor, PullRequestEvent};
use crate::tracker::{Story, StoryState, StoryTracker, TrackerId};
use crate::webhooks::branch::extract_tracker_id;
use crate::webhooks::classifier::{classify, IgnoreReason, PullRequestAction};
use crate::webhooks::description::with_story_reference;

pub const MERGED_LABEL: &str = "merged";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    LookupStory,
    FinishStory,
    CommentOpened,
    LinkDescription,
    CommentMerged,
    LabelMerged,
}

/// Result of handling one delivery. The HTTP layer answers 200 for all of
/// these; they exist so callers and tests can see what actually happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Ignored(IgnoreReason),
    NotFound(TrackerId),
    Applied(Vec<SyncStep>),
    PartialFailure {
        completed: Vec<SyncStep>,
        failed: Vec<SyncStep>,
    },
}

impl SyncOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SyncOutcome::Ignored(_) => "ignored",
            SyncOutcome::NotFound(_) => "not_found",
            SyncOutcome::Applied(_) => "applied",
            SyncOutcome::PartialFailure { .. } => "partial_failure",
        }
    }
}

#[derive(Default)]
struct StepLog {
    completed: Vec<SyncStep>,
    failed: Vec<SyncStep>,
}

impl StepLog {
    fn record(&mut self, step: SyncStep, result: BridgeResult<()>) {
        match result {
            Ok(()) => self.completed.push(step),
            Err(e) => {
                error!("Step {:?} failed: {}", step, e);
                self.failed.push(step);
            }
        }
    }

    fn into_outcome(self) -> SyncOutcome {
        if self.failed.is_empty() {
            SyncOutcome::Applied(self.completed)
        } else {
            SyncOutcome::PartialFailure {
                completed: self.completed,
                failed: self.failed,
            }
        }
    }
}

pub struct EventRouter {
    tracker: Arc<dyn StoryTracker>,
    github: Arc<dyn PullRequestEditor>,
}

impl EventRouter {
    pub fn new(tracker: Arc<dyn StoryTracker>, github: Arc<dyn PullRequestEditor>) -> Self {
        Self { tracker, github }
    }

    /// Parses an already authenticated body and handles it.
    pub async fn handle_payload(&self, body: &[u8]) -> SyncOutcome {
        match serde_json::from_slice::<PullRequestEvent>(body).map_err(BridgeError::from) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => {
                warn!("Ignoring unparseable webhook payload: {}", e);
                SyncOutcome::Ignored(IgnoreReason::MalformedPayload)
            }
        }
    }

    pub async fn handle_event(&self, event: &PullRequestEvent) -> SyncOutcome {
        let (action, pr) = match classify(event) {
            Ok(actionable) => actionable,
            Err(reason) => {
                info!("Ignoring webhook from {}: {}", event.repo_name(), reason);
                return SyncOutcome::Ignored(reason);
            }
        };

        info!(
            "Processing {:?} PR #{} in {} (branch {})",
            action,
            pr.number,
            event.repo_name(),
            pr.head.ref_name
        );

        let Some(tracker_id) = extract_tracker_id(&pr.head.ref_name) else {
            info!("No tracker ID in branch {}", pr.head.ref_name);
            return SyncOutcome::Ignored(IgnoreReason::NoTrackerId(pr.head.ref_name.clone()));
        };

        let story = match self.tracker.fetch_story(&tracker_id).await {
            Ok(Some(story)) => story,
            Ok(None) => {
                warn!("Tracker ID {} doesn't exist in Pivotal", tracker_id);
                return SyncOutcome::NotFound(tracker_id);
            }
            Err(e) => {
                error!("Failed to look up story {}: {}", tracker_id, e);
                return SyncOutcome::PartialFailure {
                    completed: Vec::new(),
                    failed: vec![SyncStep::LookupStory],
                };
            }
        };

        match action {
            PullRequestAction::Opened => self.on_opened(&story, pr).await,
            PullRequestAction::Merged => self.on_merged(&story, pr).await,
        }
    }

    async fn on_opened(&self, story: &Story, pr: &PullRequest) -> SyncOutcome {
        let mut log = StepLog::default();

        if !story.story_type.finishes_on_open() {
            info!("Story #{} is a {:?}, leaving state alone", story.id, story.story_type);
        } else if story.current_state.is_finished_or_later() {
            info!("Story #{} already {}", story.id, story.current_state);
        } else {
            log.record(
                SyncStep::FinishStory,
                self.tracker.update_state(story, StoryState::Finished).await,
            );
        }

        let comment = format!("Opened new PR: {}", pr.html_url);
        log.record(
            SyncStep::CommentOpened,
            self.tracker.add_comment(story, &comment).await,
        );

        match with_story_reference(pr.body.as_deref(), &story.url) {
            Some(body) => log.record(
                SyncStep::LinkDescription,
                self.github.update_body(&pr.url, &body).await,
            ),
            None => info!("PR #{} already links story #{}", pr.number, story.id),
        }

        log.into_outcome()
    }

    async fn on_merged(&self, story: &Story, pr: &PullRequest) -> SyncOutcome {
        let mut log = StepLog::default();

        let comment = format!("Merged PR: {}", pr.html_url);
        log.record(
            SyncStep::CommentMerged,
            self.tracker.add_comment(story, &comment).await,
        );
        log.record(
            SyncStep::LabelMerged,
            self.tracker.add_label(story, MERGED_LABEL).await,
        );

        log.into_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::StoryType;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Fetch(String),
        State(u64, StoryState),
        Comment(u64, String),
        Label(u64, String),
        Body(String, String),
    }

    #[derive(Default)]
    struct Recorder {
        story: Option<Story>,
        fail_comments: bool,
        fail_lookup: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl Recorder {
        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoryTracker for Recorder {
        async fn fetch_story(&self, id: &TrackerId) -> BridgeResult<Option<Story>> {
            self.push(Call::Fetch(id.as_str().to_string()));
            if self.fail_lookup {
                return Err(BridgeError::TrackerError("503".to_string()));
            }
            Ok(self.story.clone())
        }

        async fn update_state(&self, story: &Story, state: StoryState) -> BridgeResult<()> {
            self.push(Call::State(story.id, state));
            Ok(())
        }

        async fn add_comment(&self, story: &Story, text: &str) -> BridgeResult<()> {
            self.push(Call::Comment(story.id, text.to_string()));
            if self.fail_comments {
                return Err(BridgeError::TrackerError("500".to_string()));
            }
            Ok(())
        }

        async fn add_label(&self, story: &Story, label: &str) -> BridgeResult<()> {
            self.push(Call::Label(story.id, label.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl PullRequestEditor for Recorder {
        async fn update_body(&self, url: &str, body: &str) -> BridgeResult<()> {
            self.push(Call::Body(url.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn story(story_type: StoryType, state: StoryState) -> Story {
        Story {
            id: 123456789,
            project_id: 42,
            story_type,
            current_state: state,
            url: "https://www.pivotaltracker.com/story/show/123456789".to_string(),
            name: None,
        }
    }

    fn event(action: &str, branch: &str, merged_at: Option<&str>) -> PullRequestEvent {
        serde_json::from_value(json!({
            "action": action,
            "pull_request": {
                "number": 5,
                "url": "https://api.github.com/repos/acme/web/pulls/5",
                "html_url": "https://github.com/acme/web/pull/5",
                "body": "Adds login.",
                "merged_at": merged_at,
                "head": { "ref": branch }
            }
        }))
        .unwrap()
    }

    fn router(recorder: &Arc<Recorder>) -> EventRouter {
        EventRouter::new(recorder.clone(), recorder.clone())
    }

    #[tokio::test]
    async fn opened_feature_is_finished_commented_and_linked() {
        let recorder = Arc::new(Recorder {
            story: Some(story(StoryType::Feature, StoryState::Started)),
            ..Default::default()
        });

        let outcome = router(&recorder)
            .handle_event(&event("opened", "feature/123456789-add-login", None))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::Applied(vec![
                SyncStep::FinishStory,
                SyncStep::CommentOpened,
                SyncStep::LinkDescription
            ])
        );
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Fetch("123456789".to_string()),
                Call::State(123456789, StoryState::Finished),
                Call::Comment(
                    123456789,
                    "Opened new PR: https://github.com/acme/web/pull/5".to_string()
                ),
                Call::Body(
                    "https://api.github.com/repos/acme/web/pulls/5".to_string(),
                    "Pivotal: https://www.pivotaltracker.com/story/show/123456789\r\n\r\nAdds login."
                        .to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn opened_chore_skips_state_transition() {
        let recorder = Arc::new(Recorder {
            story: Some(story(StoryType::Chore, StoryState::Started)),
            ..Default::default()
        });

        let outcome = router(&recorder)
            .handle_event(&event("opened", "chore/123456789-cleanup", None))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::Applied(vec![SyncStep::CommentOpened, SyncStep::LinkDescription])
        );
        assert!(!recorder
            .calls()
            .iter()
            .any(|c| matches!(c, Call::State(..))));
    }

    #[tokio::test]
    async fn already_finished_story_is_not_transitioned_again() {
        let recorder = Arc::new(Recorder {
            story: Some(story(StoryType::Bug, StoryState::Delivered)),
            ..Default::default()
        });

        router(&recorder)
            .handle_event(&event("opened", "bug/123456789", None))
            .await;

        assert!(!recorder
            .calls()
            .iter()
            .any(|c| matches!(c, Call::State(..))));
    }

    #[tokio::test]
    async fn merged_pull_request_comments_and_labels() {
        let recorder = Arc::new(Recorder {
            story: Some(story(StoryType::Release, StoryState::Finished)),
            ..Default::default()
        });

        let outcome = router(&recorder)
            .handle_event(&event("closed", "release/987654321", Some("2024-03-01T12:30:00Z")))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::Applied(vec![SyncStep::CommentMerged, SyncStep::LabelMerged])
        );
        assert_eq!(
            recorder.calls()[1..],
            [
                Call::Comment(
                    123456789,
                    "Merged PR: https://github.com/acme/web/pull/5".to_string()
                ),
                Call::Label(123456789, "merged".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn branch_without_id_makes_no_calls() {
        let recorder = Arc::new(Recorder::default());

        let outcome = router(&recorder)
            .handle_event(&event("opened", "chore/abc", None))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::Ignored(IgnoreReason::NoTrackerId("chore/abc".to_string()))
        );
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_story_stops_after_lookup() {
        let recorder = Arc::new(Recorder::default());

        let outcome = router(&recorder)
            .handle_event(&event("opened", "feature/555555555", None))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::NotFound(TrackerId::new("555555555").unwrap())
        );
        assert_eq!(recorder.calls(), vec![Call::Fetch("555555555".to_string())]);
    }

    #[tokio::test]
    async fn failed_lookup_is_reported_without_writes() {
        let recorder = Arc::new(Recorder {
            fail_lookup: true,
            ..Default::default()
        });

        let outcome = router(&recorder)
            .handle_event(&event("opened", "feature/123456789", None))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::PartialFailure {
                completed: vec![],
                failed: vec![SyncStep::LookupStory]
            }
        );
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_comment_does_not_block_label() {
        let recorder = Arc::new(Recorder {
            story: Some(story(StoryType::Feature, StoryState::Finished)),
            fail_comments: true,
            ..Default::default()
        });

        let outcome = router(&recorder)
            .handle_event(&event("closed", "feature/123456789", Some("2024-03-01T12:30:00Z")))
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::PartialFailure {
                completed: vec![SyncStep::LabelMerged],
                failed: vec![SyncStep::CommentMerged]
            }
        );
    }

    #[tokio::test]
    async fn closed_without_merge_is_ignored() {
        let recorder = Arc::new(Recorder::default());

        let outcome = router(&recorder)
            .handle_event(&event("closed", "feature/123456789", None))
            .await;

        assert_eq!(outcome, SyncOutcome::Ignored(IgnoreReason::ClosedWithoutMerge));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_ignored() {
        let recorder = Arc::new(Recorder::default());

        let outcome = router(&recorder).handle_payload(b"not json").await;

        assert_eq!(outcome, SyncOutcome::Ignored(IgnoreReason::MalformedPayload));
        assert_eq!(outcome.status(), "ignored");
    }
}
