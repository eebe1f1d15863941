//! Progress-updated notifications.
//!
//! Fired after every successful advance so that views rendering unlock
//! state can recompute it instead of caching a stale answer.

use readquest_core::ids::{LearnerId, StoryId};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::aggregates::ProgressRecord;

const DEFAULT_CAPACITY: usize = 64;

/// Broadcast payload describing the record after an advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressUpdated {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Level after the advance.
    pub current_level: u32,
    /// Step after the advance.
    pub current_step: u32,
    /// Highest finished level after the advance.
    pub completed_level: u32,
}

impl From<&ProgressRecord> for ProgressUpdated {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            learner_id: record.learner_id,
            story_id: record.story_id,
            current_level: record.current_level,
            current_step: record.current_step,
            completed_level: record.completed_level,
        }
    }
}

/// Publishes [`ProgressUpdated`] to every subscribed view.
#[derive(Debug, Clone)]
pub struct ProgressNotifier {
    sender: broadcast::Sender<ProgressUpdated>,
}

impl ProgressNotifier {
    /// Creates a notifier with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a notifier buffering up to `capacity` unread notifications
    /// per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdated> {
        self.sender.subscribe()
    }

    /// Publishes `update`; returns how many subscribers received it.
    pub fn publish(&self, update: ProgressUpdated) -> usize {
        match self.sender.send(update) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(story_id = %update.story_id, "no subscribers for progress update");
                0
            }
        }
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new()
    }
}
