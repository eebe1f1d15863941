//! Store and player fakes for ceremony tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::store::ProgressStore;
use readquest_progress::domain::aggregates::{LedgerEntry, ProgressRecord};
use readquest_test_support::fixed_now;
use tokio::time::Instant;
use uuid::Uuid;

use crate::media::{MediaError, NarrationPlayer, PlaybackHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Award {
        amount: i64,
        reason: String,
        at: Duration,
    },
    Advance {
        next_level: u32,
        next_step: u32,
        completed_level: Option<u32>,
    },
}

/// Records writes; awards and advances can be made to fail or stall.
pub(crate) struct RecordingProgressStore {
    created_at: Instant,
    calls: Mutex<Vec<StoreCall>>,
    failing_awards: AtomicUsize,
    successful_awards: AtomicUsize,
    fail_advances: AtomicBool,
    award_delay: Mutex<Option<Duration>>,
}

impl RecordingProgressStore {
    pub(crate) fn new() -> Self {
        Self {
            created_at: Instant::now(),
            calls: Mutex::new(Vec::new()),
            failing_awards: AtomicUsize::new(0),
            successful_awards: AtomicUsize::new(0),
            fail_advances: AtomicBool::new(false),
            award_delay: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn award_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Award { .. }))
            .count()
    }

    pub(crate) fn advance_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Advance { .. }))
            .count()
    }

    pub(crate) fn successful_awards(&self) -> usize {
        self.successful_awards.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_awards(&self, count: usize) {
        self.failing_awards.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_advances(&self) {
        self.fail_advances.store(true, Ordering::SeqCst);
    }

    pub(crate) fn delay_awards(&self, delay: Duration) {
        *self.award_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl ProgressStore for RecordingProgressStore {
    async fn initialize_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
    ) -> Result<ProgressRecord, DomainError> {
        Ok(ProgressRecord::starting(learner_id, story_id))
    }

    async fn read_progress(
        &self,
        _learner_id: LearnerId,
        _story_id: StoryId,
    ) -> Result<Option<ProgressRecord>, DomainError> {
        Ok(None)
    }

    async fn advance_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        next_level: u32,
        next_step: u32,
        completed_level: Option<u32>,
    ) -> Result<ProgressRecord, DomainError> {
        self.calls.lock().unwrap().push(StoreCall::Advance {
            next_level,
            next_step,
            completed_level,
        });
        if self.fail_advances.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        Ok(ProgressRecord {
            learner_id,
            story_id,
            current_level: next_level,
            current_step: next_step,
            completed_level: completed_level.unwrap_or(0),
        })
    }

    async fn award_points(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        amount: i64,
        reason: &str,
    ) -> Result<LedgerEntry, DomainError> {
        self.calls.lock().unwrap().push(StoreCall::Award {
            amount,
            reason: reason.to_owned(),
            at: self.created_at.elapsed(),
        });
        let delay = *self.award_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let fail = self
            .failing_awards
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if fail {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        self.successful_awards.fetch_add(1, Ordering::SeqCst);
        Ok(LedgerEntry {
            entry_id: Uuid::new_v4(),
            learner_id,
            story_id,
            amount,
            reason: reason.to_owned(),
            timestamp: fixed_now(),
        })
    }
}

struct FakeHandle(Arc<AtomicUsize>);

impl PlaybackHandle for FakeHandle {
    fn stop(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts plays and stops; can be made to report a missing asset.
pub(crate) struct FakeNarrationPlayer {
    fail: bool,
    plays: AtomicUsize,
    stops: Arc<AtomicUsize>,
}

impl FakeNarrationPlayer {
    pub(crate) fn new() -> Self {
        Self {
            fail: false,
            plays: AtomicUsize::new(0),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrationPlayer for FakeNarrationPlayer {
    async fn play(&self, asset: &str) -> Result<Box<dyn PlaybackHandle>, MediaError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MediaError::NotFound(asset.to_owned()));
        }
        Ok(Box::new(FakeHandle(self.stops.clone())))
    }
}
