//! The progress store adapter: the sole gateway to persisted progress and
//! points.
//!
//! Every call is asynchronous and may fail. Nothing here retries; retry
//! policy belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use readquest_core::clock::Clock;
use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use readquest_core::repository::EventRepository;
use tracing::instrument;
use uuid::Uuid;

use crate::application::{command_handlers, query_handlers};
use crate::domain::aggregates::{LedgerEntry, ProgressRecord};
use crate::domain::commands::{AdvanceProgress, AwardPoints, InitializeProgress};

/// Operations the orchestration components may perform on persisted
/// progress and points.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Returns the learner's record for the story, creating it at level 1,
    /// step 1 if it does not exist. Never overwrites an existing record.
    async fn initialize_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
    ) -> Result<ProgressRecord, DomainError>;

    /// Returns the record, or `None` if the story was never opened.
    async fn read_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
    ) -> Result<Option<ProgressRecord>, DomainError>;

    /// Moves the record to `next_level`/`next_step`; `completed_level`, when
    /// given, is merged by `max`.
    async fn advance_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        next_level: u32,
        next_step: u32,
        completed_level: Option<u32>,
    ) -> Result<ProgressRecord, DomainError>;

    /// Appends one ledger entry. Fails with `InvalidAmount` unless
    /// `amount > 0`.
    async fn award_points(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        amount: i64,
        reason: &str,
    ) -> Result<LedgerEntry, DomainError>;
}

/// [`ProgressStore`] backed by an event repository.
#[derive(Clone)]
pub struct EventSourcedProgressStore {
    clock: Arc<dyn Clock>,
    repo: Arc<dyn EventRepository>,
}

impl EventSourcedProgressStore {
    /// Creates a store writing through `repo`, timestamping with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, repo: Arc<dyn EventRepository>) -> Self {
        Self { clock, repo }
    }
}

impl std::fmt::Debug for EventSourcedProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcedProgressStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProgressStore for EventSourcedProgressStore {
    #[instrument(skip(self))]
    async fn initialize_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
    ) -> Result<ProgressRecord, DomainError> {
        let command = InitializeProgress {
            correlation_id: Uuid::new_v4(),
            learner_id,
            story_id,
        };
        let result =
            command_handlers::handle_initialize_progress(&command, self.clock.as_ref(), &*self.repo)
                .await?;
        Ok(result.record)
    }

    #[instrument(skip(self))]
    async fn read_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
    ) -> Result<Option<ProgressRecord>, DomainError> {
        query_handlers::get_progress(learner_id, story_id, &*self.repo).await
    }

    #[instrument(skip(self))]
    async fn advance_progress(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        next_level: u32,
        next_step: u32,
        completed_level: Option<u32>,
    ) -> Result<ProgressRecord, DomainError> {
        let command = AdvanceProgress {
            correlation_id: Uuid::new_v4(),
            learner_id,
            story_id,
            next_level,
            next_step,
            completed_level,
        };
        let result =
            command_handlers::handle_advance_progress(&command, self.clock.as_ref(), &*self.repo)
                .await?;
        Ok(result.record)
    }

    #[instrument(skip(self, reason))]
    async fn award_points(
        &self,
        learner_id: LearnerId,
        story_id: StoryId,
        amount: i64,
        reason: &str,
    ) -> Result<LedgerEntry, DomainError> {
        let command = AwardPoints {
            correlation_id: Uuid::new_v4(),
            learner_id,
            story_id,
            amount,
            reason: reason.to_owned(),
        };
        let result =
            command_handlers::handle_award_points(&command, self.clock.as_ref(), &*self.repo)
                .await?;
        Ok(result.entry)
    }
}
