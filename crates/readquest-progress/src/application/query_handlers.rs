//! Query handlers for the Progress & Points context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use readquest_core::repository::EventRepository;
use readquest_scoring::{
    Milestone, MilestoneProgress, next_milestone, progress_to_next_milestone, star_rating,
};
use serde::Serialize;

use crate::application::command_handlers;
use crate::domain::aggregates::{LedgerEntry, ProgressRecord};
use crate::domain::streams::{ledger_stream_id, progress_stream_id};

/// Read-only view of a learner's points.
#[derive(Debug, Serialize)]
pub struct PointsSummaryView {
    /// The learner.
    pub learner_id: LearnerId,
    /// Sum of all ledger entries.
    pub total_points: i64,
    /// Star rating for `total_points`.
    pub stars: u8,
    /// The next milestone to reach.
    pub next_milestone: Milestone,
    /// Progress towards `next_milestone`.
    pub progress: MilestoneProgress,
    /// Ledger entries in append order.
    pub entries: Vec<LedgerEntry>,
    /// Current ledger version (event count).
    pub version: i64,
}

/// Retrieves a learner's progress record for one story.
///
/// `Ok(None)` means the story was never opened; callers should initialize.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_progress(
    learner_id: LearnerId,
    story_id: StoryId,
    repo: &dyn EventRepository,
) -> Result<Option<ProgressRecord>, DomainError> {
    let aggregate_id = progress_stream_id(learner_id, story_id);
    let stored_events = repo.load_events(aggregate_id).await?;
    if stored_events.is_empty() {
        return Ok(None);
    }
    let progress = command_handlers::reconstitute_progress(aggregate_id, &stored_events)?;
    Ok(progress.record())
}

/// Retrieves the learner's points total, star rating and ledger entries.
/// A learner without entries has a zero total.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_points_summary(
    learner_id: LearnerId,
    repo: &dyn EventRepository,
) -> Result<PointsSummaryView, DomainError> {
    let stored_events = repo.load_events(ledger_stream_id(learner_id)).await?;
    let ledger = command_handlers::reconstitute_ledger(learner_id, &stored_events)?;
    let total_points = ledger.total();

    Ok(PointsSummaryView {
        learner_id,
        total_points,
        stars: star_rating(total_points),
        next_milestone: next_milestone(total_points),
        progress: progress_to_next_milestone(total_points),
        entries: ledger.entries().to_vec(),
        version: ledger.version,
    })
}
