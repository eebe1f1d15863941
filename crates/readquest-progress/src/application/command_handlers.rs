//! Command handlers for the Progress & Points context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use readquest_core::aggregate::AggregateRoot;
use readquest_core::clock::Clock;
use readquest_core::command::Command;
use readquest_core::error::DomainError;
use readquest_core::event::EventMetadata;
use readquest_core::ids::LearnerId;
use readquest_core::repository::{EventRepository, StoredEvent};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{LedgerEntry, PointsLedger, ProgressRecord, StoryProgress};
use crate::domain::commands::{AdvanceProgress, AwardPoints, InitializeProgress};
use crate::domain::events::{LedgerEvent, LedgerEventKind, ProgressEvent, ProgressEventKind};
use crate::domain::streams::{ledger_stream_id, progress_stream_id};

/// Result of a successfully handled progress command.
#[derive(Debug)]
pub struct ProgressCommandResult {
    /// The progress stream affected or created by the command.
    pub aggregate_id: Uuid,
    /// The record after the command.
    pub record: ProgressRecord,
    /// The stored events produced and persisted (empty when nothing changed).
    pub stored_events: Vec<StoredEvent>,
}

/// Result of a successfully handled award command.
#[derive(Debug)]
pub struct AwardCommandResult {
    /// The ledger stream appended to.
    pub aggregate_id: Uuid,
    /// The new ledger entry.
    pub entry: LedgerEntry,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `StoryProgress` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute_progress(
    aggregate_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<StoryProgress, DomainError> {
    let mut progress = StoryProgress::with_id(aggregate_id);
    for stored in existing_events {
        let kind: ProgressEventKind = stored.decode_payload()?;
        let event = ProgressEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        progress.apply(&event);
    }
    Ok(progress)
}

/// Reconstitutes a learner's `PointsLedger` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute_ledger(
    learner_id: LearnerId,
    existing_events: &[StoredEvent],
) -> Result<PointsLedger, DomainError> {
    let mut ledger = PointsLedger::new(learner_id);
    for stored in existing_events {
        let kind: LedgerEventKind = stored.decode_payload()?;
        let event = LedgerEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        ledger.apply(&event);
    }
    Ok(ledger)
}

/// Appends an aggregate's uncommitted events and folds them into its state.
async fn persist<A>(aggregate: &mut A, repo: &dyn EventRepository) -> Result<Vec<StoredEvent>, DomainError>
where
    A: AggregateRoot,
    A::Event: Clone,
{
    let pending: Vec<A::Event> = aggregate.uncommitted_events().to_vec();
    let stored_events = aggregate.pending_stored_events();

    repo.append_events(aggregate.aggregate_id(), aggregate.version(), &stored_events)
        .await?;

    for event in &pending {
        aggregate.apply(event);
    }
    aggregate.clear_uncommitted_events();
    Ok(stored_events)
}

/// Loads the existing record of a progress stream, if any.
async fn load_existing(
    aggregate_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Option<ProgressRecord>, DomainError> {
    let existing_events = repo.load_events(aggregate_id).await?;
    if existing_events.is_empty() {
        return Ok(None);
    }
    let progress = reconstitute_progress(aggregate_id, &existing_events)?;
    progress.record().map(Some).ok_or_else(|| {
        DomainError::Infrastructure(format!(
            "progress stream {aggregate_id} has events but no initialization"
        ))
    })
}

/// Handles the `InitializeProgress` command: returns the existing record
/// untouched if the story was already opened, otherwise creates the record
/// at level 1, step 1 and persists the resulting event.
///
/// Losing a concurrent-create race is not an error: the winner's record is
/// re-read and returned.
///
/// # Errors
///
/// Returns `DomainError` if event loading or appending fails.
#[instrument(skip(command, clock, repo), fields(learner_id = %command.learner_id, story_id = %command.story_id))]
pub async fn handle_initialize_progress(
    command: &InitializeProgress,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProgressCommandResult, DomainError> {
    let aggregate_id = progress_stream_id(command.learner_id, command.story_id);

    if let Some(record) = load_existing(aggregate_id, repo).await? {
        debug!("progress already initialized, returning existing record");
        return Ok(ProgressCommandResult {
            aggregate_id,
            record,
            stored_events: Vec::new(),
        });
    }

    let mut progress = StoryProgress::with_id(aggregate_id);
    progress.initialize(
        command.learner_id,
        command.story_id,
        command.correlation_id,
        clock,
    )?;

    match persist(&mut progress, repo).await {
        Ok(stored_events) => {
            info!(
                command = command.command_type(),
                correlation_id = %command.correlation_id(),
                "progress initialized"
            );
            let record = progress
                .record()
                .unwrap_or_else(|| ProgressRecord::starting(command.learner_id, command.story_id));
            Ok(ProgressCommandResult {
                aggregate_id,
                record,
                stored_events,
            })
        }
        Err(DomainError::ConcurrencyConflict { .. }) => {
            debug!("progress created concurrently, re-reading");
            let record = load_existing(aggregate_id, repo)
                .await?
                .ok_or(DomainError::AggregateNotFound(aggregate_id))?;
            Ok(ProgressCommandResult {
                aggregate_id,
                record,
                stored_events: Vec::new(),
            })
        }
        Err(other) => Err(other),
    }
}

/// Handles the `AdvanceProgress` command: reconstitutes the record, moves it
/// forward, and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the story was never opened,
/// `DomainError::Validation` if the move breaks a record invariant, or any
/// error from event loading or appending.
#[instrument(skip(command, clock, repo), fields(learner_id = %command.learner_id, story_id = %command.story_id))]
pub async fn handle_advance_progress(
    command: &AdvanceProgress,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProgressCommandResult, DomainError> {
    let aggregate_id = progress_stream_id(command.learner_id, command.story_id);
    let existing_events = repo.load_events(aggregate_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(aggregate_id));
    }
    let mut progress = reconstitute_progress(aggregate_id, &existing_events)?;

    progress.advance(
        command.next_level,
        command.next_step,
        command.completed_level,
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&mut progress, repo).await?;
    let record = progress
        .record()
        .ok_or(DomainError::AggregateNotFound(aggregate_id))?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        current_level = record.current_level,
        current_step = record.current_step,
        completed_level = record.completed_level,
        "progress advanced"
    );

    Ok(ProgressCommandResult {
        aggregate_id,
        record,
        stored_events,
    })
}

/// Attempts made to append an award before a concurrency conflict is
/// returned to the caller.
pub const AWARD_ATTEMPTS: usize = 3;

/// Handles the `AwardPoints` command: reconstitutes the learner's ledger,
/// appends one entry, and persists the resulting event.
///
/// The ledger is shared by every story the learner reads, so a concurrent
/// award can move its version between load and append. An award does not
/// depend on earlier entries, so a conflict reloads the ledger and appends
/// again, up to [`AWARD_ATTEMPTS`] times.
///
/// # Errors
///
/// Returns `DomainError::InvalidAmount` for a non-positive amount,
/// `DomainError::ConcurrencyConflict` if every attempt lost a race, or any
/// other error from event loading or appending.
#[instrument(skip(command, clock, repo), fields(learner_id = %command.learner_id, story_id = %command.story_id, amount = command.amount))]
pub async fn handle_award_points(
    command: &AwardPoints,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<AwardCommandResult, DomainError> {
    if command.amount <= 0 {
        return Err(DomainError::InvalidAmount(command.amount));
    }

    let aggregate_id = ledger_stream_id(command.learner_id);
    let mut attempt = 1;
    loop {
        match append_award(command, aggregate_id, clock, repo).await {
            Err(DomainError::ConcurrencyConflict { actual, .. }) if attempt < AWARD_ATTEMPTS => {
                debug!(%aggregate_id, attempt, actual, "ledger moved during award, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn append_award(
    command: &AwardPoints,
    aggregate_id: Uuid,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<AwardCommandResult, DomainError> {
    let existing_events = repo.load_events(aggregate_id).await?;
    let mut ledger = reconstitute_ledger(command.learner_id, &existing_events)?;

    let entry = ledger.award(
        command.story_id,
        command.amount,
        &command.reason,
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&mut ledger, repo).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        entry_id = %entry.entry_id,
        total = ledger.total(),
        "points awarded"
    );

    Ok(AwardCommandResult {
        aggregate_id,
        entry,
        stored_events,
    })
}
