//! Aggregate roots for the Progress & Points context.

use chrono::{DateTime, Utc};
use readquest_core::aggregate::AggregateRoot;
use readquest_core::clock::Clock;
use readquest_core::error::DomainError;
use readquest_core::event::EventMetadata;
use readquest_core::ids::{LearnerId, StoryId};
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    LedgerEvent, LedgerEventKind, POINTS_AWARDED_EVENT_TYPE, PROGRESS_ADVANCED_EVENT_TYPE,
    PROGRESS_INITIALIZED_EVENT_TYPE, PointsAwarded, ProgressAdvanced, ProgressEvent,
    ProgressEventKind, ProgressInitialized,
};
use super::streams::{ledger_stream_id, progress_stream_id};

/// A learner's position inside one story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Level the learner is on (≥ 1, never decreases).
    pub current_level: u32,
    /// Step within `current_level` (≥ 1).
    pub current_step: u32,
    /// Highest level fully finished, 0 if none.
    pub completed_level: u32,
}

impl ProgressRecord {
    /// The record every learner starts a story with.
    #[must_use]
    pub fn starting(learner_id: LearnerId, story_id: StoryId) -> Self {
        Self {
            learner_id,
            story_id,
            current_level: 1,
            current_step: 1,
            completed_level: 0,
        }
    }
}

/// The aggregate root for one (learner, story) progress record.
#[derive(Debug)]
pub struct StoryProgress {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// The record, once initialized.
    pub(crate) record: Option<ProgressRecord>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ProgressEvent>,
}

impl StoryProgress {
    /// Creates an empty progress aggregate for `(learner_id, story_id)`.
    #[must_use]
    pub fn new(learner_id: LearnerId, story_id: StoryId) -> Self {
        Self::with_id(progress_stream_id(learner_id, story_id))
    }

    /// Creates an empty progress aggregate with an explicit stream id.
    #[must_use]
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            record: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// The current record, if the story has been opened.
    #[must_use]
    pub fn record(&self) -> Option<ProgressRecord> {
        self.record
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn metadata(&self, event_type: &str, correlation_id: Uuid, clock: &dyn Clock) -> EventMetadata {
        EventMetadata {
            event_id: Uuid::new_v4(),
            event_type: event_type.to_owned(),
            aggregate_id: self.id,
            sequence_number: self.next_sequence_number(),
            correlation_id,
            causation_id: correlation_id,
            occurred_at: clock.now(),
        }
    }

    /// Opens the story for the learner at level 1, step 1, producing a
    /// `ProgressInitialized` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the record already exists.
    pub fn initialize(
        &mut self,
        learner_id: LearnerId,
        story_id: StoryId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.record.is_some() {
            return Err(DomainError::Validation(format!(
                "progress for learner {learner_id} in story {story_id} already exists"
            )));
        }

        let start = ProgressRecord::starting(learner_id, story_id);
        let event = ProgressEvent {
            metadata: self.metadata(PROGRESS_INITIALIZED_EVENT_TYPE, correlation_id, clock),
            kind: ProgressEventKind::ProgressInitialized(ProgressInitialized {
                learner_id,
                story_id,
                current_level: start.current_level,
                current_step: start.current_step,
            }),
        };

        self.uncommitted_events.push(event);
        Ok(())
    }

    /// Moves the learner to `next_level`/`next_step`, producing a
    /// `ProgressAdvanced` event. A supplied `completed_level` is merged with
    /// the stored one by `max`, so it never regresses.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the record was never
    /// initialized, and `DomainError::Validation` if the move would break
    /// the record's invariants.
    pub fn advance(
        &mut self,
        next_level: u32,
        next_step: u32,
        completed_level: Option<u32>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let Some(current) = self.record else {
            return Err(DomainError::AggregateNotFound(self.id));
        };

        if next_level == 0 || next_step == 0 {
            return Err(DomainError::Validation(
                "level and step numbers start at 1".to_owned(),
            ));
        }
        if next_level < current.current_level {
            return Err(DomainError::Validation(format!(
                "progress cannot move back from level {} to level {next_level}",
                current.current_level
            )));
        }
        if let Some(completed) = completed_level {
            if completed > next_level {
                return Err(DomainError::Validation(format!(
                    "completed level {completed} exceeds current level {next_level}"
                )));
            }
        }

        let completed_level = completed_level.map_or(current.completed_level, |completed| {
            completed.max(current.completed_level)
        });

        let event = ProgressEvent {
            metadata: self.metadata(PROGRESS_ADVANCED_EVENT_TYPE, correlation_id, clock),
            kind: ProgressEventKind::ProgressAdvanced(ProgressAdvanced {
                learner_id: current.learner_id,
                story_id: current.story_id,
                current_level: next_level,
                current_step: next_step,
                completed_level,
            }),
        };

        self.uncommitted_events.push(event);
        Ok(())
    }
}

impl AggregateRoot for StoryProgress {
    type Event = ProgressEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            ProgressEventKind::ProgressInitialized(payload) => {
                self.record = Some(ProgressRecord {
                    learner_id: payload.learner_id,
                    story_id: payload.story_id,
                    current_level: payload.current_level,
                    current_step: payload.current_step,
                    completed_level: 0,
                });
            }
            ProgressEventKind::ProgressAdvanced(payload) => {
                self.record = Some(ProgressRecord {
                    learner_id: payload.learner_id,
                    story_id: payload.story_id,
                    current_level: payload.current_level,
                    current_step: payload.current_step,
                    completed_level: payload.completed_level,
                });
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

/// One immutable points award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub entry_id: Uuid,
    /// The learner.
    pub learner_id: LearnerId,
    /// The story the points were earned in.
    pub story_id: StoryId,
    /// Points; positive for awards.
    pub amount: i64,
    /// Free-text reason.
    pub reason: String,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// The aggregate root for a learner's append-only points ledger.
#[derive(Debug)]
pub struct PointsLedger {
    /// Aggregate identifier.
    pub id: Uuid,
    /// The learner who owns the ledger.
    pub learner_id: LearnerId,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Entries in append order.
    pub(crate) entries: Vec<LedgerEntry>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<LedgerEvent>,
}

impl PointsLedger {
    /// Creates an empty ledger for `learner_id`.
    #[must_use]
    pub fn new(learner_id: LearnerId) -> Self {
        Self {
            id: ledger_stream_id(learner_id),
            learner_id,
            version: 0,
            entries: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// The learner's total: the sum of all entries.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Appends an award, producing a `PointsAwarded` event, and returns the
    /// entry it will create.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` if `amount` is not positive.
    pub fn award(
        &mut self,
        story_id: StoryId,
        amount: i64,
        reason: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<LedgerEntry, DomainError> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount(amount));
        }

        let occurred_at = clock.now();
        let entry = LedgerEntry {
            entry_id: Uuid::new_v4(),
            learner_id: self.learner_id,
            story_id,
            amount,
            reason: reason.to_owned(),
            timestamp: occurred_at,
        };

        let event = LedgerEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: POINTS_AWARDED_EVENT_TYPE.to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at,
            },
            kind: LedgerEventKind::PointsAwarded(PointsAwarded {
                entry_id: entry.entry_id,
                learner_id: entry.learner_id,
                story_id,
                amount,
                reason: entry.reason.clone(),
            }),
        };

        self.uncommitted_events.push(event);
        Ok(entry)
    }
}

impl AggregateRoot for PointsLedger {
    type Event = LedgerEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            LedgerEventKind::PointsAwarded(payload) => {
                self.entries.push(LedgerEntry {
                    entry_id: payload.entry_id,
                    learner_id: payload.learner_id,
                    story_id: payload.story_id,
                    amount: payload.amount,
                    reason: payload.reason.clone(),
                    timestamp: event.metadata.occurred_at,
                });
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readquest_core::event::DomainEvent;
    use readquest_test_support::{FixedClock, fixed_now};

    fn committed(learner_id: LearnerId, story_id: StoryId, clock: &FixedClock) -> StoryProgress {
        let mut progress = StoryProgress::new(learner_id, story_id);
        progress
            .initialize(learner_id, story_id, Uuid::new_v4(), clock)
            .unwrap();
        commit(&mut progress);
        progress
    }

    fn commit(progress: &mut StoryProgress) {
        for event in progress.uncommitted_events().to_vec() {
            progress.apply(&event);
        }
        progress.clear_uncommitted_events();
    }

    #[test]
    fn test_initialize_produces_progress_initialized_event() {
        // Arrange
        let learner_id = LearnerId::new_v4();
        let story_id = StoryId(3);
        let correlation_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = StoryProgress::new(learner_id, story_id);

        // Act
        progress
            .initialize(learner_id, story_id, correlation_id, &clock)
            .unwrap();

        // Assert
        let events = progress.uncommitted_events();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type(), PROGRESS_INITIALIZED_EVENT_TYPE);

        let meta = event.metadata();
        assert_eq!(meta.aggregate_id, progress_stream_id(learner_id, story_id));
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.occurred_at, fixed_now());

        match &event.kind {
            ProgressEventKind::ProgressInitialized(payload) => {
                assert_eq!(payload.current_level, 1);
                assert_eq!(payload.current_step, 1);
            }
            other => panic!("expected ProgressInitialized, got {other:?}"),
        }
    }

    #[test]
    fn test_initialize_twice_returns_validation_error() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);

        let result = progress.initialize(learner_id, StoryId(1), Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(progress.uncommitted_events().is_empty());
    }

    #[test]
    fn test_advance_sets_level_step_and_completed_level() {
        // Arrange
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);

        // Act
        progress
            .advance(3, 1, Some(2), Uuid::new_v4(), &clock)
            .unwrap();
        commit(&mut progress);

        // Assert
        let record = progress.record().unwrap();
        assert_eq!(record.current_level, 3);
        assert_eq!(record.current_step, 1);
        assert_eq!(record.completed_level, 2);
        assert_eq!(progress.version(), 2);
    }

    #[test]
    fn test_advance_never_regresses_completed_level() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);
        progress.advance(4, 1, Some(3), Uuid::new_v4(), &clock).unwrap();
        commit(&mut progress);

        progress.advance(4, 2, Some(1), Uuid::new_v4(), &clock).unwrap();
        commit(&mut progress);

        assert_eq!(progress.record().unwrap().completed_level, 3);
    }

    #[test]
    fn test_advance_without_completed_level_keeps_existing() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);
        progress.advance(2, 1, Some(1), Uuid::new_v4(), &clock).unwrap();
        commit(&mut progress);

        progress.advance(2, 3, None, Uuid::new_v4(), &clock).unwrap();
        commit(&mut progress);

        let record = progress.record().unwrap();
        assert_eq!(record.current_step, 3);
        assert_eq!(record.completed_level, 1);
    }

    #[test]
    fn test_advance_rejects_moving_back_a_level() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);
        progress.advance(3, 1, Some(2), Uuid::new_v4(), &clock).unwrap();
        commit(&mut progress);

        let result = progress.advance(2, 1, None, Uuid::new_v4(), &clock);

        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("cannot move back")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_advance_rejects_completed_level_above_current_level() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);

        let result = progress.advance(2, 1, Some(4), Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_advance_rejects_zero_level() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = committed(learner_id, StoryId(1), &clock);

        let result = progress.advance(0, 1, None, Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_advance_uninitialized_record_returns_not_found() {
        let learner_id = LearnerId::new_v4();
        let clock = FixedClock(fixed_now());
        let mut progress = StoryProgress::new(learner_id, StoryId(1));

        let result = progress.advance(2, 1, Some(1), Uuid::new_v4(), &clock);

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, progress.id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_award_produces_points_awarded_event() {
        // Arrange
        let learner_id = LearnerId::new_v4();
        let correlation_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let mut ledger = PointsLedger::new(learner_id);

        // Act
        let entry = ledger
            .award(StoryId(2), 200, "Seviye 2 tamamlandı", correlation_id, &clock)
            .unwrap();

        // Assert
        assert_eq!(entry.amount, 200);
        assert_eq!(entry.reason, "Seviye 2 tamamlandı");
        assert_eq!(entry.timestamp, fixed_now());

        let events = ledger.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), POINTS_AWARDED_EVENT_TYPE);
        assert_eq!(events[0].metadata().aggregate_id, ledger_stream_id(learner_id));
        match &events[0].kind {
            LedgerEventKind::PointsAwarded(payload) => {
                assert_eq!(payload.entry_id, entry.entry_id);
                assert_eq!(payload.story_id, StoryId(2));
            }
        }
    }

    #[test]
    fn test_award_rejects_non_positive_amounts() {
        let clock = FixedClock(fixed_now());
        let mut ledger = PointsLedger::new(LearnerId::new_v4());

        for amount in [0, -5] {
            let result = ledger.award(StoryId(1), amount, "oops", Uuid::new_v4(), &clock);
            match result.unwrap_err() {
                DomainError::InvalidAmount(value) => assert_eq!(value, amount),
                other => panic!("expected InvalidAmount, got {other:?}"),
            }
        }
        assert!(ledger.uncommitted_events().is_empty());
    }

    #[test]
    fn test_ledger_total_sums_applied_entries() {
        let clock = FixedClock(fixed_now());
        let mut ledger = PointsLedger::new(LearnerId::new_v4());
        ledger.award(StoryId(1), 150, "a", Uuid::new_v4(), &clock).unwrap();
        ledger.award(StoryId(1), 200, "b", Uuid::new_v4(), &clock).unwrap();

        for event in ledger.uncommitted_events().to_vec() {
            ledger.apply(&event);
        }
        ledger.clear_uncommitted_events();

        assert_eq!(ledger.total(), 350);
        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.version(), 2);
    }
}
