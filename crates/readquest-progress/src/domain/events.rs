//! Domain events for the Progress & Points context.

use readquest_core::event::{DomainEvent, EventMetadata};
use readquest_core::ids::{LearnerId, StoryId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted the first time a learner opens a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInitialized {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Starting level (always 1).
    pub current_level: u32,
    /// Starting step (always 1).
    pub current_step: u32,
}

/// Emitted when a learner's position moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressAdvanced {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Level after the move.
    pub current_level: u32,
    /// Step after the move.
    pub current_step: u32,
    /// Highest finished level after the move (already max-merged).
    pub completed_level: u32,
}

/// Emitted when points are appended to a learner's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAwarded {
    /// Ledger entry identifier.
    pub entry_id: Uuid,
    /// The learner.
    pub learner_id: LearnerId,
    /// The story the points were earned in.
    pub story_id: StoryId,
    /// Signed so that offsetting corrections fit the same entry shape.
    pub amount: i64,
    /// Free-text reason shown to the learner.
    pub reason: String,
}

/// Event type identifier for [`ProgressInitialized`].
pub const PROGRESS_INITIALIZED_EVENT_TYPE: &str = "progress.initialized";

/// Event type identifier for [`ProgressAdvanced`].
pub const PROGRESS_ADVANCED_EVENT_TYPE: &str = "progress.advanced";

/// Event type identifier for [`PointsAwarded`].
pub const POINTS_AWARDED_EVENT_TYPE: &str = "points.awarded";

/// Event payload variants for a progress record stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEventKind {
    /// The record was created.
    ProgressInitialized(ProgressInitialized),
    /// The record moved forward.
    ProgressAdvanced(ProgressAdvanced),
}

/// Domain event envelope for a progress record stream.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProgressEventKind,
}

impl DomainEvent for ProgressEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            ProgressEventKind::ProgressInitialized(_) => PROGRESS_INITIALIZED_EVENT_TYPE,
            ProgressEventKind::ProgressAdvanced(_) => PROGRESS_ADVANCED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProgressEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Event payload variants for a points ledger stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEventKind {
    /// An entry was appended.
    PointsAwarded(PointsAwarded),
}

/// Domain event envelope for a points ledger stream.
#[derive(Debug, Clone)]
pub struct LedgerEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: LedgerEventKind,
}

impl DomainEvent for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            LedgerEventKind::PointsAwarded(_) => POINTS_AWARDED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("LedgerEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
