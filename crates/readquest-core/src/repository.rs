//! Persistence port for event streams.
//!
//! Each learner has one points-ledger stream and one progress stream per
//! story. Streams are append-only and versioned by sequence number.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DomainError;

/// An event as the repository stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Stream the event belongs to.
    pub aggregate_id: Uuid,
    /// Dotted type name, e.g. `points.awarded`.
    pub event_type: String,
    /// JSON payload.
    pub payload: serde_json::Value,
    /// 1-based position within the stream.
    pub sequence_number: i64,
    /// Correlation id of the command that produced the event.
    pub correlation_id: Uuid,
    /// Id of the command or event that caused this one.
    pub causation_id: Uuid,
    /// When the event was recorded.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

impl StoredEvent {
    /// Deserializes the payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` naming the event if the payload
    /// does not match `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "cannot decode {} event {}: {e}",
                self.event_type, self.event_id
            ))
        })
    }
}

/// Loads and appends event streams.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events of a stream, in sequence order. Unknown streams are empty.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Appends `events` if the stream is still at `expected_version`,
    /// otherwise fails with `DomainError::ConcurrencyConflict`.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
