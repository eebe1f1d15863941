//! Event-sourced aggregates.
//!
//! A progress record or a points ledger is rebuilt by folding its stream
//! through [`AggregateRoot::apply`]; new facts wait in the uncommitted list
//! until the repository accepts them.

use uuid::Uuid;

use crate::event::DomainEvent;
use crate::repository::StoredEvent;

/// A state machine rebuilt from its event stream.
pub trait AggregateRoot: Send + Sync {
    /// Events this aggregate emits and folds.
    type Event: DomainEvent;

    /// Stream identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Number of persisted events folded so far.
    fn version(&self) -> i64;

    /// Folds one event into the state.
    fn apply(&mut self, event: &Self::Event);

    /// Events produced since the last save.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Forgets the uncommitted events once they are stored.
    fn clear_uncommitted_events(&mut self);

    /// The uncommitted events in their persisted form.
    fn pending_stored_events(&self) -> Vec<StoredEvent> {
        self.uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored)
            .collect()
    }
}
