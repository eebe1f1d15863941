//! Commands sent to the progress and points contexts.

use uuid::Uuid;

use crate::ids::LearnerId;

/// A request to change a learner's persisted state.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used in logs, e.g. `progress.advance`.
    fn command_type(&self) -> &'static str;

    /// Ties the command to the events it produces.
    fn correlation_id(&self) -> Uuid;

    /// The learner whose state the command changes.
    fn learner_id(&self) -> LearnerId;
}
