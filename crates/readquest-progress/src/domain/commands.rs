//! Commands for the Progress & Points context.

use readquest_core::command::Command;
use readquest_core::ids::{LearnerId, StoryId};
use uuid::Uuid;

/// Opens a story for a learner; a no-op if it is already open.
#[derive(Debug, Clone)]
pub struct InitializeProgress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner.
    pub learner_id: LearnerId,
    /// The story being opened.
    pub story_id: StoryId,
}

/// Moves a learner forward inside a story.
#[derive(Debug, Clone)]
pub struct AdvanceProgress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Level to move to.
    pub next_level: u32,
    /// Step to move to within `next_level`.
    pub next_step: u32,
    /// Level just finished, if the move completes one.
    pub completed_level: Option<u32>,
}

/// Appends a points award to a learner's ledger.
#[derive(Debug, Clone)]
pub struct AwardPoints {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner.
    pub learner_id: LearnerId,
    /// The story the points were earned in.
    pub story_id: StoryId,
    /// Points to award; must be positive.
    pub amount: i64,
    /// Free-text reason.
    pub reason: String,
}

macro_rules! impl_command {
    ($($command:ty => $name:literal),+ $(,)?) => {
        $(
            impl Command for $command {
                fn command_type(&self) -> &'static str {
                    $name
                }

                fn correlation_id(&self) -> Uuid {
                    self.correlation_id
                }

                fn learner_id(&self) -> LearnerId {
                    self.learner_id
                }
            }
        )+
    };
}

impl_command! {
    InitializeProgress => "progress.initialize",
    AdvanceProgress => "progress.advance",
    AwardPoints => "points.award",
}
