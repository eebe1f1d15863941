//! ReadQuest: Scoring Rules.
//!
//! Pure, deterministic functions mapping level completion and mini-game
//! performance to points, and cumulative points to star milestones.
//! No state, no I/O.

pub mod games;
pub mod level;
pub mod milestones;

pub use games::{GameResult, MiniGame, ScoringProducer, points_for_game};
pub use level::{LEVEL_BASE_POINTS, LEVEL_WEIGHT, level_award_reason, points_for_level};
pub use milestones::{
    Milestone, MilestoneProgress, next_milestone, progress_to_next_milestone, star_rating,
};
