//! Ceremony states and the events views subscribe to.

use serde::Serialize;
use uuid::Uuid;

use super::navigation::NavigationTarget;
use super::schedule::RecapCard;

/// Progress of one ceremony run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CeremonyState {
    /// Waiting for the level-completed signal.
    Idle,
    /// Narration requested.
    Narrating,
    /// Cards are being revealed.
    Revealing {
        /// Cards shown so far.
        revealed: usize,
    },
    /// Points are being written.
    Awarding,
    /// Progress is being written.
    Advancing,
    /// The ceremony is over.
    Ready {
        /// Where to go next.
        target: NavigationTarget,
    },
    /// The learner navigated away.
    Abandoned,
}

impl CeremonyState {
    /// `Ready` or `Abandoned`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Abandoned)
    }
}

/// Published on the ceremony event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CeremonyEvent {
    /// Narration is playing.
    NarrationStarted {
        /// Asset path.
        asset: String,
    },
    /// Narration could not be played; the ceremony continues silently.
    NarrationUnavailable {
        /// Asset path.
        asset: String,
        /// Failure description.
        reason: String,
    },
    /// One recap card was revealed.
    CardRevealed {
        /// 0-based position.
        index: usize,
        /// The card.
        card: RecapCard,
    },
    /// The level's points were written.
    PointsAwarded {
        /// Ledger entry id.
        entry_id: Uuid,
        /// Points written.
        amount: i64,
    },
    /// The award failed; it may be retried.
    AwardFailed {
        /// Failure description.
        reason: String,
    },
    /// Progress was advanced.
    ProgressAdvanced {
        /// New current level.
        current_level: u32,
        /// New completed level.
        completed_level: u32,
    },
    /// Advancing progress failed.
    AdvanceFailed {
        /// Failure description.
        reason: String,
    },
    /// The next target is available.
    Ready {
        /// Where to go next.
        target: NavigationTarget,
    },
    /// The ceremony was abandoned.
    Abandoned,
}
