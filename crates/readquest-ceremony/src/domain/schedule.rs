//! Recap cards and the timing of their reveal.

use std::time::Duration;

use readquest_core::error::DomainError;
use serde::Serialize;

use super::navigation::NavigationTarget;

/// Cards shown during every ceremony.
pub const RECAP_CARD_COUNT: usize = 4;

/// What one recap card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecapCard {
    /// The level that was finished.
    LevelComplete {
        /// Level number.
        level: u32,
    },
    /// How many steps the learner went through.
    StepsCompleted {
        /// Step count.
        count: u32,
    },
    /// Points the level is worth.
    PointsEarned {
        /// Point value.
        amount: u32,
    },
    /// Where the learner goes next.
    NextStop {
        /// Navigation target.
        target: NavigationTarget,
    },
}

/// The cards of one ceremony, in reveal order.
#[must_use]
pub fn recap_cards(
    level: u32,
    step_count: u32,
    amount: u32,
    target: NavigationTarget,
) -> [RecapCard; RECAP_CARD_COUNT] {
    [
        RecapCard::LevelComplete { level },
        RecapCard::StepsCompleted { count: step_count },
        RecapCard::PointsEarned { amount },
        RecapCard::NextStop { target },
    ]
}

/// Offsets from ceremony start at which each card is revealed and the
/// award is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSchedule {
    reveals: [Duration; RECAP_CARD_COUNT],
    award_at: Duration,
}

impl RevealSchedule {
    /// A custom schedule.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if reveal offsets decrease or the
    /// award precedes the last reveal.
    pub fn new(reveals: [Duration; RECAP_CARD_COUNT], award_at: Duration) -> Result<Self, DomainError> {
        if reveals.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(DomainError::Validation(
                "reveal offsets must not decrease".to_owned(),
            ));
        }
        if reveals.last().is_some_and(|last| award_at < *last) {
            return Err(DomainError::Validation(
                "award must come after the last reveal".to_owned(),
            ));
        }
        Ok(Self { reveals, award_at })
    }

    /// Reveal offsets in card order.
    #[must_use]
    pub fn reveals(&self) -> &[Duration; RECAP_CARD_COUNT] {
        &self.reveals
    }

    /// Offset of the award.
    #[must_use]
    pub fn award_at(&self) -> Duration {
        self.award_at
    }
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self {
            reveals: [
                Duration::from_millis(300),
                Duration::from_millis(800),
                Duration::from_millis(1300),
                Duration::from_millis(1800),
            ],
            award_at: Duration::from_millis(2300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let schedule = RevealSchedule::default();

        assert_eq!(schedule.reveals()[0], Duration::from_millis(300));
        assert_eq!(schedule.reveals()[3], Duration::from_millis(1800));
        assert_eq!(schedule.award_at(), Duration::from_millis(2300));
    }

    #[test]
    fn test_decreasing_offsets_are_rejected() {
        let result = RevealSchedule::new(
            [
                Duration::from_millis(300),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(500),
            ],
            Duration::from_millis(600),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_award_before_last_reveal_is_rejected() {
        let result = RevealSchedule::new([Duration::from_millis(100); 4], Duration::from_millis(50));

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_schedule_is_allowed() {
        assert!(RevealSchedule::new([Duration::ZERO; 4], Duration::ZERO).is_ok());
    }

    #[test]
    fn test_recap_cards_order() {
        let cards = recap_cards(2, 4, 200, NavigationTarget::Level { level: 3, step: 1 });

        assert_eq!(cards[0], RecapCard::LevelComplete { level: 2 });
        assert_eq!(cards[2], RecapCard::PointsEarned { amount: 200 });
    }
}
