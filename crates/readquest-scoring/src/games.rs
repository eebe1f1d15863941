//! Points produced by the mini-games.
//!
//! Each game reports how many of its items the learner cleared and whether
//! time ran out. The games themselves live elsewhere and only talk to this
//! module through [`ScoringProducer`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Points per matched pair / found word / flipped pair.
pub const POINTS_PER_ITEM: u32 = 10;

/// Bonus for clearing every item before the timer expires.
pub const COMPLETION_BONUS: u32 = 20;

/// The mini-games that can award points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiniGame {
    /// Word-picture matching.
    Matching,
    /// Word search on a letter grid.
    WordSearch,
    /// Card-flip memory game.
    Memory,
}

impl MiniGame {
    /// Learner-facing name of the game.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Matching => "Eşleştirme",
            Self::WordSearch => "Kelime Avı",
            Self::Memory => "Hafıza",
        }
    }

    /// Ledger reason used when the game's points are awarded.
    #[must_use]
    pub fn award_reason(self) -> String {
        format!("{} oyunu", self.display_name())
    }
}

impl fmt::Display for MiniGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Outcome of one finished (or timed-out) game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Which game produced the result.
    pub game: MiniGame,
    /// Items the learner cleared.
    pub found: u32,
    /// Items the game offered.
    pub total: u32,
    /// Whether the timer ran out before the learner finished.
    pub timed_out: bool,
}

/// Points for a game result. Never negative.
#[must_use]
pub fn points_for_game(result: &GameResult) -> u32 {
    let found = result.found.min(result.total);
    let mut points = found.saturating_mul(POINTS_PER_ITEM);
    if result.total > 0 && found == result.total && !result.timed_out {
        points = points.saturating_add(COMPLETION_BONUS);
    }
    points
}

/// Narrow interface every mini-game exposes to the reward flow.
pub trait ScoringProducer {
    /// Current result; final once [`ScoringProducer::is_done`] is true.
    fn result(&self) -> GameResult;

    /// Whether the learner finished or the game timed out.
    fn is_done(&self) -> bool;

    /// Points the current result is worth.
    fn points(&self) -> u32 {
        points_for_game(&self.result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(found: u32, total: u32, timed_out: bool) -> GameResult {
        GameResult {
            game: MiniGame::Matching,
            found,
            total,
            timed_out,
        }
    }

    #[test]
    fn test_points_per_found_item() {
        assert_eq!(points_for_game(&result(3, 6, true)), 30);
    }

    #[test]
    fn test_completion_bonus_requires_all_items_in_time() {
        assert_eq!(points_for_game(&result(6, 6, false)), 80);
        assert_eq!(points_for_game(&result(6, 6, true)), 60);
    }

    #[test]
    fn test_found_is_clamped_to_total() {
        assert_eq!(points_for_game(&result(9, 4, false)), 60);
    }

    #[test]
    fn test_empty_game_scores_nothing() {
        assert_eq!(points_for_game(&result(0, 0, false)), 0);
    }

    #[test]
    fn test_award_reason_names_the_game() {
        assert_eq!(MiniGame::WordSearch.award_reason(), "Kelime Avı oyunu");
    }

    #[test]
    fn test_mini_game_serializes_in_snake_case() {
        let json = serde_json::to_value(MiniGame::WordSearch).unwrap();
        assert_eq!(json, serde_json::json!("word_search"));
    }
}
