//! The word-search mini-game.

use readquest_scoring::{GameResult, MiniGame, ScoringProducer};

use crate::grid::{Position, Selection, WordGrid};

/// A [`WordGrid`] played until every word is found or time runs out.
#[derive(Debug, Clone)]
pub struct WordSearchGame {
    grid: WordGrid,
    timed_out: bool,
}

impl WordSearchGame {
    /// Starts a game on `grid`.
    #[must_use]
    pub fn new(grid: WordGrid) -> Self {
        Self {
            grid,
            timed_out: false,
        }
    }

    /// The grid being played.
    #[must_use]
    pub fn grid(&self) -> &WordGrid {
        &self.grid
    }

    /// Applies a selection. Ignored once the game is done.
    pub fn select(&mut self, cells: &[Position]) -> Selection {
        if self.is_done() {
            return Selection::NoMatch;
        }
        self.grid.select(cells)
    }

    /// Marks the timer as expired.
    pub fn time_out(&mut self) {
        if !self.grid.is_complete() {
            self.timed_out = true;
        }
    }
}

impl ScoringProducer for WordSearchGame {
    fn result(&self) -> GameResult {
        GameResult {
            game: MiniGame::WordSearch,
            found: u32::try_from(self.grid.found().len()).unwrap_or(u32::MAX),
            total: u32::try_from(self.grid.words().len()).unwrap_or(u32::MAX),
            timed_out: self.timed_out,
        }
    }

    fn is_done(&self) -> bool {
        self.timed_out || self.grid.is_complete()
    }
}
