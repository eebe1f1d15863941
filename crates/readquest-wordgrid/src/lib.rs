//! ReadQuest: Word-search grid.
//!
//! Words are hidden horizontally or vertically in a square letter grid,
//! never diagonally and never reversed. The learner finds them by
//! selecting a straight, contiguous line of cells.

pub mod alphabet;
pub mod game;
pub mod grid;

pub use alphabet::TURKISH_UPPERCASE;
pub use game::WordSearchGame;
pub use grid::{
    DEFAULT_GRID_SIZE, GridConfig, MAX_PLACEMENT_ATTEMPTS, Orientation, Placement, Position,
    Selection, WordGrid, WordGridView,
};
