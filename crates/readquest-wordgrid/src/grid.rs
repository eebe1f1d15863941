//! Grid generation and selection matching.

use std::collections::HashSet;

use readquest_core::error::DomainError;
use readquest_core::rng::DeterministicRng;
use serde::Serialize;
use tracing::debug;

use crate::alphabet::TURKISH_UPPERCASE;

/// Side length used when none is configured.
pub const DEFAULT_GRID_SIZE: usize = 10;

/// Random placements tried per word before giving up on it.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

const MAX_GRID_SIZE: usize = 64;

/// A cell coordinate, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Position {
    /// Shorthand constructor.
    #[must_use]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Direction a word runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Orientation {
    fn cells(self, start: Position, len: usize) -> impl Iterator<Item = Position> {
        (0..len).map(move |offset| match self {
            Self::Horizontal => Position::new(start.row, start.col + offset),
            Self::Vertical => Position::new(start.row + offset, start.col),
        })
    }
}

/// Where one word was hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// The word.
    pub word: String,
    /// First letter's cell.
    pub start: Position,
    /// Direction.
    pub orientation: Orientation,
}

/// Generation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Side length.
    pub size: usize,
    /// Letters used to fill empty cells.
    pub alphabet: Vec<char>,
    /// Attempts per word.
    pub max_attempts: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            alphabet: TURKISH_UPPERCASE.to_vec(),
            max_attempts: MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

/// Result of a learner selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The selection spelled a pending word, now found.
    Found(String),
    /// A valid line that spells no pending word.
    NoMatch,
    /// Not a straight, contiguous, in-bounds line.
    Invalid,
}

/// Serializable snapshot for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordGridView {
    /// Side length.
    pub size: usize,
    /// One string per row.
    pub rows: Vec<String>,
    /// Words the learner must find.
    pub words: Vec<String>,
    /// Words already found.
    pub found: Vec<String>,
}

/// A generated word-search grid and the learner's progress on it.
#[derive(Debug, Clone)]
pub struct WordGrid {
    size: usize,
    letters: Vec<Vec<char>>,
    placements: Vec<Placement>,
    unplaced: Vec<String>,
    pending: Vec<String>,
    found: Vec<String>,
    found_cells: HashSet<Position>,
}

impl WordGrid {
    /// Hides `words` in a new grid and fills the remaining cells.
    ///
    /// A word longer than the grid is left out without trying; any other
    /// word gets `config.max_attempts` random placements. A placement is
    /// legal when every cell is empty or already holds the same letter.
    /// Words that could not be placed are reported by
    /// [`WordGrid::unplaced`] and are not part of the game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a size of 0 or above 64, or an
    /// empty alphabet.
    pub fn generate<S: AsRef<str>>(
        words: &[S],
        config: &GridConfig,
        rng: &mut dyn DeterministicRng,
    ) -> Result<Self, DomainError> {
        let size = config.size;
        if size == 0 || size > MAX_GRID_SIZE {
            return Err(DomainError::Validation(format!(
                "grid size must be between 1 and {MAX_GRID_SIZE}, got {size}"
            )));
        }
        if config.alphabet.is_empty() {
            return Err(DomainError::Validation("alphabet is empty".to_owned()));
        }

        let mut cells: Vec<Vec<Option<char>>> = vec![vec![None; size]; size];
        let mut placements = Vec::new();
        let mut unplaced = Vec::new();

        for word in words {
            let word = word.as_ref();
            let letters: Vec<char> = word.chars().collect();
            if letters.is_empty() || letters.len() > size {
                unplaced.push(word.to_owned());
                continue;
            }
            match try_place(&mut cells, &letters, config.max_attempts, rng) {
                Some((start, orientation)) => placements.push(Placement {
                    word: word.to_owned(),
                    start,
                    orientation,
                }),
                None => {
                    debug!(word, "word could not be placed");
                    unplaced.push(word.to_owned());
                }
            }
        }

        let max_letter = config.alphabet.len() - 1;
        let letters = cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.unwrap_or_else(|| config.alphabet[draw(rng, max_letter)]))
                    .collect()
            })
            .collect();

        let pending = placements.iter().map(|placement| placement.word.clone()).collect();
        Ok(Self {
            size,
            letters,
            placements,
            unplaced,
            pending,
            found: Vec::new(),
            found_cells: HashSet::new(),
        })
    }

    /// Side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Letter at `position`, if in bounds.
    #[must_use]
    pub fn letter_at(&self, position: Position) -> Option<char> {
        self.letters.get(position.row)?.get(position.col).copied()
    }

    /// One string per row.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        self.letters.iter().map(|row| row.iter().collect()).collect()
    }

    /// Where each placed word is.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Words hidden in the grid, in input order.
    #[must_use]
    pub fn words(&self) -> Vec<&str> {
        self.placements.iter().map(|placement| placement.word.as_str()).collect()
    }

    /// Words that did not fit.
    #[must_use]
    pub fn unplaced(&self) -> &[String] {
        &self.unplaced
    }

    /// Words still to find.
    #[must_use]
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Words found so far, in the order they were found.
    #[must_use]
    pub fn found(&self) -> &[String] {
        &self.found
    }

    /// Whether `position` belongs to a found word.
    #[must_use]
    pub fn is_found_cell(&self, position: Position) -> bool {
        self.found_cells.contains(&position)
    }

    /// Every hidden word was found.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Checks a selection against the pending words. Matching is
    /// case-sensitive on the letters the selection traverses.
    pub fn select(&mut self, cells: &[Position]) -> Selection {
        let Some(text) = self.traverse(cells) else {
            return Selection::Invalid;
        };
        let Some(index) = self.pending.iter().position(|word| *word == text) else {
            return Selection::NoMatch;
        };
        let word = self.pending.remove(index);
        self.found_cells.extend(cells.iter().copied());
        self.found.push(word.clone());
        Selection::Found(word)
    }

    /// Snapshot for clients.
    #[must_use]
    pub fn view(&self) -> WordGridView {
        WordGridView {
            size: self.size,
            rows: self.rows(),
            words: self.words().into_iter().map(str::to_owned).collect(),
            found: self.found.clone(),
        }
    }

    fn traverse(&self, cells: &[Position]) -> Option<String> {
        let first = cells.first()?;
        let same_row = cells.iter().all(|cell| cell.row == first.row);
        let same_col = cells.iter().all(|cell| cell.col == first.col);
        if !same_row && !same_col {
            return None;
        }
        let contiguous = cells.windows(2).all(|pair| {
            let (a, b) = (pair[0], pair[1]);
            if same_row {
                a.col.abs_diff(b.col) == 1
            } else {
                a.row.abs_diff(b.row) == 1
            }
        });
        let one_direction = cells.windows(3).all(|triple| {
            if same_row {
                (triple[0].col < triple[1].col) == (triple[1].col < triple[2].col)
            } else {
                (triple[0].row < triple[1].row) == (triple[1].row < triple[2].row)
            }
        });
        if !contiguous || !one_direction {
            return None;
        }
        cells.iter().map(|cell| self.letter_at(*cell)).collect()
    }
}

fn draw(rng: &mut dyn DeterministicRng, max: usize) -> usize {
    let bound = u32::try_from(max).unwrap_or(u32::MAX);
    usize::try_from(rng.next_u32_range(0, bound))
        .unwrap_or(max)
        .min(max)
}

fn try_place(
    cells: &mut [Vec<Option<char>>],
    letters: &[char],
    max_attempts: u32,
    rng: &mut dyn DeterministicRng,
) -> Option<(Position, Orientation)> {
    let size = cells.len();
    let span = size - letters.len();
    for _ in 0..max_attempts {
        let orientation = if rng.next_u32_range(0, 1) == 0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (row_max, col_max) = match orientation {
            Orientation::Horizontal => (size - 1, span),
            Orientation::Vertical => (span, size - 1),
        };
        let start = Position::new(draw(rng, row_max), draw(rng, col_max));

        let fits = orientation
            .cells(start, letters.len())
            .zip(letters)
            .all(|(cell, letter)| cells[cell.row][cell.col].is_none_or(|existing| existing == *letter));
        if fits {
            for (cell, letter) in orientation.cells(start, letters.len()).zip(letters) {
                cells[cell.row][cell.col] = Some(*letter);
            }
            return Some((start, orientation));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use readquest_core::rng::SystemRng;
    use readquest_test_support::{CyclingRng, MockRng, SequenceRng};

    use super::*;

    fn config(size: usize) -> GridConfig {
        GridConfig {
            size,
            ..GridConfig::default()
        }
    }

    #[test]
    fn test_fitting_words_are_all_placed_on_default_grid() {
        // Arrange
        let words = ["AYI", "TAVŞAN", "KUŞ", "AĞAÇ", "ORMAN", "ÇİÇEK"];
        let mut rng = SystemRng::seeded(7);

        // Act
        let grid = WordGrid::generate(&words, &GridConfig::default(), &mut rng).unwrap();

        // Assert
        assert_eq!(grid.size(), 10);
        assert_eq!(grid.words(), words.to_vec());
        assert!(grid.unplaced().is_empty());
        for placement in grid.placements() {
            let spelled: String = placement
                .orientation
                .cells(placement.start, placement.word.chars().count())
                .map(|cell| grid.letter_at(cell).unwrap())
                .collect();
            assert_eq!(spelled, placement.word);
        }
    }

    #[test]
    fn test_every_cell_holds_an_alphabet_letter() {
        let mut rng = SystemRng::seeded(11);

        let grid = WordGrid::generate(&["DENİZ", "BALIK"], &GridConfig::default(), &mut rng).unwrap();

        assert!(grid.rows().iter().all(|row| row.chars().count() == 10));
        assert!(
            grid.rows()
                .iter()
                .flat_map(|row| row.chars().collect::<Vec<_>>())
                .all(|letter| TURKISH_UPPERCASE.contains(&letter))
        );
    }

    #[test]
    fn test_placement_order_of_draws() {
        // Orientation 0 (horizontal), row 1, column 0.
        let mut rng = CyclingRng::new();

        let grid = WordGrid::generate(&["KEDİ"], &config(5), &mut rng).unwrap();

        assert_eq!(
            grid.placements()[0],
            Placement {
                word: "KEDİ".to_owned(),
                start: Position::new(1, 0),
                orientation: Orientation::Horizontal,
            }
        );
        assert!(grid.rows()[1].starts_with("KEDİ"));
    }

    #[test]
    fn test_overlap_with_same_letter_is_legal() {
        let mut rng = MockRng;

        let grid = WordGrid::generate(&["ABC", "AB"], &config(3), &mut rng).unwrap();

        assert_eq!(grid.words(), vec!["ABC", "AB"]);
    }

    #[test]
    fn test_conflicting_word_is_dropped_after_attempt_cap() {
        // Arrange: every draw is 0, so both words compete for row 0.
        let values = vec![0; 3 + 3 * 100 + 6];
        let mut rng = SequenceRng::new(values.clone());

        // Act
        let grid = WordGrid::generate(&["ABC", "XYZ"], &config(3), &mut rng).unwrap();

        // Assert
        assert_eq!(grid.words(), vec!["ABC"]);
        assert_eq!(grid.unplaced(), ["XYZ".to_owned()]);
        assert_eq!(grid.pending(), ["ABC".to_owned()]);
        assert_eq!(rng.consumed(), values.len());
    }

    #[test]
    fn test_word_longer_than_grid_consumes_no_attempts() {
        let mut rng = SequenceRng::new(vec![0; 9]);

        let grid = WordGrid::generate(&["ABCD"], &config(3), &mut rng).unwrap();

        assert!(grid.words().is_empty());
        assert_eq!(grid.unplaced(), ["ABCD".to_owned()]);
        assert_eq!(rng.consumed(), 9);
        assert!(grid.is_complete());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let empty_alphabet = GridConfig {
            alphabet: vec![],
            ..GridConfig::default()
        };

        assert!(WordGrid::generate(&["A"], &config(0), &mut MockRng).is_err());
        assert!(WordGrid::generate(&["A"], &empty_alphabet, &mut MockRng).is_err());
    }

    fn kedi_grid() -> WordGrid {
        WordGrid::generate(&["KEDİ"], &config(5), &mut CyclingRng::new()).unwrap()
    }

    #[test]
    fn test_selecting_a_hidden_word_finds_it() {
        // Arrange
        let mut grid = kedi_grid();
        let cells: Vec<Position> = (0..4).map(|col| Position::new(1, col)).collect();

        // Act
        let first = grid.select(&cells);
        let again = grid.select(&cells);

        // Assert
        assert_eq!(first, Selection::Found("KEDİ".to_owned()));
        assert_eq!(again, Selection::NoMatch);
        assert!(grid.is_complete());
        assert!(grid.is_found_cell(Position::new(1, 3)));
        assert!(!grid.is_found_cell(Position::new(0, 0)));
        assert_eq!(grid.view().found, vec!["KEDİ".to_owned()]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let mut grid = WordGrid::generate(&["kedi"], &config(5), &mut CyclingRng::new()).unwrap();
        grid.pending.clear();
        grid.pending.push("KEDI".to_owned());
        let cells: Vec<Position> = (0..4).map(|col| Position::new(1, col)).collect();

        assert_eq!(grid.select(&cells), Selection::NoMatch);
    }

    #[test]
    fn test_non_collinear_selection_never_matches() {
        let mut grid = kedi_grid();

        let result = grid.select(&[Position::new(1, 0), Position::new(2, 1), Position::new(1, 2)]);

        assert_eq!(result, Selection::Invalid);
        assert!(!grid.is_complete());
    }

    #[test]
    fn test_gapped_or_zigzag_selection_is_invalid() {
        let mut grid = kedi_grid();

        let gapped = grid.select(&[Position::new(1, 0), Position::new(1, 2)]);
        let zigzag = grid.select(&[Position::new(1, 0), Position::new(1, 1), Position::new(1, 0)]);
        let outside = grid.select(&[Position::new(1, 4), Position::new(1, 5)]);

        assert_eq!(gapped, Selection::Invalid);
        assert_eq!(zigzag, Selection::Invalid);
        assert_eq!(outside, Selection::Invalid);
        assert_eq!(grid.select(&[]), Selection::Invalid);
    }

    #[test]
    fn test_view_lists_only_placed_words() {
        let grid = WordGrid::generate(&["ABC", "XYZ"], &config(3), &mut MockRng).unwrap();

        let view = grid.view();

        assert_eq!(view.words, vec!["ABC".to_owned()]);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(serde_json::to_value(&view).unwrap()["size"], 3);
    }
}
