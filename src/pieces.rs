//! Couch and goal definitions, and the assembled puzzle.
//!
//! A `Puzzle` splits a parsed level into the static `BoardMetadata`, the
//! initial `BoardState` and the `StateCodec` sized for that board.

use std::path::Path;

use crate::board::BoardMetadata;
use crate::geometry::{CouchPosition, Position};
use crate::level::{Level, LevelError};
use crate::state::{BoardState, StateCodec};

/// Color tag shared by couches and the goals they must reach.
pub type Color = u8;

/// A movable two-cell piece.
///
/// Ordering is by color, then placement; board states keep their couches
/// sorted this way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Couch {
    pub color: Color,
    pub position: CouchPosition,
}

impl Couch {
    pub const fn new(color: Color, position: CouchPosition) -> Self {
        Self { color, position }
    }

    /// Returns the same couch at a new placement.
    #[inline]
    pub const fn moved_to(self, position: CouchPosition) -> Self {
        Self {
            color: self.color,
            position,
        }
    }

    #[inline]
    pub fn occupies(&self, cell: Position) -> bool {
        self.position.contains(cell)
    }
}

/// A target placement for a couch of matching color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Goal {
    pub color: Color,
    pub position: CouchPosition,
}

impl Goal {
    pub const fn new(color: Color, position: CouchPosition) -> Self {
        Self { color, position }
    }

    #[inline]
    pub fn is_satisfied_by(&self, couch: &Couch) -> bool {
        self.color == couch.color && self.position == couch.position
    }
}

/// A fully built puzzle, ready to search.
#[derive(Clone, Debug)]
pub struct Puzzle {
    pub metadata: BoardMetadata,
    pub initial_state: BoardState,
    pub codec: StateCodec,
}

impl Puzzle {
    /// Builds the metadata, initial state and key codec for a level.
    ///
    /// Fails if the board is too large for the fixed-width state key.
    pub fn new(level: &Level) -> Result<Self, LevelError> {
        let metadata = BoardMetadata::from_level(level);
        let initial_state = BoardState::new(level.start, level.couches.clone(), &metadata);
        let codec = StateCodec::new(&metadata, &initial_state)?;

        Ok(Self {
            metadata,
            initial_state,
            codec,
        })
    }

    /// Parses level text and builds the puzzle.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        Self::new(&Level::parse(text)?)
    }

    /// Reads a level file and builds the puzzle.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        Self::new(&Level::load(path)?)
    }

    /// Renders a state of this puzzle as text.
    pub fn format_state(&self, state: &BoardState) -> String {
        crate::board::format_board(&self.metadata, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(start: (u8, u8), end: (u8, u8)) -> CouchPosition {
        CouchPosition::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
            .expect("valid placement")
    }

    #[test]
    fn test_goal_requires_color_and_exact_placement() {
        let goal = Goal::new(1, placement((0, 0), (0, 1)));

        assert!(goal.is_satisfied_by(&Couch::new(1, placement((0, 0), (0, 1)))));
        assert!(!goal.is_satisfied_by(&Couch::new(2, placement((0, 0), (0, 1)))));
        // same cells, opposite facing
        assert!(!goal.is_satisfied_by(&Couch::new(1, placement((0, 1), (0, 0)))));
    }

    #[test]
    fn test_moved_couch_keeps_color() {
        let couch = Couch::new(3, placement((1, 1), (2, 1)));
        let moved = couch.moved_to(placement((2, 1), (3, 1)));
        assert_eq!(moved.color, 3);
        assert!(moved.occupies(Position::new(3, 1)));
        assert!(!moved.occupies(Position::new(1, 1)));
    }

    #[test]
    fn test_puzzle_counts_initially_satisfied_goals() {
        let puzzle = Puzzle::parse(
            "board 4,3\nstart 0,0\nc1 1,1 2,1\ng1 1,1 2,1\nc2 0,2 1,2\ng2 2,2 3,2\n",
        )
        .expect("valid level");

        assert_eq!(puzzle.initial_state.satisfied_goals(), 1);
        assert!(!puzzle.initial_state.is_solved(&puzzle.metadata));
    }
}
