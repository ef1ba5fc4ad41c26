//! Couch Puzzle Solver Library
//!
//! Finds shortest input sequences for couch-pushing puzzles: the player walks
//! a grid and pushes two-cell couches onto goals of the same color.

pub mod board;
pub mod deadlock;
pub mod explore;
pub mod geometry;
pub mod level;
pub mod pieces;
pub mod solver;
pub mod state;

pub use geometry::{format_moves, Direction};
pub use level::{Level, LevelError};
pub use pieces::Puzzle;
pub use solver::{SearchOutcome, SolverConfig};

/// Finds a shortest input sequence for `puzzle` with the default configuration.
///
/// Returns `None` when no sequence of inputs solves the puzzle.
pub fn solve(puzzle: &Puzzle) -> Option<Vec<Direction>> {
    solve_with(puzzle, &SolverConfig::default()).moves
}

/// Like [`solve`], with explicit tuning and search statistics.
pub fn solve_with(puzzle: &Puzzle, config: &SolverConfig) -> SearchOutcome {
    solver::solve(puzzle, config)
}
