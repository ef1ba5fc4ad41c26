//! Dead couch detection.
//!
//! A sufficient test only: it catches a couch flat against the wrong stretch
//! of wall, and a couch whose cells are boxed in by immovable neighbors. Other
//! unsolvable layouts are left to the search.
//!
//! Neighboring couches are treated as if they might move out of the way, so
//! two couches jammed against each other are never reported dead.

use crate::board::{BoardMetadata, Item};
use crate::geometry::{Direction, Position};
use crate::pieces::Couch;
use crate::state::BoardState;

/// Whether `couch`, as placed in `state`, can never reach a goal.
pub fn is_dead(state: &BoardState, couch: &Couch, metadata: &BoardMetadata) -> bool {
    if metadata.satisfies_goal(couch) {
        return false;
    }

    if metadata.is_flat_against_wall(couch.position) {
        return !metadata.is_on_safe_wall_segment(couch);
    }

    couch
        .position
        .cells()
        .iter()
        .all(|&cell| is_boxed(state, couch, cell, metadata))
}

/// A cell is boxed when no axis offers an empty cell to push from with a free
/// cell (empty, or another couch) on the opposite side.
fn is_boxed(state: &BoardState, couch: &Couch, cell: Position, metadata: &BoardMetadata) -> bool {
    let neighbors = Direction::ALL.map(|direction| neighbor(state, couch, cell, direction, metadata));

    let empty_count = neighbors.iter().filter(|&&item| item == Item::Empty).count();
    if empty_count > neighbors.len() / 2 {
        // some opposite pair must be empty on both sides
        return false;
    }

    // `Direction::ALL` lists opposites in adjacent pairs, so `index ^ 1` is the
    // opposite neighbor
    !neighbors.iter().enumerate().any(|(index, &item)| {
        item == Item::Empty && matches!(neighbors[index ^ 1], Item::Empty | Item::Couch(_))
    })
}

/// The item next to `cell`, looking past the couch's own second cell.
///
/// For an inline couch this joins the outer neighbors of both cells into one
/// axis, so a couch in an open corridor is not mistaken for boxed.
fn neighbor(
    state: &BoardState,
    couch: &Couch,
    cell: Position,
    direction: Direction,
    metadata: &BoardMetadata,
) -> Item {
    let Some(next) = cell.step(direction) else {
        return Item::Wall;
    };
    if !couch.occupies(next) {
        return state.item_at(next, metadata);
    }
    state.item_toward(next, direction, metadata)
}
