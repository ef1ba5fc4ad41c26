//! Path-to-couch exploration and couch push transitions.
//!
//! `find_pushes` runs a breadth-first walk over empty floor from the player
//! and reports, for every couch cell the player can walk into, the shortest
//! input sequence that ends with that push.
//!
//! Push geometry, with `target` the couch cell the player walks into and
//! `other` the couch's second cell:
//! - inline push (`target + direction == other`): both cells advance one step
//! - player came from `other`'s column: `target` pivots into `other`'s row
//! - player came from `other`'s row: `target` pivots into `other`'s column
//! - otherwise `target` alone steps forward, bending or straightening the couch

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::board::{BoardMetadata, Item};
use crate::geometry::{CouchPosition, Direction, Position};
use crate::pieces::Couch;
use crate::state::BoardState;

/// A reachable push: walk to `approach`, then step into `contact`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushAction {
    /// Cell the player stands on just before the push.
    pub approach: Position,
    /// Couch cell the player walks into; the player stands here afterwards.
    pub contact: Position,
    pub direction: Direction,
    /// Index into the state's couch list.
    pub couch_index: usize,
    /// The walk to `approach` followed by the push itself.
    pub inputs: Vec<Direction>,
}

/// Enumerates every push reachable from the player's position.
///
/// Cells are expanded in (distance, position) order, so the first path to a
/// cell is a shortest one and ties break the same way on every call. Each cell
/// is expanded once, so each (approach, direction) pair appears at most once.
pub fn find_pushes(state: &BoardState, metadata: &BoardMetadata) -> Vec<PushAction> {
    let origin = state.player();
    // came_from[cell] = (previous cell, input taken), `None` for unvisited
    let mut came_from: Vec<Option<(Position, Direction)>> = vec![None; metadata.cell_count()];
    let mut discovered = vec![false; metadata.cell_count()];
    let mut frontier = BinaryHeap::new();
    let mut pushes = Vec::new();

    if !metadata.in_bounds(origin) {
        return pushes;
    }
    discovered[metadata.cell_index(origin)] = true;
    frontier.push(Reverse((0u32, origin)));

    while let Some(Reverse((distance, position))) = frontier.pop() {
        for direction in Direction::ALL {
            let Some(next) = position.step(direction) else {
                continue;
            };
            match state.item_at(next, metadata) {
                Item::Wall | Item::Obstacle => {}
                Item::Empty => {
                    let cell = metadata.cell_index(next);
                    if !discovered[cell] {
                        discovered[cell] = true;
                        came_from[cell] = Some((position, direction));
                        frontier.push(Reverse((distance + 1, next)));
                    }
                }
                Item::Couch(couch_index) => {
                    let mut inputs = walk_to(metadata, &came_from, position);
                    inputs.push(direction);
                    pushes.push(PushAction {
                        approach: position,
                        contact: next,
                        direction,
                        couch_index,
                        inputs,
                    });
                }
            }
        }
    }

    pushes
}

/// Follows `came_from` back from `target` to the walk origin.
fn walk_to(
    metadata: &BoardMetadata,
    came_from: &[Option<(Position, Direction)>],
    target: Position,
) -> Vec<Direction> {
    let mut inputs = Vec::new();
    let mut cursor = target;
    while let Some((previous, direction)) = came_from[metadata.cell_index(cursor)] {
        inputs.push(direction);
        cursor = previous;
    }
    inputs.reverse();
    inputs
}

/// Computes where a couch ends up when the player walks into `contact`.
///
/// Returns `None` if a cell would leave the coordinate range. Occupancy of the
/// destination is not checked here; see `resolve_push`.
pub fn pushed_placement(
    placement: CouchPosition,
    contact: Position,
    direction: Direction,
) -> Option<CouchPosition> {
    let contact_is_start = placement.start() == contact;
    let (target, other) = if contact_is_start {
        (placement.start(), placement.end())
    } else {
        (placement.end(), placement.start())
    };
    let previous = contact.step(direction.opposite())?;

    let (new_target, new_other) = if target.step(direction) == Some(other) {
        (other, other.step(direction)?)
    } else if previous.x() == other.x() {
        (Position::new(target.x(), other.y()), other)
    } else if previous.y() == other.y() {
        (Position::new(other.x(), target.y()), other)
    } else {
        (target.step(direction)?, other)
    };

    let (start, end) = if contact_is_start {
        (new_target, new_other)
    } else {
        (new_other, new_target)
    };
    CouchPosition::new(start, end).ok()
}

/// The one cell a moved couch covers that it did not cover before.
#[inline]
pub fn newly_occupied(before: CouchPosition, after: CouchPosition) -> Position {
    if before.contains(after.start()) {
        after.end()
    } else {
        after.start()
    }
}

/// Validates a push against the state before it happens.
///
/// Returns the moved couch, or `None` if the cell it would swing or slide
/// into holds a wall, an obstacle or another couch.
pub fn resolve_push(
    state: &BoardState,
    metadata: &BoardMetadata,
    couch_index: usize,
    contact: Position,
    direction: Direction,
) -> Option<Couch> {
    let couch = *state.couches().get(couch_index)?;
    let placement = pushed_placement(couch.position, contact, direction)?;
    let entered = newly_occupied(couch.position, placement);

    (state.item_at(entered, metadata) == Item::Empty).then(|| couch.moved_to(placement))
}
