//! Per-node board state and its fixed-width key.
//!
//! A `BoardState` is an immutable value: transitions build a new state and
//! never touch the old one, so states move freely between worker threads.
//!
//! Key layout (most significant field first, packed into a `u128`):
//! - satisfied-goal count (`goal_bits`)
//! - player x, player y (`coord_bits` each)
//! - repeat per couch, in the state's sorted couch order:
//!   - color (`color_bits`), anchor x, anchor y (`coord_bits` each),
//!     orientation (3 bits)
//!
//! Field widths are sized from the puzzle, so keys of one puzzle compare and
//! hash as plain integers.

use crate::board::{BoardMetadata, Item};
use crate::explore::resolve_push;
use crate::geometry::{CouchPosition, Direction, Orientation, Position};
use crate::level::LevelError;
use crate::pieces::Couch;

/// Bits needed for `Orientation::index`.
const ORIENTATION_BITS: u32 = 3;

/// Width of a `StateKey`.
pub const MAX_KEY_BITS: u32 = u128::BITS;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoardState {
    player: Position,
    /// Sorted by color, then placement.
    couches: Vec<Couch>,
    satisfied_goals: usize,
}

impl BoardState {
    /// Builds a state, counting satisfied goals from scratch.
    pub fn new(player: Position, mut couches: Vec<Couch>, metadata: &BoardMetadata) -> Self {
        couches.sort_unstable();
        let satisfied_goals = couches
            .iter()
            .filter(|couch| metadata.satisfies_goal(couch))
            .count();
        Self {
            player,
            couches,
            satisfied_goals,
        }
    }

    #[inline]
    pub fn player(&self) -> Position {
        self.player
    }

    #[inline]
    pub fn couches(&self) -> &[Couch] {
        &self.couches
    }

    #[inline]
    pub fn satisfied_goals(&self) -> usize {
        self.satisfied_goals
    }

    #[inline]
    pub fn is_solved(&self, metadata: &BoardMetadata) -> bool {
        self.satisfied_goals == metadata.goal_count()
    }

    #[inline]
    pub fn item_at(&self, position: Position, metadata: &BoardMetadata) -> Item {
        metadata.item_at(position, &self.couches)
    }

    #[inline]
    pub fn item_toward(
        &self,
        from: Position,
        direction: Direction,
        metadata: &BoardMetadata,
    ) -> Item {
        metadata.item_toward(from, direction, &self.couches)
    }

    /// Returns the state after the player, now standing on `player`, has
    /// moved couch `couch_index` to `moved`.
    ///
    /// The satisfied-goal count is adjusted for the one couch that changed.
    pub fn with_push(
        &self,
        player: Position,
        couch_index: usize,
        moved: Couch,
        metadata: &BoardMetadata,
    ) -> Self {
        let previous = self.couches[couch_index];
        let mut satisfied_goals = self.satisfied_goals;
        if metadata.satisfies_goal(&previous) {
            satisfied_goals -= 1;
        }
        if metadata.satisfies_goal(&moved) {
            satisfied_goals += 1;
        }

        let mut couches = self.couches.clone();
        couches[couch_index] = moved;
        couches.sort_unstable();

        Self {
            player,
            couches,
            satisfied_goals,
        }
    }

    /// Applies one player input: a walk onto an empty cell or a push.
    ///
    /// Returns `None` when the input is blocked.
    pub fn apply_input(&self, direction: Direction, metadata: &BoardMetadata) -> Option<Self> {
        let next = self.player.step(direction)?;
        match self.item_at(next, metadata) {
            Item::Empty => Some(Self {
                player: next,
                ..self.clone()
            }),
            Item::Couch(couch_index) => {
                let moved = resolve_push(self, metadata, couch_index, next, direction)?;
                Some(self.with_push(next, couch_index, moved, metadata))
            }
            Item::Wall | Item::Obstacle => None,
        }
    }
}

/// Applies a whole move sequence, failing on the first blocked input.
pub fn replay(
    metadata: &BoardMetadata,
    state: &BoardState,
    moves: &[Direction],
) -> Option<BoardState> {
    moves
        .iter()
        .try_fold(state.clone(), |current, &direction| {
            current.apply_input(direction, metadata)
        })
}

/// Dense encoding of a `BoardState`.
///
/// Keys are only comparable between states of the same puzzle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(u128);

/// Field widths of the key layout for one puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateCodec {
    coord_bits: u32,
    color_bits: u32,
    goal_bits: u32,
    couch_count: usize,
}

/// Bits needed to store every value in `0..=max`.
#[inline]
const fn bit_width(max: u32) -> u32 {
    u32::BITS - max.leading_zeros()
}

#[inline(always)]
const fn low_mask(bits: u32) -> u128 {
    if bits == 0 {
        0
    } else {
        u128::MAX >> (u128::BITS - bits)
    }
}

impl StateCodec {
    /// Sizes the key layout for a board and its couch set.
    ///
    /// Fails if the key would not fit in `MAX_KEY_BITS`.
    pub fn new(metadata: &BoardMetadata, initial: &BoardState) -> Result<Self, LevelError> {
        let largest_coordinate = metadata.width().max(metadata.height()).saturating_sub(1);
        let largest_color = initial
            .couches()
            .iter()
            .map(|couch| couch.color)
            .max()
            .unwrap_or(0);

        let codec = Self {
            coord_bits: bit_width(largest_coordinate as u32),
            color_bits: bit_width(largest_color as u32),
            goal_bits: bit_width(metadata.goal_count() as u32),
            couch_count: initial.couches().len(),
        };

        let bits = codec.key_bits();
        if bits > MAX_KEY_BITS as usize {
            return Err(LevelError::StateTooWide {
                bits: bits.min(u32::MAX as usize) as u32,
                max_bits: MAX_KEY_BITS,
            });
        }
        Ok(codec)
    }

    #[inline]
    fn couch_bits(&self) -> u32 {
        self.color_bits + 2 * self.coord_bits + ORIENTATION_BITS
    }

    /// Total number of bits a key of this puzzle uses.
    pub fn key_bits(&self) -> usize {
        self.goal_bits as usize
            + 2 * self.coord_bits as usize
            + self.couch_count * self.couch_bits() as usize
    }

    pub fn encode(&self, state: &BoardState) -> StateKey {
        let mut key = state.satisfied_goals as u128;
        let mut push = |bits: u32, value: u128| {
            key = (key << bits) | (value & low_mask(bits));
        };

        push(self.coord_bits, state.player.x() as u128);
        push(self.coord_bits, state.player.y() as u128);
        for couch in &state.couches {
            let anchor = couch.position.start();
            push(self.color_bits, couch.color as u128);
            push(self.coord_bits, anchor.x() as u128);
            push(self.coord_bits, anchor.y() as u128);
            push(ORIENTATION_BITS, couch.position.orientation().index() as u128);
        }

        StateKey(key)
    }

    /// Rebuilds the state a key was encoded from.
    ///
    /// Returns `None` for keys that no state of this puzzle encodes to.
    pub fn decode(&self, key: StateKey) -> Option<BoardState> {
        let mut rest = key.0;
        let mut take = |bits: u32| {
            let value = rest & low_mask(bits);
            rest = if bits == 0 { rest } else { rest >> bits };
            value
        };

        let mut couches = Vec::with_capacity(self.couch_count);
        for _ in 0..self.couch_count {
            let orientation = Orientation::from_index(take(ORIENTATION_BITS) as u8)?;
            let y = take(self.coord_bits) as u8;
            let x = take(self.coord_bits) as u8;
            let color = take(self.color_bits) as u8;
            let position = CouchPosition::from_anchor(Position::new(x, y), orientation)?;
            couches.push(Couch::new(color, position));
        }
        couches.reverse();

        let player_y = take(self.coord_bits) as u8;
        let player_x = take(self.coord_bits) as u8;
        let satisfied_goals = usize::try_from(rest).ok()?;

        Some(BoardState {
            player: Position::new(player_x, player_y),
            couches,
            satisfied_goals,
        })
    }
}
