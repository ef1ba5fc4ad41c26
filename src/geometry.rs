//! Grid geometry: positions, movement directions and couch placements.
//!
//! A couch covers two cells that are horizontally, vertically or diagonally
//! adjacent. Its orientation is one of eight compass values derived from where
//! the `end` cell sits relative to the `start` cell:
//!
//! - North / South: same row, `end` to the left / right of `start`
//! - East / West: same column, `end` above / below `start`
//! - NorthEast, SouthEast, SouthWest, NorthWest: the four diagonal placements
//!
//! Ordering note: `Orientation::index` is part of the state key layout, so the
//! discriminants must stay stable.

use std::fmt;
use std::ops::Add;

/// A grid cell, packed as `x << 8 | y` into a single `u16`.
///
/// The packed form gives cheap equality, hashing and an x-major total order.
/// Board validity is not checked here; see `BoardMetadata::in_bounds`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(u16);

impl Position {
    #[inline(always)]
    pub const fn new(x: u8, y: u8) -> Self {
        Self(((x as u16) << 8) | y as u16)
    }

    #[inline(always)]
    pub const fn x(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline(always)]
    pub const fn y(self) -> u8 {
        self.0 as u8
    }

    /// Applies a delta, returning `None` if a coordinate leaves `0..=255`.
    #[inline]
    pub fn offset(self, delta: Delta) -> Option<Self> {
        let x = self.x().checked_add_signed(delta.dx)?;
        let y = self.y().checked_add_signed(delta.dy)?;
        Some(Self::new(x, y))
    }

    /// Moves one cell in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Option<Self> {
        self.offset(direction.delta())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x(), self.y())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x(), self.y())
    }
}

/// A signed movement between two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Delta {
    pub dx: i8,
    pub dy: i8,
}

impl Delta {
    pub const fn new(dx: i8, dy: i8) -> Self {
        Self { dx, dy }
    }
}

impl Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Delta {
        Delta::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

/// A single player input. The origin is the top-left cell, so `Up` decreases y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    #[inline]
    pub const fn delta(self) -> Delta {
        match self {
            Direction::Left => Delta::new(-1, 0),
            Direction::Right => Delta::new(1, 0),
            Direction::Up => Delta::new(0, -1),
            Direction::Down => Delta::new(0, 1),
        }
    }

    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Arrow glyph used when printing move sequences.
    pub const fn arrow(self) -> char {
        match self {
            Direction::Left => '←',
            Direction::Right => '→',
            Direction::Up => '↑',
            Direction::Down => '↓',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrow())
    }
}

/// Formats a move sequence as a compact string of arrows.
pub fn format_moves(moves: &[Direction]) -> String {
    moves.iter().map(|direction| direction.arrow()).collect()
}

/// Compass orientation of a couch, from the relative placement of its cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Orientation {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::North,
        Orientation::NorthEast,
        Orientation::East,
        Orientation::SouthEast,
        Orientation::South,
        Orientation::SouthWest,
        Orientation::West,
        Orientation::NorthWest,
    ];

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Offset from a couch's `start` cell to its `end` cell.
    pub const fn end_offset(self) -> Delta {
        match self {
            Orientation::North => Delta::new(-1, 0),
            Orientation::NorthEast => Delta::new(-1, -1),
            Orientation::East => Delta::new(0, -1),
            Orientation::SouthEast => Delta::new(1, -1),
            Orientation::South => Delta::new(1, 0),
            Orientation::SouthWest => Delta::new(1, 1),
            Orientation::West => Delta::new(0, 1),
            Orientation::NorthWest => Delta::new(-1, 1),
        }
    }

    /// Both cells share a row.
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }
}

/// Reasons a pair of cells cannot form a couch placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    Identical { position: Position },
    NotAdjacent { start: Position, end: Position },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical { position } => {
                write!(f, "couch cells are identical ({position})")
            }
            Self::NotAdjacent { start, end } => {
                write!(f, "couch cells {start} and {end} are not adjacent")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// The two cells a couch (or goal) occupies.
///
/// `start` is the left seat when the couch faces south. The pair is ordered:
/// swapping the cells gives the opposite orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CouchPosition {
    start: Position,
    end: Position,
}

impl CouchPosition {
    /// Builds a placement, rejecting identical or non-adjacent cells.
    pub fn new(start: Position, end: Position) -> Result<Self, PlacementError> {
        if start == end {
            return Err(PlacementError::Identical { position: start });
        }
        if start.x().abs_diff(end.x()) > 1 || start.y().abs_diff(end.y()) > 1 {
            return Err(PlacementError::NotAdjacent { start, end });
        }
        Ok(Self { start, end })
    }

    /// Rebuilds a placement from its anchor cell and orientation.
    ///
    /// Returns `None` if the `end` cell would fall off the coordinate range.
    pub fn from_anchor(start: Position, orientation: Orientation) -> Option<Self> {
        let end = start.offset(orientation.end_offset())?;
        Some(Self { start, end })
    }

    #[inline(always)]
    pub const fn start(self) -> Position {
        self.start
    }

    #[inline(always)]
    pub const fn end(self) -> Position {
        self.end
    }

    #[inline]
    pub const fn cells(self) -> [Position; 2] {
        [self.start, self.end]
    }

    #[inline]
    pub fn contains(self, position: Position) -> bool {
        self.start == position || self.end == position
    }

    pub fn orientation(self) -> Orientation {
        use std::cmp::Ordering::{Equal, Greater, Less};

        match (self.start.x().cmp(&self.end.x()), self.start.y().cmp(&self.end.y())) {
            (Less, Less) => Orientation::SouthWest,
            (Less, Equal) => Orientation::South,
            (Less, Greater) => Orientation::SouthEast,
            (Equal, Less) => Orientation::West,
            (Equal, Greater) => Orientation::East,
            (Greater, Less) => Orientation::NorthWest,
            (Greater, Equal) => Orientation::North,
            (Greater, Greater) => Orientation::NorthEast,
            // `new` rejects identical cells
            (Equal, Equal) => unreachable!("couch cells are identical"),
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        self.start.y() == self.end.y()
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        self.start.x() == self.end.x()
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
    fn test_position_packing_is_x_major() {
        let position = Position::new(3, 7);
        assert_eq!((position.x(), position.y()), (3, 7));
        assert!(Position::new(1, 200) < Position::new(2, 0));
        assert!(Position::new(2, 0) < Position::new(2, 1));
    }

    #[test]
    fn test_step_off_the_coordinate_range_is_none() {
        assert_eq!(Position::new(0, 4).step(Direction::Left), None);
        assert_eq!(Position::new(4, 0).step(Direction::Up), None);
        assert_eq!(Position::new(255, 0).step(Direction::Right), None);
        assert_eq!(
            Position::new(4, 4).step(Direction::Down),
            Some(Position::new(4, 5))
        );
    }

    #[test]
    fn test_opposites_cancel() {
        for direction in Direction::ALL {
            let delta = direction.delta() + direction.opposite().delta();
            assert_eq!(delta, Delta::new(0, 0), "{direction:?} does not cancel");
        }
    }

    #[test]
    fn test_orientation_matches_anchor_offset() {
        let anchor = Position::new(5, 5);
        for orientation in Orientation::ALL {
            let rebuilt = CouchPosition::from_anchor(anchor, orientation).expect("in range");
            assert_eq!(rebuilt.orientation(), orientation);
            assert_eq!(Orientation::from_index(orientation.index()), Some(orientation));
        }
        assert_eq!(Orientation::from_index(8), None);
    }

    #[test]
    fn test_orientation_classes() {
        assert_eq!(placement((1, 1), (2, 1)).orientation(), Orientation::South);
        assert_eq!(placement((2, 1), (1, 1)).orientation(), Orientation::North);
        assert_eq!(placement((0, 1), (0, 2)).orientation(), Orientation::West);
        assert_eq!(placement((0, 2), (0, 1)).orientation(), Orientation::East);
        let diagonal = placement((1, 1), (2, 2));
        assert!(!diagonal.is_horizontal() && !diagonal.is_vertical());
        assert!(Orientation::North.is_horizontal());
        assert!(!Orientation::West.is_horizontal());
    }

    #[test]
    fn test_invalid_placements_are_rejected() {
        let cell = Position::new(2, 2);
        assert_eq!(
            CouchPosition::new(cell, cell),
            Err(PlacementError::Identical { position: cell })
        );
        assert!(matches!(
            CouchPosition::new(cell, Position::new(4, 2)),
            Err(PlacementError::NotAdjacent { .. })
        ));
    }

    #[test]
    fn test_format_moves() {
        let moves = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];
        assert_eq!(format_moves(&moves), "↑→↓←");
    }
}
