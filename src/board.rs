//! Static board metadata and text rendering.
//!
//! `BoardMetadata` holds everything that never changes during a search:
//! dimensions, obstacles, goals, and the precomputed safe wall segments.
//! Obstacles are stored as a flat per-cell table indexed by `cell_index`, the
//! same row-major layout the explorer uses for its scratch tables.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::geometry::{CouchPosition, Direction, Orientation, Position};
use crate::level::Level;
use crate::pieces::{Color, Couch, Goal};
use crate::state::BoardState;

/// What occupies a cell, from the player's point of view.
///
/// `Couch` carries the index of the couch in the state's couch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item {
    Wall,
    Obstacle,
    Empty,
    Couch(usize),
}

/// Cells from which a couch of a given color and orientation, once flat
/// against a wall, can still slide into a matching goal on that wall.
type SafeWallPositions = FxHashMap<(Color, Orientation), FxHashSet<Position>>;

/// Read-only puzzle data shared by every search worker.
#[derive(Clone, Debug)]
pub struct BoardMetadata {
    width: u8,
    height: u8,
    /// `true` where an obstacle sits, indexed by `cell_index`.
    obstacle_cells: Vec<bool>,
    obstacles: Vec<Position>,
    goals: Vec<Goal>,
    safe_wall_positions: SafeWallPositions,
}

impl BoardMetadata {
    /// Obstacles must lie on the board; `Level` validation guarantees this.
    pub fn new(
        width: u8,
        height: u8,
        obstacles: impl IntoIterator<Item = Position>,
        goals: Vec<Goal>,
    ) -> Self {
        let mut metadata = Self {
            width,
            height,
            obstacle_cells: vec![false; width as usize * height as usize],
            obstacles: Vec::new(),
            goals,
            safe_wall_positions: SafeWallPositions::default(),
        };

        for obstacle in obstacles {
            debug_assert!(
                metadata.in_bounds(obstacle),
                "obstacle {obstacle} is outside the {width}x{height} board"
            );
            let cell = metadata.cell_index(obstacle);
            metadata.obstacle_cells[cell] = true;
            metadata.obstacles.push(obstacle);
        }
        metadata.obstacles.sort_unstable();
        metadata.obstacles.dedup();
        metadata.safe_wall_positions = build_safe_wall_positions(&metadata);
        metadata
    }

    pub fn from_level(level: &Level) -> Self {
        Self::new(
            level.width,
            level.height,
            level.obstacles.iter().copied(),
            level.goals.clone(),
        )
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[inline]
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// Number of cells on the board.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.obstacle_cells.len()
    }

    /// Row-major index of an on-board cell.
    #[inline(always)]
    pub fn cell_index(&self, position: Position) -> usize {
        position.y() as usize * self.width as usize + position.x() as usize
    }

    #[inline(always)]
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x() < self.width && position.y() < self.height
    }

    #[inline]
    pub fn is_obstacle(&self, position: Position) -> bool {
        self.in_bounds(position) && self.obstacle_cells[self.cell_index(position)]
    }

    /// Classifies a cell given the current couch placements.
    pub fn item_at(&self, position: Position, couches: &[Couch]) -> Item {
        if !self.in_bounds(position) {
            return Item::Wall;
        }
        if self.obstacle_cells[self.cell_index(position)] {
            return Item::Obstacle;
        }
        match couches.iter().position(|couch| couch.occupies(position)) {
            Some(index) => Item::Couch(index),
            None => Item::Empty,
        }
    }

    /// Classifies the neighbor of `from` in `direction`.
    ///
    /// Stepping off the coordinate range counts as a wall.
    #[inline]
    pub fn item_toward(&self, from: Position, direction: Direction, couches: &[Couch]) -> Item {
        match from.step(direction) {
            Some(position) => self.item_at(position, couches),
            None => Item::Wall,
        }
    }

    /// Whether an inline couch touches the boundary along its length.
    ///
    /// A horizontal couch on the top or bottom row, or a vertical couch in the
    /// leftmost or rightmost column, can only slide along that wall.
    pub fn is_flat_against_wall(&self, position: CouchPosition) -> bool {
        let start = position.start();
        if position.is_horizontal() {
            start.y() == 0 || start.y() + 1 == self.height
        } else if position.is_vertical() {
            start.x() == 0 || start.x() + 1 == self.width
        } else {
            false
        }
    }

    /// Whether a wall-flat couch sits where it can still slide into a goal.
    pub fn is_on_safe_wall_segment(&self, couch: &Couch) -> bool {
        self.safe_wall_positions
            .get(&(couch.color, couch.position.orientation()))
            .is_some_and(|positions| positions.contains(&couch.position.start()))
    }

    /// Whether the couch sits exactly on a goal of its color.
    #[inline]
    pub fn satisfies_goal(&self, couch: &Couch) -> bool {
        self.goals.iter().any(|goal| goal.is_satisfied_by(couch))
    }
}

/// Walks each wall-flat goal along its wall in both directions, collecting
/// every anchor cell the goal's couch could slide from.
///
/// A walk stops at the first anchor where either couch cell would leave the
/// board or land on an obstacle.
fn build_safe_wall_positions(metadata: &BoardMetadata) -> SafeWallPositions {
    let mut safe_positions = SafeWallPositions::default();

    for goal in metadata.goals() {
        if !metadata.is_flat_against_wall(goal.position) {
            continue;
        }
        let orientation = goal.position.orientation();
        let entry = safe_positions.entry((goal.color, orientation)).or_default();

        let (forward, backward) = if orientation.is_horizontal() {
            (Direction::Right, Direction::Left)
        } else {
            (Direction::Down, Direction::Up)
        };

        for direction in [forward, backward] {
            let mut anchor = Some(goal.position.start());
            while let Some(start) = anchor {
                let Some(slid) = CouchPosition::from_anchor(start, orientation) else {
                    break;
                };
                let blocked = slid
                    .cells()
                    .iter()
                    .any(|&cell| !metadata.in_bounds(cell) || metadata.is_obstacle(cell));
                if blocked {
                    break;
                }
                entry.insert(start);
                anchor = start.step(direction);
            }
        }
    }

    safe_positions
}

/// Renders a state as a bordered text grid.
///
/// `p` is the player, `o` an obstacle, and couch or goal cells show their
/// color. Couches are drawn over goals.
pub fn format_board(metadata: &BoardMetadata, state: &BoardState) -> String {
    let width = metadata.width() as usize;
    let height = metadata.height() as usize;
    let mut cells = vec![String::from(" "); width * height];

    let mut paint = |position: Position, label: String| {
        if metadata.in_bounds(position) {
            cells[metadata.cell_index(position)] = label;
        }
    };

    for goal in metadata.goals() {
        for cell in goal.position.cells() {
            paint(cell, goal.color.to_string());
        }
    }
    for couch in state.couches() {
        for cell in couch.position.cells() {
            paint(cell, couch.color.to_string());
        }
    }
    for &obstacle in &metadata.obstacles {
        paint(obstacle, String::from("o"));
    }
    paint(state.player(), String::from("p"));

    let rule = "-".repeat(width * 2 + 1);
    let mut output = String::new();
    output.push_str(&rule);
    output.push('\n');
    // an empty board renders as just its two rules
    for row in cells.chunks(width.max(1)) {
        output.push('|');
        output.push_str(&row.join(" "));
        output.push_str("|\n");
    }
    output.push_str(&rule);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(start: (u8, u8), end: (u8, u8)) -> CouchPosition {
        CouchPosition::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
            .expect("valid placement")
    }

    fn top_wall_board() -> BoardMetadata {
        // goal on the top row, obstacle two cells to its right
        BoardMetadata::new(
            6,
            3,
            [Position::new(3, 0)],
            vec![Goal::new(1, placement((1, 0), (2, 0)))],
        )
    }

    #[test]
    fn test_item_classification() {
        let metadata = top_wall_board();
        let couches = [Couch::new(1, placement((4, 1), (5, 1)))];

        assert_eq!(metadata.item_at(Position::new(6, 0), &couches), Item::Wall);
        assert_eq!(metadata.item_at(Position::new(3, 0), &couches), Item::Obstacle);
        assert_eq!(metadata.item_at(Position::new(5, 1), &couches), Item::Couch(0));
        assert_eq!(metadata.item_at(Position::new(0, 0), &couches), Item::Empty);
        assert_eq!(
            metadata.item_toward(Position::new(0, 2), Direction::Left, &couches),
            Item::Wall
        );
    }

    #[test]
    fn test_flat_against_wall() {
        let metadata = top_wall_board();

        assert!(metadata.is_flat_against_wall(placement((1, 0), (2, 0))));
        assert!(metadata.is_flat_against_wall(placement((2, 2), (1, 2))));
        assert!(metadata.is_flat_against_wall(placement((5, 0), (5, 1))));
        assert!(metadata.is_flat_against_wall(placement((0, 1), (0, 2))));
        assert!(!metadata.is_flat_against_wall(placement((1, 1), (2, 1))));
        // vertical couch touching the top row is not flat along it
        assert!(!metadata.is_flat_against_wall(placement((2, 0), (2, 1))));
        assert!(!metadata.is_flat_against_wall(placement((0, 0), (1, 1))));
    }

    #[test]
    fn test_safe_segment_stops_at_obstacles() {
        let metadata = top_wall_board();
        let safe = |start: (u8, u8), end: (u8, u8)| {
            metadata.is_on_safe_wall_segment(&Couch::new(1, placement(start, end)))
        };

        assert!(safe((1, 0), (2, 0)));
        assert!(safe((0, 0), (1, 0)));
        // the obstacle at (3,0) cuts the wall
        assert!(!safe((4, 0), (5, 0)));
        // wrong facing on the right wall segment
        assert!(!safe((1, 0), (0, 0)));
        // bottom wall has no goal
        assert!(!safe((1, 2), (2, 2)));
    }

    #[test]
    fn test_safe_segment_is_per_color() {
        let metadata = top_wall_board();
        let other_color = Couch::new(2, placement((1, 0), (2, 0)));
        assert!(!metadata.is_on_safe_wall_segment(&other_color));
    }

    #[test]
    fn test_vertical_wall_goal_slides_both_ways() {
        let metadata = BoardMetadata::new(
            3,
            5,
            [Position::new(0, 4)],
            vec![Goal::new(2, placement((0, 1), (0, 2)))],
        );
        let safe = |y: u8| {
            metadata.is_on_safe_wall_segment(&Couch::new(2, placement((0, y), (0, y + 1))))
        };

        assert!(safe(0));
        assert!(safe(1));
        assert!(safe(2));
        // end cell would sit on the obstacle
        assert!(!safe(3));
    }

    #[test]
    #[should_panic(expected = "outside the 3x3 board")]
    #[cfg(debug_assertions)]
    fn test_obstacle_off_the_board_is_rejected() {
        BoardMetadata::new(3, 3, [Position::new(3, 1)], Vec::new());
    }

    #[test]
    fn test_format_empty_board() {
        let metadata = BoardMetadata::new(0, 0, [], Vec::new());
        let state = BoardState::new(Position::new(0, 0), Vec::new(), &metadata);
        assert_eq!(format_board(&metadata, &state), "-\n-");
    }

    #[test]
    fn test_format_board_snapshot() {
        let puzzle = crate::pieces::Puzzle::parse(
            "board 4,3\nstart 0,0\no 3,2\nc1 1,1 2,1\ng1 2,1 3,1\n",
        )
        .expect("valid level");

        insta::assert_snapshot!(puzzle.format_state(&puzzle.initial_state), @r"
        ---------
        |p      |
        |  1 1 1|
        |      o|
        ---------
        ");
    }
}
