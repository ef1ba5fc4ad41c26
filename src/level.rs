//! Level text format.
//!
//! One item per line, whitespace-delimited, coordinates as `X,Y` with the
//! origin at the top-left cell:
//!
//! - `board W,H`: board width and height (required)
//! - `start X,Y`: initial player cell (required)
//! - `o X,Y`: an obstacle
//! - `cN X1,Y1 X2,Y2`: a couch of color `N` covering two cells
//! - `gN X1,Y1 X2,Y2`: a goal of color `N` covering two cells
//!
//! Blank lines and lines starting with `#` are ignored. Any other malformed
//! line fails the whole load; a puzzle is never partially initialized.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::geometry::{CouchPosition, PlacementError, Position};
use crate::pieces::{Color, Couch, Goal};

/// A parsed level definition, before any search precomputation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub width: u8,
    pub height: u8,
    pub start: Position,
    pub obstacles: Vec<Position>,
    pub couches: Vec<Couch>,
    pub goals: Vec<Goal>,
}

#[derive(Debug)]
pub enum LevelError {
    Io { path: PathBuf, source: io::Error },
    UnknownKeyword { line_no: usize, keyword: String },
    CoordinateCount { line_no: usize, keyword: String, expected: usize, found: usize },
    InvalidCoordinate { line_no: usize, token: String },
    InvalidColor { line_no: usize, keyword: String },
    InvalidPlacement { line_no: usize, reason: PlacementError },
    MissingBoard,
    MissingStart,
    EmptyBoard { width: u8, height: u8 },
    OutOfBounds { what: &'static str, position: Position },
    Overlap { position: Position },
    StateTooWide { bits: u32, max_bits: u32 },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read level file {}: {source}", path.display())
            }
            Self::UnknownKeyword { line_no, keyword } => {
                write!(f, "unknown keyword '{keyword}' on line {line_no}")
            }
            Self::CoordinateCount {
                line_no,
                keyword,
                expected,
                found,
            } => write!(
                f,
                "'{keyword}' on line {line_no} takes {expected} coordinate(s), found {found}"
            ),
            Self::InvalidCoordinate { line_no, token } => {
                write!(f, "invalid coordinate '{token}' on line {line_no}: expected X,Y")
            }
            Self::InvalidColor { line_no, keyword } => {
                write!(f, "invalid color in '{keyword}' on line {line_no}")
            }
            Self::InvalidPlacement { line_no, reason } => {
                write!(f, "invalid placement on line {line_no}: {reason}")
            }
            Self::MissingBoard => write!(f, "level has no 'board' line"),
            Self::MissingStart => write!(f, "level has no 'start' line"),
            Self::EmptyBoard { width, height } => {
                write!(f, "board dimensions {width}x{height} are empty")
            }
            Self::OutOfBounds { what, position } => {
                write!(f, "{what} at {position} is outside the board")
            }
            Self::Overlap { position } => {
                write!(f, "more than one item occupies {position}")
            }
            Self::StateTooWide { bits, max_bits } => write!(
                f,
                "board state needs {bits} bits but keys hold at most {max_bits}"
            ),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidPlacement { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl Level {
    /// Reads and parses a level file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses level text and validates that every item fits on the board.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let mut dimensions = None;
        let mut start = None;
        let mut obstacles = Vec::new();
        let mut couches = Vec::new();
        let mut goals = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            if keyword.starts_with('#') {
                continue;
            }
            let coordinates = tokens
                .map(|token| parse_coordinate(line_no, token))
                .collect::<Result<Vec<_>, _>>()?;

            let name = keyword.trim_end_matches(|c: char| c.is_ascii_digit());
            match name {
                "board" | "start" | "o" if name.len() != keyword.len() => {
                    return Err(LevelError::UnknownKeyword {
                        line_no,
                        keyword: keyword.to_string(),
                    });
                }
                "board" => {
                    let [size] = expect_coordinates::<1>(line_no, keyword, &coordinates)?;
                    dimensions = Some(size);
                }
                "start" => {
                    let [position] = expect_coordinates::<1>(line_no, keyword, &coordinates)?;
                    start = Some(position);
                }
                "o" => {
                    let [position] = expect_coordinates::<1>(line_no, keyword, &coordinates)?;
                    obstacles.push(Position::new(position.0, position.1));
                }
                "c" | "g" => {
                    let color = parse_color(line_no, keyword, &keyword[name.len()..])?;
                    let [first, second] =
                        expect_coordinates::<2>(line_no, keyword, &coordinates)?;
                    let position = CouchPosition::new(
                        Position::new(first.0, first.1),
                        Position::new(second.0, second.1),
                    )
                    .map_err(|reason| LevelError::InvalidPlacement { line_no, reason })?;

                    if name == "c" {
                        couches.push(Couch::new(color, position));
                    } else {
                        goals.push(Goal::new(color, position));
                    }
                }
                _ => {
                    return Err(LevelError::UnknownKeyword {
                        line_no,
                        keyword: keyword.to_string(),
                    });
                }
            }
        }

        let (width, height) = dimensions.ok_or(LevelError::MissingBoard)?;
        let (start_x, start_y) = start.ok_or(LevelError::MissingStart)?;

        let level = Level {
            width,
            height,
            start: Position::new(start_x, start_y),
            obstacles,
            couches,
            goals,
        };
        level.validate()?;
        Ok(level)
    }

    /// Whether a cell lies on this level's board.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x() < self.width && position.y() < self.height
    }

    /// Checks bounds for every item, and that obstacles, couches and the
    /// player never share a cell. Goals may overlap anything.
    fn validate(&self) -> Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }

        let check_bounds = |what: &'static str, position: Position| {
            if self.contains(position) {
                Ok(())
            } else {
                Err(LevelError::OutOfBounds { what, position })
            }
        };

        check_bounds("start", self.start)?;
        for &obstacle in &self.obstacles {
            check_bounds("obstacle", obstacle)?;
        }
        for couch in &self.couches {
            for cell in couch.position.cells() {
                check_bounds("couch", cell)?;
            }
        }
        for goal in &self.goals {
            for cell in goal.position.cells() {
                check_bounds("goal", cell)?;
            }
        }

        let mut occupied: FxHashSet<Position> = FxHashSet::default();
        occupied.insert(self.start);
        let solid_cells = self
            .obstacles
            .iter()
            .copied()
            .chain(self.couches.iter().flat_map(|couch| couch.position.cells()));
        for cell in solid_cells {
            if !occupied.insert(cell) {
                return Err(LevelError::Overlap { position: cell });
            }
        }

        Ok(())
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

fn parse_coordinate(line_no: usize, token: &str) -> Result<(u8, u8), LevelError> {
    let invalid = || LevelError::InvalidCoordinate {
        line_no,
        token: token.to_string(),
    };
    let (x, y) = token.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<u8>().map_err(|_| invalid())?;
    let y = y.trim().parse::<u8>().map_err(|_| invalid())?;
    Ok((x, y))
}

fn parse_color(line_no: usize, keyword: &str, digits: &str) -> Result<Color, LevelError> {
    digits.parse::<Color>().map_err(|_| LevelError::InvalidColor {
        line_no,
        keyword: keyword.to_string(),
    })
}

fn expect_coordinates<const N: usize>(
    line_no: usize,
    keyword: &str,
    coordinates: &[(u8, u8)],
) -> Result<[(u8, u8); N], LevelError> {
    coordinates
        .try_into()
        .map_err(|_| LevelError::CoordinateCount {
            line_no,
            keyword: keyword.to_string(),
            expected: N,
            found: coordinates.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
board 5,4
start 0,0
o 4,3
c1 1,1 2,1
c12 0,3 0,2
g1 2,1 3,1
g12 0,1 0,2
";

    #[test]
    fn test_parses_every_keyword() {
        let level = Level::parse(SAMPLE).expect("valid level");

        assert_eq!((level.width, level.height), (5, 4));
        assert_eq!(level.start, Position::new(0, 0));
        assert_eq!(level.obstacles, vec![Position::new(4, 3)]);
        assert_eq!(level.couches.len(), 2);
        assert_eq!(level.couches[1].color, 12);
        assert_eq!(level.couches[1].position.start(), Position::new(0, 3));
        assert_eq!(level.goals.len(), 2);
        assert_eq!(level.goals[0].color, 1);
    }

    #[test]
    fn test_from_str_matches_parse() {
        let parsed: Level = SAMPLE.parse().expect("valid level");
        assert_eq!(parsed, Level::parse(SAMPLE).expect("valid level"));
    }

    #[test]
    fn test_blank_lines_and_comments_are_skipped() {
        let level = Level::parse("# corridor\n\nboard 3,1\n   \nstart 0,0\n").expect("valid");
        assert_eq!((level.width, level.height), (3, 1));
    }

    #[test]
    fn test_missing_board_and_start() {
        assert!(matches!(
            Level::parse("start 0,0\n"),
            Err(LevelError::MissingBoard)
        ));
        assert!(matches!(
            Level::parse("board 3,3\n"),
            Err(LevelError::MissingStart)
        ));
    }

    #[test]
    fn test_identical_couch_cells_are_fatal() {
        let result = Level::parse("board 3,3\nstart 0,0\nc1 1,1 1,1\n");
        assert!(matches!(
            result,
            Err(LevelError::InvalidPlacement {
                line_no: 3,
                reason: PlacementError::Identical { .. }
            })
        ));
    }

    #[test]
    fn test_malformed_lines_are_fatal() {
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,x\n"),
            Err(LevelError::InvalidCoordinate { line_no: 2, .. })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0\nc 1,1 2,1\n"),
            Err(LevelError::InvalidColor { line_no: 3, .. })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0\nwall 1,1\n"),
            Err(LevelError::UnknownKeyword { line_no: 3, .. })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0 1,1\n"),
            Err(LevelError::CoordinateCount {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0\no 300,1\n"),
            Err(LevelError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_items_must_fit_and_not_overlap() {
        assert!(matches!(
            Level::parse("board 3,3\nstart 3,0\n"),
            Err(LevelError::OutOfBounds { what: "start", .. })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0\nc1 2,2 3,2\n"),
            Err(LevelError::OutOfBounds { what: "couch", .. })
        ));
        assert!(matches!(
            Level::parse("board 3,3\nstart 0,0\no 1,1\nc1 1,1 2,1\n"),
            Err(LevelError::Overlap { .. })
        ));
        assert!(matches!(
            Level::parse("board 0,3\nstart 0,0\n"),
            Err(LevelError::EmptyBoard { .. })
        ));
    }

    #[test]
    fn test_goal_may_overlap_couch() {
        let level = Level::parse("board 3,3\nstart 0,0\nc1 1,1 2,1\ng1 1,1 2,1\n");
        assert!(level.is_ok());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = Level::load("no/such/level.txt").expect_err("file is missing");
        assert!(error.to_string().contains("no/such/level.txt"));
    }
}
