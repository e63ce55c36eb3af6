//! Grid Positions and Directions
//!
//! Integer grid coordinates with the clamping rules used by movement.
//! The origin is the top-left cell: North decreases `y`, East increases `x`.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A cell coordinate on the grid.
///
/// Signed so that intermediate results (one step past an edge) can be
/// represented before they are clamped back into range.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by an offset.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// One step in `direction`, without clamping.
    #[inline]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Clamp into `[0, width-1] x [0, height-1]`.
    #[inline]
    pub fn clamp_to(self, bounds: Bounds) -> Self {
        Self {
            x: self.x.clamp(0, bounds.width - 1),
            y: self.y.clamp(0, bounds.height - 1),
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid dimensions. Both values are always at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Number of columns
    pub width: i32,
    /// Number of rows
    pub height: i32,
}

impl Bounds {
    /// Check if a position lies on the grid.
    #[inline]
    pub fn contains(self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Row-major index of an in-bounds position.
    #[inline]
    pub fn index_of(self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    /// Total number of cells.
    #[inline]
    pub fn area(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Clamp used when a struck unit lands.
    ///
    /// The margin is asymmetric: one column is kept free on both sides, one
    /// row at the bottom, none at the top. Order of the checks matters on
    /// tiny grids. The final outer clamp only matters when `width < 3` or
    /// `height < 2`.
    pub fn clamp_scatter(self, pos: Position) -> Position {
        let mut landing = pos;
        if landing.y < 0 {
            landing.y = 0;
        }
        if landing.y >= self.height - 1 {
            landing.y = self.height - 2;
        }
        if landing.x >= self.width - 1 {
            landing.x = self.width - 2;
        }
        if landing.x < 1 {
            landing.x = 1;
        }
        landing.clamp_to(self)
    }
}

/// Cardinal movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Towards row 0
    North,
    /// Towards the last row
    South,
    /// Towards the last column
    East,
    /// Towards column 0
    West,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit offset `(dx, dy)` for this direction.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Offset of one step along the perpendicular axis, towards the lower
    /// coordinate (west for vertical movement, north for horizontal).
    #[inline]
    pub const fn perpendicular_low(self) -> (i32, i32) {
        match self {
            Direction::North | Direction::South => (-1, 0),
            Direction::East | Direction::West => (0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
            Direction::East => "EAST",
            Direction::West => "WEST",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: Bounds = Bounds { width: 21, height: 21 };

    #[test]
    fn test_step_directions() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step(Direction::North), Position::new(5, 4));
        assert_eq!(origin.step(Direction::South), Position::new(5, 6));
        assert_eq!(origin.step(Direction::East), Position::new(6, 5));
        assert_eq!(origin.step(Direction::West), Position::new(4, 5));
    }

    #[test]
    fn test_clamp_to_outer_bounds() {
        assert_eq!(Position::new(-1, 4).clamp_to(GRID), Position::new(0, 4));
        assert_eq!(Position::new(21, 4).clamp_to(GRID), Position::new(20, 4));
        assert_eq!(Position::new(4, -1).clamp_to(GRID), Position::new(4, 0));
        assert_eq!(Position::new(4, 21).clamp_to(GRID), Position::new(4, 20));
    }

    #[test]
    fn test_scatter_clamp_is_asymmetric() {
        // Top row is reachable, bottom row is not
        assert_eq!(GRID.clamp_scatter(Position::new(5, -2)), Position::new(5, 0));
        assert_eq!(GRID.clamp_scatter(Position::new(5, 20)), Position::new(5, 19));
        // Both outer columns are off limits
        assert_eq!(GRID.clamp_scatter(Position::new(0, 5)), Position::new(1, 5));
        assert_eq!(GRID.clamp_scatter(Position::new(20, 5)), Position::new(19, 5));
        // Interior untouched
        assert_eq!(GRID.clamp_scatter(Position::new(10, 10)), Position::new(10, 10));
    }

    #[test]
    fn test_scatter_clamp_tiny_grid_stays_on_grid() {
        for (w, h) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            let bounds = Bounds { width: w, height: h };
            for x in -2..4 {
                for y in -2..4 {
                    let landing = bounds.clamp_scatter(Position::new(x, y));
                    assert!(bounds.contains(landing), "{:?} off a {}x{} grid", landing, w, h);
                }
            }
        }
    }

    #[test]
    fn test_index_of() {
        assert_eq!(GRID.index_of(Position::new(0, 0)), Some(0));
        assert_eq!(GRID.index_of(Position::new(3, 2)), Some(45));
        assert_eq!(GRID.index_of(Position::new(21, 0)), None);
        assert_eq!(GRID.index_of(Position::new(0, -1)), None);
        assert_eq!(GRID.area(), 441);
    }

    #[test]
    fn test_direction_serde_names() {
        let json = serde_json::to_string(&Direction::North).unwrap();
        assert_eq!(json, "\"NORTH\"");
        let parsed: Direction = serde_json::from_str("\"WEST\"").unwrap();
        assert_eq!(parsed, Direction::West);
    }
}
