//! Grid Store
//!
//! The authoritative cell matrix plus the unit and barrel side tables.
//! Uses BTreeMap for deterministic iteration order.
//!
//! Every unit and barrel occupies exactly the cell its record points at,
//! and every non-empty cell is backed by exactly one record. Mutation goes
//! through a handful of crate-private primitives used by the resolution
//! engine, which restores that invariant before each action returns.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::StateHasher;
use crate::core::position::{Bounds, Position};

/// Unique unit identifier, assigned by the driver at setup.
pub type UnitId = u32;

/// Team identifier. Exactly two teams exist: 0 and 1.
pub type TeamId = u8;

/// Number of teams in a match.
pub const TEAM_COUNT: TeamId = 2;

// =============================================================================
// ERRORS
// =============================================================================

/// Grid store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height is not positive.
    #[error("invalid grid dimension {width}x{height}")]
    InvalidDimension {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// Setup tried to place an entity on a non-empty cell.
    #[error("cell {0} is already occupied")]
    OccupiedCell(Position),

    /// Unit id registered twice.
    #[error("unit id {0} is already registered")]
    DuplicateUnitId(UnitId),

    /// Coordinate outside the grid.
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),

    /// Team id other than 0 or 1.
    #[error("team {0} does not exist")]
    InvalidTeam(TeamId),

    /// `set_team` called twice for the same team.
    #[error("team {0} has already been placed")]
    TeamAlreadySet(TeamId),

    /// Lookup of a unit that was never registered.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    /// Side tables and cells disagree.
    #[error("occupancy invariant violated: {0}")]
    InvariantViolation(String),
}

// =============================================================================
// CELLS AND ENTITIES
// =============================================================================

/// State of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing here
    #[default]
    Empty,
    /// A unit
    Unit {
        /// Owning team
        team: TeamId,
        /// Unit occupying the cell
        unit_id: UnitId,
    },
    /// A team's barrel
    Object {
        /// Owning team
        team: TeamId,
    },
}

impl Cell {
    /// Check if the cell is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Four-character debug token.
    pub fn token(self) -> String {
        match self {
            Cell::Empty => "[  ]".to_string(),
            Cell::Object { team } => format!("[b{}]", team),
            Cell::Unit { team, .. } => format!("[D{}]", team),
        }
    }
}

/// A unit ("dwarf") on the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique unit ID
    pub id: UnitId,
    /// Display name
    pub name: String,
    /// Owning team
    pub team: TeamId,
    /// Current cell
    pub position: Position,
}

/// A team's barrel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamObject {
    /// Owning team
    pub team: TeamId,
    /// Current cell
    pub position: Position,
}

/// Roster entry passed to [`Grid::set_team`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Unique unit ID
    pub id: UnitId,
    /// Display name
    pub name: String,
    /// Start cell
    pub position: Position,
}

impl UnitSpawn {
    /// Create a roster entry.
    pub fn new(id: UnitId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }
}

/// Externally visible state after a tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Barrel position per team
    pub objects: BTreeMap<TeamId, Position>,
    /// Units per team, ordered by id
    pub units_by_team: BTreeMap<TeamId, Vec<Unit>>,
}

// =============================================================================
// GRID
// =============================================================================

/// The grid store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    bounds: Bounds,
    /// Row-major cells
    cells: Vec<Cell>,
    units: BTreeMap<UnitId, Unit>,
    objects: BTreeMap<TeamId, TeamObject>,
}

impl Grid {
    /// Allocate an all-empty grid.
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimension { width, height });
        }

        let bounds = Bounds { width, height };
        Ok(Self {
            bounds,
            cells: vec![Cell::Empty; bounds.area()],
            units: BTreeMap::new(),
            objects: BTreeMap::new(),
        })
    }

    /// Grid dimensions.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    /// Place a team's barrel and roster.
    ///
    /// Everything is validated before the first cell is written, so a
    /// failed call leaves the grid untouched.
    pub fn set_team(
        &mut self,
        team: TeamId,
        object_position: Position,
        units: &[UnitSpawn],
    ) -> Result<(), GridError> {
        if team >= TEAM_COUNT {
            return Err(GridError::InvalidTeam(team));
        }
        if self.objects.contains_key(&team) {
            return Err(GridError::TeamAlreadySet(team));
        }

        let mut claimed: Vec<Position> = Vec::with_capacity(units.len() + 1);
        self.check_free(object_position, &claimed)?;
        claimed.push(object_position);

        let mut new_ids: Vec<UnitId> = Vec::with_capacity(units.len());
        for spawn in units {
            if self.units.contains_key(&spawn.id) || new_ids.contains(&spawn.id) {
                return Err(GridError::DuplicateUnitId(spawn.id));
            }
            self.check_free(spawn.position, &claimed)?;
            claimed.push(spawn.position);
            new_ids.push(spawn.id);
        }

        self.place_object(team, object_position);
        for spawn in units {
            self.units.insert(
                spawn.id,
                Unit {
                    id: spawn.id,
                    name: spawn.name.clone(),
                    team,
                    position: spawn.position,
                },
            );
            self.place_unit(spawn.id, spawn.position);
        }

        Ok(())
    }

    fn check_free(&self, pos: Position, claimed: &[Position]) -> Result<(), GridError> {
        let cell = self.cell_at(pos)?;
        if !cell.is_empty() || claimed.contains(&pos) {
            return Err(GridError::OccupiedCell(pos));
        }
        Ok(())
    }

    /// Cell at a position.
    pub fn cell_at(&self, pos: Position) -> Result<Cell, GridError> {
        self.bounds
            .index_of(pos)
            .map(|idx| self.cells[idx])
            .ok_or(GridError::OutOfBounds(pos))
    }

    /// Get a unit by ID.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Current position of a unit.
    pub fn unit_position(&self, id: UnitId) -> Result<Position, GridError> {
        self.units
            .get(&id)
            .map(|unit| unit.position)
            .ok_or(GridError::UnknownUnit(id))
    }

    /// Get a team's barrel.
    pub fn object(&self, team: TeamId) -> Option<&TeamObject> {
        self.objects.get(&team)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All barrels in team order.
    pub fn objects(&self) -> impl Iterator<Item = &TeamObject> {
        self.objects.values()
    }

    /// Externally visible state.
    pub fn snapshot(&self) -> GridSnapshot {
        let objects = self
            .objects
            .values()
            .map(|object| (object.team, object.position))
            .collect();

        let mut units_by_team: BTreeMap<TeamId, Vec<Unit>> = BTreeMap::new();
        for team in 0..TEAM_COUNT {
            units_by_team.insert(team, Vec::new());
        }
        for unit in self.units.values() {
            units_by_team.entry(unit.team).or_default().push(unit.clone());
        }

        GridSnapshot {
            objects,
            units_by_team,
        }
    }

    /// Human-readable dump, one row per line.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 4 + self.bounds.height as usize);
        for row in self.cells.chunks(self.bounds.width as usize) {
            for cell in row {
                out.push_str(&cell.token());
            }
            out.push('\n');
        }
        out
    }

    /// Verify that cells and side tables agree.
    pub fn check_invariants(&self) -> Result<(), GridError> {
        for (idx, cell) in self.cells.iter().enumerate() {
            let pos = Position::new(
                idx as i32 % self.bounds.width,
                idx as i32 / self.bounds.width,
            );
            match *cell {
                Cell::Empty => {}
                Cell::Unit { team, unit_id } => match self.units.get(&unit_id) {
                    Some(unit) if unit.position == pos && unit.team == team => {}
                    Some(unit) => {
                        return Err(GridError::InvariantViolation(format!(
                            "cell {} holds unit {} recorded at {}",
                            pos, unit_id, unit.position
                        )));
                    }
                    None => {
                        return Err(GridError::InvariantViolation(format!(
                            "cell {} holds unregistered unit {}",
                            pos, unit_id
                        )));
                    }
                },
                Cell::Object { team } => match self.objects.get(&team) {
                    Some(object) if object.position == pos => {}
                    _ => {
                        return Err(GridError::InvariantViolation(format!(
                            "cell {} holds a stray barrel of team {}",
                            pos, team
                        )));
                    }
                },
            }
        }

        for unit in self.units.values() {
            let expected = Cell::Unit { team: unit.team, unit_id: unit.id };
            if self.cell_at(unit.position)? != expected {
                return Err(GridError::InvariantViolation(format!(
                    "unit {} recorded at {} is not on the grid",
                    unit.id, unit.position
                )));
            }
        }

        for object in self.objects.values() {
            if self.cell_at(object.position)? != (Cell::Object { team: object.team }) {
                return Err(GridError::InvariantViolation(format!(
                    "barrel of team {} recorded at {} is not on the grid",
                    object.team, object.position
                )));
            }
        }

        Ok(())
    }

    /// Feed the grid contents into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_i32(self.bounds.width);
        hasher.update_i32(self.bounds.height);
        for object in self.objects.values() {
            hasher.update_u8(object.team);
            hasher.update_position(object.position);
        }
        for unit in self.units.values() {
            hasher.update_u32(unit.id);
            hasher.update_u8(unit.team);
            hasher.update_position(unit.position);
        }
    }

    // =========================================================================
    // Mutation primitives (resolution engine only)
    // =========================================================================

    /// Cell at an in-bounds position; `None` if off the grid.
    #[inline]
    pub(crate) fn peek(&self, pos: Position) -> Option<Cell> {
        self.bounds.index_of(pos).map(|idx| self.cells[idx])
    }

    /// Clear a cell. Side tables are not touched.
    pub(crate) fn vacate(&mut self, pos: Position) {
        if let Some(idx) = self.bounds.index_of(pos) {
            self.cells[idx] = Cell::Empty;
        }
    }

    /// Write a unit into a cell and record its new position.
    pub(crate) fn place_unit(&mut self, id: UnitId, pos: Position) {
        let Some(idx) = self.bounds.index_of(pos) else {
            return;
        };
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = pos;
            self.cells[idx] = Cell::Unit { team: unit.team, unit_id: id };
        }
    }

    /// Write a barrel into a cell and record its new position.
    pub(crate) fn place_object(&mut self, team: TeamId, pos: Position) {
        let Some(idx) = self.bounds.index_of(pos) else {
            return;
        };
        self.objects
            .entry(team)
            .and_modify(|object| object.position = pos)
            .or_insert(TeamObject { team, position: pos });
        self.cells[idx] = Cell::Object { team };
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(entries: &[(UnitId, i32, i32)]) -> Vec<UnitSpawn> {
        entries
            .iter()
            .map(|&(id, x, y)| UnitSpawn::new(id, format!("dwarf-{}", id), Position::new(x, y)))
            .collect()
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(21, 21).unwrap();
        assert_eq!(grid.width(), 21);
        assert_eq!(grid.height(), 21);
        assert_eq!(grid.cell_at(Position::new(0, 0)), Ok(Cell::Empty));
        assert_eq!(grid.cell_at(Position::new(20, 20)), Ok(Cell::Empty));
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            Grid::new(0, 5),
            Err(GridError::InvalidDimension { width: 0, height: 5 })
        );
        assert!(matches!(Grid::new(5, -1), Err(GridError::InvalidDimension { .. })));
        assert!(Grid::new(1, 1).is_ok());
    }

    #[test]
    fn test_cell_at_out_of_bounds() {
        let grid = Grid::new(5, 5).unwrap();
        assert_eq!(
            grid.cell_at(Position::new(5, 0)),
            Err(GridError::OutOfBounds(Position::new(5, 0)))
        );
        assert!(grid.cell_at(Position::new(-1, 2)).is_err());
    }

    #[test]
    fn test_set_team_places_everything() {
        let mut grid = Grid::new(21, 21).unwrap();
        grid.set_team(0, Position::new(8, 9), &roster(&[(1, 4, 18), (2, 7, 18)]))
            .unwrap();

        assert_eq!(grid.cell_at(Position::new(8, 9)), Ok(Cell::Object { team: 0 }));
        assert_eq!(
            grid.cell_at(Position::new(4, 18)),
            Ok(Cell::Unit { team: 0, unit_id: 1 })
        );
        assert_eq!(grid.unit(2).unwrap().position, Position::new(7, 18));
        assert_eq!(grid.unit(2).unwrap().name, "dwarf-2");
        assert_eq!(grid.object(0).unwrap().position, Position::new(8, 9));
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn test_set_team_rejects_occupied_cell() {
        let mut grid = Grid::new(21, 21).unwrap();
        grid.set_team(0, Position::new(8, 9), &roster(&[(1, 4, 18)])).unwrap();

        let before = grid.clone();
        let result = grid.set_team(1, Position::new(11, 9), &roster(&[(6, 4, 18)]));
        assert_eq!(result, Err(GridError::OccupiedCell(Position::new(4, 18))));

        // Failed setup must not leave a half-placed team behind
        assert_eq!(grid, before);
    }

    #[test]
    fn test_set_team_rejects_roster_sharing_a_cell() {
        let mut grid = Grid::new(21, 21).unwrap();
        let result = grid.set_team(0, Position::new(8, 9), &roster(&[(1, 2, 2), (2, 2, 2)]));
        assert_eq!(result, Err(GridError::OccupiedCell(Position::new(2, 2))));

        let result = grid.set_team(0, Position::new(8, 9), &roster(&[(1, 8, 9)]));
        assert_eq!(result, Err(GridError::OccupiedCell(Position::new(8, 9))));
    }

    #[test]
    fn test_set_team_rejects_duplicate_ids() {
        let mut grid = Grid::new(21, 21).unwrap();
        grid.set_team(0, Position::new(8, 9), &roster(&[(1, 4, 18)])).unwrap();

        let result = grid.set_team(1, Position::new(11, 9), &roster(&[(1, 4, 2)]));
        assert_eq!(result, Err(GridError::DuplicateUnitId(1)));

        let mut fresh = Grid::new(21, 21).unwrap();
        let result = fresh.set_team(0, Position::new(8, 9), &roster(&[(3, 1, 1), (3, 2, 2)]));
        assert_eq!(result, Err(GridError::DuplicateUnitId(3)));
    }

    #[test]
    fn test_set_team_rejects_bad_team() {
        let mut grid = Grid::new(21, 21).unwrap();
        assert_eq!(
            grid.set_team(2, Position::new(1, 1), &[]),
            Err(GridError::InvalidTeam(2))
        );

        grid.set_team(1, Position::new(1, 1), &[]).unwrap();
        assert_eq!(
            grid.set_team(1, Position::new(2, 2), &[]),
            Err(GridError::TeamAlreadySet(1))
        );
    }

    #[test]
    fn test_set_team_rejects_off_grid() {
        let mut grid = Grid::new(5, 5).unwrap();
        assert_eq!(
            grid.set_team(0, Position::new(5, 1), &[]),
            Err(GridError::OutOfBounds(Position::new(5, 1)))
        );
        assert_eq!(
            grid.set_team(0, Position::new(1, 1), &roster(&[(1, 0, 9)])),
            Err(GridError::OutOfBounds(Position::new(0, 9)))
        );
    }

    #[test]
    fn test_unit_position_unknown() {
        let grid = Grid::new(5, 5).unwrap();
        assert_eq!(grid.unit_position(42), Err(GridError::UnknownUnit(42)));
    }

    #[test]
    fn test_snapshot_groups_by_team() {
        let mut grid = Grid::new(21, 21).unwrap();
        grid.set_team(0, Position::new(8, 9), &roster(&[(2, 7, 18), (1, 4, 18)]))
            .unwrap();
        grid.set_team(1, Position::new(11, 9), &roster(&[(6, 4, 2)])).unwrap();

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.objects[&0], Position::new(8, 9));
        assert_eq!(snapshot.objects[&1], Position::new(11, 9));

        let team0: Vec<UnitId> = snapshot.units_by_team[&0].iter().map(|u| u.id).collect();
        assert_eq!(team0, vec![1, 2]);
        assert_eq!(snapshot.units_by_team[&1].len(), 1);
        assert_eq!(snapshot.units_by_team[&1][0].team, 1);
    }

    #[test]
    fn test_render_tokens() {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set_team(0, Position::new(0, 0), &roster(&[(1, 2, 1)])).unwrap();
        grid.set_team(1, Position::new(1, 1), &[]).unwrap();

        assert_eq!(grid.render(), "[b0][  ][  ]\n[  ][b1][D0]\n");
        assert_eq!(grid.to_string(), grid.render());
    }

    #[test]
    fn test_invariant_detects_stray_cell() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set_team(0, Position::new(1, 1), &roster(&[(1, 2, 2)])).unwrap();

        // Clearing the cell without moving the record breaks the bijection
        grid.vacate(Position::new(2, 2));
        assert!(matches!(
            grid.check_invariants(),
            Err(GridError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_primitives_keep_records_in_sync() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set_team(0, Position::new(1, 1), &roster(&[(1, 2, 2)])).unwrap();

        grid.vacate(Position::new(2, 2));
        grid.place_unit(1, Position::new(3, 2));
        grid.vacate(Position::new(1, 1));
        grid.place_object(0, Position::new(1, 0));

        assert_eq!(grid.unit_position(1), Ok(Position::new(3, 2)));
        assert_eq!(grid.object(0).unwrap().position, Position::new(1, 0));
        assert_eq!(grid.peek(Position::new(1, 0)), Some(Cell::Object { team: 0 }));
        assert_eq!(grid.peek(Position::new(9, 9)), None);
        assert!(grid.check_invariants().is_ok());
    }
}
