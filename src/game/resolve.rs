//! Cascade Resolution
//!
//! Resolves one action against the grid: a dwarf steps, pushes the barrel
//! in front of it, the barrel knocks a dwarf aside, that dwarf lands on the
//! other barrel, and so on until something gives way or blocks.
//!
//! # Rules
//!
//! - Every step is clamped to the grid; a step that clamps back onto its
//!   origin does nothing.
//! - A dwarf walks into an empty cell, pushes a barrel, or is blocked by
//!   another dwarf.
//! - A barrel slides into an empty cell, is blocked by the other barrel, or
//!   strikes a dwarf, which scatters. The barrel follows only if the dwarf
//!   actually left the cell.
//! - A scattered dwarf lands according to the drawn [`ScatterOutcome`],
//!   clamped by [`Bounds::clamp_scatter`], and resolves its landing like a
//!   walk. If the landing cannot be cleared it stays where it was.
//!
//! # Lifting
//!
//! Every entity that starts moving is lifted off the grid: its cell is
//! emptied before the cell in front of it is cleared, and it is put back
//! there if that fails. A dwarf struck against the edge can therefore land
//! on the cell the barrel just left, and the two swap.
//!
//! A cascade is a single chain, so at most one lifted entity lands on a
//! cell it did not clear itself. Whoever sits behind that cell in the chain
//! finds it taken and falls back to its own, still empty, origin.
//!
//! # Termination
//!
//! A lifted entity is not on the grid, so nothing further down the cascade
//! can strike or push it again. Each level of the cascade therefore consumes
//! a distinct entity. On top of that the depth is capped by `max_depth`, and
//! hitting the cap blocks the step.

use tracing::warn;

use crate::core::position::{Bounds, Direction, Position};
use crate::game::events::{BlockReason, ResolutionEventData};
use crate::game::grid::{Cell, Grid, TeamId, UnitId};
use crate::game::scatter::{ScatterOutcome, ScatterSource};

/// Resolves cascades for a single action.
pub struct Resolver<'a> {
    grid: &'a mut Grid,
    source: &'a mut dyn ScatterSource,
    max_depth: u32,
    events: Vec<ResolutionEventData>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `grid` drawing scatter outcomes from `source`.
    pub fn new(grid: &'a mut Grid, source: &'a mut dyn ScatterSource, max_depth: u32) -> Self {
        Self {
            grid,
            source,
            max_depth,
            events: Vec::new(),
        }
    }

    /// Events recorded so far, in the order the grid changed.
    pub fn into_events(self) -> Vec<ResolutionEventData> {
        self.events
    }

    #[inline]
    fn bounds(&self) -> Bounds {
        self.grid.bounds()
    }

    /// Depth guard shared by pushes and scatters.
    fn within_depth(&mut self, depth: u32) -> bool {
        if depth <= self.max_depth {
            return true;
        }
        warn!(depth, max_depth = self.max_depth, "cascade depth limit reached");
        self.events.push(ResolutionEventData::CascadeLimitReached { depth });
        false
    }

    /// Move a dwarf one cell. Returns true if it moved.
    ///
    /// Unknown dwarves are ignored (the caller reports them).
    pub fn resolve_unit_move(&mut self, unit_id: UnitId, direction: Direction) -> bool {
        let Ok(from) = self.grid.unit_position(unit_id) else {
            return false;
        };

        let target = from.step(direction).clamp_to(self.bounds());
        if target == from {
            self.events.push(ResolutionEventData::MoveBlocked {
                unit_id,
                at: from,
                reason: BlockReason::Boundary,
            });
            return false;
        }

        self.grid.vacate(from);
        match self.clear_for_unit(target, direction, 1) {
            Ok(()) => {
                self.grid.place_unit(unit_id, target);
                self.events.push(ResolutionEventData::UnitMoved {
                    unit_id,
                    from,
                    to: target,
                });
                true
            }
            Err(reason) => {
                self.grid.place_unit(unit_id, from);
                self.events.push(ResolutionEventData::MoveBlocked {
                    unit_id,
                    at: from,
                    reason,
                });
                false
            }
        }
    }

    /// Make `target` empty so a dwarf can step into it.
    fn clear_for_unit(
        &mut self,
        target: Position,
        direction: Direction,
        depth: u32,
    ) -> Result<(), BlockReason> {
        match self.grid.peek(target) {
            Some(Cell::Empty) => Ok(()),
            Some(Cell::Object { team }) => {
                self.resolve_object_push(team, direction, depth);
                self.require_empty(target, BlockReason::PushFailed)
            }
            Some(Cell::Unit { .. }) => Err(BlockReason::UnitInTheWay),
            None => Err(BlockReason::Boundary),
        }
    }

    fn require_empty(&self, pos: Position, reason: BlockReason) -> Result<(), BlockReason> {
        match self.grid.peek(pos) {
            Some(Cell::Empty) => Ok(()),
            _ => Err(reason),
        }
    }

    /// Push a team's barrel one cell. Returns true if it moved.
    pub fn resolve_object_push(&mut self, team: TeamId, direction: Direction, depth: u32) -> bool {
        let Some(from) = self.grid.object(team).map(|object| object.position) else {
            return false;
        };

        if !self.within_depth(depth) {
            return self.push_blocked(team, from, BlockReason::DepthLimit);
        }

        let target = from.step(direction).clamp_to(self.bounds());
        if target == from {
            return self.push_blocked(team, from, BlockReason::Boundary);
        }

        self.grid.vacate(from);
        let cleared = match self.grid.peek(target) {
            Some(Cell::Empty) => Ok(()),
            Some(Cell::Object { .. }) => Err(BlockReason::ObjectInTheWay),
            Some(Cell::Unit { unit_id, .. }) => {
                self.resolve_unit_scatter(unit_id, direction, depth + 1);
                self.require_empty(target, BlockReason::ScatterFailed)
            }
            None => Err(BlockReason::Boundary),
        };

        match cleared {
            Ok(()) => {
                self.grid.place_object(team, target);
                self.events.push(ResolutionEventData::ObjectPushed {
                    team,
                    from,
                    to: target,
                    direction,
                });
                true
            }
            Err(reason) => {
                self.grid.place_object(team, from);
                self.push_blocked(team, from, reason)
            }
        }
    }

    fn push_blocked(&mut self, team: TeamId, at: Position, reason: BlockReason) -> bool {
        self.events.push(ResolutionEventData::PushBlocked { team, at, reason });
        false
    }

    /// Knock a dwarf aside after a barrel struck it moving `direction`.
    ///
    /// Returns true if the dwarf left its cell.
    pub fn resolve_unit_scatter(&mut self, unit_id: UnitId, direction: Direction, depth: u32) -> bool {
        let Ok(from) = self.grid.unit_position(unit_id) else {
            return false;
        };

        if !self.within_depth(depth) {
            return self.scatter_blocked(unit_id, from, None, BlockReason::DepthLimit);
        }

        let outcome = self.source.next_outcome();
        let landing = self.bounds().clamp_scatter(outcome.landing(from, direction));
        if landing == from {
            return self.scatter_blocked(unit_id, from, Some(outcome), BlockReason::Boundary);
        }

        self.grid.vacate(from);
        match self.clear_for_unit(landing, direction, depth + 1) {
            Ok(()) => {
                self.grid.place_unit(unit_id, landing);
                self.events.push(ResolutionEventData::UnitScattered {
                    unit_id,
                    from,
                    to: landing,
                    outcome,
                });
                true
            }
            Err(reason) => {
                self.grid.place_unit(unit_id, from);
                self.scatter_blocked(unit_id, from, Some(outcome), reason)
            }
        }
    }

    fn scatter_blocked(
        &mut self,
        unit_id: UnitId,
        at: Position,
        outcome: Option<ScatterOutcome>,
        reason: BlockReason,
    ) -> bool {
        self.events.push(ResolutionEventData::ScatterBlocked {
            unit_id,
            at,
            outcome,
            reason,
        });
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================
