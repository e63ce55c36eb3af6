//! Submitted Actions
//!
//! One action per unit per tick. The wire format lives in
//! `network::protocol`; this is the typed form the engine consumes.

use serde::{Serialize, Deserialize};
use crate::core::position::Direction;
use crate::game::grid::UnitId;

/// What a unit wants to do this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Step one cell, pushing whatever is in the way.
    Move(Direction),
    /// Stay put.
    Pass,
}

/// An action submitted by the driver for a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Acting unit
    pub unit_id: UnitId,
    /// Requested action
    pub kind: ActionKind,
}

impl Action {
    /// Create a move action.
    pub const fn movement(unit_id: UnitId, direction: Direction) -> Self {
        Self {
            unit_id,
            kind: ActionKind::Move(direction),
        }
    }

    /// Create a pass action.
    pub const fn pass(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            kind: ActionKind::Pass,
        }
    }

    /// Direction of movement, if this is a move.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        match self.kind {
            ActionKind::Move(direction) => Some(direction),
            ActionKind::Pass => None,
        }
    }

    /// Check if this is a pass.
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self.kind, ActionKind::Pass)
    }
}
