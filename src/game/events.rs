//! Resolution Events
//!
//! Emitted while a tick is resolved, in the order the grid was changed.
//! Within one cascade the innermost displacement lands first: a push that
//! scatters a dwarf yields `UnitScattered`, then `ObjectPushed`, then
//! `UnitMoved` for the dwarf that started it.

use serde::{Serialize, Deserialize};
use crate::core::position::{Direction, Position};
use crate::game::grid::{TeamId, UnitId};
use crate::game::scatter::ScatterOutcome;

/// Why a move, push or scatter did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Already against the grid edge
    Boundary,
    /// Another team's barrel in the way of a barrel
    ObjectInTheWay,
    /// A dwarf in the way of a moving dwarf
    UnitInTheWay,
    /// The barrel in front could not be pushed
    PushFailed,
    /// The struck dwarf could not get out of the way
    ScatterFailed,
    /// Cascade exceeded the configured depth
    DepthLimit,
}

/// Why an action was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No unit with this id was registered at setup
    UnknownUnit,
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEventData {
    /// A dwarf stepped into a new cell
    UnitMoved {
        unit_id: UnitId,
        from: Position,
        to: Position,
    },

    /// A barrel moved one cell
    ObjectPushed {
        team: TeamId,
        from: Position,
        to: Position,
        direction: Direction,
    },

    /// A struck dwarf landed somewhere new
    UnitScattered {
        unit_id: UnitId,
        from: Position,
        to: Position,
        outcome: ScatterOutcome,
    },

    /// A dwarf's own move did not happen
    MoveBlocked {
        unit_id: UnitId,
        at: Position,
        reason: BlockReason,
    },

    /// A barrel could not be pushed
    PushBlocked {
        team: TeamId,
        at: Position,
        reason: BlockReason,
    },

    /// A struck dwarf stayed in place. `outcome` is `None` when the strike
    /// was refused before anything was drawn.
    ScatterBlocked {
        unit_id: UnitId,
        at: Position,
        outcome: Option<ScatterOutcome>,
        reason: BlockReason,
    },

    /// The action was ignored
    ActionSkipped {
        unit_id: UnitId,
        reason: SkipReason,
    },

    /// The cascade hit the depth cap
    CascadeLimitReached {
        depth: u32,
    },
}

/// An event with timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Index of the action in the tick's batch
    pub action_index: usize,

    /// Event data
    pub data: ResolutionEventData,
}

impl ResolutionEvent {
    /// Create a new event.
    pub fn new(tick: u32, action_index: usize, data: ResolutionEventData) -> Self {
        Self {
            tick,
            action_index,
            data,
        }
    }

    /// Dwarf directly involved, if any.
    pub fn unit_id(&self) -> Option<UnitId> {
        match &self.data {
            ResolutionEventData::UnitMoved { unit_id, .. }
            | ResolutionEventData::UnitScattered { unit_id, .. }
            | ResolutionEventData::MoveBlocked { unit_id, .. }
            | ResolutionEventData::ScatterBlocked { unit_id, .. }
            | ResolutionEventData::ActionSkipped { unit_id, .. } => Some(*unit_id),
            ResolutionEventData::ObjectPushed { .. }
            | ResolutionEventData::PushBlocked { .. }
            | ResolutionEventData::CascadeLimitReached { .. } => None,
        }
    }

    /// Check if the event records a change of the grid.
    pub fn is_displacement(&self) -> bool {
        matches!(
            self.data,
            ResolutionEventData::UnitMoved { .. }
                | ResolutionEventData::ObjectPushed { .. }
                | ResolutionEventData::UnitScattered { .. }
        )
    }
}
