//! Scatter Outcomes
//!
//! When a pushed barrel hits a dwarf, the dwarf is knocked one cell forward
//! and then either deflected sideways or carried one more cell forward.
//! Which of the three happens is the only random decision in the game; the
//! engine asks a [`ScatterSource`] for it so tests can pin the outcome.

use serde::{Serialize, Deserialize};
use crate::core::position::{Direction, Position};
use crate::core::rng::DeterministicRng;

/// Where a struck unit lands, relative to the strike direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScatterOutcome {
    /// One step forward, one step towards the lower perpendicular
    /// coordinate (north-west for a northbound strike).
    DeflectLow,
    /// Two steps forward.
    Straight,
    /// One step forward, one step towards the higher perpendicular
    /// coordinate (north-east for a northbound strike).
    DeflectHigh,
}

impl ScatterOutcome {
    /// All outcomes, in draw order.
    pub const ALL: [ScatterOutcome; 3] = [
        ScatterOutcome::DeflectLow,
        ScatterOutcome::Straight,
        ScatterOutcome::DeflectHigh,
    ];

    /// Map a draw in `0..3` to an outcome.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Raw landing cell for a unit at `from` struck towards `direction`.
    ///
    /// No clamping is applied.
    pub fn landing(self, from: Position, direction: Direction) -> Position {
        let forward = from.step(direction);
        let (px, py) = direction.perpendicular_low();
        match self {
            ScatterOutcome::DeflectLow => forward.offset(px, py),
            ScatterOutcome::Straight => forward.step(direction),
            ScatterOutcome::DeflectHigh => forward.offset(-px, -py),
        }
    }
}

/// Source of scatter outcomes.
pub trait ScatterSource {
    /// Draw the outcome for the next strike.
    fn next_outcome(&mut self) -> ScatterOutcome;
}

impl ScatterSource for DeterministicRng {
    fn next_outcome(&mut self) -> ScatterOutcome {
        ScatterOutcome::from_index(self.next_int(3)).unwrap_or(ScatterOutcome::Straight)
    }
}

/// Always returns the same outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedScatter(pub ScatterOutcome);

impl ScatterSource for FixedScatter {
    fn next_outcome(&mut self) -> ScatterOutcome {
        self.0
    }
}

/// Plays back a fixed sequence, then repeats the last entry.
///
/// An empty script behaves like `FixedScatter(Straight)`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedScatter {
    outcomes: Vec<ScatterOutcome>,
    cursor: usize,
}

impl ScriptedScatter {
    /// Create from a sequence of outcomes.
    pub fn new(outcomes: Vec<ScatterOutcome>) -> Self {
        Self { outcomes, cursor: 0 }
    }

    /// Number of outcomes drawn so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl ScatterSource for ScriptedScatter {
    fn next_outcome(&mut self) -> ScatterOutcome {
        let outcome = self
            .outcomes
            .get(self.cursor)
            .or_else(|| self.outcomes.last())
            .copied()
            .unwrap_or(ScatterOutcome::Straight);
        self.cursor += 1;
        outcome
    }
}
