//! Match State
//!
//! Everything a tick reads and writes: the grid, the tick counter and the
//! seeded RNG that drives scatter outcomes.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::events::ResolutionEvent;
use crate::game::grid::{Grid, GridError, GridSnapshot, TeamId, UnitSpawn};
use crate::core::position::Position;

/// Complete state of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identifier
    pub match_id: [u8; 16],

    /// Number of ticks resolved so far
    pub tick: u32,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// The board
    pub grid: Grid,

    /// Events generated this tick (cleared each tick)
    #[serde(skip)]
    pub pending_events: Vec<ResolutionEvent>,
}

impl MatchState {
    /// Create a match on an empty `width` x `height` grid.
    pub fn new(match_id: [u8; 16], rng_seed: u64, width: i32, height: i32) -> Result<Self, GridError> {
        Ok(Self {
            match_id,
            tick: 0,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            grid: Grid::new(width, height)?,
            pending_events: Vec::new(),
        })
    }

    /// Place a team's barrel and roster. See [`Grid::set_team`].
    pub fn set_team(
        &mut self,
        team: TeamId,
        object_position: Position,
        units: &[UnitSpawn],
    ) -> Result<(), GridError> {
        self.grid.set_team(team, object_position, units)
    }

    /// Externally visible grid state.
    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
            self.grid.hash_into(hasher);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<ResolutionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a resolution event.
    pub fn push_event(&mut self, event: ResolutionEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{ResolutionEventData, SkipReason};

    fn two_teams(seed: u64) -> MatchState {
        let mut state = MatchState::new([0; 16], seed, 21, 21).unwrap();
        state
            .set_team(0, Position::new(8, 9), &[UnitSpawn::new(1, "Rhun", Position::new(4, 18))])
            .unwrap();
        state
            .set_team(1, Position::new(11, 9), &[UnitSpawn::new(6, "Edmyg", Position::new(4, 2))])
            .unwrap();
        state
    }

    #[test]
    fn test_match_state_determinism() {
        let state1 = two_teams(12345);
        let state2 = two_teams(12345);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_hash_covers_grid_and_rng() {
        let base = two_teams(12345);

        let mut moved = base.clone();
        moved.grid.vacate(Position::new(4, 18));
        moved.grid.place_unit(1, Position::new(4, 17));
        assert_ne!(base.compute_hash(), moved.compute_hash());

        let mut drawn = base.clone();
        drawn.rng.next_u64();
        assert_ne!(base.compute_hash(), drawn.compute_hash());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            MatchState::new([0; 16], 1, 0, 5).unwrap_err(),
            GridError::InvalidDimension { width: 0, height: 5 }
        );
    }

    #[test]
    fn test_take_events_drains() {
        let mut state = two_teams(1);
        state.push_event(ResolutionEvent::new(
            0,
            0,
            ResolutionEventData::ActionSkipped { unit_id: 9, reason: SkipReason::UnknownUnit },
        ));
        assert_eq!(state.take_events().len(), 1);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_state_json_skips_pending_events() {
        let mut state = two_teams(7);
        state.push_event(ResolutionEvent::new(
            0,
            0,
            ResolutionEventData::CascadeLimitReached { depth: 65 },
        ));

        let json = serde_json::to_string(&state).unwrap();
        let restored: MatchState = serde_json::from_str(&json).unwrap();
        assert!(restored.pending_events.is_empty());
        assert_eq!(restored.compute_hash(), state.compute_hash());
    }
}
