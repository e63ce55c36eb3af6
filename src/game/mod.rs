//! Game Logic Module
//!
//! All game simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `grid`: Cell matrix, dwarves and barrels
//! - `action`: Typed per-unit actions
//! - `scatter`: Scatter outcomes and their sources
//! - `resolve`: Move, push and scatter cascades
//! - `state`: Match state
//! - `tick`: Batch resolution loop
//! - `events`: Resolution events for replay/verification

pub mod action;
pub mod grid;
pub mod scatter;
pub mod resolve;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use action::{Action, ActionKind};
pub use grid::{Cell, Grid, GridError, GridSnapshot, TeamId, UnitId, UnitSpawn};
pub use scatter::{ScatterOutcome, ScatterSource};
pub use state::MatchState;
pub use tick::{MatchConfig, TickResult};
pub use events::{ResolutionEvent, ResolutionEventData, BlockReason};
