//! # Dwarven Tavern Server
//!
//! Turn resolution for Dwarven Tavern: two teams of dwarves pushing their
//! barrels around a grid.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  DWARVEN TAVERN SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── position.rs - Cells, directions, grid bounds            │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── grid.rs     - Grid store                                │
//! │  ├── action.rs   - Submitted actions                         │
//! │  ├── scatter.rs  - Scatter outcomes                          │
//! │  ├── resolve.rs  - Push/scatter cascades                     │
//! │  ├── state.rs    - Match state                               │
//! │  ├── tick.rs     - Batch resolution loop                     │
//! │  └── events.rs   - Resolution events                         │
//! │                                                              │
//! │  network/        - Wire format                               │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+, drawn only when a barrel
//!   strikes a dwarf
//!
//! Given identical action batches and RNG seed, a match produces
//! **identical results** and an identical state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::position::{Direction, Position};
pub use core::rng::DeterministicRng;
pub use game::action::Action;
pub use game::grid::{Grid, GridError, UnitSpawn};
pub use game::state::MatchState;
pub use game::tick::{tick, MatchConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default grid width (columns)
pub const DEFAULT_GRID_WIDTH: i32 = 21;

/// Default grid height (rows)
pub const DEFAULT_GRID_HEIGHT: i32 = 21;
