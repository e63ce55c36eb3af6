//! Core deterministic primitives.
//!
//! Grid geometry, the seeded PRNG behind scatter outcomes, and state hashing.

pub mod position;
pub mod rng;
pub mod hash;

// Re-export core types
pub use position::{Position, Direction, Bounds};
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
