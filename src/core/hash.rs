//! State Hashing for Verification
//!
//! Provides deterministic hashing of match state for:
//! - Replay validation
//! - Detecting that a tick left the grid untouched

use sha2::{Sha256, Digest};
use super::position::Position;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for match state.
///
/// Wraps SHA-256 with helpers for grid types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"DWARVEN_TAVERN_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a grid position.
    #[inline]
    pub fn update_position(&mut self, value: Position) {
        self.update_i32(value.x);
        self.update_i32(value.y);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for match verification.
///
/// This function is called by `MatchState::compute_hash()`.
/// The parameter is a closure that adds state-specific data.
pub fn compute_state_hash<F>(tick: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    // Always hash tick and seed first
    hasher.update_u32(tick);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_match_state();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_position(Position::new(3, 4));
            hasher.update_u8(1);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_position(Position::new(1, 2));
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_position(Position::new(2, 1));
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(100, 12345, |hasher| {
            hasher.update_position(Position::new(5, 5));
        });
        let hash2 = compute_state_hash(100, 12345, |hasher| {
            hasher.update_position(Position::new(5, 5));
        });
        assert_eq!(hash, hash2);

        // Different tick = different hash
        let hash3 = compute_state_hash(101, 12345, |hasher| {
            hasher.update_position(Position::new(5, 5));
        });
        assert_ne!(hash, hash3);
    }
}
