//! Seeded per-cell pseudo-random functions. These give every cell its own
//! reproducible random values without touching the shared RNG stream, so
//! the values don't depend on the order cells are visited in.

use crate::map::grid::GridPoint;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// What a cell hash is being used for. Hashing the same cell for two
/// different purposes must give uncorrelated values, so each consumer gets
/// its own tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashPurpose {
    /// Deriving the seed of a noise function
    NoiseSeed,
    /// Deciding whether an interior cell gets decorated at all
    DecorationDensity,
    /// Picking which decorative variant to use
    DecorationVariant,
}

/// SplitMix64 finalizer. FNV on its own has poor avalanche for small inputs
/// (neighboring coordinates hash to neighboring values), so every hash gets
/// run through this.
pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash a cell, keyed by seed, purpose, and an arbitrary salt (usually a
/// biome ID).
pub fn cell_hash(
    seed: u64,
    point: GridPoint,
    purpose: HashPurpose,
    salt: u64,
) -> u64 {
    let mut hasher = FnvHasher::default();
    (seed, point.x, point.y, purpose, salt).hash(&mut hasher);
    mix64(hasher.finish())
}

/// Map a hash onto `[0, 1)`, using the top 53 bits so every output is an
/// exactly representable f64.
pub fn unit_interval(hash: u64) -> f64 {
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

/// Derive the seed for a noise function from the map seed and a per-function
/// offset.
pub fn noise_seed(seed: u64, seed_offset: u32) -> u32 {
    let mut hasher = FnvHasher::default();
    (seed, HashPurpose::NoiseSeed, seed_offset).hash(&mut hasher);
    // Truncation is fine, noise fns only take 32-bit seeds
    mix64(hasher.finish()) as u32
}
