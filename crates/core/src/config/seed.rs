use derive_more::Display;
use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// RNG seed for a map. Accepts either a number or a string on input:
/// - An integer that fits in `u64` is used directly
/// - A string that parses as a `u64` is used as that number
/// - Any other string is kept as text, and hashed when the seed is used
/// - Anything else is an error
///
/// The seed is always serialized as a **string**. TOML (and some JSON
/// consumers) can't represent the full `u64` range, so a numeric seed could
/// otherwise get mangled on its way back in.
#[derive(Clone, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeedInput", into = "String")]
pub enum Seed {
    /// An integer seed, used as-is
    Int(u64),
    /// Free text, hashed into a `u64` before use
    Text(String),
}

impl Seed {
    /// Get the numeric value to feed into RNGs and hashes
    pub fn to_u64(&self) -> u64 {
        match self {
            Self::Int(seed) => *seed,
            Self::Text(text) => {
                let mut hasher = FnvHasher::default();
                text.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::Int(42)
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Self::Int(seed)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        text.parse().map_or_else(|_| Self::Text(text.into()), Self::Int)
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.to_string()
    }
}

/// Everything we accept on the way in. Only used for deserialization.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedInput {
    Int(u64),
    Text(String),
}

impl From<SeedInput> for Seed {
    fn from(input: SeedInput) -> Self {
        match input {
            SeedInput::Int(seed) => Self::Int(seed),
            SeedInput::Text(text) => text.as_str().into(),
        }
    }
}
