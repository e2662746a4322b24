//! Terrain seeds: integers or deterministic hashes of arbitrary strings.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Seed shared by the noise engine and the color gradient factory.
///
/// Identical seeds produce identical height fields, gradients, and textures
/// for the same resolution and layer settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seed(pub u32);

impl Seed {
    /// Derive a seed from free-form text.
    ///
    /// Text that parses as an unsigned integer is used verbatim, so `"27"`
    /// and `Seed(27)` describe the same planet. Anything else is hashed with
    /// `FxHasher` and folded to 32 bits. The hasher's crate version is pinned
    /// because text seeds are persisted in `config.ron`.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(value) = trimmed.parse::<u32>() {
            return Self(value);
        }
        Self(fold_to_u32(hash_text(trimmed)))
    }

    /// The raw seed value.
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

#[inline]
fn fold_to_u32(value: u64) -> u32 {
    ((value >> 32) as u32) ^ (value as u32)
}
