//! Item identifiers
//!
//! ID Format: a version-4 UUID in its hyphenated lowercase form
//! (e.g. `3f2b4c1d-9a0e-4b7c-a1d2-0e9f8c7b6a54`).
//!
//! Ids are opaque once stored: anything persisted with a string id is kept
//! as-is, so only freshly generated ids are guaranteed to have the UUID shape.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of characters shown when an id is abbreviated for display
pub const SHORT_ID_LEN: usize = 8;

/// Identifier of a single item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps an existing id without validating it
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form used in listings
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_ID_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Returns true if this id has the version-4 UUID shape
    pub fn is_uuid_v4_shaped(&self) -> bool {
        is_uuid_v4_shaped(&self.0)
    }
}

/// Checks the `8-4-4-4-12` lowercase hex layout with the version nibble set
/// to `4` and the variant nibble in `{8, 9, a, b}`.
pub fn is_uuid_v4_shaped(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    let lens = [8, 4, 4, 4, 12];

    if groups.len() != lens.len() {
        return false;
    }

    let well_formed = groups.iter().zip(lens).all(|(group, len)| {
        group.len() == len
            && group
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    });

    well_formed
        && groups[2].starts_with('4')
        && matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b'))
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Source of identifiers for newly created items
pub trait IdGenerator {
    /// Produces a fresh identifier
    fn generate(&mut self) -> ItemId;
}

/// Generates random version-4 UUIDs from any [`RngCore`]
///
/// Collision resistance comes from the 122 random bits; the generator is not
/// meant to be cryptographically secure.
#[derive(Debug)]
pub struct RandomIdGenerator<R = StdRng> {
    rng: R,
}

impl RandomIdGenerator<StdRng> {
    /// Creates a generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic generator, useful in tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIdGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> RandomIdGenerator<R> {
    /// Creates a generator drawing from the given RNG
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> IdGenerator for RandomIdGenerator<R> {
    fn generate(&mut self) -> ItemId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        ItemId(uuid.hyphenated().to_string())
    }
}
