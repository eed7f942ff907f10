//! Hash maps used by schemas, the registry and the per-call tables.
//!
//! [`HashMap`] is a *hashbrown* map over [`FixedHashState`], a seeded
//! `foldhash` that mixes small integer keys such as type and field ids.
//! [`NoOpHashState`] is reserved for [`TypeId`](core::any::TypeId) keys,
//! which are already uniformly distributed.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

/// A [`hashbrown::HashMap`] hashing with [`FixedHashState`] unless told otherwise.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

// -----------------------------------------------------------------------------
// FixedHashState

const SEED: u64 = 0x51_7C_C1_B7_27_22_0A_95;

/// `foldhash` with a seed that is the same in every process.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use vc_rtti::hash::FixedHashState;
///
/// assert_eq!(FixedHashState.hash_one(7_u32), FixedHashState.hash_one(7_u32));
/// assert_ne!(FixedHashState.hash_one(7_u32), FixedHashState.hash_one(8_u32));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        const STATE: FixedState = FixedState::with_seed(SEED);
        STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHashState

/// Keeps the last integer written as the hash.
///
/// Only suitable for keys whose bits are already random.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut word = [0_u8; 8];
        for chunk in bytes.chunks(8) {
            word[..chunk.len()].copy_from_slice(chunk);
            self.0 ^= u64::from_le_bytes(word);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

/// Builds [`NoOpHasher`]s, for maps keyed by [`TypeId`](core::any::TypeId).
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher(0)
    }
}
