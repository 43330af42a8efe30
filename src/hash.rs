//! Deterministic string hashers.
//!
//! The table reduces `BuildHasher::hash_one(key)` modulo its current
//! capacity on every probe, so hashers must not be randomly seeded.

use core::hash::{BuildHasher, Hasher};

/// djb2 (`h * 33 + byte`, seeded with 5381).
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher(u64);

impl Default for Djb2Hasher {
    fn default() -> Self {
        Djb2Hasher(5381)
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 5).wrapping_add(self.0).wrapping_add(b as u64);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// Default hasher for `Table`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2BuildHasher;

impl BuildHasher for Djb2BuildHasher {
    type Hasher = Djb2Hasher;
    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1aHasher(u64);

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Fnv1aHasher(FNV_OFFSET_BASIS)
    }
}

impl Hasher for Fnv1aHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1aBuildHasher;

impl BuildHasher for Fnv1aBuildHasher {
    type Hasher = Fnv1aHasher;
    fn build_hasher(&self) -> Self::Hasher {
        Fnv1aHasher::default()
    }
}
