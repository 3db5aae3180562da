//! Provide `FixedHasher` and `NoOpHasher`.
//!
//! `FixedHasher` wraps `foldhash` with a constant seed, so two processes hashing
//! the same serializer key get the same bucket layout.
//!
//! `NoOpHasher` passes an already well-distributed `u64` straight through. It is
//! meant for keys such as [`TypeId`](core::any::TypeId), which hash themselves
//! with a single `write_u64`.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6d73_6770_6163_6b21);

/// A hasher whose output only depends on the input.
///
/// Created through [`FixedHashState::build_hasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state with a fixed seed, based on `foldhash`.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use vc_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("nil");
/// let b = FixedHashState.hash_one("nil");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher that keeps the last written `u64` as the hash value.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Fold little-endian so `write(&n.to_le_bytes())` matches `write_u64(n)`.
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state producing [`NoOpHasher`]s.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hasher};
/// use vc_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// hasher.write_u64(42);
/// assert_eq!(hasher.finish(), 42);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hasher};

    use super::{FixedHashState, NoOpHashState};

    #[test]
    fn noop_write_matches_write_u64() {
        let mut a = NoOpHashState.build_hasher();
        a.write(&0x0102_0304_u64.to_le_bytes());
        let mut b = NoOpHashState.build_hasher();
        b.write_u64(0x0102_0304);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn fixed_state_is_stable() {
        assert_eq!(FixedHashState.hash_one(17_u32), FixedHashState.hash_one(17_u32));
        assert_ne!(FixedHashState.hash_one(17_u32), FixedHashState.hash_one(18_u32));
    }
}
