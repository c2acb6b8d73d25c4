//! Fingerprint: the 64-bit hash that places a value in a bucket.
//!
//! A fingerprint is only ever used for placement. Equal values always share
//! a fingerprint; unequal values may collide and are told apart by `T: Eq`.

use core::hash::{BuildHasher, Hash};

/// Hasher builder used when no custom one is supplied.
///
/// `ahash` mixes well on small integers and short strings, which are the
/// bulk of interned keys. Seeds are drawn once per store, so fingerprints
/// are stable for the life of a store but not across processes.
pub type DefaultFingerprinter = ahash::RandomState;

/// Compute the fingerprint of `q` under `hasher`.
#[inline]
pub fn fingerprint<S, Q>(hasher: &S, q: &Q) -> u64
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    hasher.hash_one(q)
}

/// Map a fingerprint onto one of `buckets` slots (`h mod N`).
#[inline]
pub(crate) fn bucket_index(fingerprint: u64, buckets: usize) -> usize {
    debug_assert!(buckets > 0);
    (fingerprint % buckets as u64) as usize
}
