//! CanonicalEntry: the single stored copy of an interned value.
//!
//! An entry is jointly owned by the handles pointing at it. It also owns a
//! keepalive reference to its store so the bucket it sits in outlives it;
//! the store only ever holds a `Weak` back to the entry.

use crate::store::Shared;
use std::sync::Arc;

pub(crate) struct Entry<T, S> {
    value: T,
    fingerprint: u64,
    owner: Arc<Shared<T, S>>,
}

impl<T, S> Entry<T, S> {
    pub(crate) fn new(value: T, fingerprint: u64, owner: Arc<Shared<T, S>>) -> Self {
        Self {
            value,
            fingerprint,
            owner,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> &T {
        &self.value
    }
}

// Reclamation hook: runs once the last handle is gone. The slot is unlinked
// before `value` is dropped, so a value that itself holds handles into the
// same store can reclaim those without this entry's bucket lock held.
impl<T, S> Drop for Entry<T, S> {
    fn drop(&mut self) {
        self.owner.reclaim(self.fingerprint, self as *const Self);
    }
}
