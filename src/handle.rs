//! Handle: the caller-facing reference to a canonical entry.

use crate::entry::Entry;
use crate::fingerprint::DefaultFingerprinter;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use std::sync::Arc;

/// A shared reference to an interned value.
///
/// Two handles are equal iff they point at the same canonical entry, which
/// for handles from the same interner means their values are equal. Equality
/// and hashing look only at the entry's address and never touch the store.
/// Cloning bumps a reference count; dropping the last clone reclaims the
/// entry.
///
/// `Handle` intentionally does not implement `Borrow<T>`: its `Hash` is
/// address-based and would disagree with `T`'s.
pub struct Handle<T, S = DefaultFingerprinter> {
    entry: Arc<Entry<T, S>>,
}

impl<T, S> Handle<T, S> {
    pub(crate) fn new(entry: Arc<Entry<T, S>>) -> Self {
        Self { entry }
    }

    /// The interned value. Valid for as long as this handle lives.
    #[inline]
    pub fn value(&self) -> &T {
        self.entry.value()
    }

    /// Address of the stored value; stable while any handle to it is live.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.entry.value()
    }

    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.entry, &b.entry)
    }
}

impl<T, S> Clone for Handle<T, S> {
    fn clone(&self) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
        }
    }
}

impl<T, S> PartialEq for Handle<T, S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T, S> Eq for Handle<T, S> {}

impl<T, S> Hash for Handle<T, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.entry) as usize).hash(state);
    }
}

impl<T, S> Deref for Handle<T, S> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value()
    }
}

impl<T, S> AsRef<T> for Handle<T, S> {
    fn as_ref(&self) -> &T {
        self.value()
    }
}

impl<T: fmt::Debug, S> fmt::Debug for Handle<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.value(), f)
    }
}

impl<T: fmt::Display, S> fmt::Display for Handle<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.value(), f)
    }
}

#[cfg(test)]
mod tests {
    use crate::Interner;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};

    fn hash_of<H: Hash>(h: &H) -> u64 {
        let mut s = DefaultHasher::new();
        h.hash(&mut s);
        s.finish()
    }

    /// Clones are equal and hash alike; distinct entries are not equal.
    #[test]
    fn equality_and_hash_follow_identity() {
        let m: Interner<String> = Interner::new();
        let a = m.intern("a".to_string());
        let a2 = a.clone();
        let b = m.intern("b".to_string());
        assert!(a == a2);
        assert_eq!(hash_of(&a), hash_of(&a2));
        assert!(a != b);

        let set: HashSet<_> = [a.clone(), a2, b.clone(), m.intern("a".to_string())]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn value_deref_and_formatting() {
        let m: Interner<String> = Interner::new();
        let h = m.intern("hi".to_string());
        assert_eq!(h.value(), "hi");
        assert_eq!(h.len(), 2);
        assert_eq!(h.as_ref(), "hi");
        assert_eq!(format!("{}", h), "hi");
        assert_eq!(format!("{:?}", h), "\"hi\"");
        assert_eq!(h.as_ptr(), h.clone().as_ptr());
    }
}
