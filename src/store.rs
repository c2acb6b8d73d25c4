//! Canonical store: concurrent lookup-or-insert over weakly held entries.
//!
//! Layout
//! - A bucket array behind a table-level `RwLock`. Interning and
//!   reclamation take it shared; only a resize takes it exclusively.
//! - Each bucket is its own `RwLock<Vec<Slot>>`, so writers in different
//!   buckets never contend.
//! - A slot is `(fingerprint, Weak<Entry>)`. A slot whose `Weak` no longer
//!   upgrades is a tombstone; it is unlinked by the entry's reclamation hook
//!   or by the next writer walking that bucket, whichever comes first.
//!
//! Lock order is table, then bucket. An `Arc<Entry>` is never released
//! while either lock is held: candidates that fail the equality check are
//! moved into a caller-owned vector and dropped after the locks are gone.
//! That keeps the reclamation hook (which needs a bucket write lock) from
//! ever running under a lock of the same store.

use crate::config::{over_load, StoreConfig};
use crate::entry::Entry;
use crate::error::InternError;
use crate::fingerprint::{bucket_index, fingerprint, DefaultFingerprinter};
use crate::handle::Handle;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, trace, warn};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

struct Slot<T, S> {
    fingerprint: u64,
    entry: Weak<Entry<T, S>>,
}

impl<T, S> Slot<T, S> {
    #[inline]
    fn is_live(&self) -> bool {
        self.entry.strong_count() > 0
    }
}

type Bucket<T, S> = RwLock<Vec<Slot<T, S>>>;

/// State shared between an `Interner` and every entry it created.
pub(crate) struct Shared<T, S> {
    hasher: S,
    table: RwLock<Vec<Bucket<T, S>>>,
    // Slots across all buckets, tombstones included until unlinked.
    // Only changed under a bucket write lock or the table write lock.
    slots: AtomicUsize,
    reentrancy: DebugReentrancy,
}

/// An interning table for values of type `T`.
///
/// Equal values interned through the same `Interner` yield handles that
/// compare equal by pointer. The table keeps no value alive: once every
/// handle to a value is dropped, its entry is reclaimed.
///
/// Most callers want the process-wide [`intern`](crate::intern) instead;
/// a local `Interner` is useful for scoping or for a custom `BuildHasher`.
pub struct Interner<T, S = DefaultFingerprinter> {
    shared: Arc<Shared<T, S>>,
}

impl<T> Interner<T>
where
    T: Eq + Hash,
{
    /// Create an empty interner with the default config and a freshly
    /// seeded `ahash` fingerprinter.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty interner with `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_config_and_hasher(config, DefaultFingerprinter::new())
    }
}

impl<T> Default for Interner<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Interner<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Create an empty interner that fingerprints with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(StoreConfig::default(), hasher)
    }

    /// Create an empty interner with both `config` and `hasher`.
    pub fn with_config_and_hasher(config: StoreConfig, hasher: S) -> Self {
        let buckets = config.initial_bucket_count();
        debug!(
            "creating interner for {} with {} buckets",
            core::any::type_name::<T>(),
            buckets
        );
        Self {
            shared: Arc::new(Shared {
                hasher,
                table: RwLock::new(empty_buckets(buckets)),
                slots: AtomicUsize::new(0),
                reentrancy: DebugReentrancy::new(),
            }),
        }
    }

    /// Return the canonical handle for `value`, creating its entry if no
    /// live handle to an equal value exists.
    ///
    /// Panics if the allocator refuses memory for the store's bookkeeping;
    /// see [`try_intern`](Self::try_intern).
    pub fn intern(&self, value: T) -> Handle<T, S> {
        match self.try_intern(value) {
            Ok(handle) => handle,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible [`intern`](Self::intern). Returns
    /// [`InternError::AllocationFailure`] when a bucket or the bucket array
    /// cannot grow; the store is left as it was.
    pub fn try_intern(&self, value: T) -> Result<Handle<T, S>, InternError> {
        let fp = fingerprint(&self.shared.hasher, &value);
        let mut rejected = Vec::new();
        if let Some(entry) = self.shared.lookup(fp, &value, &mut rejected) {
            return Ok(Handle::new(entry));
        }
        let mut value = Some(value);
        let res = self.shared.find_or_insert(fp, &mut value, &mut rejected);
        // Locks are released: now it is safe to drop an unused `value` and
        // any rejected candidates, either of which may run reclamation.
        drop(value);
        drop(rejected);
        res.map(Handle::new)
    }

    /// Intern from a borrowed form of `T`. An owned `T` is only built when
    /// no live entry equals `q`.
    pub fn intern_borrowed<Q>(&self, q: &Q) -> Handle<T, S>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = T>,
    {
        match self.try_intern_borrowed(q) {
            Ok(handle) => handle,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible [`intern_borrowed`](Self::intern_borrowed). Returns
    /// [`InternError::AllocationFailure`] under the same conditions as
    /// [`try_intern`](Self::try_intern).
    pub fn try_intern_borrowed<Q>(&self, q: &Q) -> Result<Handle<T, S>, InternError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = T>,
    {
        // `Borrow` guarantees `q` and `q.to_owned()` hash identically.
        let fp = fingerprint(&self.shared.hasher, q);
        let mut rejected = Vec::new();
        if let Some(entry) = self.shared.lookup(fp, q, &mut rejected) {
            return Ok(Handle::new(entry));
        }
        let mut value = Some(q.to_owned());
        let res = self.shared.find_or_insert(fp, &mut value, &mut rejected);
        drop(value);
        drop(rejected);
        res.map(Handle::new)
    }
}

impl<T, S> fmt::Debug for Interner<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").finish_non_exhaustive()
    }
}

fn empty_buckets<T, S>(n: usize) -> Vec<Bucket<T, S>> {
    let mut v = Vec::with_capacity(n);
    v.resize_with(n, || RwLock::new(Vec::new()));
    v
}

/// Holds an upgraded candidate while it is compared. Unless taken on a
/// match, the candidate is moved into the caller's `rejected` list when this
/// drops, including while unwinding from a panicking `Eq`, so it is never
/// released under a store lock.
struct Parked<'a, T, S> {
    entry: Option<Arc<Entry<T, S>>>,
    rejected: &'a mut Vec<Arc<Entry<T, S>>>,
}

impl<T, S> Drop for Parked<'_, T, S> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.rejected.push(entry);
        }
    }
}

/// Walk `slots` for an entry with fingerprint `fp` equal to `q`.
///
/// A hit allocates nothing; only mismatched candidates land in `rejected`.
fn scan<T, S, Q>(
    slots: &[Slot<T, S>],
    fp: u64,
    q: &Q,
    rejected: &mut Vec<Arc<Entry<T, S>>>,
) -> Option<Arc<Entry<T, S>>>
where
    T: Borrow<Q>,
    Q: ?Sized + Eq,
{
    for slot in slots.iter().filter(|s| s.fingerprint == fp) {
        let Some(entry) = slot.entry.upgrade() else {
            continue;
        };
        let mut parked = Parked {
            entry: Some(entry),
            rejected: &mut *rejected,
        };
        let is_match = parked
            .entry
            .as_ref()
            .is_some_and(|e| e.value().borrow() == q);
        if is_match {
            return parked.entry.take();
        }
    }
    None
}

impl<T, S> Shared<T, S>
where
    T: Eq,
{
    /// Read-only search of the bucket for `fp`.
    fn lookup<Q>(
        &self,
        fp: u64,
        q: &Q,
        rejected: &mut Vec<Arc<Entry<T, S>>>,
    ) -> Option<Arc<Entry<T, S>>>
    where
        T: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let _g = self.reentrancy.enter();
        let table = self.table.read();
        let bucket = table[bucket_index(fp, table.len())].read();
        scan(&bucket, fp, q, rejected)
    }

    /// Search again under the bucket's write lock and insert on a miss.
    ///
    /// `value` must be `Some`. It is taken only when a new entry is created;
    /// otherwise it is left for the caller to drop once the locks are gone.
    fn find_or_insert(
        self: &Arc<Self>,
        fp: u64,
        value: &mut Option<T>,
        rejected: &mut Vec<Arc<Entry<T, S>>>,
    ) -> Result<Arc<Entry<T, S>>, InternError> {
        self.grow_if_needed()?;

        let _g = self.reentrancy.enter();
        let table = self.table.read();
        let index = bucket_index(fp, table.len());
        let mut bucket = table[index].write();
        self.purge(&mut bucket);

        // Another thread may have inserted an equal value since `lookup`.
        if let Some(entry) = value.as_ref().and_then(|v| scan(&bucket, fp, v, rejected)) {
            return Ok(entry);
        }

        bucket
            .try_reserve(1)
            .map_err(|_| InternError::AllocationFailure {
                requested: bucket.len() + 1,
            })?;
        let Some(value) = value.take() else {
            unreachable!("find_or_insert called without a value");
        };
        let entry = Arc::new(Entry::new(value, fp, Arc::clone(self)));
        bucket.push(Slot {
            fingerprint: fp,
            entry: Arc::downgrade(&entry),
        });
        self.slots.fetch_add(1, Ordering::Relaxed);
        trace!("interned new entry fp={:#018x} bucket={}", fp, index);
        Ok(entry)
    }
}

impl<T, S> Shared<T, S> {
    /// Unlink tombstones from a bucket we hold for writing.
    fn purge(&self, bucket: &mut Vec<Slot<T, S>>) {
        let before = bucket.len();
        bucket.retain(Slot::is_live);
        let removed = before - bucket.len();
        if removed > 0 {
            self.slots.fetch_sub(removed, Ordering::Relaxed);
        }
    }

    /// Double the bucket array if one more slot would exceed the load
    /// factor. Readers and writers are excluded only for the rehash itself.
    fn grow_if_needed(&self) -> Result<(), InternError> {
        {
            let table = self.table.read();
            if !over_load(self.slots.load(Ordering::Relaxed) + 1, table.len()) {
                return Ok(());
            }
        }

        let _g = self.reentrancy.enter();
        let mut table = self.table.write();
        let old_len = table.len();
        // Someone else may have grown the table while we waited.
        if !over_load(self.slots.load(Ordering::Relaxed) + 1, old_len) {
            return Ok(());
        }

        let new_len = old_len
            .checked_mul(2)
            .ok_or(InternError::AllocationFailure {
                requested: usize::MAX,
            })?;
        let mut next: Vec<Bucket<T, S>> = Vec::new();
        if next.try_reserve_exact(new_len).is_err() {
            warn!(
                "interner resize from {} to {} buckets failed to allocate",
                old_len, new_len
            );
            return Err(InternError::AllocationFailure { requested: new_len });
        }
        next.resize_with(new_len, || RwLock::new(Vec::new()));

        // Rehash by stored fingerprint; `T: Hash` is never called here.
        let mut live = 0;
        for bucket in table.drain(..) {
            for slot in bucket.into_inner() {
                if !slot.is_live() {
                    continue;
                }
                next[bucket_index(slot.fingerprint, new_len)]
                    .get_mut()
                    .push(slot);
                live += 1;
            }
        }
        *table = next;
        self.slots.store(live, Ordering::Relaxed);
        debug!(
            "interner for {} grew from {} to {} buckets ({} live slots)",
            core::any::type_name::<T>(),
            old_len,
            new_len,
            live
        );
        Ok(())
    }

    /// Reclamation hook, called from `Entry::drop` once the last strong
    /// reference is gone. Finds the bucket by fingerprint, so a resize
    /// since insertion is harmless, and unlinks the entry's slot along
    /// with any other tombstones in that bucket.
    pub(crate) fn reclaim(&self, fp: u64, entry: *const Entry<T, S>) {
        let _g = self.reentrancy.enter();
        let table = self.table.read();
        let index = bucket_index(fp, table.len());
        let mut bucket = table[index].write();
        let before = bucket.len();
        // Our own slot may already be gone if a writer purged it first.
        bucket.retain(|s| s.is_live() && !core::ptr::eq(s.entry.as_ptr(), entry));
        let removed = before - bucket.len();
        if removed > 0 {
            self.slots.fetch_sub(removed, Ordering::Relaxed);
        }
        trace!(
            "reclaimed entry fp={:#018x} bucket={} unlinked={}",
            fp,
            index,
            removed
        );
    }
}

// Introspection for white-box tests only; never part of the public surface.
#[cfg(test)]
impl<T, S> Interner<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn live_slots(&self) -> usize {
        self.shared.slots.load(Ordering::Relaxed)
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.shared.table.read().len()
    }

    pub(crate) fn bucket_len_for(&self, value: &T) -> usize {
        let fp = fingerprint(&self.shared.hasher, value);
        let table = self.shared.table.read();
        let len = table[bucket_index(fp, table.len())].read().len();
        len
    }
}
