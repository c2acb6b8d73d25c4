//! weak-intern: thread-safe hash-consing of immutable values, where the
//! table holds its entries weakly and frees them when the last handle goes.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: map every value to a canonical `Handle` so that equal values give
//!   handles that compare equal by a single pointer comparison, without the
//!   table keeping anything alive.
//! - Layers:
//!   - `fingerprint`: 64-bit placement hash (`ahash` by default, or any
//!     `BuildHasher`). Equal values share a fingerprint; collisions are
//!     resolved with `T: Eq`.
//!   - `Entry<T, S>`: the one stored copy of a value, jointly owned by its
//!     handles. Its `Drop` is the reclamation hook that unlinks it from the
//!     store.
//!   - `Interner<T, S>`: buckets of `(fingerprint, Weak<Entry>)` slots with
//!     per-bucket locks; lookup-or-insert, resize at load factor 0.75.
//!   - `Handle<T, S>`: one `Arc` pointer; `==` and `Hash` use the entry's
//!     address.
//!   - `global`: a lazily built store per type behind a `TypeId` registry,
//!     exposed as [`intern`].
//!
//! Constraints
//! - Thread-safe: `Interner` and `Handle` are `Send + Sync` when `T` is.
//! - `Handle::value` and handle equality never lock.
//! - Values are immutable once interned; there is no `value_mut`.
//! - No listing, clearing or size queries: an unreferenced entry must not
//!   be observable.
//!
//! Ownership
//! - Handles own entries; entries own a keepalive `Arc` to the store's
//!   shared state; the store owns only `Weak`s back to entries. There is no
//!   strong cycle, and a local `Interner` may be dropped while handles it
//!   produced are still live.
//!
//! Locking
//! - Table `RwLock` then bucket `RwLock`, always in that order. Resize is the
//!   only exclusive user of the table lock.
//! - No `Arc<Entry>` and no caller value is dropped while a lock of the same
//!   store is held, so reclamation never waits on a lock its own thread
//!   holds. `T: Eq` does run under a bucket lock; in debug builds a
//!   reentrancy guard turns a nested call into the same store into a panic.
//!
//! Errors
//! - A type without `Eq + Hash` is rejected at compile time.
//! - Allocation failure while growing a bucket or the bucket array is
//!   returned from `try_intern` as [`InternError::AllocationFailure`];
//!   `intern` panics with it.
//!
//! Logging goes through the `log` facade; the crate never installs a
//! logger.

mod config;
mod entry;
mod error;
pub mod fingerprint;
mod global;
mod handle;
mod reentrancy;
mod store;
mod store_proptest;

// Public surface
pub use config::{StoreConfig, DEFAULT_BUCKET_COUNT, MAX_LOAD_FACTOR};
pub use error::InternError;
pub use fingerprint::DefaultFingerprinter;
pub use global::{intern, intern_borrowed, intern_with_config, try_intern};
pub use handle::Handle;
pub use store::Interner;
