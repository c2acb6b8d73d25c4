//! Process-wide interning: one lazily created store per value type.
//!
//! Stores are kept in a type-erased registry keyed by `TypeId` and are never
//! torn down. That costs one small allocation per type; entries inside a
//! store are still reclaimed as soon as their last handle is dropped.

use crate::config::StoreConfig;
use crate::error::InternError;
use crate::handle::Handle;
use crate::store::Interner;
use core::any::{Any, TypeId};
use core::borrow::Borrow;
use core::hash::Hash;
use hashbrown::HashMap;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

type Erased = &'static (dyn Any + Send + Sync);

static REGISTRY: Lazy<RwLock<HashMap<TypeId, Erased>>> = Lazy::new(Default::default);

fn downcast<T>(erased: Erased) -> &'static Interner<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    match erased.downcast_ref::<Interner<T>>() {
        Some(store) => store,
        None => unreachable!(
            "registry entry for {} has the wrong type",
            core::any::type_name::<T>()
        ),
    }
}

/// The process-wide store for `T`, created with `config` on first use.
fn store<T>(config: Option<StoreConfig>) -> &'static Interner<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    let id = TypeId::of::<T>();
    let existing = REGISTRY.read().get(&id).copied();
    if let Some(erased) = existing {
        if config.is_some() {
            debug!(
                "store for {} already exists; ignoring config",
                core::any::type_name::<T>()
            );
        }
        return downcast(erased);
    }

    let mut registry = REGISTRY.write();
    // Another thread may have won the race between the two locks.
    let erased = *registry.entry(id).or_insert_with(|| {
        let store: Erased = Box::leak(Box::new(Interner::<T>::with_config(
            config.unwrap_or_default(),
        )));
        store
    });
    drop(registry);
    downcast(erased)
}

/// Intern `value` in the process-wide store for `T`.
///
/// Values equal under `T: Eq` yield equal handles for as long as any of
/// them is live.
pub fn intern<T>(value: T) -> Handle<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    store::<T>(None).intern(value)
}

/// Fallible [`intern`]. Returns [`InternError::AllocationFailure`] when the
/// store for `T` cannot grow.
pub fn try_intern<T>(value: T) -> Result<Handle<T>, InternError>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    store::<T>(None).try_intern(value)
}

/// Like [`intern`], but creates the store for `T` with `config` if this is
/// the first use of `T`. Later configs are ignored.
pub fn intern_with_config<T>(value: T, config: StoreConfig) -> Handle<T>
where
    T: Eq + Hash + Send + Sync + 'static,
{
    store::<T>(Some(config)).intern(value)
}

/// Intern from a borrowed form, e.g. `intern_borrowed::<String, str>("x")`.
/// Allocates an owned `T` only when no equal value is live.
pub fn intern_borrowed<T, Q>(q: &Q) -> Handle<T>
where
    T: Eq + Hash + Send + Sync + 'static + Borrow<Q>,
    Q: ?Sized + Hash + Eq + ToOwned<Owned = T>,
{
    store::<T>(None).intern_borrowed(q)
}
