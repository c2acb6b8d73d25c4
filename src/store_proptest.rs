#![cfg(test)]

// Property tests for Interner kept inside the crate so they can see the
// slot counters, which are not part of the public surface.

use crate::config::StoreConfig;
use crate::handle::Handle;
use crate::store::Interner;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::HashMap;

// Few distinct fingerprints, so most buckets see collisions.
#[derive(Clone, Default)]
struct LowBitsBuildHasher;
struct LowBitsHasher(u64);
impl BuildHasher for LowBitsBuildHasher {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        LowBitsHasher(0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_add(*b as u64);
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 3
    }
}

#[derive(Clone, Debug)]
enum Op {
    Intern(usize),
    Dup(usize),
    DropOne(usize),
    DropAll(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-d]{0,3}", 1..=8).prop_flat_map(|pool| {
        let n = pool.len();
        let op = prop_oneof![
            3 => (0..n).prop_map(Op::Intern),
            1 => (0..n).prop_map(Op::Dup),
            2 => (0..n).prop_map(Op::DropOne),
            1 => (0..n).prop_map(Op::DropAll),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against a model of outstanding
// handles per distinct value.
// Invariants exercised after every step:
// - all live handles for one value are pairwise equal; handles for
//   different values differ;
// - `value()` round-trips;
// - the store holds exactly one slot per value with a live handle
//   (reclamation is immediate, so no tombstones linger).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_store_matches_model((pool, ops) in arb_scenario()) {
        let sut: Interner<String, LowBitsBuildHasher> =
            Interner::with_config_and_hasher(StoreConfig::new(1).unwrap(), LowBitsBuildHasher);
        let mut live: HashMap<String, Vec<Handle<String, LowBitsBuildHasher>>> = HashMap::new();

        for op in ops {
            match op {
                Op::Intern(i) => {
                    let v = pool[i].clone();
                    let h = sut.intern(v.clone());
                    prop_assert_eq!(h.value(), &v);
                    live.entry(v).or_default().push(h);
                }
                Op::Dup(i) => {
                    if let Some(hs) = live.get_mut(&pool[i]) {
                        if let Some(h) = hs.last().cloned() {
                            hs.push(h);
                        }
                    }
                }
                Op::DropOne(i) => {
                    if let Some(hs) = live.get_mut(&pool[i]) {
                        hs.pop();
                    }
                }
                Op::DropAll(i) => {
                    live.remove(&pool[i]);
                }
            }
            live.retain(|_, hs| !hs.is_empty());

            for (v, hs) in &live {
                for h in hs {
                    prop_assert!(*h == hs[0]);
                    prop_assert_eq!(h.value(), v);
                }
            }
            let firsts: Vec<_> = live.values().map(|hs| &hs[0]).collect();
            for (i, a) in firsts.iter().enumerate() {
                for b in &firsts[i + 1..] {
                    prop_assert!(*a != *b);
                }
            }
            prop_assert_eq!(sut.live_slots(), live.len());
        }

        drop(live);
        prop_assert_eq!(sut.live_slots(), 0);
    }
}

// Property: interning the same value repeatedly never grows the store.
proptest! {
    #[test]
    fn prop_idempotent(v in any::<Vec<u8>>(), reps in 1usize..20) {
        let sut: Interner<Vec<u8>> = Interner::new();
        let first = sut.intern(v.clone());
        for _ in 0..reps {
            prop_assert!(sut.intern(v.clone()) == first);
        }
        prop_assert_eq!(sut.live_slots(), 1);
    }
}
