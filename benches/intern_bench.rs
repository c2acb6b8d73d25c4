use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use weak_intern::Interner;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_intern_new(c: &mut Criterion) {
    c.bench_function("intern_new_10k", |b| {
        b.iter_batched(
            Interner::<String>::new,
            |m| {
                // Hold handles so entries are not reclaimed mid-loop.
                let mut held = Vec::with_capacity(10_000);
                for x in lcg(1).take(10_000) {
                    held.push(m.intern(key(x)));
                }
                black_box((m, held))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_intern_hit(c: &mut Criterion) {
    c.bench_function("intern_hit", |b| {
        let m: Interner<String> = Interner::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        let _held: Vec<_> = keys.iter().map(|k| m.intern_borrowed(k.as_str())).collect();
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.intern_borrowed(k.as_str()));
        })
    });
}

fn bench_intern_drop_cycle(c: &mut Criterion) {
    c.bench_function("intern_then_reclaim", |b| {
        let m: Interner<String> = Interner::new();
        let mut it = lcg(11);
        b.iter(|| {
            // Each handle is dropped at once, exercising the reclamation hook.
            let h = m.intern(key(it.next().unwrap()));
            black_box(&h);
        })
    });
}

fn bench_handle_eq(c: &mut Criterion) {
    c.bench_function("handle_eq", |b| {
        let m: Interner<String> = Interner::new();
        let a = m.intern(key(1));
        let a2 = m.intern(key(1));
        let z = m.intern(key(2));
        b.iter(|| black_box(a == a2) ^ black_box(a == z))
    });
}

fn configure() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = configure();
    targets = bench_intern_new, bench_intern_hit, bench_intern_drop_cycle, bench_handle_eq
}
criterion_main!(benches);
