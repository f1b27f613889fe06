use chained_collections::alloc::Heap;
use chained_collections::Dict;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}\0", n)
}

fn keys(seed: u64, n: usize) -> Vec<String> {
    lcg(seed).take(n).map(key).collect()
}

fn filled<'v>(keys: &[String], value: &'v u64) -> Dict<'static, 'v, u64> {
    let mut d = Dict::new(0).unwrap();
    for k in keys {
        d.set(k.as_bytes(), value).unwrap();
    }
    d
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    let ks = keys(1, 100_000);
    let value = 7u64;
    c.bench_function("dict::insert_fresh_100k", |b| {
        b.iter_batched(
            || Dict::<u64>::new(0).unwrap(),
            |mut d| {
                for k in &ks {
                    d.set(k.as_bytes(), &value).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_presized_100k(c: &mut Criterion) {
    let ks = keys(2, 100_000);
    let value = 7u64;
    c.bench_function("dict::insert_presized_100k", |b| {
        b.iter_batched(
            // large enough that no insert resizes
            || Dict::<u64>::new(200_003).unwrap(),
            |mut d| {
                for k in &ks {
                    d.set(k.as_bytes(), &value).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_overwrite_100k(c: &mut Criterion) {
    let ks = keys(3, 100_000);
    let (first, second) = (1u64, 2u64);
    c.bench_function("dict::overwrite_100k", |b| {
        b.iter_batched(
            || filled(&ks, &first),
            |mut d| {
                for k in &ks {
                    d.set(k.as_bytes(), &second).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_miss(c: &mut Criterion) {
    let ks = keys(4, 100_000);
    let misses = keys(5, 100_000);
    let value = 7u64;
    let d = filled(&ks, &value);
    c.bench_function("dict::get_hit_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &ks {
                sum += *d.get(k.as_bytes()).unwrap();
            }
            black_box(sum)
        })
    });
    c.bench_function("dict::get_miss_100k", |b| {
        b.iter(|| {
            let mut found = 0usize;
            for k in &misses {
                found += d.contains_key(k.as_bytes()) as usize;
            }
            black_box(found)
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    let ks = keys(6, 10_000);
    let value = 7u64;
    let d = filled(&ks, &value);
    c.bench_function("dict::iter_cursor_10k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for (k, _) in &d {
                n += k.len();
            }
            black_box(n)
        })
    });
    c.bench_function("dict::next_key_stateless_10k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            let mut key = d.next_key(None);
            while let Some(k) = key {
                n += k.len();
                key = d.next_key(Some(k));
            }
            black_box(n)
        })
    });
}

fn bench_collisions(c: &mut Criterion) {
    fn zero_hash(_: &[u8]) -> u64 {
        0
    }
    let ks = keys(7, 1_000);
    let value = 7u64;
    c.bench_function("dict::insert_single_chain_1k", |b| {
        b.iter_batched(
            || Dict::<u64>::with_fns_in(0, &Heap, Some(zero_hash), None).unwrap(),
            |mut d| {
                for k in &ks {
                    d.set(k.as_bytes(), &value).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_insert_fresh_100k,
        bench_insert_presized_100k,
        bench_overwrite_100k,
        bench_get_hit_miss,
        bench_iterate,
        bench_collisions
}
criterion_main!(benches);
