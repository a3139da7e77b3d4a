use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use sentinel_table::DirectMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

// 10k indices drawn from 0..n.
fn sample_indices(n: usize) -> Vec<usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..10_000)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            (s as usize) % n
        })
        .collect()
}

fn filled(seed: u64, n: usize) -> (DirectMap<String, u64>, Vec<String>) {
    let mut m = DirectMap::new();
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.insert(k.clone(), i as u64);
    }
    (m, keys)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    let mut g = c.benchmark_group("insert_fresh_100k");
    g.bench_function("direct_map", |b| {
        b.iter_batched(
            DirectMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    g.bench_function("hashbrown", |b| {
        b.iter_batched(
            hashbrown::HashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.entry(key(x)).or_insert(i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("direct_map::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut m = DirectMap::<String, u64>::new();
                m.reserve(100_000);
                m
            },
            |mut m| {
                for (i, x) in lcg(2).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_or_assign_overwrite(c: &mut Criterion) {
    c.bench_function("direct_map::insert_or_assign_overwrite_10k_on_100k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(3, 100_000);
                let targets: Vec<String> =
                    sample_indices(keys.len()).into_iter().map(|i| keys[i].clone()).collect();
                (m, targets)
            },
            |(mut m, targets)| {
                for (i, k) in targets.into_iter().enumerate() {
                    m.insert_or_assign(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("direct_map::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                let to_erase: Vec<String> =
                    sample_indices(keys.len()).into_iter().map(|i| keys[i].clone()).collect();
                (m, to_erase)
            },
            |(mut m, to_erase)| {
                for k in &to_erase {
                    m.erase(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    let mut g = c.benchmark_group("find_hit_10k_on_100k");
    let (m, keys) = filled(7, 100_000);
    let queries: Vec<String> = sample_indices(keys.len())
        .into_iter()
        .map(|i| keys[i].clone())
        .collect();
    g.bench_function("direct_map", |b| {
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k));
            }
        })
    });
    let hb: hashbrown::HashMap<String, u64> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
    g.bench_function("hashbrown", |b| {
        b.iter(|| {
            for k in &queries {
                black_box(hb.get_key_value(k));
            }
        })
    });
    g.finish();
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("direct_map::find_miss_10k_on_100k", |b| {
        let (m, _) = filled(11, 100_000);
        let misses: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
        b.iter(|| {
            for k in &misses {
                black_box(m.find(k));
            }
        })
    });
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("direct_map::churn_erase_insert_50k", |b| {
        b.iter_batched(
            || filled(13, 10_000),
            |(mut m, keys)| {
                // Tombstones pile up until a same-capacity rebuild clears them.
                for (round, x) in lcg(17).take(50_000).enumerate() {
                    m.erase(&keys[round % keys.len()]);
                    m.insert(key(x), round as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_and_iter_mut(c: &mut Criterion) {
    c.bench_function("direct_map::iter_all_100k", |b| {
        let (m, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("direct_map::iter_mut_increment_all_100k", |b| {
        b.iter_batched(
            || filled(1001, 100_000).0,
            |mut m| {
                for (_k, v) in m.iter_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k,
              bench_insert_reserved_100k,
              bench_insert_or_assign_overwrite
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_churn,
              bench_iter_and_iter_mut
}
criterion_main!(benches_insert, benches_ops);
