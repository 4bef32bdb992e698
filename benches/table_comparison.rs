use core::hash::Hash;
use core::hash::Hasher;
use core::hint::black_box;

use criterion::BatchSize;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use dblhash::HashPolicy;
use dblhash::Table;
use hashbrown::HashTable as HashbrownHashTable;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use siphasher::sip::SipHasher;

const SIZES: &[usize] = &[(1 << 10), (1 << 14), (1 << 18)];

fn sip_hash(value: u64, k0: u64, k1: u64) -> u64 {
    let mut hasher = SipHasher::new_with_keys(k0, k1);
    value.hash(&mut hasher);
    hasher.finish()
}

struct SipPolicy;

impl HashPolicy<u64> for SipPolicy {
    fn hash_primary(&self, item: &u64) -> u64 {
        sip_hash(*item, 0, 0)
    }

    fn hash_secondary(&self, item: &u64) -> u64 {
        sip_hash(*item, 1, 1)
    }

    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }
}

fn keys(count: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(0xdb1);
    let mut keys: Vec<u64> = (0..count as u64).collect();
    keys.shuffle(&mut rng);
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &size in SIZES {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("dblhash/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = Table::with_size_and_policy(2, SipPolicy);
                    for k in keys {
                        table.insert(black_box(k));
                    }
                    table
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = HashbrownHashTable::new();
                    for k in keys {
                        let hash = sip_hash(k, 0, 0);
                        table.insert_unique(hash, black_box(k), |&v| sip_hash(v, 0, 0));
                    }
                    table
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    for &size in SIZES {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        let mut table = Table::with_size_and_policy(size, SipPolicy);
        for &k in &keys {
            table.insert(k);
        }
        group.bench_function(format!("dblhash/{size}"), |b| {
            b.iter(|| {
                for k in &keys {
                    black_box(table.find(black_box(k)));
                }
            });
        });

        let mut hb = HashbrownHashTable::with_capacity(size);
        for &k in &keys {
            hb.insert_unique(sip_hash(k, 0, 0), k, |&v| sip_hash(v, 0, 0));
        }
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for &k in &keys {
                    black_box(hb.find(sip_hash(k, 0, 0), |&v| v == k));
                }
            });
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    for &size in &[1 << 10, 1 << 14] {
        let keys = keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("dblhash/{size}"), |b| {
            let mut table = Table::with_size_and_policy(size, SipPolicy);
            for &k in &keys {
                table.insert(k);
            }
            b.iter(|| {
                for &k in &keys {
                    black_box(table.remove(&k));
                    table.insert(black_box(k));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_churn);
criterion_main!(benches);
