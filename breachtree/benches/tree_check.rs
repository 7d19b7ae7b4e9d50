use std::io::Cursor;

use breachtree::{Sha1, TreeBuilder, TreeReader};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TREE_KEYS: u64 = 100_000;
const TREE_ORDER: u32 = 64;

fn key(n: u64) -> Sha1 {
    let mut k = [0u8; 20];
    k[12..].copy_from_slice(&n.to_be_bytes());
    k
}

fn build_tree(keys: u64, order: u32) -> Cursor<Vec<u8>> {
    let mut builder = TreeBuilder::create(Cursor::new(Vec::new()), order).unwrap();
    builder.insert_all((0..keys).map(|i| key(i * 2))).unwrap();
    builder.finalize().unwrap()
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_10k_keys_order_64", |b| {
        b.iter(|| black_box(build_tree(black_box(10_000), TREE_ORDER)))
    });
}

fn bench_contains_hits(c: &mut Criterion) {
    let mut reader = TreeReader::open(build_tree(TREE_KEYS, TREE_ORDER)).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("contains_hit_100k_tree", |b| {
        b.iter(|| {
            let probe = key(rng.gen_range(0..TREE_KEYS) * 2);
            black_box(reader.contains(black_box(&probe)).unwrap())
        })
    });
}

fn bench_contains_misses(c: &mut Criterion) {
    let mut reader = TreeReader::open(build_tree(TREE_KEYS, TREE_ORDER)).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("contains_miss_100k_tree", |b| {
        b.iter(|| {
            // Odd trailing value: never inserted.
            let probe = key(rng.gen_range(0..TREE_KEYS) * 2 + 1);
            black_box(reader.contains(black_box(&probe)).unwrap())
        })
    });
}

criterion_group!(benches, bench_build, bench_contains_hits, bench_contains_misses);
criterion_main!(benches);
