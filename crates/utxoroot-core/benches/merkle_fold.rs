use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use utxoroot_core::{leaf_hash, merkle_root, prove, HashList};

fn make_leaves(n: usize) -> HashList {
    (0..n)
        .map(|i| {
            let mut txid = [0u8; 32];
            txid[..8].copy_from_slice(&(i as u64).to_le_bytes());
            leaf_hash(&txid, &[0x01, 0x02], 1 + i as i64)
        })
        .collect()
}

fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_fold");
    for n in [1_000usize, 10_001, 100_000] {
        let leaves = make_leaves(n);
        group.bench_with_input(BenchmarkId::new("root", n), &leaves, |b, l| {
            b.iter(|| merkle_root(black_box(l)))
        });
        group.bench_with_input(BenchmarkId::new("prove_last", n), &leaves, |b, l| {
            b.iter(|| prove(black_box(l), l.len() - 1))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fold);
criterion_main!(benches);
