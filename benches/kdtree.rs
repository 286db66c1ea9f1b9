use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kd_index::kdtree::KDTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_pairs(n: usize, dimension: usize) -> Vec<(Vec<f64>, u32)> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..n)
        .map(|i| {
            let key = (0..dimension).map(|_| rng.gen_range(0.0..1000.0)).collect();
            (key, i as u32)
        })
        .collect()
}

fn construct_kdtree(pairs: &[(Vec<f64>, u32)], dimension: usize) -> KDTree<f64, u32> {
    KDTree::try_new(pairs.to_vec(), dimension).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    for dimension in [2, 3] {
        let pairs = random_pairs(100_000, dimension);

        c.bench_with_input(
            BenchmarkId::new("construction", dimension),
            &pairs,
            |b, pairs| b.iter(|| construct_kdtree(pairs, dimension)),
        );

        let tree = construct_kdtree(&pairs, dimension);
        let small = vec![(400., 420.); dimension];
        let large = vec![(100., 600.); dimension];

        c.bench_with_input(BenchmarkId::new("range (small box)", dimension), &small, |b, q| {
            b.iter(|| tree.range(black_box(q)).unwrap().count())
        });

        c.bench_with_input(BenchmarkId::new("range (large box)", dimension), &large, |b, q| {
            b.iter(|| tree.range(black_box(q)).unwrap().count())
        });
    }

    // Heavy duplication exercises the tie and collision fallbacks
    let mut rng = StdRng::seed_from_u64(1);
    let dense: Vec<(Vec<i32>, u32)> = (0..100_000)
        .map(|i| (vec![rng.gen_range(0..8), rng.gen_range(0..8)], i))
        .collect();
    c.bench_function("construction (dense duplicates)", |b| {
        b.iter(|| KDTree::try_new(dense.clone(), 2).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
