//! Inference benchmark: feature vectors → individual scorers → fused verdict.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phishguard::features::{pad_sequence, SparseVector};
use phishguard::fusion::fuse;
use phishguard::model::{DecisionTree, LogisticRegression, LstmClassifier, LstmWeights, RandomForest, Scorer};

const DIM: usize = 1000;
const MAX_LEN: usize = 100;

fn sparse(nnz: usize) -> SparseVector {
    SparseVector {
        dim: DIM,
        entries: (0..nnz).map(|i| ((i * 7) as u32, 0.1)).collect(),
    }
}

/// Depth-one trees over spread-out columns.
fn forest(n_trees: usize) -> RandomForest {
    let trees = (0..n_trees)
        .map(|t| DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![(t * 13 % DIM) as i32, -2, -2],
            threshold: vec![0.05, -2.0, -2.0],
            value: vec![[1.0, 1.0], [0.7, 0.3], [0.2, 0.8]],
        })
        .collect();
    RandomForest { n_features: DIM, trees }
}

fn lstm(units: usize, embed: usize) -> LstmClassifier {
    let weights = LstmWeights {
        embedding: (0..DIM).map(|i| vec![(i % 5) as f32 * 0.01; embed]).collect(),
        kernel: vec![vec![0.01; 4 * units]; embed],
        recurrent_kernel: vec![vec![0.01; 4 * units]; units],
        bias: vec![0.0; 4 * units],
        dense_kernel: vec![0.1; units],
        dense_bias: 0.0,
    };
    match LstmClassifier::from_weights(weights, DIM) {
        Ok(m) => m,
        Err(e) => panic!("bench weights rejected: {}", e),
    }
}

fn bench_linear(c: &mut Criterion) {
    let model = LogisticRegression {
        coef: vec![0.01; DIM],
        intercept: -0.2,
    };
    let x = sparse(60);
    c.bench_function("linear_1000d_60nnz", |b| b.iter(|| model.score_probability(black_box(&x))));
}

fn bench_forest(c: &mut Criterion) {
    let model = forest(100);
    let x = sparse(60);
    c.bench_function("forest_100_trees", |b| b.iter(|| model.score_probability(black_box(&x))));
}

fn bench_lstm_by_units(c: &mut Criterion) {
    let seq = pad_sequence((1..60).collect(), MAX_LEN);
    let mut g = c.benchmark_group("lstm_by_units");
    for units in [16, 32, 64] {
        let model = lstm(units, 128);
        g.bench_function(format!("units_{}", units).as_str(), |b| {
            b.iter(|| model.score_probability(black_box(&seq)))
        });
    }
    g.finish();
}

fn bench_fuse(c: &mut Criterion) {
    c.bench_function("fuse", |b| b.iter(|| fuse(black_box(0.9), black_box(0.8), black_box(0.7))));
}

criterion_group!(benches, bench_linear, bench_forest, bench_lstm_by_units, bench_fuse);
criterion_main!(benches);
