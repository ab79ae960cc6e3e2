//! Criterion benchmarks for execflag-rf: forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use execflag_rf::{ForestConfig, MaxFeatures};

fn make_binary(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = usize::from(i % 4 == 0);
        labels.push(class);
        let row: Vec<f64> = (0..7)
            .map(|f| {
                let base = if f < 2 { class as f64 * 0.5 } else { 0.0 };
                base + rng.r#gen::<f64>()
            })
            .collect();
        features.push(row);
    }
    let names: Vec<String> = (0..7).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_training_preset(c: &mut Criterion) {
    let (features, labels, names) = make_binary(1000, 42);
    let cfg = ForestConfig::new(200)
        .unwrap()
        .with_max_features(MaxFeatures::Fixed(2))
        .with_max_depth(Some(20))
        .with_min_samples_leaf(5);

    c.bench_function("rf_train_1000x7_200trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_validation_preset(c: &mut Criterion) {
    let (features, labels, names) = make_binary(1000, 42);
    let cfg = ForestConfig::new(20)
        .unwrap()
        .with_max_features(MaxFeatures::Fixed(2))
        .with_max_depth(Some(8))
        .with_max_leaf_nodes(Some(10))
        .with_class_weights(Some(vec![1.0, 100.0]))
        .with_tree_seeds((0..20).collect());

    c.bench_function("rf_train_1000x7_20trees_leafcap10", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_binary(1000, 42);
    let forest = ForestConfig::new(50)
        .unwrap()
        .fit(&features, &labels, &names)
        .unwrap();

    c.bench_function("rf_predict_batch_1000x7_50trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

criterion_group!(
    benches,
    bench_training_preset,
    bench_validation_preset,
    bench_predict_batch
);
criterion_main!(benches);
