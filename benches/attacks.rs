use criterion::{criterion_group, criterion_main, Criterion};
use mia_rs::dataset::gaussian_blobs;
use mia_rs::learners::ForestConfig;
use mia_rs::{
    AttackInputType, AttackModelType, BlackBoxAttack, Bounds1, LabelOnlyDecisionBoundary,
    MembershipInference, SearchConfig, TargetModel, DNN,
};
use ndarray::Array2;
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use pprof::criterion::{Output, PProfProfiler};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::time::Duration;

fn bench(c: &mut Criterion) {
    let mut rng = Pcg64::seed_from_u64(69);
    let input_size = 16;
    let model = TargetModel::new(DNN::random(&[input_size, 64, 64, 4], &mut rng))
        .with_clip_values(Bounds1::from_elem(input_size, -3.5, 3.5).unwrap())
        .unwrap();
    let centers = Array2::random_using((4, input_size), Normal::new(0., 1.).unwrap(), &mut rng);
    let members = gaussian_blobs(&centers.view(), 25, 0.5, &mut rng);
    let nonmembers = gaussian_blobs(&centers.view(), 25, 0.5, &mut rng);

    c.bench_function("black_box::fit random_forest", |b| {
        b.iter(|| {
            let mut attack = BlackBoxAttack::new(
                &model,
                AttackInputType::Prediction,
                AttackModelType::RandomForest(ForestConfig {
                    n_estimators: 20,
                    ..ForestConfig::default()
                }),
            );
            attack
                .fit(
                    &members.features(),
                    &members.labels(),
                    &nonmembers.features(),
                    &nonmembers.labels(),
                )
                .unwrap();
            attack
        })
    });

    let mut group = c.benchmark_group("label_only");
    group.warm_up_time(Duration::from_secs(5));
    group.sample_size(10);
    let attack = LabelOnlyDecisionBoundary::new(&model, SearchConfig::default(), 0).with_threshold(0.5);
    group.bench_function("label_only::infer", |b| {
        b.iter(|| {
            attack
                .infer(&members.features(), &members.labels())
                .unwrap()
        })
    });
    group.bench_function("label_only::calibrate_unsupervised", |b| {
        b.iter_batched(
            || attack.clone(),
            |mut attack| {
                attack
                    .calibrate_distance_threshold_unsupervised(50., 100, 1)
                    .unwrap()
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench
}
criterion_main!(benches);
