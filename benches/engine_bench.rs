use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kluster::{
    ClusteringConfig, ClusteringEngine, Dataset, FeatureScaler, FittedModel, InitMethod,
    Predictor, Record, ScaledFeatureSet, Schema,
};
use ndarray::Array2;
use rand::prelude::*;

fn generate_students(n_students: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let records = (0..n_students)
        .map(|i| {
            let engaged = rng.gen_bool(0.5);
            let (score, attendance) = if engaged {
                (rng.gen_range(75.0..100.0), rng.gen_range(0.85..1.0))
            } else {
                (rng.gen_range(40.0..75.0), rng.gen_range(0.5..0.85))
            };
            let flags = (0..4)
                .map(|_| u8::from(rng.gen_bool(if engaged { 0.8 } else { 0.2 })))
                .collect();
            Record::new((i + 1).to_string(), vec![score, attendance], flags)
        })
        .collect();
    Dataset::from_records(Schema::student(), records).unwrap()
}

fn prepared(n_students: usize) -> (Array2<f64>, Array2<u8>, ScaledFeatureSet) {
    let data = generate_students(n_students);
    let features = FeatureScaler::fit(&data).unwrap();
    let scaled = features.transform_batch(data.numeric_matrix().view()).unwrap();
    (scaled, data.categorical_matrix(), features)
}

fn bench_engine_small(c: &mut Criterion) {
    let (scaled, categorical, features) = prepared(100);

    let mut group = c.benchmark_group("engine_small");

    for &n_clusters in &[2, 4, 6] {
        for init_method in [InitMethod::Huang, InitMethod::Random] {
            group.bench_with_input(
                BenchmarkId::new(format!("k{}_{:?}", n_clusters, init_method), ""),
                &(n_clusters, init_method),
                |b, &(k, method)| {
                    b.iter(|| {
                        let mut engine = ClusteringEngine::new(k)
                            .init_method(method)
                            .seed(42)
                            .n_restarts(1)
                            .max_iterations(50);
                        black_box(
                            engine
                                .fit(
                                    black_box(scaled.view()),
                                    black_box(categorical.view()),
                                    &features,
                                )
                                .unwrap(),
                        )
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_gamma_effect(c: &mut Criterion) {
    let (scaled, categorical, features) = prepared(200);

    let mut group = c.benchmark_group("gamma_effect");

    for &gamma in &[0.1, 0.5, 1.0, 2.0, 5.0] {
        group.bench_with_input(BenchmarkId::from_parameter(gamma), &gamma, |b, &g| {
            b.iter(|| {
                let mut engine = ClusteringEngine::new(4)
                    .gamma(g)
                    .seed(42)
                    .n_restarts(1)
                    .max_iterations(50);
                black_box(
                    engine
                        .fit(black_box(scaled.view()), black_box(categorical.view()), &features)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_restart_parallelism(c: &mut Criterion) {
    let (scaled, categorical, features) = prepared(500);

    let mut group = c.benchmark_group("restart_parallelism");
    group.sample_size(20);

    for &n_jobs in &[1, 2, 4] {
        group.bench_with_input(BenchmarkId::new("jobs", n_jobs), &n_jobs, |b, &jobs| {
            b.iter(|| {
                let mut engine = ClusteringEngine::new(4)
                    .seed(42)
                    .n_restarts(8)
                    .n_jobs(jobs)
                    .max_iterations(30);
                black_box(
                    engine
                        .fit(black_box(scaled.view()), black_box(categorical.view()), &features)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_engine_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_scaling");
    group.sample_size(10);

    for &n_students in &[100, 500, 2000] {
        let (scaled, categorical, features) = prepared(n_students);

        group.bench_with_input(
            BenchmarkId::new("students", n_students),
            &n_students,
            |b, _| {
                b.iter(|| {
                    let mut engine = ClusteringEngine::new(3)
                        .seed(42)
                        .n_restarts(1)
                        .max_iterations(30);
                    black_box(
                        engine
                            .fit(black_box(scaled.view()), black_box(categorical.view()), &features)
                            .unwrap(),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let data = generate_students(1000);
    let records = data.records.clone();
    let model = FittedModel::fit(data, &ClusteringConfig::new(4).n_restarts(4)).unwrap();
    let predictor: Predictor<'_> = model.predictor().unwrap();

    let mut group = c.benchmark_group("prediction");

    group.bench_function("single", |b| {
        b.iter(|| black_box(predictor.predict(black_box(&records[0])).unwrap()))
    });
    group.bench_function("batch_1000", |b| {
        b.iter(|| black_box(predictor.predict_batch(black_box(&records)).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_engine_small,
    bench_gamma_effect,
    bench_restart_parallelism,
    bench_engine_scaling,
    bench_prediction
);
criterion_main!(benches);
