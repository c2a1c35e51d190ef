use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crop_advisor::feature_engineering::{FeatureTransformer, SoilSample};
use crop_advisor::export::ModelBundle;
use crop_advisor::inference::CropRecommender;
use crop_advisor::optimizer::{GridSearchCV, ParamGrid};
use crop_advisor::preprocessing::LabelEncoder;
use crop_advisor::training::{ForestParams, RandomForestClassifier, StratifiedKFold};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const CROPS: [&str; 4] = ["banana", "chickpea", "maize", "rice"];

/// Engineered feature matrix for noisy samples around one centre per crop
fn create_crop_data(n_rows: usize) -> (Array2<f64>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let centres = [
        [100.0, 82.0, 50.0, 27.0, 80.0, 5.9, 105.0],
        [40.0, 68.0, 80.0, 18.0, 16.0, 7.3, 80.0],
        [78.0, 48.0, 20.0, 22.0, 65.0, 6.2, 85.0],
        [80.0, 45.0, 40.0, 23.0, 82.0, 6.4, 220.0],
    ];

    let mut rows = Vec::with_capacity(n_rows * FeatureTransformer::n_features());
    let mut y = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let class = i % CROPS.len();
        let raw: Vec<f64> = centres[class].iter().map(|c| c * (1.0 + rng.gen_range(-0.15..0.15))).collect();
        rows.extend(FeatureTransformer::transform_row(&raw).unwrap());
        y.push(class);
    }
    let x = Array2::from_shape_vec((n_rows, FeatureTransformer::n_features()), rows).unwrap();
    (x, y)
}

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, y) = create_crop_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut forest = RandomForestClassifier::new(ForestParams::default());
                forest.fit(black_box(x), black_box(y), CROPS.len()).unwrap();
                forest
            })
        });
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    let (x, y) = create_crop_data(400);
    group.bench_function("quick_grid_3fold", |b| {
        b.iter(|| {
            GridSearchCV::new(ParamGrid::quick(), StratifiedKFold::new(3).with_shuffle(42))
                .fit(black_box(&x), black_box(&y), CROPS.len())
                .unwrap()
        })
    });

    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    let (x, y) = create_crop_data(1000);
    let mut encoder = LabelEncoder::new();
    encoder.fit(&CROPS).unwrap();
    let params = ForestParams::default();
    let mut forest = RandomForestClassifier::new(params);
    forest.fit(&x, &y, CROPS.len()).unwrap();
    let recommender = CropRecommender::new(ModelBundle::new(forest, encoder, params, 1.0)).unwrap();

    let sample = SoilSample::new(90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9);
    group.bench_function("single", |b| b.iter(|| recommender.recommend(black_box(&sample)).unwrap()));

    for n in [100, 1000].iter() {
        let samples = vec![sample; *n];
        group.bench_with_input(BenchmarkId::new("batch", n), &samples, |b, samples| {
            b.iter(|| recommender.recommend_batch(black_box(samples)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forest_fit, bench_grid_search, bench_recommend);
criterion_main!(benches);
