use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera::{Context, EngineConfig, Images};

fn random_stack(ctx: &Context, frames: usize, rows: usize, cols: usize) -> Images {
    let mut rng = StdRng::seed_from_u64(7);
    let arrays: Vec<Array2<f64>> = (0..frames)
        .map(|_| Array::from_shape_fn((rows, cols), |_| rng.random::<f64>()))
        .collect();
    ctx.from_list(arrays).unwrap()
}

fn conversion_benchmarks(c: &mut Criterion) {
    let ctx = Context::new(EngineConfig::default()).unwrap();
    let images = random_stack(&ctx, 32, 256, 256);

    let mut group = c.benchmark_group("to_series");
    group.sample_size(20);
    group.bench_function("direct", |b| b.iter(|| images.to_series()));
    for size in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("blocks", size), &size, |b, &size| {
            b.iter(|| images.to_blocks(size).unwrap().to_series().unwrap())
        });
    }
    group.finish();
}

fn filter_benchmarks(c: &mut Criterion) {
    let ctx = Context::new(EngineConfig::default()).unwrap();
    let images = random_stack(&ctx, 8, 256, 256);

    let mut group = c.benchmark_group("filters");
    group.sample_size(10);
    for size in [3usize, 5] {
        group.bench_with_input(BenchmarkId::new("median", size), &size, |b, &size| {
            b.iter(|| images.median_filter(size).unwrap().values())
        });
        group.bench_with_input(BenchmarkId::new("uniform", size), &size, |b, &size| {
            b.iter(|| images.uniform_filter(size).unwrap().values())
        });
    }
    group.bench_function("gaussian_2", |b| {
        b.iter(|| images.gaussian_filter(2.0).unwrap().values())
    });
    group.bench_function("local_corr_1", |b| b.iter(|| images.local_corr(1)));
    group.finish();
}

criterion_group!(benches, conversion_benchmarks, filter_benchmarks);
criterion_main!(benches);
