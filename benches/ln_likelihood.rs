use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use gmm_em::prelude::*;

fn grid_sample(n: usize) -> Sample {
    let xs = (0..n).map(|i| -2.0 + 6.0 * i as f64 / n as f64).collect();
    Sample::new(xs).unwrap()
}

fn bench_ln_likelihood(c: &mut Criterion) {
    let model = MixtureModel::from_parts(
        vec![0.2, 0.3, 0.5],
        vec![-1.0, 0.5, 2.0],
        vec![0.5, 0.3, 0.8],
    )
    .unwrap();

    let mut group = c.benchmark_group("ln_likelihood");
    for n in [10, 100, 1_000] {
        let sample = grid_sample(n);
        group.bench_function(format!("{n} points"), |b| {
            b.iter(|| ln_likelihood(&sample, &model).unwrap())
        });
    }
    group.finish();
}

fn bench_lower_bound(c: &mut Criterion) {
    let sample = grid_sample(1_000);
    let model = MixtureModel::from_parts(
        vec![0.2, 0.3, 0.5],
        vec![-1.0, 0.5, 2.0],
        vec![0.5, 0.3, 0.8],
    )
    .unwrap();
    let resp = e_step(&sample, &model).unwrap();
    c.bench_function("lower bound, 1000 points, 3 components", |b| {
        b.iter(|| lower_bound(&sample, &model, &resp).unwrap())
    });
}

criterion_group!(ln_likelihood_benches, bench_ln_likelihood, bench_lower_bound);
criterion_main!(ln_likelihood_benches);
