use criterion::BatchSize;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use gmm_em::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn two_cluster_sample(n: usize) -> Sample {
    let mut rng = Xoshiro256Plus::seed_from_u64(1337);
    Sample::concat_draws(
        &[
            (Gaussian::new_unchecked(0.0, 0.4), n / 2),
            (Gaussian::new_unchecked(2.0, 0.2), n - n / 2),
        ],
        &mut rng,
    )
    .unwrap()
}

fn init() -> MixtureModel {
    MixtureModel::from_parts(vec![0.5, 0.5], vec![-1.0, 3.0], vec![1.0, 1.0])
        .unwrap()
}

fn bench_e_step(c: &mut Criterion) {
    let sample = two_cluster_sample(1_000);
    let model = init();
    c.bench_function("e-step, 1000 points, 2 components", |b| {
        b.iter(|| e_step(&sample, &model).unwrap())
    });
}

fn bench_m_step(c: &mut Criterion) {
    let sample = two_cluster_sample(1_000);
    let resp = e_step(&sample, &init()).unwrap();
    c.bench_function("m-step, 1000 points, 2 components", |b| {
        b.iter(|| m_step(&sample, &resp).unwrap())
    });
}

fn bench_fit(c: &mut Criterion) {
    let sample = two_cluster_sample(1_000);
    let params = EmParams::default().with_max_iter(50);
    c.bench_function("fit, 1000 points, 2 components", |b| {
        b.iter_batched(
            init,
            |mm| fit(&sample, mm, &params).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(em_step, bench_e_step, bench_m_step, bench_fit);
criterion_main!(em_step);
