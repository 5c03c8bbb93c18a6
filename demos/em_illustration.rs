//! Walk through the classic two-cluster EM illustration.
//!
//! Prints the log-likelihood and lower bound along μ₁ before and after one
//! EM iteration, then fits to convergence and writes the data and densities
//! as tab-separated rows to stdout.
use std::io;

use gmm_em::diagnostics::{
    linspace, render_fit, sweep_ln_likelihood, sweep_lower_bound, Param,
    TsvSink,
};
use gmm_em::prelude::*;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(0x1234);
    let sample = Sample::concat_draws(
        &[
            (Gaussian::new(0.0, 0.4)?, 50),
            (Gaussian::new(2.0, 0.2)?, 50),
        ],
        &mut rng,
    )?;

    let init = MixtureModel::from_parts(
        vec![0.5, 0.5],
        vec![-1.0, 0.0],
        vec![0.2, 0.2],
    )?;

    let resp = e_step(&sample, &init)?;
    let grid = linspace(-1.0, 3.0, 41);
    let ll = sweep_ln_likelihood(&sample, &init, Param::Mean(1), &grid)?;
    let bound =
        sweep_lower_bound(&sample, &init, &resp, Param::Mean(1), &grid)?;

    println!("# μ₁\tln p(x)\tbound");
    ll.xs
        .iter()
        .zip(ll.ys.iter())
        .zip(bound.ys.iter())
        .for_each(|((x, l), b)| println!("{x:.2}\t{l:.4}\t{b:.4}"));

    let next = m_step(&sample, &resp)?;
    println!(
        "# one iteration: ln p(x) {:.4} -> {:.4}, model = {}",
        ln_likelihood(&sample, &init)?,
        ln_likelihood(&sample, &next)?,
        next
    );
    if let Some((x, y)) = bound.argmax() {
        println!("# bound peaks at μ₁ = {x:.2} ({y:.4})");
    }

    let start = MixtureModel::from_parts(
        vec![0.5, 0.5],
        vec![-1.0, 3.0],
        vec![1.0, 1.0],
    )?;
    let res = fit(&sample, start.clone(), &EmParams::default())?;
    println!(
        "# fit: {:?} after {} iterations, ln p(x) = {:.4}, model = {}",
        res.stop_reason,
        res.n_iter,
        res.ln_likelihood(),
        res.model
    );

    let mut sink = TsvSink::new(io::stdout().lock());
    let (lo, hi) = sample.range();
    let xs = linspace(lo - 0.5, hi + 0.5, 91);
    render_fit(&mut sink, &sample, &start, &res.model, &xs)?;
    Ok(())
}
