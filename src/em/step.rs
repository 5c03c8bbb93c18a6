#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use log::warn;

use super::{Degeneracy, EmError};
use crate::consts::WEIGHT_SUM_TOL;
use crate::data::{
    DataError, ResponsibilityMatrix, Sample, WeightedGaussianSuffStat,
};
use crate::dist::{Gaussian, MixtureModel};
use crate::traits::{HasDensity, WeightedSuffStat};

/// What the M-step does with a component that received no responsibility
/// mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum DegeneratePolicy {
    /// Return [`EmError::ZeroResponsibilityMass`]
    #[default]
    Fail,
    /// Keep the component's previous mean and standard deviation, with
    /// weight zero
    Retain,
    /// Reset the component to the mean and standard deviation of the whole
    /// sample, with weight zero
    Reinitialize,
}

/// Make sure densities of `model` are defined everywhere
fn check_model(model: &MixtureModel) -> Result<(), EmError> {
    model.check_weights()?;
    match model.first_improper() {
        Some(component) => Err(EmError::DegenerateModel(
            Degeneracy::ImproperComponent {
                component,
                sigma: model.components()[component].sigma(),
            },
        )),
        None => Ok(()),
    }
}

fn check_shape(
    sample: &Sample,
    k: usize,
    resp: &ResponsibilityMatrix,
) -> Result<(), EmError> {
    if resp.n_rows() != sample.len() || resp.k() != k {
        Err(EmError::DimensionMismatch {
            expected: (sample.len(), k),
            found: (resp.n_rows(), resp.k()),
        })
    } else {
        Ok(())
    }
}

/// Log-likelihood of the sample under the mixture,
/// Σ<sub>i</sub> ln Σ<sub>j</sub> π<sub>j</sub> N(x<sub>i</sub>; μ<sub>j</sub>, σ<sub>j</sub>).
///
/// # Errors
///
/// - [`EmError::DegenerateModel`] if a component has a non-positive standard
///   deviation, or if the mixture density at any point is zero or infinite.
/// - [`EmError::InvalidParameters`] if the weights are invalid.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let sample = Sample::new(vec![0.0]).unwrap();
/// let model = MixtureModel::from_parts(vec![1.0], vec![0.0], vec![1.0]).unwrap();
///
/// let ll = ln_likelihood(&sample, &model).unwrap();
/// assert!((ll + 0.918_938_533_204_672_7).abs() < 1E-12);
/// ```
pub fn ln_likelihood(
    sample: &Sample,
    model: &MixtureModel,
) -> Result<f64, EmError> {
    check_model(model)?;
    sample
        .iter()
        .enumerate()
        .try_fold(0.0, |acc, (ix, &x)| {
            let p = model.f(&x);
            if p == f64::INFINITY {
                Err(EmError::DegenerateModel(Degeneracy::InfiniteDensity {
                    ix,
                    x,
                }))
            } else if p > 0.0 {
                Ok(acc + p.ln())
            } else {
                Err(EmError::DegenerateModel(Degeneracy::ZeroDensity { ix, x }))
            }
        })
}

/// Compute the responsibility of each component for each observation,
///
/// R[i][j] = π<sub>j</sub> N(x<sub>i</sub>; μ<sub>j</sub>, σ<sub>j</sub>) /
/// Σ<sub>k</sub> π<sub>k</sub> N(x<sub>i</sub>; μ<sub>k</sub>, σ<sub>k</sub>).
///
/// The ratio is taken directly, not in log space.
///
/// # Errors
///
/// - [`EmError::DensityUnderflow`] if the denominator is zero for some
///   observation.
/// - [`EmError::DegenerateModel`] if a component has a non-positive standard
///   deviation, or the denominator overflows.
/// - [`EmError::InvalidParameters`] if the weights are invalid.
pub fn e_step(
    sample: &Sample,
    model: &MixtureModel,
) -> Result<ResponsibilityMatrix, EmError> {
    check_model(model)?;
    let k = model.k();
    let mut values: Vec<f64> = Vec::with_capacity(sample.len() * k);

    for (ix, &x) in sample.iter().enumerate() {
        let joint = model.joint_densities(x);
        let z: f64 = joint.iter().sum();
        if z == f64::INFINITY {
            return Err(EmError::DegenerateModel(
                Degeneracy::InfiniteDensity { ix, x },
            ));
        } else if z.is_nan() || z <= 0.0 {
            return Err(EmError::DensityUnderflow { ix, x });
        }
        values.extend(joint.iter().map(|p| p / z));
    }

    Ok(ResponsibilityMatrix::from_raw_unchecked(
        values,
        sample.len(),
        k,
    ))
}

/// Maximize the expected complete-data log-likelihood given the
/// responsibilities.
///
/// - π<sub>j</sub> = Σ<sub>i</sub> R[i][j] / m
/// - μ<sub>j</sub> = Σ<sub>i</sub> R[i][j] x<sub>i</sub> / Σ<sub>i</sub> R[i][j]
/// - σ<sub>j</sub>² = Σ<sub>i</sub> R[i][j] (x<sub>i</sub> - μ<sub>j</sub>)² / Σ<sub>i</sub> R[i][j]
///
/// The returned model is not validated: a component that owns a single point
/// comes back with σ = 0, which the next E-step reports as a degenerate
/// model.
///
/// # Errors
///
/// - [`EmError::ZeroResponsibilityMass`] if a column of `resp` sums to zero.
/// - [`EmError::DimensionMismatch`] if `resp` does not have one row per
///   observation.
/// - [`EmError::InvalidResponsibilities`] if a row does not sum to one.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let sample = Sample::new(vec![1.0, 2.0, 10.0, 11.0]).unwrap();
/// let resp = ResponsibilityMatrix::from_rows(vec![
///     vec![1.0, 0.0],
///     vec![1.0, 0.0],
///     vec![0.0, 1.0],
///     vec![0.0, 1.0],
/// ]).unwrap();
///
/// let model = m_step(&sample, &resp).unwrap();
///
/// assert_eq!(model.weights(), &[0.5, 0.5]);
/// assert_eq!(model.means(), vec![1.5, 10.5]);
/// assert_eq!(model.stddevs(), vec![0.5, 0.5]);
/// ```
pub fn m_step(
    sample: &Sample,
    resp: &ResponsibilityMatrix,
) -> Result<MixtureModel, EmError> {
    m_step_inner(sample, resp, |component| {
        Err(EmError::ZeroResponsibilityMass { component })
    })
}

/// [`m_step`] with explicit handling of components that receive no
/// responsibility mass.
///
/// `prev` is the model the responsibilities were computed from.
pub fn m_step_with(
    sample: &Sample,
    resp: &ResponsibilityMatrix,
    prev: &MixtureModel,
    policy: DegeneratePolicy,
) -> Result<MixtureModel, EmError> {
    if prev.k() != resp.k() {
        return Err(EmError::DimensionMismatch {
            expected: (sample.len(), prev.k()),
            found: (resp.n_rows(), resp.k()),
        });
    }

    m_step_inner(sample, resp, |component| match policy {
        DegeneratePolicy::Fail => {
            Err(EmError::ZeroResponsibilityMass { component })
        }
        DegeneratePolicy::Retain => {
            warn!("m_step: retaining empty component {}", component);
            Ok(prev.components()[component].clone())
        }
        DegeneratePolicy::Reinitialize => {
            warn!("m_step: reinitializing empty component {}", component);
            Gaussian::new(sample.mean(), sample.stddev())
                .map_err(|_| EmError::ZeroResponsibilityMass { component })
        }
    })
}

fn m_step_inner<F>(
    sample: &Sample,
    resp: &ResponsibilityMatrix,
    mut on_empty: F,
) -> Result<MixtureModel, EmError>
where
    F: FnMut(usize) -> Result<Gaussian, EmError>,
{
    check_shape(sample, resp.k(), resp)?;
    if let Some((row, sum)) = resp.first_unnormalized_row(WEIGHT_SUM_TOL) {
        return Err(DataError::RowNotNormalized { row, sum }.into());
    }

    let mut stats = vec![WeightedGaussianSuffStat::new(); resp.k()];
    sample.iter().zip(resp.rows()).for_each(|(x, row)| {
        stats
            .iter_mut()
            .zip(row.iter())
            .for_each(|(stat, &r)| stat.observe_weighted(x, r));
    });

    let m = sample.len() as f64;
    let mut weights: Vec<f64> = Vec::with_capacity(resp.k());
    let mut components: Vec<Gaussian> = Vec::with_capacity(resp.k());

    for (j, stat) in stats.iter().enumerate() {
        match (stat.mean(), stat.variance()) {
            (Some(mu), Some(var)) => {
                weights.push(stat.total_weight() / m);
                components.push(Gaussian::new_unchecked(mu, var.sqrt()));
            }
            _ => {
                components.push(on_empty(j)?);
                weights.push(0.0);
            }
        }
    }

    Ok(MixtureModel::new_unchecked(weights, components))
}

/// Expected complete-data log-likelihood,
/// Σ<sub>i,j</sub> R[i][j] ln(π<sub>j</sub> N(x<sub>i</sub>; μ<sub>j</sub>, σ<sub>j</sub>)).
///
/// This is the part of the [`lower_bound`] that depends on the parameters.
/// Terms with zero responsibility contribute nothing.
pub fn q_function(
    sample: &Sample,
    model: &MixtureModel,
    resp: &ResponsibilityMatrix,
) -> Result<f64, EmError> {
    weighted_joint_sum(sample, model, resp, |r, ln_p| r * ln_p)
}

/// Entropy of the responsibilities, -Σ<sub>i,j</sub> R[i][j] ln R[i][j], with
/// 0 ln 0 = 0.
pub fn responsibility_entropy(resp: &ResponsibilityMatrix) -> f64 {
    -resp
        .rows()
        .flat_map(|row| row.iter())
        .filter(|&&r| r > 0.0)
        .map(|&r| r * r.ln())
        .sum::<f64>()
}

/// The EM lower bound on the log-likelihood,
/// Σ<sub>i,j</sub> R[i][j] ln(π<sub>j</sub> N(x<sub>i</sub>; μ<sub>j</sub>, σ<sub>j</sub>) / R[i][j]).
///
/// Terms with `R[i][j] == 0` contribute exactly zero. When `resp` is the
/// E-step output for `model`, the bound equals the log-likelihood.
///
/// # Errors
///
/// - [`EmError::DegenerateModel`] if a component has a non-positive standard
///   deviation, or if a positive responsibility falls on a component with
///   zero weight.
/// - [`EmError::DimensionMismatch`] if the shapes disagree.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let sample = Sample::new(vec![-0.5, 0.1, 1.9, 2.3]).unwrap();
/// let model = MixtureModel::from_parts(
///     vec![0.4, 0.6],
///     vec![0.0, 2.0],
///     vec![0.5, 0.3],
/// ).unwrap();
///
/// let resp = e_step(&sample, &model).unwrap();
/// let bound = lower_bound(&sample, &model, &resp).unwrap();
/// let ll = ln_likelihood(&sample, &model).unwrap();
///
/// assert!((bound - ll).abs() < 1E-9);
/// ```
pub fn lower_bound(
    sample: &Sample,
    model: &MixtureModel,
    resp: &ResponsibilityMatrix,
) -> Result<f64, EmError> {
    weighted_joint_sum(sample, model, resp, |r, ln_p| r * (ln_p - r.ln()))
}

/// Sum `term(R[i][j], ln π_j + ln N(x_i; μ_j, σ_j))` over all entries with
/// positive responsibility.
///
/// Works in log space, so terms stay finite where the density itself
/// underflows to zero.
fn weighted_joint_sum<F>(
    sample: &Sample,
    model: &MixtureModel,
    resp: &ResponsibilityMatrix,
    term: F,
) -> Result<f64, EmError>
where
    F: Fn(f64, f64) -> f64,
{
    check_model(model)?;
    check_shape(sample, model.k(), resp)?;

    let mut total = 0.0;
    for (ix, (&x, row)) in sample.iter().zip(resp.rows()).enumerate() {
        let ln_joint = model.ln_joint_densities(x);
        for (&r, &ln_p) in row.iter().zip(ln_joint.iter()) {
            // 0 ln 0 = 0
            if r == 0.0 {
                continue;
            }
            if ln_p == f64::INFINITY {
                return Err(EmError::DegenerateModel(
                    Degeneracy::InfiniteDensity { ix, x },
                ));
            } else if !ln_p.is_finite() {
                return Err(EmError::DegenerateModel(
                    Degeneracy::ZeroDensity { ix, x },
                ));
            }
            total += term(r, ln_p);
        }
    }
    Ok(total)
}
