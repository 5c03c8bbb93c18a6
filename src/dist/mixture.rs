//! Univariate Gaussian mixture model
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use rand::Rng;
use std::fmt;

use crate::consts::WEIGHT_SUM_TOL;
use crate::dist::{Gaussian, GaussianError};
use crate::misc::{logsumexp, pflip};
use crate::traits::{
    ContinuousDistr, HasDensity, Parameterized, Sampleable, Support,
};

/// A [mixture](https://en.wikipedia.org/wiki/Mixture_model) of K univariate
/// Gaussians, Σ<sub>j</sub> π<sub>j</sub> N(μ<sub>j</sub>, σ<sub>j</sub>).
///
/// A `MixtureModel` is never mutated by EM; each M-step produces a new one.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let mm = MixtureModel::from_parts(
///     vec![0.5, 0.5],
///     vec![-1.0, 1.0],
///     vec![0.5, 0.5],
/// ).unwrap();
///
/// assert_eq!(mm.k(), 2);
///
/// // symmetric around zero
/// assert!((mm.f(&-0.3_f64) - mm.f(&0.3_f64)).abs() < 1E-12);
/// ```
///
/// Weights that do not sum to one are rejected
///
/// ```
/// # use gmm_em::prelude::*;
/// let res = MixtureModel::from_parts(
///     vec![0.5, 0.6],
///     vec![-1.0, 1.0],
///     vec![0.5, 0.5],
/// );
///
/// assert!(res.is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "serde1", serde(try_from = "MixtureParameters"))]
#[cfg_attr(feature = "serde1", serde(into = "MixtureParameters"))]
pub struct MixtureModel {
    /// Mixture weights, π
    weights: Vec<f64>,
    /// Component distributions
    components: Vec<Gaussian>,
}

/// Flat parameter vectors of a mixture
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct MixtureParameters {
    pub weights: Vec<f64>,
    pub means: Vec<f64>,
    pub stddevs: Vec<f64>,
}

impl TryFrom<MixtureParameters> for MixtureModel {
    type Error = MixtureError;

    fn try_from(params: MixtureParameters) -> Result<Self, Self::Error> {
        MixtureModel::from_parts(params.weights, params.means, params.stddevs)
    }
}

impl From<MixtureModel> for MixtureParameters {
    fn from(mm: MixtureModel) -> Self {
        mm.emit_params()
    }
}

impl Parameterized for MixtureModel {
    type Parameters = MixtureParameters;

    fn emit_params(&self) -> Self::Parameters {
        MixtureParameters {
            weights: self.weights.clone(),
            means: self.means(),
            stddevs: self.stddevs(),
        }
    }

    fn from_params(params: Self::Parameters) -> Self {
        let components = params
            .means
            .iter()
            .zip(params.stddevs.iter())
            .map(|(&mu, &sigma)| Gaussian::new_unchecked(mu, sigma))
            .collect();
        Self::new_unchecked(params.weights, components)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum MixtureError {
    /// The mixture has no components
    Empty,
    /// The parameter vectors have different lengths
    LengthMismatch {
        n_weights: usize,
        n_means: usize,
        n_stddevs: usize,
    },
    /// A weight is less than zero
    WeightTooLow { ix: usize, weight: f64 },
    /// A weight is infinite or NaN
    WeightNotFinite { ix: usize, weight: f64 },
    /// The weights do not sum to one
    WeightsDoNotSumToOne { sum: f64 },
    /// A component has invalid parameters
    Component { ix: usize, err: GaussianError },
}

fn validate_weights(weights: &[f64]) -> Result<(), MixtureError> {
    if weights.is_empty() {
        return Err(MixtureError::Empty);
    }

    weights.iter().enumerate().try_for_each(|(ix, &weight)| {
        if !weight.is_finite() {
            Err(MixtureError::WeightNotFinite { ix, weight })
        } else if weight < 0.0 {
            Err(MixtureError::WeightTooLow { ix, weight })
        } else {
            Ok(())
        }
    })?;

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
        Err(MixtureError::WeightsDoNotSumToOne { sum })
    } else {
        Ok(())
    }
}

impl MixtureModel {
    /// Create a mixture from weights and components
    pub fn new(
        weights: Vec<f64>,
        components: Vec<Gaussian>,
    ) -> Result<Self, MixtureError> {
        if weights.len() != components.len() {
            return Err(MixtureError::LengthMismatch {
                n_weights: weights.len(),
                n_means: components.len(),
                n_stddevs: components.len(),
            });
        }
        validate_weights(&weights)?;
        components.iter().enumerate().try_for_each(|(ix, cpnt)| {
            Gaussian::new(cpnt.mu(), cpnt.sigma())
                .map(|_| ())
                .map_err(|err| MixtureError::Component { ix, err })
        })?;

        Ok(MixtureModel {
            weights,
            components,
        })
    }

    /// Create a mixture from flat parameter vectors
    ///
    /// # Arguments
    /// - weights: mixture proportions, π
    /// - means: component means, μ
    /// - stddevs: component standard deviations, σ
    pub fn from_parts(
        weights: Vec<f64>,
        means: Vec<f64>,
        stddevs: Vec<f64>,
    ) -> Result<Self, MixtureError> {
        if weights.len() != means.len() || weights.len() != stddevs.len() {
            return Err(MixtureError::LengthMismatch {
                n_weights: weights.len(),
                n_means: means.len(),
                n_stddevs: stddevs.len(),
            });
        }

        let components = means
            .iter()
            .zip(stddevs.iter())
            .enumerate()
            .map(|(ix, (&mu, &sigma))| {
                Gaussian::new(mu, sigma)
                    .map_err(|err| MixtureError::Component { ix, err })
            })
            .collect::<Result<Vec<Gaussian>, MixtureError>>()?;

        validate_weights(&weights)?;

        Ok(MixtureModel {
            weights,
            components,
        })
    }

    /// Creates a mixture without checking whether the parameters are valid.
    #[inline]
    #[must_use]
    pub fn new_unchecked(weights: Vec<f64>, components: Vec<Gaussian>) -> Self {
        MixtureModel {
            weights,
            components,
        }
    }

    /// Mixture with equal weight on each component
    ///
    /// # Example
    ///
    /// ```
    /// # use gmm_em::prelude::*;
    /// let mm = MixtureModel::uniform(vec![
    ///     Gaussian::new(-1.0, 1.0).unwrap(),
    ///     Gaussian::new(0.0, 1.0).unwrap(),
    ///     Gaussian::new(1.0, 1.0).unwrap(),
    ///     Gaussian::new(2.0, 1.0).unwrap(),
    /// ]).unwrap();
    ///
    /// assert_eq!(mm.weights(), &[0.25, 0.25, 0.25, 0.25]);
    /// ```
    pub fn uniform(components: Vec<Gaussian>) -> Result<Self, MixtureError> {
        if components.is_empty() {
            return Err(MixtureError::Empty);
        }
        let k = components.len();
        let weights = vec![(k as f64).recip(); k];
        Self::new(weights, components)
    }

    /// Number of components
    #[inline]
    pub fn k(&self) -> usize {
        self.components.len()
    }

    /// Mixture weights
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The component distributions
    #[inline]
    pub fn components(&self) -> &[Gaussian] {
        &self.components
    }

    /// Component means
    pub fn means(&self) -> Vec<f64> {
        self.components.iter().map(Gaussian::mu).collect()
    }

    /// Component standard deviations
    pub fn stddevs(&self) -> Vec<f64> {
        self.components.iter().map(Gaussian::sigma).collect()
    }

    /// Re-check the weights of a mixture that may have been built with
    /// [`MixtureModel::new_unchecked`].
    pub fn check_weights(&self) -> Result<(), MixtureError> {
        if self.weights.len() != self.components.len() {
            return Err(MixtureError::LengthMismatch {
                n_weights: self.weights.len(),
                n_means: self.components.len(),
                n_stddevs: self.components.len(),
            });
        }
        validate_weights(&self.weights)
    }

    /// Index of the first component whose density is not well defined, if
    /// any.
    pub fn first_improper(&self) -> Option<usize> {
        self.components.iter().position(|cpnt| !cpnt.is_proper())
    }

    /// Weighted component densities `w_j N(x; μ_j, σ_j)` at `x`
    pub fn joint_densities(&self, x: f64) -> Vec<f64> {
        self.weights
            .iter()
            .zip(self.components.iter())
            .map(|(&w, cpnt)| w * cpnt.f(&x))
            .collect()
    }

    /// Log weighted component densities `ln w_j + ln N(x; μ_j, σ_j)` at `x`.
    ///
    /// These stay finite where [`MixtureModel::joint_densities`] underflows
    /// to zero. A zero weight gives -∞.
    pub fn ln_joint_densities(&self, x: f64) -> Vec<f64> {
        self.weights
            .iter()
            .zip(self.components.iter())
            .map(|(&w, cpnt)| w.ln() + cpnt.ln_f(&x))
            .collect()
    }
}

impl From<&MixtureModel> for String {
    fn from(mm: &MixtureModel) -> String {
        let cpnts: Vec<String> =
            mm.components.iter().map(String::from).collect();
        format!(
            "Mixture(k: {}, weights: {:?}, components: [{}])",
            mm.k(),
            mm.weights,
            cpnts.join(", ")
        )
    }
}

crate::impl_display!(MixtureModel);

impl HasDensity<f64> for MixtureModel {
    /// # Panics
    ///
    /// On a mixture with no components, which only
    /// [`MixtureModel::new_unchecked`] can build.
    fn ln_f(&self, x: &f64) -> f64 {
        logsumexp(&self.ln_joint_densities(*x))
    }

    fn f(&self, x: &f64) -> f64 {
        self.joint_densities(*x).iter().sum()
    }
}

impl Sampleable<f64> for MixtureModel {
    /// # Panics
    ///
    /// If the mixture has no components or its weights sum to zero. Neither
    /// passes [`MixtureModel::new`].
    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        let k: usize = pflip(&self.weights, 1, rng)[0];
        self.components[k].draw(rng)
    }

    /// # Panics
    ///
    /// As [`Sampleable::draw`].
    fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        pflip(&self.weights, n, rng)
            .iter()
            .map(|&k| self.components[k].draw(rng))
            .collect()
    }
}

impl Support<f64> for MixtureModel {
    fn supports(&self, x: &f64) -> bool {
        self.components.iter().any(|cpnt| cpnt.supports(x))
    }
}

impl ContinuousDistr<f64> for MixtureModel {}

impl std::error::Error for MixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Component { err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for MixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "a mixture needs at least one component"),
            Self::LengthMismatch {
                n_weights,
                n_means,
                n_stddevs,
            } => write!(
                f,
                "parameter lengths differ: {n_weights} weights, \
                 {n_means} means, {n_stddevs} stddevs"
            ),
            Self::WeightTooLow { ix, weight } => {
                write!(f, "weight {ix} ({weight}) must be non-negative")
            }
            Self::WeightNotFinite { ix, weight } => {
                write!(f, "weight {ix} is not finite: {weight}")
            }
            Self::WeightsDoNotSumToOne { sum } => {
                write!(f, "weights must sum to 1, but sum to {sum}")
            }
            Self::Component { ix, err } => {
                write!(f, "component {ix} is invalid: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const TOL: f64 = 1E-12;

    fn two_cpnt() -> MixtureModel {
        MixtureModel::from_parts(
            vec![0.3, 0.7],
            vec![0.0, 2.0],
            vec![0.4, 0.2],
        )
        .unwrap()
    }

    use crate::test_basic_impls;
    test_basic_impls!(two_cpnt());

    #[test]
    fn from_parts_accessors() {
        let mm = two_cpnt();
        assert_eq!(mm.k(), 2);
        assert_eq!(mm.weights(), &[0.3, 0.7]);
        assert_eq!(mm.means(), vec![0.0, 2.0]);
        assert_eq!(mm.stddevs(), vec![0.4, 0.2]);
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let res = MixtureModel::from_parts(vec![1.0], vec![0.0, 1.0], vec![1.0]);
        assert_eq!(
            res,
            Err(MixtureError::LengthMismatch {
                n_weights: 1,
                n_means: 2,
                n_stddevs: 1
            })
        );
    }

    #[test]
    fn from_parts_rejects_zero_stddev() {
        let res = MixtureModel::from_parts(
            vec![0.5, 0.5],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        );
        assert_eq!(
            res,
            Err(MixtureError::Component {
                ix: 1,
                err: GaussianError::SigmaTooLow { sigma: 0.0 }
            })
        );
    }

    #[test]
    fn from_parts_rejects_negative_weight() {
        let res = MixtureModel::from_parts(
            vec![1.5, -0.5],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        );
        assert_eq!(
            res,
            Err(MixtureError::WeightTooLow {
                ix: 1,
                weight: -0.5
            })
        );
    }

    #[test]
    fn from_parts_rejects_bad_weight_sum() {
        let res = MixtureModel::from_parts(
            vec![0.5, 0.4],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        );
        assert!(matches!(
            res,
            Err(MixtureError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn empty_mixture_is_rejected() {
        assert_eq!(
            MixtureModel::from_parts(vec![], vec![], vec![]),
            Err(MixtureError::Empty)
        );
        assert_eq!(MixtureModel::uniform(vec![]), Err(MixtureError::Empty));
    }

    #[test]
    fn new_rejects_unchecked_zero_sigma_component() {
        let res = MixtureModel::new(
            vec![1.0],
            vec![Gaussian::new_unchecked(0.0, 0.0)],
        );
        assert!(matches!(res, Err(MixtureError::Component { ix: 0, .. })));
    }

    #[test]
    fn ln_f_agrees_with_f() {
        let mm = two_cpnt();
        for x in [-1.0, 0.0, 0.5, 1.9, 2.0, 3.3] {
            assert::close(mm.ln_f(&x), mm.f(&x).ln(), TOL);
        }
    }

    #[test]
    fn single_component_mixture_is_the_component() {
        let g = Gaussian::new(1.0, 0.5).unwrap();
        let mm = MixtureModel::uniform(vec![g.clone()]).unwrap();
        for x in [-1.0, 0.0, 1.0, 2.5] {
            assert::close(mm.ln_f(&x), g.ln_f(&x), TOL);
        }
    }

    #[test]
    fn pdf_integrates_to_one() {
        use peroxide::numerical::integral::{
            gauss_kronrod_quadrature, Integral,
        };
        let mm = two_cpnt();
        let res = gauss_kronrod_quadrature(
            |x: f64| mm.f(&x),
            (-10.0, 10.0),
            Integral::G7K15(1e-12, 100),
        );
        assert::close(res, 1.0, 1e-9);
    }

    #[test]
    fn ln_joint_densities_survive_underflow() {
        let mm = two_cpnt();
        let joint = mm.joint_densities(50.0);
        let ln_joint = mm.ln_joint_densities(50.0);
        assert_eq!(joint, vec![0.0, 0.0]);
        assert!(ln_joint.iter().all(|lp| lp.is_finite()));
        assert::close(
            ln_joint[1],
            0.7_f64.ln() + Gaussian::new(2.0, 0.2).unwrap().ln_f(&50.0),
            TOL,
        );
    }

    #[test]
    #[should_panic]
    fn ln_f_of_componentless_mixture_panics() {
        let mm = MixtureModel::new_unchecked(vec![], vec![]);
        let _lf = mm.ln_f(&0.0);
    }

    #[test]
    #[should_panic]
    fn draw_from_zero_weights_panics() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let mm = MixtureModel::new_unchecked(
            vec![0.0, 0.0],
            vec![Gaussian::standard(), Gaussian::standard()],
        );
        let _x: f64 = mm.draw(&mut rng);
    }

    #[test]
    fn sample_mean_is_close() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0x1234);
        let mm = two_cpnt();
        let xs: Vec<f64> = mm.sample(20_000, &mut rng);
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        assert::close(mean, 1.4, 0.03);
    }

    #[test]
    fn first_improper_finds_zero_sigma() {
        let mm = MixtureModel::new_unchecked(
            vec![0.5, 0.5],
            vec![Gaussian::standard(), Gaussian::new_unchecked(1.0, 0.0)],
        );
        assert_eq!(mm.first_improper(), Some(1));
        assert_eq!(two_cpnt().first_improper(), None);
    }

    #[test]
    fn params_round_trip() {
        let mm = two_cpnt();
        let params = mm.emit_params();
        assert_eq!(MixtureModel::from_params(params.clone()), mm);
        assert_eq!(MixtureModel::try_from(params).unwrap(), mm);
    }

    #[test]
    fn display() {
        let mm = MixtureModel::uniform(vec![Gaussian::standard()]).unwrap();
        assert_eq!(
            format!("{mm}"),
            "Mixture(k: 1, weights: [1.0], components: [N(μ: 0, σ: 1)])"
        );
    }

    #[cfg(feature = "serde1")]
    crate::test_serde_roundtrip!(two_cpnt(), MixtureModel);
}
