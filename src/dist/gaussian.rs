//! Gaussian mixture component
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

use crate::consts::HALF_LN_2PI;
use crate::impl_display;
use crate::traits::{
    ContinuousDistr, HasDensity, Parameterized, Sampleable, Support,
};

/// Gaussian / [Normal distribution](https://en.wikipedia.org/wiki/Normal_distribution),
/// N(μ, σ) over real values.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let gauss = Gaussian::new(2.0, 0.5).unwrap();
///
/// // The density peaks at the mean
/// assert!(gauss.pdf(&2.0_f64) > gauss.pdf(&2.1_f64));
/// assert!(gauss.pdf(&2.0_f64) > gauss.pdf(&1.9_f64));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "serde1", serde(try_from = "GaussianParameters"))]
#[cfg_attr(feature = "serde1", serde(into = "GaussianParameters"))]
pub struct Gaussian {
    /// Mean
    mu: f64,
    /// Standard deviation
    sigma: f64,
    /// Cached log(sigma)
    ln_sigma: f64,
}

impl PartialEq for Gaussian {
    fn eq(&self, other: &Gaussian) -> bool {
        self.mu == other.mu && self.sigma == other.sigma
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct GaussianParameters {
    pub mu: f64,
    pub sigma: f64,
}

impl TryFrom<GaussianParameters> for Gaussian {
    type Error = GaussianError;

    fn try_from(params: GaussianParameters) -> Result<Self, Self::Error> {
        Gaussian::new(params.mu, params.sigma)
    }
}

impl From<Gaussian> for GaussianParameters {
    fn from(gauss: Gaussian) -> Self {
        GaussianParameters {
            mu: gauss.mu,
            sigma: gauss.sigma,
        }
    }
}

impl Parameterized for Gaussian {
    type Parameters = GaussianParameters;

    fn emit_params(&self) -> Self::Parameters {
        Self::Parameters {
            mu: self.mu(),
            sigma: self.sigma(),
        }
    }

    fn from_params(params: Self::Parameters) -> Self {
        Self::new_unchecked(params.mu, params.sigma)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum GaussianError {
    /// The mu parameter is infinite or NaN
    MuNotFinite { mu: f64 },
    /// The sigma parameter is less than or equal to zero
    SigmaTooLow { sigma: f64 },
    /// The sigma parameter is infinite or NaN
    SigmaNotFinite { sigma: f64 },
}

impl Gaussian {
    /// Create a new Gaussian distribution
    ///
    /// # Arguments
    /// - mu: mean
    /// - sigma: standard deviation
    pub fn new(mu: f64, sigma: f64) -> Result<Self, GaussianError> {
        if !mu.is_finite() {
            Err(GaussianError::MuNotFinite { mu })
        } else if sigma <= 0.0 {
            Err(GaussianError::SigmaTooLow { sigma })
        } else if !sigma.is_finite() {
            Err(GaussianError::SigmaNotFinite { sigma })
        } else {
            Ok(Gaussian::new_unchecked(mu, sigma))
        }
    }

    /// Creates a new Gaussian without checking whether the parameters are
    /// valid.
    ///
    /// The M-step builds components this way because a component that
    /// collapsed onto a single point legitimately has `sigma == 0`.
    #[inline]
    #[must_use]
    pub fn new_unchecked(mu: f64, sigma: f64) -> Self {
        Gaussian {
            mu,
            sigma,
            ln_sigma: sigma.ln(),
        }
    }

    /// Standard normal
    ///
    /// # Example
    ///
    /// ```rust
    /// # use gmm_em::dist::Gaussian;
    /// let gauss = Gaussian::standard();
    ///
    /// assert_eq!(gauss, Gaussian::new(0.0, 1.0).unwrap());
    /// ```
    #[inline]
    #[must_use]
    pub fn standard() -> Self {
        Gaussian {
            mu: 0.0,
            sigma: 1.0,
            ln_sigma: 0.0,
        }
    }

    /// Get mu parameter
    #[inline]
    #[must_use]
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Get sigma parameter
    #[inline]
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// `true` if sigma is finite and strictly positive, i.e., the density is
    /// well defined everywhere.
    #[inline]
    pub fn is_proper(&self) -> bool {
        self.mu.is_finite() && self.sigma.is_finite() && self.sigma > 0.0
    }
}

impl From<&Gaussian> for String {
    fn from(gauss: &Gaussian) -> String {
        format!("N(μ: {}, σ: {})", gauss.mu, gauss.sigma)
    }
}

impl_display!(Gaussian);

impl HasDensity<f64> for Gaussian {
    /// ln N(x; μ, σ). NaN when σ is zero.
    fn ln_f(&self, x: &f64) -> f64 {
        let k = (x - self.mu) / self.sigma;
        (0.5 * k).mul_add(-k, -self.ln_sigma) - HALF_LN_2PI
    }
}

impl Sampleable<f64> for Gaussian {
    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.sigma.mul_add(z, self.mu)
    }
}

impl Support<f64> for Gaussian {
    fn supports(&self, x: &f64) -> bool {
        x.is_finite()
    }
}

impl ContinuousDistr<f64> for Gaussian {}

impl std::error::Error for GaussianError {}

impl fmt::Display for GaussianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MuNotFinite { mu } => write!(f, "non-finite mu: {mu}"),
            Self::SigmaTooLow { sigma } => {
                write!(f, "sigma ({sigma}) must be greater than zero")
            }
            Self::SigmaNotFinite { sigma } => {
                write!(f, "non-finite sigma: {sigma}")
            }
        }
    }
}
