#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use rand::Rng;

use super::DataError;
use crate::dist::{Gaussian, MixtureModel};
use crate::traits::Sampleable;

/// An ordered, immutable set of univariate observations.
///
/// Every value is finite and there is at least one of them.
///
/// # Example
///
/// ```
/// use gmm_em::data::Sample;
///
/// let sample = Sample::new(vec![0.1, -0.2, 1.9]).unwrap();
/// assert_eq!(sample.len(), 3);
///
/// assert!(Sample::new(vec![]).is_err());
/// assert!(Sample::new(vec![0.0, f64::NAN]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(try_from = "Vec<f64>"))]
#[cfg_attr(feature = "serde1", serde(into = "Vec<f64>"))]
pub struct Sample {
    xs: Vec<f64>,
}

impl Sample {
    pub fn new(xs: Vec<f64>) -> Result<Self, DataError> {
        if xs.is_empty() {
            return Err(DataError::EmptySample);
        }
        if let Some((ix, &x)) = xs.iter().enumerate().find(|(_, x)| !x.is_finite())
        {
            return Err(DataError::NotFinite { ix, x });
        }
        Ok(Sample { xs })
    }

    /// Draw `n` points from a mixture.
    ///
    /// The mixture must be valid (see [`MixtureModel::new`]).
    pub fn from_mixture<R: Rng>(
        mm: &MixtureModel,
        n: usize,
        rng: &mut R,
    ) -> Result<Self, DataError> {
        MixtureModel::new(mm.weights().to_vec(), mm.components().to_vec())?;
        Self::new(mm.sample(n, rng))
    }

    /// Concatenate `n` draws from each of several Gaussians, in order.
    ///
    /// This is how the two-cluster data of the classic EM illustration is
    /// built: 50 draws from N(0, 0.4) followed by 50 draws from N(2, 0.2).
    pub fn concat_draws<R: Rng>(
        parts: &[(Gaussian, usize)],
        rng: &mut R,
    ) -> Result<Self, DataError> {
        let xs: Vec<f64> = parts
            .iter()
            .flat_map(|(gauss, n)| {
                let draws: Vec<f64> = gauss.sample(*n, rng);
                draws
            })
            .collect();
        Self::new(xs)
    }

    /// Number of observations, m
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always `false`; a `Sample` cannot be empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.xs
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.xs.iter()
    }

    /// Sample mean
    pub fn mean(&self) -> f64 {
        self.xs.iter().sum::<f64>() / self.len() as f64
    }

    /// Population standard deviation
    pub fn stddev(&self) -> f64 {
        let mean = self.mean();
        let ss: f64 = self.xs.iter().map(|x| (x - mean) * (x - mean)).sum();
        (ss / self.len() as f64).sqrt()
    }

    /// Smallest and largest observation
    pub fn range(&self) -> (f64, f64) {
        self.xs.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
    }
}

impl TryFrom<Vec<f64>> for Sample {
    type Error = DataError;

    fn try_from(xs: Vec<f64>) -> Result<Self, Self::Error> {
        Sample::new(xs)
    }
}

impl From<Sample> for Vec<f64> {
    fn from(sample: Sample) -> Self {
        sample.xs
    }
}

impl AsRef<[f64]> for Sample {
    fn as_ref(&self) -> &[f64] {
        &self.xs
    }
}

impl<'a> IntoIterator for &'a Sample {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.xs.iter()
    }
}
