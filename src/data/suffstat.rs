#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::traits::WeightedSuffStat;

/// Weighted Gaussian sufficient statistic.
///
/// Holds the total weight, the weighted mean, and the weighted sum of squared
/// deviations from that mean, updated one observation at a time (West's
/// weighted variant of Welford's algorithm). The population variance under the
/// weights is `sx / total_weight`.
///
/// # Example
///
/// ```
/// use gmm_em::data::WeightedGaussianSuffStat;
/// use gmm_em::traits::WeightedSuffStat;
///
/// let mut stat = WeightedGaussianSuffStat::new();
/// stat.observe_many_weighted(&[1.0, 3.0], &[1.0, 3.0]);
///
/// assert_eq!(stat.total_weight(), 4.0);
/// assert!((stat.mean().unwrap() - 2.5).abs() < 1E-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct WeightedGaussianSuffStat {
    /// Number of observations with non-zero weight
    n: usize,
    /// Sum of weights
    sum_w: f64,
    /// Weighted mean of `x`
    mean: f64,
    /// Weighted sum of squared deviations from the mean
    sx: f64,
}

impl WeightedGaussianSuffStat {
    #[inline]
    pub fn new() -> Self {
        WeightedGaussianSuffStat {
            n: 0,
            sum_w: 0.0,
            mean: 0.0,
            sx: 0.0,
        }
    }

    /// Weighted mean. `None` if no weight has been observed.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.sum_w > 0.0 {
            Some(self.mean)
        } else {
            None
        }
    }

    /// Weighted population variance, Σ w (x - mean)² / Σ w. `None` if no
    /// weight has been observed.
    #[inline]
    pub fn variance(&self) -> Option<f64> {
        if self.sum_w > 0.0 {
            // rounding can leave sx a hair below zero
            Some((self.sx / self.sum_w).max(0.0))
        } else {
            None
        }
    }
}

impl Default for WeightedGaussianSuffStat {
    fn default() -> Self {
        WeightedGaussianSuffStat::new()
    }
}

impl WeightedSuffStat<f64> for WeightedGaussianSuffStat {
    fn n(&self) -> usize {
        self.n
    }

    fn total_weight(&self) -> f64 {
        self.sum_w
    }

    fn observe_weighted(&mut self, x: &f64, w: f64) {
        if w <= 0.0 {
            return;
        }

        self.n += 1;
        self.sum_w += w;

        let delta = x - self.mean;
        let mean_xn = (delta * w).mul_add(self.sum_w.recip(), self.mean);
        self.sx = (w * delta).mul_add(x - mean_xn, self.sx);
        self.mean = mean_xn;
    }
}
