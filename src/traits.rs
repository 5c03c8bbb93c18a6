//! Distribution traits
use rand::Rng;

/// Types whose parameters can be pulled out and put back in.
pub trait Parameterized: Sized {
    type Parameters;

    fn emit_params(&self) -> Self::Parameters;

    fn from_params(params: Self::Parameters) -> Self;

    /// Apply a function to the parameters and rebuild
    fn map_params(&self, f: impl Fn(Self::Parameters) -> Self::Parameters) -> Self {
        let params = self.emit_params();
        let new_params = f(params);
        Self::from_params(new_params)
    }
}

/// Has a density (or mass) function.
pub trait HasDensity<X> {
    /// Probability function
    ///
    /// # Example
    ///
    /// ```
    /// use gmm_em::dist::Gaussian;
    /// use gmm_em::traits::HasDensity;
    ///
    /// let g = Gaussian::standard();
    /// assert!(g.f(&0.0_f64) > g.f(&1.0_f64));
    /// ```
    fn f(&self, x: &X) -> f64 {
        self.ln_f(x).exp()
    }

    /// Log probability function
    fn ln_f(&self, x: &X) -> f64;
}

/// Can be drawn from.
pub trait Sampleable<X> {
    /// Single draw
    fn draw<R: Rng>(&self, rng: &mut R) -> X;

    /// Multiple draws
    fn sample<R: Rng>(&self, n: usize, mut rng: &mut R) -> Vec<X> {
        (0..n).map(|_| self.draw(&mut rng)).collect()
    }
}

/// Identifies the support of the distribution
pub trait Support<X> {
    /// Returns `true` if `x` is in the support
    fn supports(&self, x: &X) -> bool;
}

/// A continuous probability distribution
pub trait ContinuousDistr<X>: HasDensity<X> + Support<X> {
    /// The value of the Probability Density Function (PDF) at `x`.
    ///
    /// Returns zero outside of the support.
    fn pdf(&self, x: &X) -> f64 {
        self.ln_pdf(x).exp()
    }

    /// The value of the log PDF at `x`
    fn ln_pdf(&self, x: &X) -> f64 {
        if self.supports(x) {
            self.ln_f(x)
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// A statistic that accumulates weighted observations.
///
/// The M-step uses one of these per mixture component, with each datum
/// weighted by its responsibility.
pub trait WeightedSuffStat<X> {
    /// Number of observations with non-zero weight
    fn n(&self) -> usize;

    /// Sum of the weights observed so far
    fn total_weight(&self) -> f64;

    /// Assimilate the datum `x` with weight `w`
    fn observe_weighted(&mut self, x: &X, w: f64);

    /// Assimilate several observations with their weights
    fn observe_many_weighted(&mut self, xs: &[X], ws: &[f64]) {
        xs.iter()
            .zip(ws.iter())
            .for_each(|(x, &w)| self.observe_weighted(x, w));
    }
}
