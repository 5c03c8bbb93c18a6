//! Probability distributions
mod gaussian;
mod mixture;

pub use gaussian::{Gaussian, GaussianError, GaussianParameters};
pub use mixture::{MixtureError, MixtureModel, MixtureParameters};
