#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

use super::driver::{EmState, Transition};
use crate::data::DataError;
use crate::dist::MixtureError;

/// Why a model cannot be evaluated
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum Degeneracy {
    /// A component's standard deviation is zero, negative, or not finite
    ImproperComponent { component: usize, sigma: f64 },
    /// The mixture assigns zero density to an observation, so its log is
    /// undefined
    ZeroDensity { ix: usize, x: f64 },
    /// The mixture density at an observation overflowed, as happens when a
    /// component's σ is subnormal
    InfiniteDensity { ix: usize, x: f64 },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum EmError {
    /// The model has zero or undefined density somewhere it is evaluated
    DegenerateModel(Degeneracy),
    /// Every component assigned ~0 density to observation `ix`, so its
    /// responsibilities cannot be normalized
    DensityUnderflow { ix: usize, x: f64 },
    /// A component received no responsibility mass in the M-step, so its
    /// mean and variance are undefined
    ZeroResponsibilityMass { component: usize },
    /// The mixture parameters are invalid
    InvalidParameters(MixtureError),
    /// The responsibilities are malformed
    InvalidResponsibilities(DataError),
    /// Shapes of the sample, model, and responsibilities disagree. Shapes are
    /// (observations, components).
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A parameter refers to a component the model does not have
    NoSuchComponent { component: usize, k: usize },
    /// A step was requested out of order
    InvalidTransition { from: EmState, attempted: Transition },
}

impl From<MixtureError> for EmError {
    fn from(err: MixtureError) -> Self {
        EmError::InvalidParameters(err)
    }
}

impl From<DataError> for EmError {
    fn from(err: DataError) -> Self {
        EmError::InvalidResponsibilities(err)
    }
}

impl std::error::Error for EmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidParameters(err) => Some(err),
            Self::InvalidResponsibilities(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImproperComponent { component, sigma } => write!(
                f,
                "component {component} has non-positive or non-finite \
                 sigma: {sigma}"
            ),
            Self::ZeroDensity { ix, x } => {
                write!(f, "density of observation {ix} ({x}) is not positive")
            }
            Self::InfiniteDensity { ix, x } => {
                write!(f, "density of observation {ix} ({x}) is infinite")
            }
        }
    }
}

impl fmt::Display for EmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateModel(reason) => {
                write!(f, "degenerate model: {reason}")
            }
            Self::DensityUnderflow { ix, x } => write!(
                f,
                "every component density underflowed at observation {ix} ({x})"
            ),
            Self::ZeroResponsibilityMass { component } => write!(
                f,
                "component {component} received no responsibility mass"
            ),
            Self::InvalidParameters(err) => {
                write!(f, "invalid parameters: {err}")
            }
            Self::InvalidResponsibilities(err) => {
                write!(f, "invalid responsibilities: {err}")
            }
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "expected {} observations × {} components but found {} × {}",
                expected.0, expected.1, found.0, found.1
            ),
            Self::NoSuchComponent { component, k } => write!(
                f,
                "component index {component} is out of bounds for a \
                 {k}-component mixture"
            ),
            Self::InvalidTransition { from, attempted } => {
                write!(f, "cannot run {attempted:?} from state {from:?}")
            }
        }
    }
}
