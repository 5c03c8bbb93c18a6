//! Data utilities
mod responsibilities;
mod sample;
mod suffstat;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

use crate::dist::MixtureError;

pub use responsibilities::ResponsibilityMatrix;
pub use sample::Sample;
pub use suffstat::WeightedGaussianSuffStat;

/// Errors constructing data containers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum DataError {
    /// A sample must contain at least one observation
    EmptySample,
    /// An observation is infinite or NaN
    NotFinite { ix: usize, x: f64 },
    /// A responsibility matrix must have at least one row and one column
    EmptyMatrix,
    /// A row of a responsibility matrix has the wrong number of entries
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A responsibility is outside of [0, 1]
    EntryOutOfRange { row: usize, col: usize, value: f64 },
    /// A row of a responsibility matrix does not sum to one
    RowNotNormalized { row: usize, sum: f64 },
    /// Cannot draw from an invalid mixture
    Mixture(MixtureError),
}

impl From<MixtureError> for DataError {
    fn from(err: MixtureError) -> Self {
        DataError::Mixture(err)
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mixture(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySample => write!(f, "sample is empty"),
            Self::NotFinite { ix, x } => {
                write!(f, "observation {ix} is not finite: {x}")
            }
            Self::EmptyMatrix => write!(f, "responsibility matrix is empty"),
            Self::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} responsibilities but {expected} were \
                 expected"
            ),
            Self::EntryOutOfRange { row, col, value } => write!(
                f,
                "responsibility ({row}, {col}) = {value} is outside of [0, 1]"
            ),
            Self::RowNotNormalized { row, sum } => write!(
                f,
                "responsibilities of row {row} sum to {sum} rather than 1"
            ),
            Self::Mixture(err) => write!(f, "invalid mixture: {err}"),
        }
    }
}
