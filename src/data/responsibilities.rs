#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::DataError;
use crate::misc::argmax;

/// An m×K matrix of posterior component-membership probabilities.
///
/// Entry `(i, j)` is the probability that observation `i` was generated by
/// component `j`. The E-step always produces rows that sum to one; matrices
/// built by hand with [`ResponsibilityMatrix::from_rows`] only have their
/// shape and entry range checked, so that the M-step can report precisely
/// what is wrong with them.
///
/// # Example
///
/// ```
/// use gmm_em::data::ResponsibilityMatrix;
///
/// let resp = ResponsibilityMatrix::from_rows(vec![
///     vec![0.9, 0.1],
///     vec![0.2, 0.8],
///     vec![0.5, 0.5],
/// ]).unwrap();
///
/// assert_eq!(resp.n_rows(), 3);
/// assert_eq!(resp.k(), 2);
/// assert_eq!(resp.row(1), &[0.2, 0.8]);
/// assert_eq!(resp.assignments(), vec![0, 1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(try_from = "Vec<Vec<f64>>"))]
#[cfg_attr(feature = "serde1", serde(into = "Vec<Vec<f64>>"))]
pub struct ResponsibilityMatrix {
    /// Row-major entries
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl ResponsibilityMatrix {
    /// Build a matrix from rows, one row per observation.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        let n_cols = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(DataError::EmptyMatrix),
        };
        let n_rows = rows.len();

        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (row_ix, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(DataError::RaggedRows {
                    row: row_ix,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            if let Some((col, &value)) = row
                .iter()
                .enumerate()
                .find(|(_, r)| !(0.0..=1.0).contains(*r))
            {
                return Err(DataError::EntryOutOfRange {
                    row: row_ix,
                    col,
                    value,
                });
            }
            values.extend(row);
        }

        Ok(ResponsibilityMatrix {
            values,
            n_rows,
            n_cols,
        })
    }

    /// Build a matrix from row-major entries without checking them.
    #[inline]
    pub(crate) fn from_raw_unchecked(
        values: Vec<f64>,
        n_rows: usize,
        n_cols: usize,
    ) -> Self {
        debug_assert_eq!(values.len(), n_rows * n_cols);
        ResponsibilityMatrix {
            values,
            n_rows,
            n_cols,
        }
    }

    /// Number of observations, m
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of components, K
    #[inline]
    pub fn k(&self) -> usize {
        self.n_cols
    }

    /// Responsibility of component `j` for observation `i`
    ///
    /// # Panics
    ///
    /// If `i` or `j` is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(j < self.n_cols, "component index out of bounds");
        self.values[i * self.n_cols + j]
    }

    /// The responsibilities of every component for observation `i`
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Iterate over the rows
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.n_cols)
    }

    /// Iterate over the responsibilities of component `j`, one per
    /// observation
    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().map(move |row| row[j])
    }

    /// Σ<sub>i</sub> R[i][j] for every component j
    pub fn column_sums(&self) -> Vec<f64> {
        self.rows().fold(vec![0.0; self.n_cols], |mut acc, row| {
            acc.iter_mut().zip(row.iter()).for_each(|(a, r)| *a += r);
            acc
        })
    }

    /// Index and sum of the first row that does not sum to one within `tol`
    pub fn first_unnormalized_row(&self, tol: f64) -> Option<(usize, f64)> {
        self.rows()
            .map(|row| row.iter().sum::<f64>())
            .enumerate()
            .find(|(_, sum)| sum.is_nan() || (sum - 1.0).abs() > tol)
    }

    /// The most responsible component for each observation. Ties go to the
    /// lowest component index.
    pub fn assignments(&self) -> Vec<usize> {
        self.rows().map(|row| argmax(row)[0]).collect()
    }

    /// Copy out the rows
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for ResponsibilityMatrix {
    type Error = DataError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        ResponsibilityMatrix::from_rows(rows)
    }
}

impl From<ResponsibilityMatrix> for Vec<Vec<f64>> {
    fn from(resp: ResponsibilityMatrix) -> Self {
        resp.to_rows()
    }
}
