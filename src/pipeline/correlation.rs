//! Pearson correlation matrix over named numeric columns

use faer::Mat;
use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::stats;

/// Symmetric correlation matrix; undefined cells (constant columns) hold NaN.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Mat<f64>,
}

/// Correlation of one column with the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetCorrelation {
    pub column: String,
    pub correlation: f64,
}

impl CorrelationMatrix {
    /// Compute every column pair in parallel.
    pub fn compute(columns: &[(String, Vec<f64>)]) -> Self {
        let n = columns.len();

        // Upper triangle only; the matrix is filled symmetrically below
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let results: Vec<(usize, usize, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let r = stats::pearson(&columns[i].1, &columns[j].1).unwrap_or(f64::NAN);
                (i, j, r)
            })
            .collect();

        let mut values = Mat::<f64>::zeros(n, n);
        for (i, (_, data)) in columns.iter().enumerate() {
            values[(i, i)] = if stats::sample_std(data).is_some_and(|s| s > 0.0) {
                1.0
            } else {
                f64::NAN
            };
        }
        for (i, j, r) in results {
            values[(i, j)] = r;
            values[(j, i)] = r;
        }

        Self {
            columns: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        }
    }

    fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Correlation between two columns; `None` if unknown or undefined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let r = self.values[(self.index(a)?, self.index(b)?)];
        (!r.is_nan()).then_some(r)
    }

    /// Correlations of every other column with `target`, by absolute value descending.
    pub fn with_target(&self, target: &str) -> Vec<TargetCorrelation> {
        let mut out: Vec<TargetCorrelation> = self
            .columns
            .iter()
            .filter(|c| c.as_str() != target)
            .filter_map(|c| {
                self.get(c, target).map(|correlation| TargetCorrelation {
                    column: c.clone(),
                    correlation,
                })
            })
            .collect();

        out.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out
    }

    /// Matrix as nested rows, NaN written as `None`.
    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.values.nrows())
            .map(|i| {
                (0..self.values.ncols())
                    .map(|j| {
                        let r = self.values[(i, j)];
                        (!r.is_nan()).then_some(r)
                    })
                    .collect()
            })
            .collect()
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CorrelationMatrix", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("values", &self.rows())?;
        state.end()
    }
}
