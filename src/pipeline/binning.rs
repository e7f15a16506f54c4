//! Fixed-boundary binning of numeric columns into ordinal categories
//!
//! All three bin configurations live in [`BIN_SPECS`] and go through the
//! same [`BinSpec::bucket`] function. Intervals are half-open
//! `[lower, upper)`; values outside the outer boundaries clamp into the
//! first or last bucket.

use serde::{Serialize, Serializer};

use super::schema::NumericColumn;

/// Bin configuration for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    pub column: NumericColumn,
    /// Name of the derived category column
    pub target: &'static str,
    /// `labels.len() + 1` ascending boundaries
    pub breakpoints: &'static [f64],
    pub labels: &'static [&'static str],
}

pub const AGE_BINS: BinSpec = BinSpec {
    column: NumericColumn::Age,
    target: "age_category",
    breakpoints: &[0.0, 25.0, 35.0, 45.0, 55.0, 100.0],
    labels: &["18-25", "26-35", "36-45", "46-55", "56+"],
};

pub const BMI_BINS: BinSpec = BinSpec {
    column: NumericColumn::Bmi,
    target: "bmi_category",
    breakpoints: &[0.0, 18.5, 25.0, 30.0, 35.0, 100.0],
    labels: &["Underweight", "Normal", "Overweight", "Obese", "Extremely Obese"],
};

pub const CHARGES_BINS: BinSpec = BinSpec {
    column: NumericColumn::Charges,
    target: "charges_category",
    breakpoints: &[0.0, 5000.0, 10000.0, 20000.0, 100000.0],
    labels: &["Low", "Medium", "High", "Very High"],
};

pub const BIN_SPECS: [BinSpec; 3] = [AGE_BINS, BMI_BINS, CHARGES_BINS];

/// An ordinal bucket; compares by position, serializes as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    pub index: usize,
    pub label: &'static str,
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}

impl BinSpec {
    /// Bucket position of `value`.
    ///
    /// Counts the interior boundaries at or below the value, so a value equal
    /// to a boundary lands in the upper bucket and out-of-range values clamp.
    pub fn bin_index(&self, value: f64) -> usize {
        let interior = &self.breakpoints[1..self.breakpoints.len() - 1];
        interior.iter().take_while(|&&b| b <= value).count()
    }

    pub fn bucket(&self, value: f64) -> Bucket {
        let index = self.bin_index(value);
        Bucket {
            index,
            label: self.labels[index],
        }
    }

    /// Whether `value` lies inside `[first, last)` without clamping.
    pub fn in_domain(&self, value: f64) -> bool {
        match (self.breakpoints.first(), self.breakpoints.last()) {
            (Some(&lo), Some(&hi)) => value >= lo && value < hi,
            _ => false,
        }
    }

    /// Look a label up again; `None` for labels outside this binning.
    pub fn parse_label(&self, label: &str) -> Option<Bucket> {
        self.labels
            .iter()
            .position(|l| *l == label)
            .map(|index| Bucket {
                index,
                label: self.labels[index],
            })
    }

    /// Every bucket in order.
    pub fn buckets(&self) -> Vec<Bucket> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| Bucket { index, label })
            .collect()
    }

    /// `[lower, upper)` bounds of a bucket.
    pub fn bounds(&self, bucket: Bucket) -> (f64, f64) {
        (
            self.breakpoints[bucket.index],
            self.breakpoints[bucket.index + 1],
        )
    }
}
