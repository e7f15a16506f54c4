//! Fixed record schema for the insurance dataset
//!
//! The dataset has a fixed, known set of columns, so rows are held as a typed
//! [`Record`] rather than looked up by column name. String column names only
//! appear at the loader boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Base columns in file order.
pub const BASE_COLUMNS: [&str; 7] = ["age", "sex", "bmi", "children", "smoker", "region", "charges"];

/// Numeric base columns.
pub const NUMERIC_COLUMNS: [&str; 4] = ["age", "bmi", "children", "charges"];

/// Numeric base columns that only hold whole numbers.
pub const INTEGER_COLUMNS: [&str; 2] = ["age", "children"];

/// Categorical base columns.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["sex", "smoker", "region"];

/// Target column of every aggregation.
pub const TARGET_COLUMN: &str = "charges";

/// A categorical field with a closed set of string values.
pub trait Categorical: Copy + Ord + Sized + 'static {
    /// Column name in the CSV file
    const COLUMN: &'static str;
    /// Every value, in ascending string order
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Categorical for Sex {
    const COLUMN: &'static str = "sex";
    const ALL: &'static [Self] = &[Sex::Female, Sex::Male];

    fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    No,
    Yes,
}

impl Categorical for Smoker {
    const COLUMN: &'static str = "smoker";
    const ALL: &'static [Self] = &[Smoker::No, Smoker::Yes];

    fn as_str(&self) -> &'static str {
        match self {
            Smoker::No => "no",
            Smoker::Yes => "yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Categorical for Region {
    const COLUMN: &'static str = "region";
    const ALL: &'static [Self] = &[
        Region::Northeast,
        Region::Northwest,
        Region::Southeast,
        Region::Southwest,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Region::Northeast => "northeast",
            Region::Northwest => "northwest",
            Region::Southeast => "southeast",
            Region::Southwest => "southwest",
        }
    }
}

macro_rules! impl_display_from_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as Categorical>::parse(s).ok_or_else(|| {
                        format!("Unknown {} value: '{}'", <$ty as Categorical>::COLUMN, s)
                    })
                }
            }
        )*
    };
}

impl_display_from_str!(Sex, Smoker, Region);

/// One row of the insurance dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub age: u32,
    pub sex: Sex,
    pub bmi: f64,
    pub children: u32,
    pub smoker: Smoker,
    pub region: Region,
    pub charges: f64,
}

/// Exact-equality key of a record (floats compared bit for bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey(u32, Sex, u64, u32, Smoker, Region, u64);

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey(
            self.age,
            self.sex,
            self.bmi.to_bits(),
            self.children,
            self.smoker,
            self.region,
            self.charges.to_bits(),
        )
    }

    pub fn numeric(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Age => self.age as f64,
            NumericColumn::Bmi => self.bmi,
            NumericColumn::Children => self.children as f64,
            NumericColumn::Charges => self.charges,
        }
    }

    pub fn is_smoker(&self) -> bool {
        self.smoker == Smoker::Yes
    }
}

/// Typed handle on a numeric base column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericColumn {
    Age,
    Bmi,
    Children,
    Charges,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Age,
        NumericColumn::Bmi,
        NumericColumn::Children,
        NumericColumn::Charges,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericColumn::Age => "age",
            NumericColumn::Bmi => "bmi",
            NumericColumn::Children => "children",
            NumericColumn::Charges => "charges",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, NumericColumn::Age | NumericColumn::Children)
    }
}

/// Parse a categorical cell, reporting the column and row on failure.
pub fn parse_category<C: Categorical>(value: &str, row: usize) -> Result<C, PipelineError> {
    C::parse(value).ok_or_else(|| PipelineError::InvalidValue {
        column: C::COLUMN.to_string(),
        row,
        value: value.to_string(),
        path: None,
    })
}
