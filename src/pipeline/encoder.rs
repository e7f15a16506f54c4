//! Label and one-hot encoding of the categorical columns
//!
//! Codes are assigned by ascending string order of the distinct values
//! observed at fit time, so re-fitting the same data always yields the same
//! mapping regardless of row order.

use std::collections::BTreeSet;

use serde::Serialize;

use super::schema::{Categorical, Record, Region, Sex, Smoker};

/// Code assignment for one categorical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoding<C: Categorical> {
    classes: Vec<C>,
}

impl<C: Categorical> LabelEncoding<C> {
    /// Fit on the distinct values present in `values`.
    pub fn fit(values: impl IntoIterator<Item = C>) -> Self {
        // Enum order matches string order (checked in schema tests)
        let distinct: BTreeSet<C> = values.into_iter().collect();
        Self {
            classes: distinct.into_iter().collect(),
        }
    }

    pub fn column(&self) -> &'static str {
        C::COLUMN
    }

    /// Distinct values in code order.
    pub fn classes(&self) -> &[C] {
        &self.classes
    }

    pub fn encode(&self, value: C) -> Option<u32> {
        self.classes
            .binary_search(&value)
            .ok()
            .map(|i| i as u32)
    }

    pub fn decode(&self, code: u32) -> Option<C> {
        self.classes.get(code as usize).copied()
    }

    /// Decode straight to the string that was encoded.
    pub fn decode_str(&self, code: u32) -> Option<&'static str> {
        self.decode(code).map(|c| c.as_str())
    }

    /// One indicator per class, in code order.
    pub fn one_hot(&self, value: C) -> Vec<bool> {
        self.classes.iter().map(|c| *c == value).collect()
    }

    /// Names of the indicator columns, e.g. `region_northeast`.
    pub fn one_hot_columns(&self) -> Vec<String> {
        self.classes
            .iter()
            .map(|c| format!("{}_{}", C::COLUMN, c.as_str()))
            .collect()
    }

    pub fn encoded_column(&self) -> String {
        format!("{}_encoded", C::COLUMN)
    }

    pub fn mapping(&self) -> ColumnMapping {
        ColumnMapping {
            column: C::COLUMN.to_string(),
            classes: self
                .classes
                .iter()
                .enumerate()
                .map(|(code, c)| (c.as_str().to_string(), code as u32))
                .collect(),
        }
    }
}

/// Serializable view of one label mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub column: String,
    pub classes: Vec<(String, u32)>,
}

/// Fitted encodings of all three categorical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encodings {
    pub sex: LabelEncoding<Sex>,
    pub smoker: LabelEncoding<Smoker>,
    pub region: LabelEncoding<Region>,
}

impl Encodings {
    pub fn fit(records: &[Record]) -> Self {
        Self {
            sex: LabelEncoding::fit(records.iter().map(|r| r.sex)),
            smoker: LabelEncoding::fit(records.iter().map(|r| r.smoker)),
            region: LabelEncoding::fit(records.iter().map(|r| r.region)),
        }
    }

    pub fn mappings(&self) -> Vec<ColumnMapping> {
        vec![
            self.sex.mapping(),
            self.smoker.mapping(),
            self.region.mapping(),
        ]
    }

    /// Indicator column names: sex, smoker, region, each in code order.
    pub fn one_hot_columns(&self) -> Vec<String> {
        let mut names = self.sex.one_hot_columns();
        names.extend(self.smoker.one_hot_columns());
        names.extend(self.region.one_hot_columns());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_string_order_not_insertion() {
        let enc = LabelEncoding::fit([Region::Southwest, Region::Northeast, Region::Southeast]);
        assert_eq!(enc.encode(Region::Northeast), Some(0));
        assert_eq!(enc.encode(Region::Southeast), Some(1));
        assert_eq!(enc.encode(Region::Southwest), Some(2));
        assert_eq!(enc.encode(Region::Northwest), None);
    }

    #[test]
    fn test_decode_out_of_range() {
        let enc = LabelEncoding::fit([Smoker::Yes]);
        assert_eq!(enc.decode(0), Some(Smoker::Yes));
        assert_eq!(enc.decode(1), None);
    }

    #[test]
    fn test_one_hot_columns() {
        let enc = LabelEncoding::fit([Sex::Male, Sex::Female]);
        assert_eq!(enc.one_hot_columns(), vec!["sex_female", "sex_male"]);
        assert_eq!(enc.one_hot(Sex::Male), vec![false, true]);
        assert_eq!(enc.encoded_column(), "sex_encoded");
    }
}
