//! Feature derivation: encodings, z-scores, categories, flags and risk score

use polars::prelude::*;
use serde::Serialize;

use super::binning::{Bucket, AGE_BINS, BMI_BINS, CHARGES_BINS};
use super::encoder::{Encodings, LabelEncoding};
use super::error::PipelineError;
use super::loader::frame_from_records;
use super::schema::{Categorical, NumericColumn, Record, BASE_COLUMNS};
use super::stats;

/// BMI at or above which a record counts as overweight.
pub const OVERWEIGHT_BMI: f64 = 25.0;
/// BMI at or above which a record counts as obese for the risk score.
pub const OBESE_BMI: f64 = 30.0;
/// Age at or above which the risk score adds one point.
pub const SENIOR_AGE: u32 = 50;
/// Number of children from which a family counts as large.
pub const MANY_CHILDREN: u32 = 3;
/// Highest possible risk score.
pub const MAX_RISK_SCORE: u8 = 6;

/// Composite risk score: +3 smoker, +2 bmi >= 30, +1 age >= 50.
pub fn risk_score(record: &Record) -> u8 {
    let increments = [
        (record.is_smoker(), 3u8),
        (record.bmi >= OBESE_BMI, 2),
        (record.age >= SENIOR_AGE, 1),
    ];
    increments
        .iter()
        .filter(|(hit, _)| *hit)
        .fold(0u8, |acc, (_, points)| acc.saturating_add(*points))
        .min(MAX_RISK_SCORE)
}

/// Standard scaler parameters for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZScore {
    pub mean: f64,
    /// Population standard deviation, or 1 for a constant column
    pub scale: f64,
}

impl ZScore {
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mean = stats::mean(values)?;
        let std = stats::population_std(values)?;
        let scale = if std == 0.0 { 1.0 } else { std };
        Some(Self { mean, scale })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Parameters fitted once on the whole table and applied row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureModel {
    pub encodings: Encodings,
    /// One scaler per entry of [`NumericColumn::ALL`]
    pub scalers: [ZScore; 4],
}

impl FeatureModel {
    pub fn fit(records: &[Record]) -> Result<Self, PipelineError> {
        let mut scalers = [ZScore {
            mean: 0.0,
            scale: 1.0,
        }; 4];
        for (slot, column) in scalers.iter_mut().zip(NumericColumn::ALL) {
            let values: Vec<f64> = records.iter().map(|r| r.numeric(column)).collect();
            *slot = ZScore::fit(&values).ok_or(PipelineError::EmptyDataset { path: None })?;
        }

        Ok(Self {
            encodings: Encodings::fit(records),
            scalers,
        })
    }

    pub fn scaler(&self, column: NumericColumn) -> ZScore {
        let index = NumericColumn::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or(0);
        self.scalers[index]
    }

    /// Derive every feature of one record.
    ///
    /// A categorical value unseen at fit time cannot occur for records the
    /// model was fitted on; for foreign records it is reported as an input error.
    pub fn derive(&self, record: &Record) -> Result<EnrichedRecord, PipelineError> {
        let enc = &self.encodings;
        let sex_code = code(&enc.sex, record.sex)?;
        let smoker_code = code(&enc.smoker, record.smoker)?;
        let region_code = code(&enc.region, record.region)?;

        let scaled = |column| self.scaler(column).transform(record.numeric(column));

        Ok(EnrichedRecord {
            record: *record,
            sex_code,
            smoker_code,
            region_code,
            age_scaled: scaled(NumericColumn::Age),
            bmi_scaled: scaled(NumericColumn::Bmi),
            children_scaled: scaled(NumericColumn::Children),
            charges_scaled: scaled(NumericColumn::Charges),
            age_category: AGE_BINS.bucket(record.age as f64),
            bmi_category: BMI_BINS.bucket(record.bmi),
            charges_category: CHARGES_BINS.bucket(record.charges),
            smoker_bmi_interaction: smoker_code as f64 * record.bmi,
            is_overweight: record.bmi >= OVERWEIGHT_BMI,
            has_many_children: record.children >= MANY_CHILDREN,
            risk_score: risk_score(record),
        })
    }
}

fn code<C: Categorical>(encoding: &LabelEncoding<C>, value: C) -> Result<u32, PipelineError> {
    encoding
        .encode(value)
        .ok_or_else(|| PipelineError::InvalidValue {
            column: C::COLUMN.to_string(),
            row: 0,
            value: value.as_str().to_string(),
            path: None,
        })
}

/// A record with all of its derived features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub sex_code: u32,
    pub smoker_code: u32,
    pub region_code: u32,
    pub age_scaled: f64,
    pub bmi_scaled: f64,
    pub children_scaled: f64,
    pub charges_scaled: f64,
    pub age_category: Bucket,
    pub bmi_category: Bucket,
    pub charges_category: Bucket,
    pub smoker_bmi_interaction: f64,
    pub is_overweight: bool,
    pub has_many_children: bool,
    pub risk_score: u8,
}

/// Derived feature columns in output order, after the one-hot block.
pub const DERIVED_COLUMNS: [&str; 7] = [
    "age_category",
    "bmi_category",
    "smoker_bmi_interaction",
    "charges_category",
    "is_overweight",
    "has_many_children",
    "risk_score",
];

/// Columns of the reduced output file.
pub const ESSENTIAL_COLUMNS: [&str; 11] = [
    "age",
    "sex",
    "bmi",
    "children",
    "smoker",
    "region",
    "charges",
    "age_category",
    "bmi_category",
    "charges_category",
    "risk_score",
];

/// The enriched table together with the model that produced it.
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    pub model: FeatureModel,
    pub rows: Vec<EnrichedRecord>,
}

impl EnrichedTable {
    /// Fit the model on `records` and derive every row.
    pub fn build(records: &[Record]) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset { path: None });
        }
        let model = FeatureModel::fit(records)?;
        let rows = records
            .iter()
            .enumerate()
            .map(|(row, r)| {
                model.derive(r).map_err(|e| match e {
                    PipelineError::InvalidValue {
                        column,
                        value,
                        path,
                        ..
                    } => PipelineError::InvalidValue {
                        column,
                        row,
                        value,
                        path,
                    },
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { model, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every output column name, in file order.
    pub fn column_names(&self) -> Vec<String> {
        let enc = &self.model.encodings;
        let mut names: Vec<String> = BASE_COLUMNS.iter().map(|s| s.to_string()).collect();
        names.push(enc.sex.encoded_column());
        names.push(enc.smoker.encoded_column());
        names.push(enc.region.encoded_column());
        names.extend(enc.one_hot_columns());
        names.extend(NumericColumn::ALL.iter().map(|c| format!("{}_scaled", c.name())));
        names.extend(DERIVED_COLUMNS.iter().map(|s| s.to_string()));
        names
    }

    /// Columns added on top of the base columns.
    pub fn new_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .skip(BASE_COLUMNS.len())
            .collect()
    }

    /// Full enriched frame.
    pub fn to_frame(&self) -> Result<DataFrame, PipelineError> {
        let records: Vec<Record> = self.rows.iter().map(|r| r.record).collect();
        let base = frame_from_records(&records)?;
        let mut columns: Vec<Column> = base.get_columns().to_vec();
        let rows = &self.rows;
        let enc = &self.model.encodings;

        let int_col = |name: &str, f: &dyn Fn(&EnrichedRecord) -> i64| {
            Column::new(name.into(), rows.iter().map(f).collect::<Vec<i64>>())
        };
        let float_col = |name: &str, f: &dyn Fn(&EnrichedRecord) -> f64| {
            Column::new(name.into(), rows.iter().map(f).collect::<Vec<f64>>())
        };
        let label_col = |name: &str, f: &dyn Fn(&EnrichedRecord) -> Bucket| {
            Column::new(
                name.into(),
                rows.iter().map(|r| f(r).label).collect::<Vec<&str>>(),
            )
        };

        columns.push(int_col(enc.sex.encoded_column().as_str(), &|r| r.sex_code as i64));
        columns.push(int_col(enc.smoker.encoded_column().as_str(), &|r| r.smoker_code as i64));
        columns.push(int_col(enc.region.encoded_column().as_str(), &|r| r.region_code as i64));

        columns.extend(indicator_columns(&enc.sex, rows, |r| r.sex));
        columns.extend(indicator_columns(&enc.smoker, rows, |r| r.smoker));
        columns.extend(indicator_columns(&enc.region, rows, |r| r.region));

        columns.push(float_col("age_scaled", &|r| r.age_scaled));
        columns.push(float_col("bmi_scaled", &|r| r.bmi_scaled));
        columns.push(float_col("children_scaled", &|r| r.children_scaled));
        columns.push(float_col("charges_scaled", &|r| r.charges_scaled));

        columns.push(label_col("age_category", &|r| r.age_category));
        columns.push(label_col("bmi_category", &|r| r.bmi_category));
        columns.push(float_col("smoker_bmi_interaction", &|r| {
            r.smoker_bmi_interaction
        }));
        columns.push(label_col("charges_category", &|r| r.charges_category));
        columns.push(int_col("is_overweight", &|r| r.is_overweight as i64));
        columns.push(int_col("has_many_children", &|r| r.has_many_children as i64));
        columns.push(int_col("risk_score", &|r| r.risk_score as i64));

        Ok(DataFrame::new(columns)?)
    }

    /// Reduced frame holding [`ESSENTIAL_COLUMNS`] only.
    pub fn essential_frame(&self) -> Result<DataFrame, PipelineError> {
        let full = self.to_frame()?;
        Ok(full.select(ESSENTIAL_COLUMNS)?)
    }
}

fn indicator_columns<C: Categorical>(
    encoding: &LabelEncoding<C>,
    rows: &[EnrichedRecord],
    value: impl Fn(&Record) -> C,
) -> Vec<Column> {
    encoding
        .classes()
        .iter()
        .zip(encoding.one_hot_columns())
        .map(|(class, name)| {
            let flags: Vec<bool> = rows.iter().map(|r| value(&r.record) == *class).collect();
            Column::new(name.as_str().into(), flags)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::{Region, Sex, Smoker};

    fn record(age: u32, bmi: f64, smoker: Smoker) -> Record {
        Record {
            age,
            sex: Sex::Female,
            bmi,
            children: 0,
            smoker,
            region: Region::Northwest,
            charges: 1000.0,
        }
    }

    #[test]
    fn test_risk_score_extremes() {
        assert_eq!(risk_score(&record(55, 32.0, Smoker::Yes)), 6);
        assert_eq!(risk_score(&record(20, 22.0, Smoker::No)), 0);
        assert_eq!(risk_score(&record(50, 30.0, Smoker::No)), 3);
        assert_eq!(risk_score(&record(49, 29.9, Smoker::Yes)), 3);
    }

    #[test]
    fn test_zscore_constant_column_scales_by_one() {
        let z = ZScore::fit(&[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(z.scale, 1.0);
        assert_eq!(z.transform(4.0), 0.0);
    }

    #[test]
    fn test_zscore_uses_population_std() {
        let z = ZScore::fit(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((z.mean - 5.0).abs() < 1e-12);
        assert!((z.scale - 2.0).abs() < 1e-12);
        assert!((z.transform(9.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_interaction_uses_smoker_code() {
        let records = [record(30, 20.0, Smoker::No), record(30, 31.0, Smoker::Yes)];
        let table = EnrichedTable::build(&records).unwrap();
        assert_eq!(table.rows[0].smoker_bmi_interaction, 0.0);
        assert_eq!(table.rows[1].smoker_bmi_interaction, 31.0);
    }

    #[test]
    fn test_column_names_order() {
        let records = [record(30, 20.0, Smoker::No), record(60, 36.0, Smoker::Yes)];
        let table = EnrichedTable::build(&records).unwrap();
        let names = table.column_names();
        assert_eq!(&names[..7], &BASE_COLUMNS.map(String::from)[..]);
        assert_eq!(names[7], "sex_encoded");
        assert_eq!(names[10], "sex_female");
        assert_eq!(names.last().map(String::as_str), Some("risk_score"));
        assert_eq!(table.new_columns().len(), names.len() - 7);
    }
}
