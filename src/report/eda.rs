//! Exploratory data analysis over the raw dataset

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use super::export::ReportMetadata;
use crate::pipeline::stats::{self, Describe, OutlierSummary};
use crate::pipeline::{
    analyze_missing_values, first_occurrence_mask, frame_row_keys, numeric_values, text_values,
    MissingCount, PipelineError, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS, TARGET_COLUMN,
};

/// Columns checked for IQR outliers.
pub const OUTLIER_COLUMNS: [&str; 3] = ["age", "bmi", "charges"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    #[serde(flatten)]
    pub describe: Describe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCounts {
    pub column: String,
    pub values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSummary {
    pub count: usize,
    pub pct: f64,
}

/// Distribution of the charges column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaReport {
    pub metadata: ReportMetadata,
    pub shape: Shape,
    pub columns: Vec<String>,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoryCounts>,
    pub missing: Vec<MissingCount>,
    pub duplicates: DuplicateSummary,
    pub target: Option<TargetSummary>,
    pub outliers: Vec<OutlierSummary>,
}

fn present(df: &DataFrame, column: &str) -> Result<Vec<f64>, PipelineError> {
    Ok(numeric_values(df, column)?.into_iter().flatten().collect())
}

fn pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Value counts of a text column, most frequent first (ties by value).
pub fn value_counts(df: &DataFrame, column: &str) -> Result<CategoryCounts, PipelineError> {
    let values = text_values(df, column)?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for v in values.into_iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();

    let mut values: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value,
            count,
            pct: pct(count, total),
        })
        .collect();
    values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    Ok(CategoryCounts {
        column: column.to_string(),
        values,
    })
}

/// Count rows that repeat an earlier row across every column.
pub fn count_duplicates(df: &DataFrame) -> Result<usize, PipelineError> {
    let keys = frame_row_keys(df)?;
    Ok(first_occurrence_mask(keys).into_iter().filter(|keep| !keep).count())
}

pub fn summarize_target(values: &[f64]) -> Option<TargetSummary> {
    let d = Describe::from_values(values)?;
    Some(TargetSummary {
        column: TARGET_COLUMN.to_string(),
        mean: d.mean,
        median: d.median,
        std: d.std,
        min: d.min,
        max: d.max,
        q1: d.q1,
        q3: d.q3,
        skewness: stats::skewness(values),
        kurtosis: stats::kurtosis(values),
    })
}

/// Analyze a validated raw frame. Missing cells are skipped, not filled.
pub fn analyze(df: &DataFrame, metadata: ReportMetadata) -> Result<EdaReport, PipelineError> {
    let rows = df.height();

    let mut numeric = Vec::with_capacity(NUMERIC_COLUMNS.len());
    for column in NUMERIC_COLUMNS {
        if let Some(describe) = Describe::from_values(&present(df, column)?) {
            numeric.push(NumericSummary {
                column: column.to_string(),
                describe,
            });
        }
    }

    let categorical = CATEGORICAL_COLUMNS
        .iter()
        .map(|c| value_counts(df, c))
        .collect::<Result<Vec<_>, _>>()?;

    let duplicates = count_duplicates(df)?;

    let mut outliers = Vec::with_capacity(OUTLIER_COLUMNS.len());
    for column in OUTLIER_COLUMNS {
        if let Some(summary) = stats::iqr_outliers(column, &present(df, column)?) {
            outliers.push(summary);
        }
    }

    Ok(EdaReport {
        metadata,
        shape: Shape {
            rows,
            columns: df.width(),
        },
        columns: df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        numeric,
        categorical,
        missing: analyze_missing_values(df),
        duplicates: DuplicateSummary {
            count: duplicates,
            pct: pct(duplicates, rows),
        },
        target: summarize_target(&present(df, TARGET_COLUMN)?),
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn frame() -> DataFrame {
        df! {
            "age" => [Some(19i64), Some(30), None, Some(30)],
            "sex" => ["male", "female", "male", "female"],
            "bmi" => [27.9f64, 33.0, 22.7, 33.0],
            "children" => [0i64, 1, 0, 1],
            "smoker" => ["yes", "no", "no", "no"],
            "region" => ["southwest", "southeast", "northwest", "southeast"],
            "charges" => [16884.92f64, 4449.46, 21984.47, 4449.46],
        }
        .unwrap()
    }

    #[test]
    fn test_value_counts_sorted() {
        let counts = value_counts(&frame(), "smoker").unwrap();
        assert_eq!(counts.values[0].value, "no");
        assert_eq!(counts.values[0].count, 3);
        assert!((counts.values[0].pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_counts_duplicates_and_missing() {
        let meta = ReportMetadata::new("eda", Path::new("x.csv"), None);
        let report = analyze(&frame(), meta).unwrap();
        assert_eq!(report.shape.rows, 4);
        assert_eq!(report.duplicates.count, 1);
        assert_eq!(report.missing[0].column, "age");
        assert_eq!(report.missing[0].count, 1);
        assert_eq!(report.numeric[0].describe.count, 3);
    }
}
