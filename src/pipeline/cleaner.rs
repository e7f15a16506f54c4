//! Missing value analysis, missing value fill and duplicate removal

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use polars::prelude::*;
use serde::Serialize;

use super::error::PipelineError;
use super::loader::{numeric_values, records_from_frame, text_values};
use super::schema::{Record, CATEGORICAL_COLUMNS, INTEGER_COLUMNS, NUMERIC_COLUMNS};
use super::stats;

/// Missing cells of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub count: usize,
    pub pct: f64,
}

/// Value written into the missing cells of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Number(v) => write!(f, "{}", v),
            FillValue::Text(s) => f.write_str(s),
        }
    }
}

/// One column filled by [`fill_missing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    pub column: String,
    pub filled: usize,
    pub value: FillValue,
}

/// Outcome of [`clean_frame`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub fills: Vec<ColumnFill>,
    pub duplicates_dropped: usize,
}

impl CleanReport {
    pub fn filled_cells(&self) -> usize {
        self.fills.iter().map(|f| f.filled).sum()
    }
}

/// Count missing cells per column, sorted by count descending.
///
/// Ties keep the frame's column order.
pub fn analyze_missing_values(df: &DataFrame) -> Vec<MissingCount> {
    let height = df.height();
    let mut counts: Vec<MissingCount> = df
        .get_columns()
        .iter()
        .map(|col| {
            let count = col.null_count();
            let pct = if height == 0 {
                0.0
            } else {
                count as f64 / height as f64 * 100.0
            };
            MissingCount {
                column: col.name().to_string(),
                count,
                pct,
            }
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Fill missing numeric cells with the column median and missing categorical
/// cells with the column mode.
///
/// Integer columns receive the median rounded half away from zero. Categorical
/// cells are rewritten in canonical form before the mode is counted, so
/// "Male" and "male" are one value here and in duplicate removal. Mode ties
/// go to the smallest value in string order. A column with no value at all
/// cannot be filled.
pub fn fill_missing(df: &DataFrame) -> Result<(DataFrame, Vec<ColumnFill>), PipelineError> {
    let mut out = df.clone();
    let mut fills = Vec::new();

    for column in NUMERIC_COLUMNS {
        let values = numeric_values(df, column)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            continue;
        }

        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let median = stats::median(&present).ok_or_else(|| PipelineError::EmptyColumn {
            column: column.to_string(),
            path: None,
        })?;

        let filled = if INTEGER_COLUMNS.contains(&column) {
            let fill = median.round();
            let ints: Vec<i64> = values
                .iter()
                .map(|v| v.unwrap_or(fill).round() as i64)
                .collect();
            out.with_column(Column::new(column.into(), ints))?;
            fill
        } else {
            let floats: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();
            out.with_column(Column::new(column.into(), floats))?;
            median
        };

        fills.push(ColumnFill {
            column: column.to_string(),
            filled: missing,
            value: FillValue::Number(filled),
        });
    }

    for column in CATEGORICAL_COLUMNS {
        let values: Vec<Option<String>> = text_values(df, column)?
            .into_iter()
            .map(|v| v.map(|s| canonical_label(&s)))
            .collect();
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            out.with_column(Column::new(column.into(), values))?;
            continue;
        }

        let mode = mode(values.iter().flatten().map(|s| s.as_str())).ok_or_else(|| {
            PipelineError::EmptyColumn {
                column: column.to_string(),
                path: None,
            }
        })?;

        let strings: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| mode.clone()))
            .collect();
        out.with_column(Column::new(column.into(), strings))?;

        fills.push(ColumnFill {
            column: column.to_string(),
            filled: missing,
            value: FillValue::Text(mode),
        });
    }

    Ok((out, fills))
}

/// Canonical spelling of a categorical cell: trimmed and lowercase.
///
/// Matches the folding done by [`Categorical::parse`](super::schema::Categorical::parse).
pub fn canonical_label(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Most frequent value; ties go to the smallest value.
pub fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.to_string())
}

/// `true` for the first occurrence of each key, `false` for later repeats.
pub fn first_occurrence_mask<K: Eq + Hash>(keys: impl IntoIterator<Item = K>) -> Vec<bool> {
    let mut seen = HashSet::new();
    keys.into_iter().map(|k| seen.insert(k)).collect()
}

/// Drop exact duplicate records, keeping first occurrences in order.
///
/// Categorical fields compare by their typed value, which is the canonical
/// spelling written by [`fill_missing`].
///
/// Returns the kept records and the number dropped.
pub fn drop_duplicates(records: Vec<Record>) -> (Vec<Record>, usize) {
    let before = records.len();
    let mask = first_occurrence_mask(records.iter().map(Record::key));
    let kept: Vec<Record> = records
        .into_iter()
        .zip(mask)
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Fill, type and de-duplicate a raw frame.
pub fn clean_frame(df: &DataFrame) -> Result<(Vec<Record>, CleanReport), PipelineError> {
    let rows_before = df.height();
    if rows_before == 0 {
        return Err(PipelineError::EmptyDataset { path: None });
    }

    let (filled, fills) = fill_missing(df)?;
    let records = records_from_frame(&filled)?;
    let (records, duplicates_dropped) = drop_duplicates(records);

    let report = CleanReport {
        rows_before,
        rows_after: records.len(),
        fills,
        duplicates_dropped,
    };
    Ok((records, report))
}
