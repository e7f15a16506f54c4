//! Dataset loader for CSV and Parquet files
//!
//! Reading happens in two steps: the file is read into a polars `DataFrame`
//! (which may still hold missing cells), then once cleaned the frame is
//! converted into typed [`Record`]s.

use std::path::Path;

use polars::prelude::*;

use super::error::PipelineError;
use super::schema::{
    parse_category, Record, Region, Sex, Smoker, BASE_COLUMNS, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS,
};

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// `infer_schema_length` is the number of CSV rows used for type inference;
/// 0 scans the whole file.
pub fn load_frame(path: &Path, infer_schema_length: usize) -> Result<DataFrame, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let unreadable = |e: PolarsError| PipelineError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()
            .map_err(unreadable)?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default()).map_err(unreadable)?,
        _ => {
            return Err(PipelineError::Unreadable {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported file format '{}'; supported formats: csv, parquet",
                    extension
                ),
            })
        }
    };

    lf.collect().map_err(unreadable)
}

/// Get column names in file order without converting any values.
pub fn get_column_names(path: &Path) -> Result<Vec<String>, PipelineError> {
    let df = load_frame(path, 100)?;
    Ok(df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect())
}

/// Check that every base column exists and every numeric cell parses.
///
/// Missing cells are allowed here; the cleaner fills them afterwards.
pub fn validate_frame(df: &DataFrame) -> Result<(), PipelineError> {
    for column in BASE_COLUMNS {
        df.column(column)
            .map_err(|_| PipelineError::missing_column(column))?;
    }

    for column in NUMERIC_COLUMNS {
        let raw = text_values(df, column)?;
        let parsed = numeric_values(df, column)?;

        for (row, (raw, parsed)) in raw.iter().zip(parsed.iter()).enumerate() {
            let bad = match (raw, parsed) {
                (Some(_), None) => true,
                (Some(_), Some(v)) => !v.is_finite(),
                _ => false,
            };
            if bad {
                return Err(PipelineError::InvalidValue {
                    column: column.to_string(),
                    row,
                    value: raw.clone().unwrap_or_default(),
                    path: None,
                });
            }
        }
    }

    Ok(())
}

/// Read a column as `f64`, keeping missing (and unparseable) cells as `None`.
pub fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, PipelineError> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column))?;
    let cast = col.cast(&DataType::Float64)?;
    let values = cast.f64()?.into_iter().collect();
    Ok(values)
}

/// Read a column as text, keeping missing cells as `None`.
pub fn text_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, PipelineError> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column))?;
    let cast = col.cast(&DataType::String)?;
    let values = cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Convert a fully populated frame into typed records.
///
/// Extra columns are ignored, so an enriched file is also a valid input.
/// A missing cell at this point is an input error: the frame must be cleaned first.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<Record>, PipelineError> {
    let mut numeric = Vec::with_capacity(NUMERIC_COLUMNS.len());
    for column in NUMERIC_COLUMNS {
        numeric.push(numeric_values(df, column)?);
    }
    let mut text = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
    for column in CATEGORICAL_COLUMNS {
        text.push(text_values(df, column)?);
    }

    let (ages, bmis, children, charges) = (&numeric[0], &numeric[1], &numeric[2], &numeric[3]);
    let (sexes, smokers, regions) = (&text[0], &text[1], &text[2]);

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        records.push(Record {
            age: whole_number("age", row, ages[row])?,
            sex: parse_category::<Sex>(required_text("sex", row, &sexes[row])?, row)?,
            bmi: required_number("bmi", row, bmis[row])?,
            children: whole_number("children", row, children[row])?,
            smoker: parse_category::<Smoker>(required_text("smoker", row, &smokers[row])?, row)?,
            region: parse_category::<Region>(required_text("region", row, &regions[row])?, row)?,
            charges: required_number("charges", row, charges[row])?,
        });
    }

    Ok(records)
}

/// Load, validate and convert a file that is expected to have no missing cells.
pub fn load_records(path: &Path, infer_schema_length: usize) -> Result<Vec<Record>, PipelineError> {
    let df = load_frame(path, infer_schema_length)?;
    validate_frame(&df).map_err(|e| e.with_path(path))?;
    let records = records_from_frame(&df).map_err(|e| e.with_path(path))?;
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset {
            path: Some(path.to_path_buf()),
        });
    }
    Ok(records)
}

/// Build a frame holding just the base columns of `records`.
pub fn frame_from_records(records: &[Record]) -> Result<DataFrame, PipelineError> {
    let columns = vec![
        Column::new("age".into(), records.iter().map(|r| r.age as i64).collect::<Vec<_>>()),
        Column::new("sex".into(), records.iter().map(|r| r.sex.to_string()).collect::<Vec<_>>()),
        Column::new("bmi".into(), records.iter().map(|r| r.bmi).collect::<Vec<_>>()),
        Column::new(
            "children".into(),
            records.iter().map(|r| r.children as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            "smoker".into(),
            records.iter().map(|r| r.smoker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "region".into(),
            records.iter().map(|r| r.region.to_string()).collect::<Vec<_>>(),
        ),
        Column::new("charges".into(), records.iter().map(|r| r.charges).collect::<Vec<_>>()),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Render every row of the frame as a comparable key, cell by cell.
pub fn frame_row_keys(df: &DataFrame) -> Result<Vec<Vec<Option<String>>>, PipelineError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        columns.push(text_values(df, name)?);
    }

    Ok((0..df.height())
        .map(|row| columns.iter().map(|col| col[row].clone()).collect())
        .collect())
}

/// Save a frame to file (CSV or Parquet based on extension), creating parent directories.
pub fn save_frame(df: &mut DataFrame, path: &Path) -> Result<(), PipelineError> {
    create_parent_dir(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file =
                std::fs::File::create(path).map_err(|e| PipelineError::output(path, e))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .map_err(|e| PipelineError::output(path, e))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path).map_err(|e| PipelineError::output(path, e))?;
            ParquetWriter::new(file)
                .finish(df)
                .map_err(|e| PipelineError::output(path, e))?;
        }
        _ => {
            return Err(PipelineError::output(
                path,
                format!(
                    "unsupported output format '{}'; supported formats: csv, parquet",
                    extension
                ),
            ))
        }
    }

    Ok(())
}

/// Create the directory that will hold `path`.
///
/// A failure is reported against `path` itself, naming the directory.
pub(crate) fn create_parent_dir(path: &Path) -> Result<(), PipelineError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|e| {
            PipelineError::output(
                path,
                format!("cannot create directory {}: {}", parent.display(), e),
            )
        }),
        None => Ok(()),
    }
}

fn required_number(column: &str, row: usize, value: Option<f64>) -> Result<f64, PipelineError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(column, row, v.to_string())),
        None => Err(invalid(column, row, String::new())),
    }
}

fn whole_number(column: &str, row: usize, value: Option<f64>) -> Result<u32, PipelineError> {
    let v = required_number(column, row, value)?;
    if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
        return Err(invalid(column, row, v.to_string()));
    }
    Ok(v as u32)
}

fn required_text<'a>(
    column: &str,
    row: usize,
    value: &'a Option<String>,
) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .ok_or_else(|| invalid(column, row, String::new()))
}

fn invalid(column: &str, row: usize, value: String) -> PipelineError {
    PipelineError::InvalidValue {
        column: column.to_string(),
        row,
        value,
        path: None,
    }
}
