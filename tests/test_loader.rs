//! Unit tests for dataset loader

use medcost::pipeline::{
    get_column_names, load_frame, load_records, records_from_frame, save_frame, validate_frame,
    ErrorKind, PipelineError, Region, Sex, Smoker,
};
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn write_lines(lines: &[&str]) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("insurance.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    (temp_dir, csv_path)
}

#[test]
fn test_load_csv_records() {
    let (_dir, path) = write_lines(&[
        "age,sex,bmi,children,smoker,region,charges",
        "19,female,27.9,0,yes,southwest,16884.924",
        "18,male,33.77,1,no,southeast,1725.5523",
    ]);

    let records = load_records(&path, 100).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].age, 19);
    assert_eq!(records[0].sex, Sex::Female);
    assert_eq!(records[0].smoker, Smoker::Yes);
    assert_eq!(records[1].region, Region::Southeast);
    assert_close(records[1].charges, 1725.5523, 1e-9);
}

#[test]
fn test_load_parquet_file() {
    let mut df = frame_of(&sample_records());
    let (_dir, path) = create_temp_parquet(&mut df);

    let records = load_records(&path, 100).unwrap();
    assert_eq!(records, sample_records());
}

#[test]
fn test_extra_columns_are_ignored() {
    let (_dir, path) = write_lines(&[
        "age,sex,bmi,children,smoker,region,charges,risk_score",
        "55,male,32.0,0,yes,northeast,40000.0,6",
    ]);

    let records = load_records(&path, 100).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(get_column_names(&path).unwrap().len(), 8);
}

#[test]
fn test_missing_file_is_input_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_frame(&temp_dir.path().join("absent.csv"), 100).unwrap_err();

    assert!(matches!(err, PipelineError::MissingFile { .. }));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("insurance.txt");
    std::fs::write(&path, "age\n1\n").unwrap();

    let err = load_frame(&path, 100).unwrap_err();
    assert!(matches!(err, PipelineError::Unreadable { .. }));
}

#[test]
fn test_missing_column_names_file_and_column() {
    let (_dir, path) = write_lines(&[
        "age,sex,bmi,kids,smoker,region,charges",
        "19,female,27.9,0,yes,southwest,16884.924",
    ]);

    let err = load_records(&path, 100).unwrap_err();
    match &err {
        PipelineError::MissingColumn { column, path: p } => {
            assert_eq!(column, "children");
            assert_eq!(p.as_deref(), Some(path.as_path()));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("insurance.csv"));
}

#[test]
fn test_unparseable_number_reports_row() {
    let (_dir, path) = write_lines(&[
        "age,sex,bmi,children,smoker,region,charges",
        "19,female,27.9,0,yes,southwest,16884.924",
        "18,male,thin,1,no,southeast,1725.5523",
    ]);

    let df = load_frame(&path, 100).unwrap();
    let err = validate_frame(&df).unwrap_err();
    match err {
        PipelineError::InvalidValue {
            column, row, value, ..
        } => {
            assert_eq!(column, "bmi");
            assert_eq!(row, 1);
            assert_eq!(value, "thin");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unknown_category_is_invalid_value() {
    let (_dir, path) = write_lines(&[
        "age,sex,bmi,children,smoker,region,charges",
        "19,female,27.9,0,sometimes,southwest,16884.924",
    ]);

    let err = load_records(&path, 100).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidValue { ref column, .. } if column == "smoker"
    ));
}

#[test]
fn test_records_require_filled_frame() {
    let df = create_raw_dataframe();
    let err = records_from_frame(&df).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn test_empty_dataset() {
    let (_dir, path) = write_lines(&["age,sex,bmi,children,smoker,region,charges"]);
    let err = load_records(&path, 100).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDataset { .. }));
}

#[test]
fn test_save_frame_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("out.csv");
    let mut df = frame_of(&sample_records());

    save_frame(&mut df, &path).unwrap();

    let reloaded = load_records(&path, 100).unwrap();
    assert_eq!(reloaded.len(), sample_records().len());
}

#[test]
fn test_save_under_regular_file_is_output_error() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("data");
    std::fs::write(&blocker, "not a directory").unwrap();
    let target = blocker.join("insurance_clean.csv");

    let mut df = frame_of(&sample_records());
    let err = save_frame(&mut df, &target).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Output);
    assert!(matches!(err, PipelineError::Output { ref path, .. } if path == &target));
    assert!(err.to_string().contains("insurance_clean.csv"));
}
