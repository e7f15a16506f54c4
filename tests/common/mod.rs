//! Shared test utilities and fixture generators

use medcost::pipeline::{Categorical, Record, Region, Sex, Smoker};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Shorthand record constructor used throughout the tests
pub fn record(
    age: u32,
    sex: Sex,
    bmi: f64,
    children: u32,
    smoker: Smoker,
    region: Region,
    charges: f64,
) -> Record {
    Record {
        age,
        sex,
        bmi,
        children,
        smoker,
        region,
        charges,
    }
}

/// Small hand-checked set of records covering every category value.
///
/// - 2 smokers, 6 non-smokers
/// - every region present, northeast has no smoker
/// - ages 19..=62, bmi 17.4..=38.1
pub fn sample_records() -> Vec<Record> {
    vec![
        record(19, Sex::Female, 27.9, 0, Smoker::Yes, Region::Southwest, 16884.92),
        record(18, Sex::Male, 33.77, 1, Smoker::No, Region::Southeast, 1725.55),
        record(28, Sex::Male, 33.0, 3, Smoker::No, Region::Southeast, 4449.46),
        record(33, Sex::Male, 22.705, 0, Smoker::No, Region::Northwest, 21984.47),
        record(32, Sex::Male, 28.88, 0, Smoker::No, Region::Northwest, 3866.86),
        record(46, Sex::Female, 17.4, 1, Smoker::No, Region::Northeast, 8240.59),
        record(62, Sex::Female, 26.29, 0, Smoker::Yes, Region::Southeast, 27808.73),
        record(56, Sex::Female, 38.1, 4, Smoker::No, Region::Northeast, 10797.34),
    ]
}

/// Raw insurance frame with one missing age, one missing region and one
/// exact duplicate (last row repeats the third).
pub fn create_raw_dataframe() -> DataFrame {
    df! {
        "age" => [Some(19i64), Some(18), Some(28), None, Some(32), Some(46), Some(28)],
        "sex" => ["female", "male", "male", "male", "male", "female", "male"],
        "bmi" => [27.9f64, 33.77, 33.0, 22.705, 28.88, 17.4, 33.0],
        "children" => [0i64, 1, 3, 0, 0, 1, 3],
        "smoker" => ["yes", "no", "no", "no", "no", "no", "no"],
        "region" => [Some("southwest"), Some("southeast"), Some("southeast"), Some("northwest"), None, Some("northeast"), Some("southeast")],
        "charges" => [16884.92f64, 1725.55, 4449.46, 21984.47, 3866.86, 8240.59, 4449.46],
    }
    .unwrap()
}

/// Frame holding exactly the base columns of `records`.
pub fn frame_of(records: &[Record]) -> DataFrame {
    medcost::pipeline::frame_from_records(records).unwrap()
}

/// Reproducible synthetic records with a realistic smoker premium.
pub fn synthetic_records(n: usize, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let age = rng.gen_range(18..65);
            let bmi = rng.gen_range(16.0..48.0);
            let children = rng.gen_range(0..6);
            let smoker = if rng.gen_bool(0.2) { Smoker::Yes } else { Smoker::No };
            let sex = if rng.gen_bool(0.5) { Sex::Male } else { Sex::Female };
            let region = Region::ALL[rng.gen_range(0..Region::ALL.len())];
            let base = 250.0 * age as f64 + 300.0 * (bmi - 20.0) + 500.0 * children as f64;
            let premium = if smoker == Smoker::Yes { 23000.0 } else { 0.0 };
            let charges = (base + premium + rng.gen_range(0.0..4000.0)).max(1100.0);
            record(age, sex, bmi, children, smoker, region, charges)
        })
        .collect()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("insurance.csv");
    write_csv(df, &csv_path);
    (temp_dir, csv_path)
}

/// Write a frame as CSV, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("insurance.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert two floats agree within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} (±{}), got {}",
        expected,
        tol,
        actual
    );
}
