//! Integration tests running every stage in-process against a scratch workspace

use std::collections::BTreeSet;
use std::path::PathBuf;

use medcost::cli::Config;
use medcost::pipeline::{load_frame, load_records, ErrorKind, PipelineError};
use medcost::report::{export_json, package_reports};
use medcost::stages::{report_paths, Stage};
use serde_json::Value;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn workspace(rows: usize) -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp_dir.path().join("data"),
        reports_dir: temp_dir.path().join("reports"),
        ..Config::default()
    };
    let mut df = frame_of(&synthetic_records(rows, 99));
    write_csv(&mut df, &config.raw_path());
    (temp_dir, config)
}

fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_all_stages_write_their_outputs() {
    let (_dir, config) = workspace(150);

    for stage in Stage::ALL {
        let report = stage.run(&config).unwrap();
        assert_eq!(report, stage.report_path(&config));
        assert!(report.exists(), "{} report missing", stage.name());
    }

    let clean = load_frame(&config.clean_path(), 0).unwrap();
    assert_eq!(clean.width(), 29);
    assert_has_columns(&clean, &["risk_score", "region_southwest", "charges_scaled"]);
    let essential = load_frame(&config.essential_path(), 0).unwrap();
    assert_eq!(essential.width(), 11);
    assert_eq!(essential.height(), clean.height());

    let eda = read_json(&Stage::Eda.report_path(&config));
    assert_eq!(eda["shape"]["rows"], 150);
    assert_eq!(eda["metadata"]["stage"], "eda");

    let prep = read_json(&Stage::Preprocess.report_path(&config));
    assert_eq!(prep["rows_before"], 150);
    assert_eq!(prep["total_columns"], 29);
    assert_eq!(prep["label_mappings"][1]["column"], "smoker");

    let features = read_json(&Stage::Features.report_path(&config));
    assert_eq!(features["metadata"]["alpha"], 0.05);
    assert_eq!(features["smoker_comparison"]["test"]["status"], "completed");

    let charts = read_json(&Stage::Visualizations.report_path(&config));
    assert_eq!(charts["metadata"]["stage"], "visualizations");
    assert_eq!(charts["charges_by_sex"].as_array().unwrap().len(), 2);
    assert_eq!(charts["charges_histograms"]["edges"].as_array().unwrap().len(), 31);
    let risk_total: u64 = charts["risk_score_counts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["count"].as_u64().unwrap())
        .sum();
    assert_eq!(risk_total, 150);

    let regional = read_json(&Stage::Regional.report_path(&config));
    assert_eq!(regional["by_region"].as_array().unwrap().len(), 4);
    assert_eq!(regional["ranking"][0]["rank"], 1);
}

#[test]
fn test_preprocess_output_is_clean_input() {
    let (_dir, config) = workspace(80);
    Stage::Preprocess.run(&config).unwrap();

    let records = load_records(&config.clean_path(), 0).unwrap();
    assert_eq!(records.len(), 80);
}

#[test]
fn test_analysis_stage_without_clean_file_fails() {
    let (_dir, config) = workspace(20);
    let err = Stage::Features.run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("medcost preprocess"));
}

#[test]
fn test_missing_raw_input_fails_eda() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        input: Some(temp_dir.path().join("absent.csv")),
        ..Config::default()
    };
    let err = Stage::Eda.run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.csv"));
}

#[test]
fn test_reports_bundle_contains_every_report() {
    let (_dir, config) = workspace(60);
    for stage in Stage::ALL {
        stage.run(&config).unwrap();
    }

    package_reports(&report_paths(&config), &config.bundle_path()).unwrap();

    let file = std::fs::File::open(config.bundle_path()).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let names: BTreeSet<&str> = archive.file_names().collect();
    assert_eq!(
        names,
        BTreeSet::from([
            "eda/eda_summary.json",
            "features/feature_analysis.json",
            "preprocessing/preprocessing_summary.json",
            "regional/regional_analysis.json",
            "visualizations/chart_data.json",
        ])
    );
    // Reports stay in place next to the bundle
    assert!(report_paths(&config).iter().all(|p| p.exists()));
}

#[test]
fn test_report_under_regular_file_is_output_error() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("reports");
    std::fs::write(&blocker, "").unwrap();
    let target = blocker.join("eda").join("eda_summary.json");

    let err = export_json(&serde_json::json!({"rows": 1}), &target).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Output);
    let message = err.to_string();
    assert!(message.contains("eda_summary.json"), "{}", message);
    assert!(!target.exists());
}

#[test]
fn test_stage_reports_output_error_with_path() {
    let (dir, config) = workspace(30);
    std::fs::write(dir.path().join("reports"), "").unwrap();

    let err = Stage::Eda.run(&config).unwrap_err();
    let pipeline_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<PipelineError>())
        .unwrap();

    assert_eq!(pipeline_err.kind(), ErrorKind::Output);
    assert!(format!("{:#}", err).contains("eda_summary.json"));
}
