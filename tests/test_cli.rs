//! Tests for CLI argument parsing and the binary's exit behavior

use assert_cmd::Command;
use clap::Parser;
use medcost::cli::{Cli, Commands};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["medcost"]);

    assert_eq!(cli.command, None, "No subcommand means run-all");
    assert_eq!(cli.config.data_dir, PathBuf::from("data"));
    assert_eq!(cli.config.reports_dir, PathBuf::from("reports"));
    assert_eq!(cli.config.alpha, 0.05, "Default alpha should be 0.05");
    assert_eq!(
        cli.config.infer_schema_length, 10000,
        "Default schema inference should be 10000"
    );
    assert_eq!(cli.config.input, None);
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::parse_from([
        "medcost",
        "regional",
        "--alpha",
        "0.01",
        "--data-dir",
        "/tmp/d",
        "-i",
        "/tmp/raw.csv",
    ]);

    assert_eq!(cli.command, Some(Commands::Regional));
    assert_eq!(cli.config.alpha, 0.01);
    assert_eq!(
        cli.config.clean_path(),
        PathBuf::from("/tmp/d/insurance_clean.csv")
    );
    assert_eq!(cli.config.raw_path(), PathBuf::from("/tmp/raw.csv"));
}

#[test]
fn test_alpha_out_of_range_rejected() {
    for bad in ["0", "1", "1.5", "-0.1", "abc"] {
        let result = Cli::try_parse_from(["medcost", "--alpha", bad]);
        assert!(result.is_err(), "alpha {} should be rejected", bad);
    }
}

#[test]
fn test_subcommand_names() {
    for (name, command) in [
        ("eda", Commands::Eda),
        ("preprocess", Commands::Preprocess),
        ("features", Commands::Features),
        ("visualizations", Commands::Visualizations),
        ("regional", Commands::Regional),
        ("run-all", Commands::RunAll),
        ("explore", Commands::Explore),
    ] {
        let cli = Cli::parse_from(["medcost", name]);
        assert_eq!(cli.command, Some(command));
        assert_eq!(command.name(), name);
    }
}

// ============================================================================
// Binary
// ============================================================================

#[test]
fn test_help_lists_stages() {
    Command::cargo_bin("medcost")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preprocess"))
        .stdout(predicate::str::contains("run-all"));
}

#[test]
fn test_missing_input_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("medcost")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("eda")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("insurance.csv"));
}

#[test]
fn test_run_all_generates_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let mut df = frame_of(&synthetic_records(120, 5));
    write_csv(&mut df, &temp_dir.path().join("data").join("insurance.csv"));

    Command::cargo_bin("medcost")
        .unwrap()
        .current_dir(temp_dir.path())
        .arg("run-all")
        .assert()
        .success()
        .stdout(predicate::str::contains("RUN SUMMARY"));

    let reports = temp_dir.path().join("reports");
    assert!(reports.join("insurance_reports.zip").exists());
    assert!(reports.join("regional").join("regional_analysis.json").exists());
    assert!(reports
        .join("visualizations")
        .join("chart_data.json")
        .exists());
    assert!(temp_dir
        .path()
        .join("data")
        .join("insurance_clean_essential.csv")
        .exists());
}

#[test]
fn test_run_all_stops_at_failing_stage() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("data")).unwrap();
    std::fs::write(
        temp_dir.path().join("data").join("insurance.csv"),
        // No charges column
        "age,sex,bmi,children,smoker,region\n19,female,27.9,0,yes,southwest\n",
    )
    .unwrap();

    Command::cargo_bin("medcost")
        .unwrap()
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("stage 'eda'"));

    assert!(!temp_dir
        .path()
        .join("reports")
        .join("insurance_reports.zip")
        .exists());
}
