//! Tests for the run-all driver using an in-memory stage runner

use std::ffi::OsStr;

use anyhow::{bail, Result};
use medcost::cli::Config;
use medcost::stages::{run_all, ProcessRunner, Stage, StageRunner};
use tempfile::TempDir;

/// Writes a placeholder report for each stage and records the call order.
struct FakeRunner {
    calls: Vec<Stage>,
    fail_at: Option<Stage>,
}

impl FakeRunner {
    fn new(fail_at: Option<Stage>) -> Self {
        Self {
            calls: Vec::new(),
            fail_at,
        }
    }
}

impl StageRunner for FakeRunner {
    fn run_stage(&mut self, stage: Stage, config: &Config) -> Result<()> {
        self.calls.push(stage);
        if self.fail_at == Some(stage) {
            bail!("{} blew up", stage.name());
        }
        let path = stage.report_path(config);
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(&path, format!("{{\"stage\": \"{}\"}}", stage.name()))?;
        Ok(())
    }
}

fn config(temp_dir: &TempDir) -> Config {
    Config {
        data_dir: temp_dir.path().join("data"),
        reports_dir: temp_dir.path().join("reports"),
        ..Config::default()
    }
}

#[test]
fn test_all_stages_run_in_order_then_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let mut runner = FakeRunner::new(None);

    let summary = run_all(&config, &mut runner).unwrap();

    assert_eq!(runner.calls, Stage::ALL.to_vec());
    assert_eq!(summary.successes(), 5);
    assert_eq!(summary.failures(), 0);
    assert_eq!(summary.failed_stage(), None);
    assert!(config.bundle_path().exists());
    // clean, essential, five reports and the bundle
    assert_eq!(summary.generated.len(), 8);
    assert_eq!(summary.generated.last(), Some(&config.bundle_path()));
}

#[test]
fn test_failure_stops_later_stages() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let mut runner = FakeRunner::new(Some(Stage::Preprocess));

    let summary = run_all(&config, &mut runner).unwrap();

    assert_eq!(runner.calls, vec![Stage::Eda, Stage::Preprocess]);
    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.failed_stage(), Some("preprocess"));
    assert!(summary.outcomes[1]
        .detail
        .as_deref()
        .unwrap()
        .contains("preprocess blew up"));
    assert!(summary.generated.is_empty());
    assert!(!config.bundle_path().exists());
}

#[test]
fn test_last_stage_failure_still_skips_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let mut runner = FakeRunner::new(Some(Stage::Regional));

    let summary = run_all(&config, &mut runner).unwrap();

    assert_eq!(runner.calls.len(), 5);
    assert_eq!(summary.successes(), 4);
    assert!(!config.bundle_path().exists());
}

#[test]
fn test_process_runner_forwards_shared_options() {
    let config = Config {
        alpha: 0.01,
        input: Some("raw/in.csv".into()),
        ..Config::default()
    };
    let runner = ProcessRunner::new("/opt/medcost".into());

    let command = runner.command(Stage::Features, &config);
    let args: Vec<&OsStr> = command.get_args().collect();

    assert_eq!(command.get_program(), OsStr::new("/opt/medcost"));
    assert_eq!(args[0], "features");
    let alpha = args.iter().position(|a| *a == "--alpha").unwrap();
    assert_eq!(args[alpha + 1], "0.01");
    let input = args.iter().position(|a| *a == "--input").unwrap();
    assert_eq!(args[input + 1], "raw/in.csv");
}

#[test]
fn test_process_runner_reports_exit_status() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let mut runner = ProcessRunner::new(temp_dir.path().join("no-such-binary"));

    let err = runner.run_stage(Stage::Eda, &config).unwrap_err();
    assert!(err.to_string().contains("failed to start"));
}
