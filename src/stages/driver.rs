//! `run-all` driver: every stage in order, each in its own process
//!
//! The driver stops at the first failing stage. The report bundle is written
//! only after every stage succeeded.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use super::{report_paths, Stage};
use crate::cli::Config;
use crate::report::{package_reports, RunSummary, StageOutcome};
use crate::utils::{print_error, print_step_header, print_step_time, print_success};

/// Runs one stage to completion. An `Err` marks the stage as failed.
pub trait StageRunner {
    fn run_stage(&mut self, stage: Stage, config: &Config) -> Result<()>;
}

/// Re-invokes an executable (normally the current one) with the stage
/// subcommand and the shared options. Output is inherited.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
}

impl ProcessRunner {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Runner for the binary that is currently executing.
    pub fn current() -> Result<Self> {
        let executable =
            std::env::current_exe().context("cannot locate the medcost executable")?;
        Ok(Self::new(executable))
    }

    /// Command line for one stage.
    pub fn command(&self, stage: Stage, config: &Config) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg(stage.name()).args(config.to_args());
        command
    }
}

impl StageRunner for ProcessRunner {
    fn run_stage(&mut self, stage: Stage, config: &Config) -> Result<()> {
        let status = self
            .command(stage, config)
            .status()
            .with_context(|| format!("failed to start {}", self.executable.display()))?;
        if !status.success() {
            match status.code() {
                Some(code) => bail!("exited with status {}", code),
                None => bail!("terminated by signal"),
            }
        }
        Ok(())
    }
}

/// Run every stage through `runner`, fail-fast, then bundle the reports.
pub fn run_all(config: &Config, runner: &mut impl StageRunner) -> Result<RunSummary> {
    let run_start = Instant::now();
    let mut summary = RunSummary::default();

    for (i, stage) in Stage::ALL.iter().enumerate() {
        print_step_header(i as u8 + 1, &format!("Stage '{}'", stage.name()));
        let step_start = Instant::now();
        let result = runner.run_stage(*stage, config);
        let elapsed = step_start.elapsed();
        print_step_time(elapsed);

        match result {
            Ok(()) => {
                print_success(&format!("Stage '{}' finished", stage.name()));
                summary.outcomes.push(StageOutcome {
                    stage: stage.name().to_string(),
                    success: true,
                    elapsed,
                    detail: None,
                });
            }
            Err(e) => {
                print_error(&format!("Stage '{}' failed: {:#}", stage.name(), e));
                summary.outcomes.push(StageOutcome {
                    stage: stage.name().to_string(),
                    success: false,
                    elapsed,
                    detail: Some(format!("{:#}", e)),
                });
                break;
            }
        }
    }

    if summary.failures() == 0 {
        let reports = report_paths(config);
        let bundle = config.bundle_path();
        package_reports(&reports, &bundle)?;
        print_success(&format!("Reports bundled into {}", bundle.display()));

        summary.generated.push(config.clean_path());
        summary.generated.push(config.essential_path());
        summary.generated.extend(reports);
        summary.generated.push(bundle);
    }

    summary.total = run_start.elapsed();
    summary.display();
    Ok(summary)
}
