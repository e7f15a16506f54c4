//! Stage runners: one per subcommand, plus the `run-all` driver
//!
//! Each stage reads its input from the configured paths, prints its steps to
//! the terminal and writes one JSON report. Stages never call each other; the
//! driver sequences them as separate processes.

pub mod driver;
pub mod eda;
pub mod explore;
pub mod features;
pub mod preprocess;
pub mod regional;
pub mod visualizations;

use std::path::PathBuf;

use anyhow::Context;

use crate::cli::{Commands, Config};
use crate::pipeline::{load_records, EnrichedTable, PipelineError, TestReport};
use crate::utils::{
    create_spinner, finish_with_error, finish_with_success, print_info, print_kv, print_success,
    print_warning,
};

pub use driver::{run_all, ProcessRunner, StageRunner};

/// A batch analysis stage, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Eda,
    Preprocess,
    Features,
    Visualizations,
    Regional,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Eda,
        Stage::Preprocess,
        Stage::Features,
        Stage::Visualizations,
        Stage::Regional,
    ];

    pub fn command(&self) -> Commands {
        match self {
            Stage::Eda => Commands::Eda,
            Stage::Preprocess => Commands::Preprocess,
            Stage::Features => Commands::Features,
            Stage::Visualizations => Commands::Visualizations,
            Stage::Regional => Commands::Regional,
        }
    }

    pub fn name(&self) -> &'static str {
        self.command().name()
    }

    /// Report directory and file name under the reports root.
    fn report_location(&self) -> (&'static str, &'static str) {
        match self {
            Stage::Eda => ("eda", "eda_summary.json"),
            Stage::Preprocess => ("preprocessing", "preprocessing_summary.json"),
            Stage::Features => ("features", "feature_analysis.json"),
            Stage::Visualizations => ("visualizations", "chart_data.json"),
            Stage::Regional => ("regional", "regional_analysis.json"),
        }
    }

    pub fn report_path(&self, config: &Config) -> PathBuf {
        let (dir, file) = self.report_location();
        config.report_path(dir, file)
    }

    /// Run this stage in the current process.
    pub fn run(&self, config: &Config) -> anyhow::Result<PathBuf> {
        match self {
            Stage::Eda => eda::run(config),
            Stage::Preprocess => preprocess::run(config),
            Stage::Features => features::run(config),
            Stage::Visualizations => visualizations::run(config),
            Stage::Regional => regional::run(config),
        }
    }
}

/// Every report a full run produces, in stage order.
pub fn report_paths(config: &Config) -> Vec<PathBuf> {
    Stage::ALL.iter().map(|s| s.report_path(config)).collect()
}

/// Load the cleaned dataset and derive the enriched table from it.
pub fn load_enriched(config: &Config) -> anyhow::Result<EnrichedTable> {
    let path = config.clean_path();
    let table = spin("Loading cleaned dataset...", "Cleaned dataset loaded", || {
        let records = load_records(&path, config.infer_schema_length)?;
        EnrichedTable::build(&records).map_err(|e| e.with_path(&path))
    })
    .with_context(|| {
        format!(
            "cannot load {}; run `medcost preprocess` first",
            path.display()
        )
    })?;
    print_kv("Rows", table.len());
    Ok(table)
}

/// Print the outcome of a significance test, or why it was skipped.
pub(crate) fn print_test(report: &TestReport) {
    match report {
        TestReport::Completed(outcome) => {
            print_kv(
                &outcome.test,
                format!(
                    "statistic={:.4}, p={:.4e}",
                    outcome.statistic, outcome.p_value
                ),
            );
            if outcome.significant {
                print_success(&format!("Significant at alpha={}", outcome.alpha));
            } else {
                print_info(&format!("Not significant at alpha={}", outcome.alpha));
            }
        }
        TestReport::Skipped { test, reason } => {
            print_warning(&format!("{} skipped: {}", test, reason));
        }
    }
}

/// Run `f` behind a spinner, finishing it with the outcome.
pub(crate) fn spin<T>(
    message: &str,
    done: &str,
    f: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    let spinner = create_spinner(message);
    match f() {
        Ok(value) => {
            finish_with_success(&spinner, done);
            Ok(value)
        }
        Err(e) => {
            finish_with_error(&spinner, &e.to_string());
            Err(e)
        }
    }
}
