//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::DEFAULT_ALPHA;

/// Raw dataset file name inside the data directory
pub const RAW_FILE: &str = "insurance.csv";
/// Cleaned and enriched dataset
pub const CLEAN_FILE: &str = "insurance_clean.csv";
/// Essential subset of the enriched dataset
pub const ESSENTIAL_FILE: &str = "insurance_clean_essential.csv";
/// Report bundle written by `run-all`
pub const BUNDLE_FILE: &str = "insurance_reports.zip";

/// medcost - Medical insurance cost analysis pipeline
#[derive(Parser, Debug)]
#[command(name = "medcost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub config: Config,
}

/// Options shared by every stage. They are forwarded unchanged to each
/// stage process by `run-all`.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the raw and cleaned datasets
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory the JSON reports and the bundle are written to
    #[arg(long, global = true, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Raw input file (CSV or Parquet).
    /// Defaults to insurance.csv inside the data directory.
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Significance level for the t-test and ANOVA (strictly between 0 and 1)
    #[arg(long, global = true, default_value_t = DEFAULT_ALPHA, value_parser = validate_alpha)]
    pub alpha: f64,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, global = true, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Exploratory analysis of the raw dataset
    Eda,
    /// Clean, encode, scale and enrich the dataset, writing the clean CSVs
    Preprocess,
    /// Correlations, category aggregates, trends and the smoker comparison
    Features,
    /// Chart data: distributions, cross-tabulations and counts
    Visualizations,
    /// Per-region aggregates, profiles and ANOVA
    Regional,
    /// Run every stage in order and bundle the reports (default)
    RunAll,
    /// Interactive filterable dashboard over the cleaned dataset
    Explore,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            input: None,
            alpha: DEFAULT_ALPHA,
            infer_schema_length: 10000,
        }
    }
}

impl Config {
    /// Raw dataset path, honoring `--input`.
    pub fn raw_path(&self) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| self.data_dir.join(RAW_FILE))
    }

    pub fn clean_path(&self) -> PathBuf {
        self.data_dir.join(CLEAN_FILE)
    }

    pub fn essential_path(&self) -> PathBuf {
        self.data_dir.join(ESSENTIAL_FILE)
    }

    /// `<reports>/<dir>/<file>`
    pub fn report_path(&self, dir: &str, file: &str) -> PathBuf {
        self.reports_dir.join(dir).join(file)
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.reports_dir.join(BUNDLE_FILE)
    }

    /// Command-line form of these options, for re-invoking the binary.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--data-dir".to_string(),
            path_arg(&self.data_dir),
            "--reports-dir".to_string(),
            path_arg(&self.reports_dir),
            "--alpha".to_string(),
            self.alpha.to_string(),
            "--infer-schema-length".to_string(),
            self.infer_schema_length.to_string(),
        ];
        if let Some(input) = &self.input {
            args.push("--input".to_string());
            args.push(path_arg(input));
        }
        args
    }
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Eda => "eda",
            Commands::Preprocess => "preprocess",
            Commands::Features => "features",
            Commands::Visualizations => "visualizations",
            Commands::Regional => "regional",
            Commands::RunAll => "run-all",
            Commands::Explore => "explore",
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Validator for the alpha parameter
pub fn validate_alpha(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "alpha must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}
