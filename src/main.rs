//! medcost: Medical insurance cost analysis CLI
//!
//! Runs the analysis stages (eda, preprocess, features, visualizations,
//! regional) one at a time or all in sequence, and opens the interactive
//! dashboard.

use anyhow::{bail, Result};
use clap::Parser;

use medcost::cli::{Cli, Commands};
use medcost::stages::{self, ProcessRunner, Stage};
use medcost::utils::{print_banner, print_error};

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config;

    match cli.command.unwrap_or(Commands::RunAll) {
        Commands::Eda => Stage::Eda.run(&config).map(|_| ()),
        Commands::Preprocess => Stage::Preprocess.run(&config).map(|_| ()),
        Commands::Features => Stage::Features.run(&config).map(|_| ()),
        Commands::Visualizations => Stage::Visualizations.run(&config).map(|_| ()),
        Commands::Regional => Stage::Regional.run(&config).map(|_| ()),
        Commands::Explore => stages::explore::run(&config),
        Commands::RunAll => {
            print_banner(env!("CARGO_PKG_VERSION"));
            let mut runner = ProcessRunner::current()?;
            let summary = stages::run_all(&config, &mut runner)?;
            if let Some(stage) = summary.failed_stage() {
                bail!(
                    "run aborted at stage '{}' ({} succeeded, {} failed)",
                    stage,
                    summary.successes(),
                    summary.failures()
                );
            }
            Ok(())
        }
    }
}
