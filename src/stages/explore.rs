//! `explore` stage: open the dashboard over the cleaned dataset

use std::sync::Arc;

use anyhow::{bail, Result};

use super::{load_enriched, Stage};
use crate::cli::{confirm_run_preprocess, run_explore, Config};
use crate::pipeline::EnrichedRecord;

pub fn run(config: &Config) -> Result<()> {
    let clean_path = config.clean_path();
    if !clean_path.exists() {
        if !confirm_run_preprocess(&clean_path)? {
            bail!(
                "{} is required; run `medcost preprocess` first",
                clean_path.display()
            );
        }
        Stage::Preprocess.run(config)?;
    }

    let table = load_enriched(config)?;
    let rows: Arc<[EnrichedRecord]> = Arc::from(table.rows);
    run_explore(rows)
}
