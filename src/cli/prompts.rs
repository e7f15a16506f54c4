//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Ask whether to run preprocessing because the cleaned dataset is missing
pub fn confirm_run_preprocess(clean_path: &Path) -> Result<bool> {
    let message = format!(
        "{} not found. Run preprocessing first?",
        clean_path.display()
    );
    confirm_step(&message)
}
