//! CLI module - argument parsing, interactive prompts and the dashboard

mod args;
pub mod explore;
mod prompts;

pub use args::{
    validate_alpha, Cli, Commands, Config, BUNDLE_FILE, CLEAN_FILE, ESSENTIAL_FILE, RAW_FILE,
};
pub use explore::run_explore;
pub use prompts::*;
