//! Error types for the analysis pipeline.
//!
//! Every failure the pipeline can raise falls into one of three kinds:
//! bad input, too little data for a statistical test, or a failed write.
//! Input and output errors abort the current stage; insufficient-data
//! errors are reported as a skipped test and the stage carries on.

use std::path::{Path, PathBuf};

use polars::prelude::PolarsError;
use thiserror::Error;

/// Broad classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, missing column, unparseable value, empty data.
    Input,
    /// A statistical test could not run on the given groups.
    InsufficientData,
    /// A result file or directory could not be written.
    Output,
}

/// Errors raised by the loading, cleaning, derivation and testing steps.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file does not exist.
    #[error("input file not found: {}", .path.display())]
    MissingFile { path: PathBuf },

    /// The input file exists but could not be read as a table.
    #[error("failed to read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    /// A required column is absent (or misnamed) in the input.
    #[error("column '{column}' not found{}", origin(.path))]
    MissingColumn {
        column: String,
        path: Option<PathBuf>,
    },

    /// A cell could not be converted to the column's type.
    #[error("column '{column}', row {row}: cannot parse {value:?}{}", origin(.path))]
    InvalidValue {
        column: String,
        /// Zero-based data row index (header excluded)
        row: usize,
        value: String,
        path: Option<PathBuf>,
    },

    /// A column has no usable value at all, so it cannot be filled or typed.
    #[error("column '{column}' contains no values{}", origin(.path))]
    EmptyColumn {
        column: String,
        path: Option<PathBuf>,
    },

    /// The dataset has no rows after loading and cleaning.
    #[error("dataset is empty{}", origin(.path))]
    EmptyDataset { path: Option<PathBuf> },

    /// A statistical test was skipped because a group is too small.
    #[error("{test} skipped: {reason}")]
    InsufficientData { test: String, reason: String },

    /// A result file could not be written.
    #[error("failed to write {}: {message}", .path.display())]
    Output { path: PathBuf, message: String },

    /// Low-level data frame failure while reshaping columns.
    #[error("data frame error: {0}")]
    Frame(#[from] PolarsError),
}

impl PipelineError {
    /// Classify the error into one of the three pipeline error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InsufficientData { .. } => ErrorKind::InsufficientData,
            PipelineError::Output { .. } => ErrorKind::Output,
            _ => ErrorKind::Input,
        }
    }

    /// Attach the source file to a column-level error raised before the path was known.
    pub fn with_path(self, file: &Path) -> Self {
        let file = Some(file.to_path_buf());
        match self {
            PipelineError::MissingColumn { column, path: None } => {
                PipelineError::MissingColumn { column, path: file }
            }
            PipelineError::InvalidValue {
                column,
                row,
                value,
                path: None,
            } => PipelineError::InvalidValue {
                column,
                row,
                value,
                path: file,
            },
            PipelineError::EmptyColumn { column, path: None } => {
                PipelineError::EmptyColumn { column, path: file }
            }
            PipelineError::EmptyDataset { path: None } => PipelineError::EmptyDataset { path: file },
            other => other,
        }
    }

    pub(crate) fn missing_column(column: &str) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            path: None,
        }
    }

    pub(crate) fn insufficient(test: &str, reason: impl Into<String>) -> Self {
        PipelineError::InsufficientData {
            test: test.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn output(path: &Path, err: impl std::fmt::Display) -> Self {
        PipelineError::Output {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" in {}", p.display()),
        None => String::new(),
    }
}
