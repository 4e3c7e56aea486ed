use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures. Per-row data problems never reach this type;
/// the normalizer substitutes null/zero and keeps going.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("No .csv files found under: {0}")]
    NoInputFiles(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid date filter '{0}'. Use YYYY-MM-DD (e.g. 2024-01-01)")]
    InvalidDateFilter(String),

    #[error("{0}")]
    Config(String),

    #[error("Failed to write {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("No articles to report{}", .filter.as_ref().map(|d| format!(" on or after {d}")).unwrap_or_default())]
    NoData { filter: Option<String> },
}

impl AnalysisError {
    /// Process exit code: 2 for the empty-result state, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalysisError::NoData { .. } => 2,
            _ => 1,
        }
    }
}
