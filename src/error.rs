use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelaudit operations.
///
/// Only infrastructure failures end up here. Unreadable label files and
/// malformed lines are recorded in reports and never abort a run.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to list folder {path}: {source}")]
    FolderScan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write metrics CSV to {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read metrics CSV from {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Metrics CSV is missing {section} metric(s): {}", .missing.join(", "))]
    MissingPlotMetrics {
        section: String,
        missing: Vec<String>,
    },

    #[error("Metric {section}.{metric} has non-numeric value '{value}'")]
    InvalidPlotValue {
        section: String,
        metric: String,
        value: String,
    },

    #[error("Failed to serialize JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
