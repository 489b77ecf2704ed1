//! Audit configuration.
//!
//! Settings can come from a YAML file; command-line flags override whatever
//! the file provides. Every field has a default, so an empty file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AuditError;
use crate::layout::{
    default_splits, DatasetLayout, Split, DEFAULT_IMAGES_DIRNAME, DEFAULT_LABELS_DIRNAME,
};

/// Default location of the exported metrics table.
pub const DEFAULT_METRICS_CSV: &str = "artifacts/metrics/dataset_metrics.csv";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Dataset root containing one folder per split.
    pub dataset_dir: Option<PathBuf>,
    /// Splits to audit, in report order.
    pub splits: Vec<Split>,
    pub images_dirname: String,
    pub labels_dirname: String,
    /// Where the metrics CSV is written.
    pub metrics_csv: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dataset_dir: None,
            splits: default_splits(),
            images_dirname: DEFAULT_IMAGES_DIRNAME.to_string(),
            labels_dirname: DEFAULT_LABELS_DIRNAME.to_string(),
            metrics_csv: PathBuf::from(DEFAULT_METRICS_CSV),
        }
    }
}

impl AuditConfig {
    pub fn from_yaml_str(yaml: &str, path: &Path) -> Result<Self, AuditError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| AuditError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, AuditError> {
        let yaml = fs::read_to_string(path).map_err(|source| AuditError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Builds the layout rooted at `dataset_dir`, or the current directory
    /// when none is configured.
    pub fn layout(&self) -> DatasetLayout {
        let root = self
            .dataset_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        DatasetLayout::new(root)
            .with_images_dirname(self.images_dirname.clone())
            .with_labels_dirname(self.labels_dirname.clone())
    }
}
