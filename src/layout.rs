//! Dataset layout resolution.
//!
//! A dataset is laid out as `<root>/<split>/<images>/*` and
//! `<root>/<split>/<labels>/*.txt`. This module only computes paths; it
//! never touches the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default split order used when no configuration overrides it.
pub const DEFAULT_SPLITS: [&str; 3] = ["train", "valid", "test"];

/// Default image folder name inside a split.
pub const DEFAULT_IMAGES_DIRNAME: &str = "images";

/// Default label folder name inside a split.
pub const DEFAULT_LABELS_DIRNAME: &str = "labels";

/// A named dataset partition, such as `train` or `valid`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Split(String);

impl Split {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Split {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Split {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Returns the default ordered split list.
pub fn default_splits() -> Vec<Split> {
    DEFAULT_SPLITS.iter().map(|s| Split::from(*s)).collect()
}

/// Which of the two per-split folders a path refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderKind {
    Images,
    Labels,
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderKind::Images => f.write_str("images"),
            FolderKind::Labels => f.write_str("labels"),
        }
    }
}

/// Where a dataset lives and how its split folders are named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
    images_dirname: String,
    labels_dirname: String,
}

impl DatasetLayout {
    /// Creates a layout with the default `images`/`labels` folder names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images_dirname: DEFAULT_IMAGES_DIRNAME.to_string(),
            labels_dirname: DEFAULT_LABELS_DIRNAME.to_string(),
        }
    }

    pub fn with_images_dirname(mut self, name: impl Into<String>) -> Self {
        self.images_dirname = name.into();
        self
    }

    pub fn with_labels_dirname(mut self, name: impl Into<String>) -> Self {
        self.labels_dirname = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self, split: &Split) -> PathBuf {
        self.root.join(split.as_str()).join(&self.images_dirname)
    }

    pub fn labels_dir(&self, split: &Split) -> PathBuf {
        self.root.join(split.as_str()).join(&self.labels_dirname)
    }

    pub fn folder(&self, split: &Split, kind: FolderKind) -> PathBuf {
        match kind {
            FolderKind::Images => self.images_dir(split),
            FolderKind::Labels => self.labels_dir(split),
        }
    }
}
