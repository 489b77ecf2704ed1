//! Dataset structure scanning.
//!
//! Lists the entries of each split's image and label folders. Listings are
//! non-recursive, sorted by name and skip dot-prefixed entries, so a folder
//! behaves like the shell glob `<folder>/*`. A missing folder is not an
//! error: it lists as empty and the caller reports it through its sink.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::AuditError;
use crate::layout::{DatasetLayout, FolderKind, Split};
use crate::sink::{AuditEvent, AuditSink, TracingSink};

/// Extension (with dot) of label files whose contents are inspected.
pub const LABEL_SUFFIX: &str = ".txt";

/// One entry found directly inside a split folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub path: PathBuf,
}

impl FolderEntry {
    /// File name without its final extension; the pairing key between
    /// images and labels.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn is_label_file(&self) -> bool {
        self.name.ends_with(LABEL_SUFFIX)
    }
}

/// Lists the entries directly inside `dir`.
///
/// Returns `Ok(None)` when `dir` does not exist. Any failure while reading
/// an existing folder is returned as [`AuditError::FolderScan`].
pub fn list_folder(dir: &Path) -> Result<Option<Vec<FolderEntry>>, AuditError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| AuditError::FolderScan {
            path: dir.to_path_buf(),
            source,
        })?;

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        entries.push(FolderEntry {
            name,
            path: entry.into_path(),
        });
    }

    Ok(Some(entries))
}

/// Lists one split folder, reporting a missing folder to `sink`.
pub(crate) fn list_split_folder(
    layout: &DatasetLayout,
    split: &Split,
    kind: FolderKind,
    sink: &dyn AuditSink,
) -> Result<Vec<FolderEntry>, AuditError> {
    let dir = layout.folder(split, kind);
    match list_folder(&dir)? {
        Some(entries) => Ok(entries),
        None => {
            sink.emit(&AuditEvent::MissingFolder {
                split,
                kind,
                path: &dir,
            });
            Ok(Vec::new())
        }
    }
}

/// Entry counts for a single split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitStructure {
    pub split: Split,
    /// Entries under the image folder (any file type).
    pub images: usize,
    /// Entries under the label folder (any file type).
    pub labels: usize,
    pub images_folder_found: bool,
    pub labels_folder_found: bool,
}

/// Entry counts for every split, in split order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub splits: Vec<SplitStructure>,
}

impl StructureReport {
    pub fn get(&self, split: &str) -> Option<&SplitStructure> {
        self.splits.iter().find(|s| s.split.as_str() == split)
    }

    pub fn total_images(&self) -> usize {
        self.splits.iter().map(|s| s.images).sum()
    }

    pub fn total_labels(&self) -> usize {
        self.splits.iter().map(|s| s.labels).sum()
    }
}

impl fmt::Display for StructureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset structure:")?;
        for split in &self.splits {
            write!(
                f,
                "  {:<8} images: {:>6}  labels: {:>6}",
                split.split.as_str(),
                split.images,
                split.labels
            )?;
            let mut missing = Vec::new();
            if !split.images_folder_found {
                missing.push("images");
            }
            if !split.labels_folder_found {
                missing.push("labels");
            }
            if !missing.is_empty() {
                write!(f, "  (missing: {})", missing.join(", "))?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "  {:<8} images: {:>6}  labels: {:>6}",
            "total",
            self.total_images(),
            self.total_labels()
        )
    }
}

/// Counts the entries of every split's image and label folders.
pub struct StructureScanner<'a> {
    layout: &'a DatasetLayout,
    sink: &'a dyn AuditSink,
}

impl<'a> StructureScanner<'a> {
    pub fn new(layout: &'a DatasetLayout) -> Self {
        Self {
            layout,
            sink: &TracingSink,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn AuditSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn scan(&self, splits: &[Split]) -> Result<StructureReport, AuditError> {
        let mut report = StructureReport::default();

        for split in splits {
            let images = self.count(split, FolderKind::Images)?;
            let labels = self.count(split, FolderKind::Labels)?;

            self.sink.emit(&AuditEvent::SplitScanned {
                split,
                images: images.unwrap_or(0),
                labels: labels.unwrap_or(0),
            });

            report.splits.push(SplitStructure {
                split: split.clone(),
                images: images.unwrap_or(0),
                labels: labels.unwrap_or(0),
                images_folder_found: images.is_some(),
                labels_folder_found: labels.is_some(),
            });
        }

        Ok(report)
    }

    fn count(&self, split: &Split, kind: FolderKind) -> Result<Option<usize>, AuditError> {
        let dir = self.layout.folder(split, kind);
        let listing = list_folder(&dir)?;
        if listing.is_none() {
            self.sink.emit(&AuditEvent::MissingFolder {
                split,
                kind,
                path: &dir,
            });
        }
        Ok(listing.map(|entries| entries.len()))
    }
}
