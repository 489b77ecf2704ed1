//! Observer handles for audit decisions.
//!
//! Components never reach for a global logger. Each one holds an
//! [`AuditSink`] and reports every skip or flag decision through it as a
//! typed [`AuditEvent`]. The default is [`TracingSink`], which forwards
//! events to `tracing`; tests usually swap in a [`MemorySink`].

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::label::SkipReason;
use crate::layout::{FolderKind, Split};

/// A single decision made while auditing a dataset.
#[derive(Debug)]
pub enum AuditEvent<'a> {
    /// An expected split folder does not exist; treated as empty.
    MissingFolder {
        split: &'a Split,
        kind: FolderKind,
        path: &'a Path,
    },
    /// Entry counts for one split.
    SplitScanned {
        split: &'a Split,
        images: usize,
        labels: usize,
    },
    /// A label file could not be read.
    UnreadableLabel { path: &'a Path, error: &'a io::Error },
    /// A label file with no content, i.e. a negative example.
    NegativeLabel { path: &'a Path },
    /// The validator flagged a label file on its first malformed line.
    MalformedLabelFile { path: &'a Path, line: &'a str },
    /// The aggregator skipped a single line.
    SkippedLine {
        path: &'a Path,
        line_number: usize,
        reason: &'a SkipReason,
    },
    /// Per-split validation summary.
    SplitValidated {
        split: &'a Split,
        labels_without_images: usize,
        images_without_labels: usize,
        invalid_labels: usize,
    },
    /// No valid box was found anywhere in the dataset.
    NoValidBoxes,
    /// Aggregation finished with at least one box.
    MetricsComputed {
        total_boxes: usize,
        images_with_objects: usize,
    },
}

/// Discriminant of an [`AuditEvent`], for filtering recorded events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MissingFolder,
    SplitScanned,
    UnreadableLabel,
    NegativeLabel,
    MalformedLabelFile,
    SkippedLine,
    SplitValidated,
    NoValidBoxes,
    MetricsComputed,
}

impl AuditEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            AuditEvent::MissingFolder { .. } => EventKind::MissingFolder,
            AuditEvent::SplitScanned { .. } => EventKind::SplitScanned,
            AuditEvent::UnreadableLabel { .. } => EventKind::UnreadableLabel,
            AuditEvent::NegativeLabel { .. } => EventKind::NegativeLabel,
            AuditEvent::MalformedLabelFile { .. } => EventKind::MalformedLabelFile,
            AuditEvent::SkippedLine { .. } => EventKind::SkippedLine,
            AuditEvent::SplitValidated { .. } => EventKind::SplitValidated,
            AuditEvent::NoValidBoxes => EventKind::NoValidBoxes,
            AuditEvent::MetricsComputed { .. } => EventKind::MetricsComputed,
        }
    }
}

impl fmt::Display for AuditEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::MissingFolder { split, kind, path } => write!(
                f,
                "{} folder not found for split {}: {}",
                kind,
                split,
                path.display()
            ),
            AuditEvent::SplitScanned {
                split,
                images,
                labels,
            } => write!(f, "split {} | images: {} | labels: {}", split, images, labels),
            AuditEvent::UnreadableLabel { path, error } => {
                write!(f, "could not read label {}: {}", path.display(), error)
            }
            AuditEvent::NegativeLabel { path } => {
                write!(f, "empty label (negative example): {}", path.display())
            }
            AuditEvent::MalformedLabelFile { path, line } => {
                write!(f, "malformed label in {}: {:?}", path.display(), line)
            }
            AuditEvent::SkippedLine {
                path,
                line_number,
                reason,
            } => write!(
                f,
                "skipped line {} in {}: {}",
                line_number,
                path.display(),
                reason
            ),
            AuditEvent::SplitValidated {
                split,
                labels_without_images,
                images_without_labels,
                invalid_labels,
            } => write!(
                f,
                "split {} | labels without image: {} | images without label: {} | invalid labels: {}",
                split, labels_without_images, images_without_labels, invalid_labels
            ),
            AuditEvent::NoValidBoxes => f.write_str("no valid bounding box found in the dataset"),
            AuditEvent::MetricsComputed {
                total_boxes,
                images_with_objects,
            } => write!(
                f,
                "metrics computed: {} box(es) across {} image(s)",
                total_boxes, images_with_objects
            ),
        }
    }
}

/// Receives audit decisions from the scanner, validator and aggregator.
pub trait AuditSink {
    fn emit(&self, event: &AuditEvent<'_>);
}

/// Forwards events to the `tracing` subscriber installed by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn emit(&self, event: &AuditEvent<'_>) {
        match event {
            AuditEvent::MissingFolder { split, kind, path } => warn!(
                split = %split,
                folder = %kind,
                path = %path.display(),
                "folder not found"
            ),
            AuditEvent::SplitScanned {
                split,
                images,
                labels,
            } => info!(split = %split, images, labels, "split scanned"),
            AuditEvent::UnreadableLabel { path, error } => {
                error!(path = %path.display(), %error, "could not read label file")
            }
            AuditEvent::NegativeLabel { path } => {
                debug!(path = %path.display(), "empty label file (negative example)")
            }
            AuditEvent::MalformedLabelFile { path, line } => {
                warn!(path = %path.display(), line = %line, "malformed label file")
            }
            AuditEvent::SkippedLine {
                path,
                line_number,
                reason,
            } => warn!(
                path = %path.display(),
                line_number,
                reason = %reason,
                "skipped label line"
            ),
            AuditEvent::SplitValidated {
                split,
                labels_without_images,
                images_without_labels,
                invalid_labels,
            } => info!(
                split = %split,
                labels_without_images,
                images_without_labels,
                invalid_labels,
                "split validated"
            ),
            AuditEvent::NoValidBoxes => error!("no valid bounding box found in the dataset"),
            AuditEvent::MetricsComputed {
                total_boxes,
                images_with_objects,
            } => info!(total_boxes, images_with_objects, "dataset metrics computed"),
        }
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn emit(&self, _event: &AuditEvent<'_>) {}
}

/// An event captured by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub message: String,
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<RecordedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind == kind).count()
    }
}

impl AuditSink for MemorySink {
    fn emit(&self, event: &AuditEvent<'_>) {
        self.events.borrow_mut().push(RecordedEvent {
            kind: event.kind(),
            message: event.to_string(),
        });
    }
}
