//! Dataset consistency validation.
//!
//! For every split this module checks:
//! - label files whose stem has no matching image
//! - images with no label file at all
//! - label files that cannot be read or contain a line without exactly five
//!   tokens
//!
//! A label file whose trimmed content is empty is a negative example and is
//! never flagged. Invalidity is decided per file: the first offending line
//! flags the file and the remaining lines are not inspected.

mod report;

pub use report::{IssueCode, Severity, SplitFindings, ValidationIssue, ValidationReport};

use std::collections::BTreeSet;
use std::fs;

use crate::error::AuditError;
use crate::label::{has_record_shape, split_lines};
use crate::layout::{DatasetLayout, FolderKind, Split};
use crate::scan::{list_split_folder, FolderEntry};
use crate::sink::{AuditEvent, AuditSink, TracingSink};

/// Outcome of inspecting one label file's contents.
#[derive(Clone, Debug, PartialEq, Eq)]
enum LabelFileCheck {
    Valid,
    Negative,
    Unreadable,
    Malformed,
}

impl LabelFileCheck {
    fn is_invalid(&self) -> bool {
        matches!(self, LabelFileCheck::Unreadable | LabelFileCheck::Malformed)
    }
}

/// Cross-references image and label folders split by split.
pub struct Validator<'a> {
    layout: &'a DatasetLayout,
    sink: &'a dyn AuditSink,
}

impl<'a> Validator<'a> {
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

    /// Validates every split and returns the combined report.
    ///
    /// Unreadable label files are recorded, not raised. A failure to list an
    /// existing folder aborts the whole run.
    pub fn validate(&self, splits: &[Split]) -> Result<ValidationReport, AuditError> {
        let mut report = ValidationReport::new();

        for split in splits {
            let findings = self.validate_split(split)?;

            self.sink.emit(&AuditEvent::SplitValidated {
                split,
                labels_without_images: findings.labels_without_images.len(),
                images_without_labels: findings.images_without_labels.len(),
                invalid_labels: findings.invalid_labels.len(),
            });

            report.insert(split.clone(), findings);
        }

        Ok(report)
    }

    /// Validates a single split.
    pub fn validate_split(&self, split: &Split) -> Result<SplitFindings, AuditError> {
        let image_entries = list_split_folder(self.layout, split, FolderKind::Images, self.sink)?;
        let label_entries = list_split_folder(self.layout, split, FolderKind::Labels, self.sink)?;

        let image_stems: BTreeSet<String> = image_entries.iter().map(FolderEntry::stem).collect();
        let label_stems: BTreeSet<String> = label_entries.iter().map(FolderEntry::stem).collect();

        let labels_without_images: Vec<String> =
            label_stems.difference(&image_stems).cloned().collect();
        let images_without_labels: Vec<String> =
            image_stems.difference(&label_stems).cloned().collect();

        let mut invalid_labels: Vec<String> = label_entries
            .iter()
            .filter(|entry| entry.is_label_file())
            .filter(|entry| self.check_label_file(entry).is_invalid())
            .map(|entry| entry.name.clone())
            .collect();
        invalid_labels.sort();

        Ok(SplitFindings {
            labels_without_images,
            images_without_labels,
            invalid_labels,
        })
    }

    fn check_label_file(&self, entry: &FolderEntry) -> LabelFileCheck {
        let content = match fs::read_to_string(&entry.path) {
            Ok(content) => content,
            Err(error) => {
                self.sink.emit(&AuditEvent::UnreadableLabel {
                    path: &entry.path,
                    error: &error,
                });
                return LabelFileCheck::Unreadable;
            }
        };

        let content = content.trim();
        if content.is_empty() {
            self.sink
                .emit(&AuditEvent::NegativeLabel { path: &entry.path });
            return LabelFileCheck::Negative;
        }

        let check = match split_lines(content).find(|line| !has_record_shape(line)) {
            Some(line) => {
                self.sink.emit(&AuditEvent::MalformedLabelFile {
                    path: &entry.path,
                    line,
                });
                LabelFileCheck::Malformed
            }
            None => LabelFileCheck::Valid,
        };
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{EventKind, MemorySink};
    use std::path::Path;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write file");
    }

    fn validate(root: &Path, sink: &MemorySink) -> ValidationReport {
        let layout = DatasetLayout::new(root);
        Validator::new(&layout)
            .with_sink(sink)
            .validate(&[Split::from("train")])
            .expect("validate")
    }

    #[test]
    fn matching_sets_have_no_pairing_findings() {
        let temp = tempfile::tempdir().expect("create temp dir");
        for stem in ["a", "b"] {
            touch(&temp.path().join(format!("train/images/{stem}.jpg")), "img");
            touch(
                &temp.path().join(format!("train/labels/{stem}.txt")),
                "0 0.5 0.5 0.1 0.1\n",
            );
        }

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);
        let train = report.get("train").expect("train findings");

        assert!(train.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn reports_orphans_both_ways_sorted() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/zeta.jpg"), "img");
        touch(&temp.path().join("train/images/alpha.jpg"), "img");
        touch(&temp.path().join("train/images/shared.jpg"), "img");
        touch(&temp.path().join("train/labels/shared.txt"), "");
        touch(&temp.path().join("train/labels/orphan_b.txt"), "");
        touch(&temp.path().join("train/labels/orphan_a.txt"), "");

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);
        let train = report.get("train").expect("train findings");

        assert_eq!(train.labels_without_images, vec!["orphan_a", "orphan_b"]);
        assert_eq!(train.images_without_labels, vec!["alpha", "zeta"]);
        assert!(train.invalid_labels.is_empty());
    }

    #[test]
    fn empty_label_file_is_a_negative_example() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/neg.jpg"), "img");
        touch(&temp.path().join("train/labels/neg.txt"), "  \n\n\t");

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);

        assert!(report.get("train").expect("train").invalid_labels.is_empty());
        assert_eq!(sink.count(EventKind::NegativeLabel), 1);
    }

    #[test]
    fn first_malformed_line_flags_file_once() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/bad.jpg"), "img");
        touch(
            &temp.path().join("train/labels/bad.txt"),
            "0 0.5 0.5 0.1 0.1\n0 0.5 0.5 0.1\n1 2 3\n",
        );

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);

        assert_eq!(
            report.get("train").expect("train").invalid_labels,
            vec!["bad.txt"]
        );
        assert_eq!(sink.count(EventKind::MalformedLabelFile), 1);
    }

    #[test]
    fn carriage_return_line_endings_are_line_breaks() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/mac.jpg"), "img");
        touch(
            &temp.path().join("train/labels/mac.txt"),
            "0 0.5 0.5 0.1 0.1\r1 0.5 0.5 0.3 0.3\r",
        );

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);

        assert!(report.get("train").expect("train").invalid_labels.is_empty());
        assert_eq!(sink.count(EventKind::MalformedLabelFile), 0);
    }

    #[test]
    fn non_numeric_tokens_pass_structural_check() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/odd.jpg"), "img");
        touch(&temp.path().join("train/labels/odd.txt"), "cat x y w h\n");

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);

        assert!(report.get("train").expect("train").invalid_labels.is_empty());
    }

    #[test]
    fn unreadable_label_is_flagged_and_processing_continues() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/ok.jpg"), "img");
        touch(&temp.path().join("train/labels/ok.txt"), "0 0.5 0.5 0.1 0.1");
        fs::write(temp.path().join("train/labels/binary.txt"), [0xff, 0xfe, 0x00])
            .expect("write invalid utf-8");
        fs::create_dir_all(temp.path().join("train/labels/folder.txt")).expect("create dir");
        touch(&temp.path().join("train/labels/zz_bad.txt"), "0 1\n");

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);
        let train = report.get("train").expect("train");

        assert_eq!(
            train.invalid_labels,
            vec!["binary.txt", "folder.txt", "zz_bad.txt"]
        );
        assert_eq!(sink.count(EventKind::UnreadableLabel), 2);
    }

    #[test]
    fn non_txt_label_entries_pair_but_are_not_read() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("train/images/a.jpg"), "img");
        touch(&temp.path().join("train/labels/a.json"), "{ not yolo }");

        let sink = MemorySink::new();
        let report = validate(temp.path(), &sink);
        let train = report.get("train").expect("train");

        assert!(train.images_without_labels.is_empty());
        assert!(train.invalid_labels.is_empty());
    }

    #[test]
    fn missing_split_is_empty_not_an_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = DatasetLayout::new(temp.path());
        let sink = MemorySink::new();

        let report = Validator::new(&layout)
            .with_sink(&sink)
            .validate(&[Split::from("train"), Split::from("test")])
            .expect("validate");

        assert!(report.is_clean());
        assert_eq!(report.splits().count(), 2);
        assert_eq!(sink.count(EventKind::MissingFolder), 4);
        assert_eq!(sink.count(EventKind::SplitValidated), 2);
    }
}
