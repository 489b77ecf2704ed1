//! Validation report types for structured error reporting.
//!
//! The report keeps, for every split, the three sorted lists produced by the
//! validator. The same findings are also available as flat
//! [`ValidationIssue`]s with a severity, for display and exit-status
//! decisions.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::layout::Split;

/// Findings for a single split. All lists are sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitFindings {
    /// Label stems with no image of the same stem.
    pub labels_without_images: Vec<String>,
    /// Image stems with no label file at all. An empty label file still
    /// counts as a label here.
    pub images_without_labels: Vec<String>,
    /// File names of label files that could not be read or contain a line
    /// without exactly five tokens.
    pub invalid_labels: Vec<String>,
}

impl SplitFindings {
    pub fn is_empty(&self) -> bool {
        self.labels_without_images.is_empty()
            && self.images_without_labels.is_empty()
            && self.invalid_labels.is_empty()
    }
}

/// The result of validating a dataset, keyed by split in split order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    splits: Vec<(Split, SplitFindings)>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { splits: Vec::new() }
    }

    /// Records the findings for a split, replacing any earlier entry.
    pub fn insert(&mut self, split: Split, findings: SplitFindings) {
        match self.splits.iter_mut().find(|(s, _)| *s == split) {
            Some((_, existing)) => *existing = findings,
            None => self.splits.push((split, findings)),
        }
    }

    /// Findings for the named split, if it was validated.
    pub fn get(&self, split: &str) -> Option<&SplitFindings> {
        self.splits
            .iter()
            .find(|(s, _)| s.as_str() == split)
            .map(|(_, findings)| findings)
    }

    /// Iterates over validated splits in order.
    pub fn splits(&self) -> impl Iterator<Item = (&Split, &SplitFindings)> {
        self.splits.iter().map(|(split, findings)| (split, findings))
    }

    /// Flattens the findings into individual issues, split by split.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (split, findings) in &self.splits {
            for stem in &findings.labels_without_images {
                issues.push(ValidationIssue::new(
                    IssueCode::LabelWithoutImage,
                    split.clone(),
                    stem.clone(),
                ));
            }
            for stem in &findings.images_without_labels {
                issues.push(ValidationIssue::new(
                    IssueCode::ImageWithoutLabel,
                    split.clone(),
                    stem.clone(),
                ));
            }
            for name in &findings.invalid_labels {
                issues.push(ValidationIssue::new(
                    IssueCode::InvalidLabelFile,
                    split.clone(),
                    name.clone(),
                ));
            }
        }
        issues
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.splits
            .iter()
            .map(|(_, f)| f.labels_without_images.len() + f.invalid_labels.len())
            .sum()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.splits
            .iter()
            .map(|(_, f)| f.images_without_labels.len())
            .sum()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.splits.iter().all(|(_, f)| f.is_empty())
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.splits.len()))?;
        for (split, findings) in &self.splits {
            map.serialize_entry(split.as_str(), findings)?;
        }
        map.end()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (split, findings) in &self.splits {
            writeln!(
                f,
                "Split {}: {} label(s) without image, {} image(s) without label, {} invalid label file(s)",
                split,
                findings.labels_without_images.len(),
                findings.images_without_labels.len(),
                findings.invalid_labels.len()
            )?;
        }

        if self.is_clean() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in self.issues() {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub split: Split,
    /// Stem or file name the issue refers to.
    pub name: String,
}

impl ValidationIssue {
    /// Creates an issue; severity follows from the code.
    pub fn new(code: IssueCode, split: Split, name: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            split,
            name: name.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in split {}: {}",
            severity, self.code, self.split, self.name
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Worth a look but not necessarily wrong.
    Warning,
    /// Inconsistent or unusable data.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// A label file has no image with the same stem.
    LabelWithoutImage,
    /// An image has no label file at all (not even an empty one).
    ImageWithoutLabel,
    /// A label file is unreadable or has a line without five tokens.
    InvalidLabelFile,
}

impl IssueCode {
    pub fn severity(self) -> Severity {
        match self {
            IssueCode::LabelWithoutImage | IssueCode::InvalidLabelFile => Severity::Error,
            IssueCode::ImageWithoutLabel => Severity::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationReport {
        let mut report = ValidationReport::new();
        report.insert(
            Split::from("train"),
            SplitFindings {
                labels_without_images: vec!["orphan".to_string()],
                images_without_labels: vec!["c".to_string(), "d".to_string()],
                invalid_labels: vec![],
            },
        );
        report.insert(Split::from("valid"), SplitFindings::default());
        report
    }

    #[test]
    fn counts_by_severity() {
        let report = sample();
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 2);
        assert!(!report.is_ok());
        assert!(!report.is_clean());
        assert_eq!(report.issues().len(), 3);
    }

    #[test]
    fn serializes_as_split_mapping_in_order() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        assert_eq!(
            json,
            r#"{"train":{"labels_without_images":["orphan"],"images_without_labels":["c","d"],"invalid_labels":[]},"valid":{"labels_without_images":[],"images_without_labels":[],"invalid_labels":[]}}"#
        );
    }

    #[test]
    fn display_mentions_issue_codes() {
        let text = sample().to_string();
        assert!(text.contains("LabelWithoutImage in split train: orphan"));
        assert!(text.contains("1 error(s) and 2 warning(s)"));
    }

    #[test]
    fn clean_report_passes() {
        let mut report = ValidationReport::new();
        report.insert(Split::from("train"), SplitFindings::default());
        assert!(report.is_clean());
        assert!(report.to_string().contains("Validation passed"));
    }
}
