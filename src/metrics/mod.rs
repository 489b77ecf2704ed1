//! Dataset box statistics.
//!
//! The aggregator walks every split's label folder, parses each line of each
//! non-empty `.txt` file, and folds the valid records into a single
//! dataset-wide [`MetricsAccumulator`]. Lines are judged one at a time: a
//! malformed line is skipped while the other lines of the same file still
//! count.

mod table;

pub use table::{
    format_float, MetricRow, MetricValue, MetricsTable, SECTION_BOXES, SECTION_BOX_SIZES,
    SECTION_LABELS,
};

use std::collections::BTreeSet;
use std::fs;

use crate::error::AuditError;
use crate::label::{parse_record, split_lines, LabelRecord, LineOutcome, SizeClass};
use crate::layout::{DatasetLayout, FolderKind, Split};
use crate::scan::{list_split_folder, FolderEntry};
use crate::sink::{AuditEvent, AuditSink, TracingSink};

/// Running totals over every valid box seen so far.
///
/// Per-box scalars are buffered so mean/min/max can be computed once at the
/// end.
#[derive(Clone, Debug, Default)]
pub struct MetricsAccumulator {
    widths: Vec<f64>,
    heights: Vec<f64>,
    areas: Vec<f64>,
    proportions: Vec<f64>,
    classes: Vec<f64>,
    size_counts: [usize; 3],
    images_with_objects: BTreeSet<String>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one valid record from the label file with the given stem.
    pub fn observe(&mut self, stem: &str, record: &LabelRecord) {
        self.widths.push(record.width);
        self.heights.push(record.height);
        self.areas.push(record.area());
        self.proportions.push(record.aspect_ratio());

        // Adding zero folds -0.0 into 0.0.
        let class_id = record.class_id + 0.0;
        if !self.classes.iter().any(|c| c.total_cmp(&class_id).is_eq()) {
            self.classes.push(class_id);
        }

        let slot = match record.size_class() {
            SizeClass::Small => 0,
            SizeClass::Medium => 1,
            SizeClass::Large => 2,
        };
        self.size_counts[slot] += 1;

        if !self.images_with_objects.contains(stem) {
            self.images_with_objects.insert(stem.to_string());
        }
    }

    pub fn total_boxes(&self) -> usize {
        self.widths.len()
    }

    pub fn images_with_objects(&self) -> usize {
        self.images_with_objects.len()
    }

    /// Builds the final table, or an empty one when no box was observed.
    pub fn finish(self) -> MetricsTable {
        let mut table = MetricsTable::new();
        if self.total_boxes() == 0 {
            return table;
        }

        let mut classes = self.classes;
        classes.sort_by(f64::total_cmp);

        table.push(
            SECTION_LABELS,
            "images_with_objects",
            MetricValue::Count(self.images_with_objects.len()),
        );
        table.push(
            SECTION_LABELS,
            "total_boxes",
            MetricValue::Count(self.widths.len()),
        );
        table.push(SECTION_LABELS, "classes", MetricValue::Classes(classes));

        for (name, values) in [
            ("width", &self.widths),
            ("height", &self.heights),
            ("area", &self.areas),
            ("proportion", &self.proportions),
        ] {
            let summary = Summary::of(values);
            table.push(
                SECTION_BOXES,
                format!("{name}_mean"),
                MetricValue::Float(summary.mean),
            );
            table.push(
                SECTION_BOXES,
                format!("{name}_min"),
                MetricValue::Float(summary.min),
            );
            table.push(
                SECTION_BOXES,
                format!("{name}_max"),
                MetricValue::Float(summary.max),
            );
        }

        for (size_class, count) in SizeClass::ALL.iter().zip(self.size_counts) {
            table.push(
                SECTION_BOX_SIZES,
                size_class.as_str(),
                MetricValue::Count(count),
            );
        }

        table
    }
}

struct Summary {
    mean: f64,
    min: f64,
    max: f64,
}

impl Summary {
    /// `values` must be non-empty.
    fn of(values: &[f64]) -> Self {
        // Summing in sorted order makes the mean independent of visit order.
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Self {
            mean,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Computes dataset-wide statistics from every split's label files.
pub struct MetricsAggregator<'a> {
    layout: &'a DatasetLayout,
    sink: &'a dyn AuditSink,
}

impl<'a> MetricsAggregator<'a> {
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

    /// Aggregates all splits into one table.
    ///
    /// Returns an empty table when no valid box exists anywhere. Only a
    /// failure to list an existing folder is an error.
    pub fn compute(&self, splits: &[Split]) -> Result<MetricsTable, AuditError> {
        let mut acc = MetricsAccumulator::new();

        for split in splits {
            let entries = list_split_folder(self.layout, split, FolderKind::Labels, self.sink)?;
            for entry in entries.iter().filter(|e| e.is_label_file()) {
                self.accumulate_file(entry, &mut acc);
            }
        }

        if acc.total_boxes() == 0 {
            self.sink.emit(&AuditEvent::NoValidBoxes);
            return Ok(MetricsTable::new());
        }

        self.sink.emit(&AuditEvent::MetricsComputed {
            total_boxes: acc.total_boxes(),
            images_with_objects: acc.images_with_objects(),
        });

        Ok(acc.finish())
    }

    fn accumulate_file(&self, entry: &FolderEntry, acc: &mut MetricsAccumulator) {
        let content = match fs::read_to_string(&entry.path) {
            Ok(content) => content,
            Err(error) => {
                self.sink.emit(&AuditEvent::UnreadableLabel {
                    path: &entry.path,
                    error: &error,
                });
                return;
            }
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return;
        }

        let leading = content.len() - content.trim_start().len();
        let line_offset = split_lines(&content[..leading]).count() - 1;
        let stem = entry.stem();

        for (idx, line) in split_lines(trimmed).enumerate() {
            match parse_record(line) {
                LineOutcome::Record(record) => acc.observe(&stem, &record),
                LineOutcome::Skip(reason) => self.sink.emit(&AuditEvent::SkippedLine {
                    path: &entry.path,
                    line_number: line_offset + idx + 1,
                    reason: &reason,
                }),
            }
        }
    }
}
