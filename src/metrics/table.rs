//! The flat `(section, metric, value)` statistics table.

use std::fmt;

use serde::{Serialize, Serializer};

pub const SECTION_LABELS: &str = "labels";
pub const SECTION_BOXES: &str = "boxes";
pub const SECTION_BOX_SIZES: &str = "box_sizes";

/// A loosely typed metric value.
#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Float(f64),
    /// Sorted distinct class ids.
    Classes(Vec<f64>),
}

impl MetricValue {
    pub fn as_count(&self) -> Option<usize> {
        match self {
            MetricValue::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(count) => Some(*count as f64),
            MetricValue::Float(value) => Some(*value),
            MetricValue::Classes(_) => None,
        }
    }
}

/// Formats a float in shortest round-trip form, always with a decimal point
/// or exponent (`1.0`, `0.1`, `1e-7`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else {
        format!("{:?}", value)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(count) => write!(f, "{}", count),
            MetricValue::Float(value) => f.write_str(&format_float(*value)),
            MetricValue::Classes(classes) => {
                let rendered: Vec<String> = classes.iter().map(|c| format_float(*c)).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Count(count) => serializer.serialize_u64(*count as u64),
            MetricValue::Float(value) => serializer.serialize_f64(*value),
            MetricValue::Classes(classes) => classes.serialize(serializer),
        }
    }
}

/// One `(section, metric, value)` triple.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricRow {
    pub section: &'static str,
    pub metric: String,
    pub value: MetricValue,
}

/// Ordered statistics for a whole dataset.
///
/// An empty table means no valid box was found, not that stats were
/// skipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsTable {
    rows: Vec<MetricRow>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn push(&mut self, section: &'static str, metric: impl Into<String>, value: MetricValue) {
        self.rows.push(MetricRow {
            section,
            metric: metric.into(),
            value,
        });
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, section: &str, metric: &str) -> Option<&MetricValue> {
        self.rows
            .iter()
            .find(|row| row.section == section && row.metric == metric)
            .map(|row| &row.value)
    }

    pub fn section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a MetricRow> + 'a {
        self.rows.iter().filter(move |row| row.section == section)
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "No valid bounding boxes found; no metrics to report");
        }

        writeln!(f, "{:<10} {:<20} value", "section", "metric")?;
        for row in &self.rows {
            writeln!(f, "{:<10} {:<20} {}", row.section, row.metric, row.value)?;
        }
        Ok(())
    }
}
