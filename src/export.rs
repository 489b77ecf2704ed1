//! Metrics CSV export and plot inputs.
//!
//! The table is written in long form with the header `section,metric,value`.
//! Plot inputs are read back from that file: the `boxes` section as twelve
//! geometry metrics and the `box_sizes` section as three counts, both in a
//! fixed order. Rendering the charts is left to other tools.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::metrics::{MetricsTable, SECTION_BOXES, SECTION_BOX_SIZES};

/// Column names of the metrics CSV.
pub const CSV_HEADER: [&str; 3] = ["section", "metric", "value"];

/// Geometry metrics in plotting order.
pub const BOX_GEOMETRY_ORDER: [&str; 12] = [
    "width_min",
    "width_mean",
    "width_max",
    "height_min",
    "height_mean",
    "height_max",
    "area_min",
    "area_mean",
    "area_max",
    "proportion_min",
    "proportion_mean",
    "proportion_max",
];

/// Size classes in plotting order.
pub const BOX_SIZE_ORDER: [&str; 3] = ["small", "medium", "large"];

/// A metrics CSV row as read back from disk.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CsvMetricRow {
    pub section: String,
    pub metric: String,
    pub value: String,
}

/// One named, ordered numeric series ready for a bar chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotSeries {
    pub section: String,
    pub points: Vec<PlotPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotPoint {
    pub metric: String,
    pub value: f64,
}

/// Writes the table as CSV, creating parent directories as needed.
///
/// An empty table produces a header-only file.
pub fn write_metrics_csv(path: &Path, table: &MetricsTable) -> Result<(), AuditError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(AuditError::Io)?;
    }

    let file = File::create(path).map_err(AuditError::Io)?;
    write_metrics_csv_to(BufWriter::new(file), table).map_err(|source| AuditError::CsvWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders the table as a CSV string.
pub fn metrics_csv_string(table: &MetricsTable) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_metrics_csv_to(&mut buffer, table)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_metrics_csv_to<W: Write>(writer: W, table: &MetricsTable) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for row in table.rows() {
        let value = row.value.to_string();
        csv_writer.write_record([row.section, row.metric.as_str(), value.as_str()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Reads a metrics CSV written by [`write_metrics_csv`].
pub fn read_metrics_csv(path: &Path) -> Result<Vec<CsvMetricRow>, AuditError> {
    let file = File::open(path).map_err(AuditError::Io)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: CsvMetricRow = result.map_err(|source| AuditError::CsvRead {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// The twelve `boxes` metrics in [`BOX_GEOMETRY_ORDER`].
pub fn box_geometry_series(rows: &[CsvMetricRow]) -> Result<PlotSeries, AuditError> {
    ordered_series(rows, SECTION_BOXES, &BOX_GEOMETRY_ORDER)
}

/// The three `box_sizes` counts in [`BOX_SIZE_ORDER`].
pub fn box_size_series(rows: &[CsvMetricRow]) -> Result<PlotSeries, AuditError> {
    ordered_series(rows, SECTION_BOX_SIZES, &BOX_SIZE_ORDER)
}

fn ordered_series(
    rows: &[CsvMetricRow],
    section: &str,
    order: &[&str],
) -> Result<PlotSeries, AuditError> {
    let find = |metric: &str| {
        rows.iter()
            .find(|row| row.section == section && row.metric == metric)
    };

    let missing: Vec<String> = order
        .iter()
        .filter(|metric| find(**metric).is_none())
        .map(|metric| metric.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AuditError::MissingPlotMetrics {
            section: section.to_string(),
            missing,
        });
    }

    let mut points = Vec::with_capacity(order.len());
    for metric in order {
        let Some(row) = find(*metric) else {
            continue;
        };
        let value = row
            .value
            .trim()
            .parse::<f64>()
            .map_err(|_| AuditError::InvalidPlotValue {
                section: section.to_string(),
                metric: metric.to_string(),
                value: row.value.clone(),
            })?;
        points.push(PlotPoint {
            metric: metric.to_string(),
            value,
        });
    }

    Ok(PlotSeries {
        section: section.to_string(),
        points,
    })
}
