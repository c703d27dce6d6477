//! CSV summary output for batch and multi-clustering runs
//!
//! One row per table (or clustering), in the column layout the plotting
//! tools read: `PCA` and `Cluster` hold the component and cluster counts.

use crate::batch::TableReport;
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

const HEADER: [&str; 8] = [
    "filename",
    "PCA",
    "Cluster",
    "deviance_retained",
    "deviance_lost",
    "intra_cluster_total",
    "total_dev_lost",
    "error",
];

/// Format a metric with 6 decimals; NaN stays visible as `NaN`
fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn format_count(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a summary table to any writer
pub fn write_summary<W: Write>(writer: W, reports: &[TableReport]) -> Result<()> {
    write_rows(writer, reports, true)
}

/// Append rows to a summary file, writing the header only when the file is new
/// or empty
pub fn append_summary<P: AsRef<Path>>(path: P, reports: &[TableReport]) -> Result<()> {
    let path = path.as_ref();
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    write_rows(BufWriter::new(file), reports, is_new)
}

fn write_rows<W: Write>(writer: W, reports: &[TableReport], header: bool) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if header {
        csv.write_record(HEADER)?;
    }
    for report in reports {
        csv.write_record([
            report.filename.clone(),
            format_count(report.components),
            format_count(report.clusters),
            format_float(report.deviance_retained),
            format_float(report.deviance_lost),
            format_float(report.intra_cluster_total),
            format_float(report.total_dev_lost),
            report.error.clone().unwrap_or_default(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Render a summary table as a string
pub fn summary_to_string(reports: &[TableReport]) -> Result<String> {
    let mut buffer = Vec::new();
    write_summary(&mut buffer, reports)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
