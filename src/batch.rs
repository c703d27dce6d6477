//! Directory-wide deviance runs
//!
//! Each input table is loaded and analyzed on its own. A failure in one
//! table becomes the `error` field of its report row; the remaining tables
//! are still processed.

use crate::config::DevianceConfig;
use crate::deviance::{analyze, TableAnalysis};
use crate::error::{DevianceError, Result};
use crate::table::TableLoader;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// One row of a summary: the metrics of one table (or one clustering)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    /// File name, or label column name in multi-clustering mode
    pub filename: String,
    /// Number of principal components, when known
    pub components: Option<u32>,
    /// Number of clusters, when known
    pub clusters: Option<u32>,
    pub deviance_retained: f64,
    pub deviance_lost: f64,
    pub intra_cluster_total: f64,
    pub total_dev_lost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableReport {
    /// A row whose metrics are all NaN
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            components: None,
            clusters: None,
            deviance_retained: f64::NAN,
            deviance_lost: f64::NAN,
            intra_cluster_total: f64::NAN,
            total_dev_lost: f64::NAN,
            error: Some(error.into()),
        }
    }

    /// Build a row from a finished analysis
    pub fn from_analysis(filename: impl Into<String>, analysis: &TableAnalysis) -> Self {
        let (deviance_retained, deviance_lost) = match &analysis.split {
            Ok(split) => (split.deviance_retained, split.deviance_lost),
            Err(_) => (f64::NAN, f64::NAN),
        };
        let intra_cluster_total = analysis
            .groups
            .as_ref()
            .map(|g| g.total)
            .unwrap_or(f64::NAN);
        let errors = analysis.errors();

        Self {
            filename: filename.into(),
            components: None,
            clusters: None,
            deviance_retained,
            deviance_lost,
            intra_cluster_total,
            total_dev_lost: analysis.total_dev_lost,
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn counts_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d+)_comp[a-z]*_(\d+)_cluster").expect("static regex is valid")
    })
}

/// Parse component and cluster counts from names like `6_componenti_13_cluster.csv`
pub fn parse_counts(filename: &str) -> (Option<u32>, Option<u32>) {
    match counts_pattern().captures(filename) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

/// Runs the per-table analysis over many files
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: DevianceConfig,
    loader: TableLoader,
}

impl BatchRunner {
    pub fn new(config: DevianceConfig) -> Self {
        let loader = TableLoader::from_config(&config);
        Self { config, loader }
    }

    pub fn config(&self) -> &DevianceConfig {
        &self.config
    }

    /// List `*.csv` files of a directory (case-insensitive), sorted by name
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DevianceError::InvalidPath(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Analyze every file; never stops early
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<TableReport> {
        paths.iter().map(|p| self.run_path(p.as_ref())).collect()
    }

    /// Analyze a single file into its report row
    pub fn run_path(&self, path: &Path) -> TableReport {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let (components, clusters) = parse_counts(&filename);

        let mut report = match self.loader.load_path(path) {
            Ok(table) => {
                let analysis = analyze(&table, &self.config);
                TableReport::from_analysis(&filename, &analysis)
            }
            Err(e) => TableReport::failed(&filename, format!("read error: {}", e)),
        };
        report.components = components;
        report.clusters = clusters;

        match &report.error {
            None => info!(
                file = %filename,
                retained = report.deviance_retained,
                total_dev_lost = report.total_dev_lost,
                "processed table"
            ),
            Some(error) => warn!(file = %filename, %error, "table processed with errors"),
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counts() {
        assert_eq!(parse_counts("6_componenti_13_cluster.csv"), (Some(6), Some(13)));
        assert_eq!(parse_counts("4_COMPONENTS_7_clusters.csv"), (Some(4), Some(7)));
        assert_eq!(parse_counts("hl_pca_clustering.csv"), (None, None));
    }

    #[test]
    fn test_failed_report_is_nan() {
        let report = TableReport::failed("x.csv", "read error: boom");
        assert!(!report.is_ok());
        assert!(report.deviance_retained.is_nan());
        assert!(report.total_dev_lost.is_nan());
    }

    #[test]
    fn test_discover_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            BatchRunner::discover(file.path()),
            Err(DevianceError::InvalidPath(_))
        ));
    }
}
