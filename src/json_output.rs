//! JSON output for deviance results
//!
//! NaN metrics serialize as `null`, so degenerate results stay visible to
//! machine consumers instead of turning into zeros.

use crate::batch::TableReport;
use crate::deviance::TableAnalysis;
use crate::table::CoercionReport;
use serde::Serialize;
use std::collections::BTreeMap;

/// Decomposition part of a JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonSplit {
    pub deviance_lost: f64,
    pub deviance_retained: f64,
    pub reduced_deviance: f64,
    pub original_deviance: f64,
    pub reduced_columns: Vec<String>,
    pub original_columns: Vec<String>,
}

/// Full JSON report for one table
#[derive(Debug, Clone, Serialize)]
pub struct JsonAnalysis {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<JsonSplit>,
    /// Per-group deviance plus the synthetic `"total"` key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intra_cluster: Option<BTreeMap<String, f64>>,
    /// Constant features left out of the group analysis
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_features: Vec<String>,
    /// Per cluster, features with no value in it
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub empty_features: BTreeMap<String, Vec<String>>,
    pub total_dev_lost: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dropped_values: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl JsonAnalysis {
    pub fn from_analysis(filename: impl Into<String>, analysis: &TableAnalysis) -> Self {
        let split = analysis.split.as_ref().ok().map(|s| JsonSplit {
            deviance_lost: s.deviance_lost,
            deviance_retained: s.deviance_retained,
            reduced_deviance: s.reduced_deviance,
            original_deviance: s.original_deviance,
            reduced_columns: s.reduced_columns.clone(),
            original_columns: s.original_columns.clone(),
        });
        let CoercionReport { dropped } = analysis.coercion();
        let (dropped_features, empty_features) = match &analysis.groups {
            Ok(groups) => (groups.dropped_features.clone(), groups.empty_features.clone()),
            Err(_) => (Vec::new(), BTreeMap::new()),
        };

        Self {
            filename: filename.into(),
            split,
            intra_cluster: analysis.groups.as_ref().ok().map(|g| g.to_map()),
            dropped_features,
            empty_features,
            total_dev_lost: analysis.total_dev_lost,
            dropped_values: dropped,
            errors: analysis.errors(),
        }
    }
}

/// JSON wrapper for batch summaries
#[derive(Debug, Clone, Serialize)]
pub struct JsonBatch<'a> {
    pub tables: usize,
    pub failed: usize,
    pub reports: &'a [TableReport],
}

impl<'a> JsonBatch<'a> {
    pub fn new(reports: &'a [TableReport]) -> Self {
        Self {
            tables: reports.len(),
            failed: reports.iter().filter(|r| !r.is_ok()).count(),
            reports,
        }
    }
}
