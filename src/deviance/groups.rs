use crate::deviance::stats::{is_degenerate, mean, standardize};
use crate::error::{DevianceError, Result};
use crate::table::{CoercionReport, LenientParser, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Key of the synthetic entry holding the sum over all groups
pub const TOTAL_KEY: &str = "total";

/// Options for [`within_group_deviance`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Z-score each feature over the labeled rows before grouping.
    /// Constant features are dropped in this mode.
    pub standardize: bool,
}

/// Intra-group deviance per label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDeviance {
    /// Deviance of each group, keyed by canonical label
    pub groups: BTreeMap<String, f64>,
    /// Sum of all group deviances
    pub total: f64,
    pub feature_columns: Vec<String>,
    /// Constant features left out by standardization
    pub dropped_features: Vec<String>,
    /// Per label, features with no value in that group; they add nothing to
    /// the group's deviance
    pub empty_features: BTreeMap<String, Vec<String>>,
    /// Rows that carried a label
    pub rows: usize,
    pub coercion: CoercionReport,
}

impl GroupDeviance {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.groups.get(label).copied()
    }

    /// Flat mapping with the synthetic `"total"` key
    ///
    /// A real group labelled `total` is shadowed by the synthetic entry here;
    /// it remains available through [`GroupDeviance::groups`].
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = self.groups.clone();
        map.insert(TOTAL_KEY.to_string(), self.total);
        map
    }
}

/// Sum of squared distances of each row from its group's mean vector
///
/// Rows with a missing or blank label are dropped first. Labels are compared
/// in their canonical string form (see [`crate::table::Cell::label`]).
/// Missing coordinates are skipped both in the group mean and in the
/// distances.
///
/// # Errors
/// * `MissingGroupColumn` when `group_col` is absent
/// * `EmptyAfterFilter` when no row carries a label
/// * `NoFeatureColumns` when none of `feature_cols` is present
pub fn within_group_deviance<S: AsRef<str>>(
    table: &Table,
    group_col: &str,
    feature_cols: &[S],
    options: GroupOptions,
) -> Result<GroupDeviance> {
    let mut filtered = table.retain_labeled(group_col)?;
    if filtered.row_count() == 0 {
        return Err(DevianceError::EmptyAfterFilter {
            column: group_col.to_string(),
        });
    }

    let mut features: Vec<String> = Vec::new();
    for requested in feature_cols {
        let name: &str = requested.as_ref();
        if name != group_col && filtered.has_column(name) && !features.iter().any(|f| f == name) {
            features.push(name.to_string());
        }
    }
    if features.is_empty() {
        return Err(DevianceError::NoFeatureColumns {
            requested: feature_cols.iter().map(|s| s.as_ref().to_string()).collect(),
        });
    }

    let mut coercion = CoercionReport::new();
    for name in &features {
        if !filtered.is_numeric_column(name) {
            let dropped = filtered.coerce_numeric(name, &LenientParser);
            coercion.record(name, dropped);
        }
    }
    if !coercion.is_empty() {
        warn!(
            dropped = coercion.total(),
            columns = ?coercion.dropped,
            "unparseable feature values treated as missing"
        );
    }

    let mut matrix: Vec<Vec<f64>> = features
        .iter()
        .map(|name| filtered.numeric_values(name).unwrap_or_default())
        .collect();

    let mut dropped_features = Vec::new();
    if options.standardize {
        let (kept, dropped): (Vec<_>, Vec<_>) = features
            .into_iter()
            .zip(matrix)
            .partition(|(_, values)| !is_degenerate(values));
        dropped_features = dropped.into_iter().map(|(name, _)| name).collect();
        if !dropped_features.is_empty() {
            warn!(
                columns = ?dropped_features,
                "constant features dropped before standardization"
            );
        }
        if kept.is_empty() {
            return Err(DevianceError::NoFeatureColumns {
                requested: feature_cols.iter().map(|s| s.as_ref().to_string()).collect(),
            });
        }
        features = kept.iter().map(|(n, _)| n.clone()).collect();
        matrix = kept.iter().map(|(_, values)| standardize(values)).collect();
    }

    let labels = filtered.labels(group_col).unwrap_or_default();
    let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.into_iter().enumerate() {
        if let Some(label) = label {
            members.entry(label).or_default().push(row);
        }
    }

    let mut groups = BTreeMap::new();
    let mut empty_features = BTreeMap::new();
    let mut total = 0.0;
    for (label, rows) in members {
        let (deviance, empty) = group_deviance(&matrix, &rows);
        if !empty.is_empty() {
            let names: Vec<String> = empty.into_iter().map(|i| features[i].clone()).collect();
            warn!(group = %label, columns = ?names, "features without values in group");
            empty_features.insert(label.clone(), names);
        }
        total += deviance;
        groups.insert(label, deviance);
    }

    debug!(groups = groups.len(), total, features = ?features, "within-group deviance");

    Ok(GroupDeviance {
        groups,
        total,
        feature_columns: features,
        dropped_features,
        empty_features,
        rows: filtered.row_count(),
        coercion,
    })
}

/// Deviance of one group, plus the indices of features with no value in it
fn group_deviance(matrix: &[Vec<f64>], rows: &[usize]) -> (f64, Vec<usize>) {
    let mut deviance = 0.0;
    let mut empty = Vec::new();
    for (index, column) in matrix.iter().enumerate() {
        let members: Vec<f64> = rows.iter().map(|&r| column[r]).collect();
        let centre = mean(&members);
        if centre.is_nan() {
            empty.push(index);
            continue;
        }
        deviance += members
            .iter()
            .filter(|v| !v.is_nan())
            .map(|v| (v - centre).powi(2))
            .sum::<f64>();
    }
    (deviance, empty)
}
