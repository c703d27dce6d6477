use crate::config::DevianceConfig;
use crate::deviance::decomposition::{reduced_vs_original_deviance, DevianceSplit};
use crate::deviance::groups::{within_group_deviance, GroupDeviance, GroupOptions};
use crate::deviance::stats::{is_degenerate, standardize, sum_squared_deviations};
use crate::error::{DevianceError, Result};
use crate::table::{CoercionReport, Table};
use tracing::warn;

/// Combined loss from the reduction and from intra-cluster spread
///
/// `deviance_lost + (groups.total / split.reduced_deviance) * deviance_retained`.
/// When the reduced columns carry no deviance the intra-cluster term is 0.
/// The result has no formal bound and is reported as-is.
pub fn total_deviance_lost(split: &DevianceSplit, groups: &GroupDeviance) -> f64 {
    let normalized_intra = if split.reduced_deviance > 0.0 {
        groups.total / split.reduced_deviance
    } else {
        0.0
    };
    split.deviance_lost + normalized_intra * split.deviance_retained
}

/// Total deviance of a set of columns
///
/// With `standardize` each column is z-scored first and constant columns are
/// skipped. Without it, columns with no finite values are skipped. Both cases
/// log the skipped names.
pub fn total_deviance<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    standardize_first: bool,
) -> Result<f64> {
    let present: Vec<&str> = columns
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| table.is_numeric_column(c))
        .collect();
    if present.is_empty() {
        return Err(DevianceError::NoFeatureColumns {
            requested: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        });
    }

    let mut total = 0.0;
    let mut skipped = Vec::new();
    for name in present {
        let values = table.numeric_values(name).unwrap_or_default();
        let contribution = if standardize_first {
            if is_degenerate(&values) {
                f64::NAN
            } else {
                sum_squared_deviations(&standardize(&values))
            }
        } else {
            sum_squared_deviations(&values)
        };
        if contribution.is_nan() {
            skipped.push(name);
        } else {
            total += contribution;
        }
    }
    if !skipped.is_empty() {
        warn!(columns = ?skipped, "columns without deviance skipped");
    }
    Ok(total)
}

/// Every metric computed for one table
///
/// Each part fails independently; the composite is NaN when either input
/// failed.
#[derive(Debug)]
pub struct TableAnalysis {
    pub split: Result<DevianceSplit>,
    pub groups: Result<GroupDeviance>,
    pub total_dev_lost: f64,
}

impl TableAnalysis {
    /// Error messages prefixed with the stage that produced them
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Err(e) = &self.split {
            errors.push(format!("deviance split error: {}", e));
        }
        if let Err(e) = &self.groups {
            errors.push(format!("intra-cluster error: {}", e));
        }
        errors
    }

    /// Coercion warnings from both stages
    pub fn coercion(&self) -> CoercionReport {
        let mut report = CoercionReport::new();
        if let Ok(split) = &self.split {
            report.merge(&split.coercion);
        }
        if let Ok(groups) = &self.groups {
            report.merge(&groups.coercion);
        }
        report
    }
}

/// Run the decomposition, the group analysis and the composite on one table
///
/// When the group column exists, unlabeled rows are dropped before the
/// decomposition as well, so both metrics describe the same rows.
pub fn analyze(table: &Table, config: &DevianceConfig) -> TableAnalysis {
    let split = if table.has_column(&config.group_column) {
        table
            .retain_labeled(&config.group_column)
            .and_then(|labeled| {
                if labeled.row_count() == 0 {
                    Err(DevianceError::EmptyAfterFilter {
                        column: config.group_column.clone(),
                    })
                } else {
                    reduced_vs_original_deviance(&labeled, config)
                }
            })
    } else {
        reduced_vs_original_deviance(table, config)
    };

    let options = GroupOptions {
        standardize: config.standardize_group_features,
    };
    let groups = within_group_deviance(
        table,
        &config.group_column,
        &config.reduced_column_candidates,
        options,
    );

    let total_dev_lost = match (&split, &groups) {
        (Ok(split), Ok(groups)) => total_deviance_lost(split, groups),
        _ => f64::NAN,
    };

    TableAnalysis {
        split,
        groups,
        total_dev_lost,
    }
}
