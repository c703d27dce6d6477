//! Deviance lost to clustering alone, for several clusterings of one table
//!
//! The table carries one label column per clustering (`Cluster_5`,
//! `Cluster_33`, ...) and no reduced representation. Features are z-scored
//! and the intra-cluster deviance of each clustering is normalized by the
//! total deviance of the features.

use crate::batch::TableReport;
use crate::config::DevianceConfig;
use crate::deviance::{total_deviance, within_group_deviance, GroupOptions};
use crate::error::{DevianceError, Result};
use crate::table::Table;
use tracing::{debug, info, warn};

/// Evaluate every `<prefix><k>` label column of `table`
///
/// Fails as a whole only when there is no label column or no feature
/// column. A clustering that cannot be evaluated yields a NaN row carrying
/// its error; the others are still reported.
pub fn process_multi_cluster(table: &Table, config: &DevianceConfig) -> Result<Vec<TableReport>> {
    let prefix = config.cluster_column_prefix.as_str();
    let cluster_columns: Vec<&str> = table
        .column_names()
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();
    if cluster_columns.is_empty() {
        return Err(DevianceError::NoClusterColumns {
            prefix: prefix.to_string(),
        });
    }
    debug!(columns = ?cluster_columns, "cluster columns");

    let features: Vec<&str> = table
        .numeric_column_names()
        .into_iter()
        .filter(|name| !cluster_columns.contains(name) && !config.is_excluded(name))
        .collect();
    if features.is_empty() {
        return Err(DevianceError::NoOriginalColumns {
            excluded: config.excluded_column_candidates.clone(),
        });
    }
    debug!(columns = ?features, "feature columns");

    let total = total_deviance(table, &features, true)?;
    info!(total_deviance = total, "total deviance without clustering");

    let options = GroupOptions { standardize: true };
    let reports = cluster_columns
        .iter()
        .map(|column| {
            let clusters = column[prefix.len()..].parse::<u32>().ok();
            match within_group_deviance(table, column, &features, options) {
                Ok(groups) => {
                    let normalized_intra = if total > 0.0 {
                        groups.total / total
                    } else {
                        0.0
                    };
                    info!(
                        column,
                        intra_total = groups.total,
                        total_dev_lost = normalized_intra,
                        "processed clustering"
                    );
                    TableReport {
                        filename: column.to_string(),
                        components: Some(0),
                        clusters,
                        deviance_retained: 1.0,
                        deviance_lost: 0.0,
                        intra_cluster_total: groups.total,
                        total_dev_lost: normalized_intra,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(column, error = %e, "clustering could not be evaluated");
                    let mut report = TableReport::failed(*column, format!("Error: {}", e));
                    report.components = Some(0);
                    report.clusters = clusters;
                    report
                }
            }
        })
        .collect();

    Ok(reports)
}
