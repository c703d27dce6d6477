use crate::config::DevianceConfig;
use crate::deviance::stats::{standardize, sum_squared_deviations};
use crate::error::{DevianceError, Result};
use crate::table::{CoercionReport, LenientParser, Table};
use serde::Serialize;
use tracing::{debug, warn};

/// How much of the original features' deviance the reduced columns keep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevianceSplit {
    /// `1 - deviance_retained`
    pub deviance_lost: f64,
    /// `reduced_deviance / original_deviance`, not clamped to [0, 1]
    pub deviance_retained: f64,
    /// Sum of squared deviations of the raw reduced columns
    pub reduced_deviance: f64,
    /// Sum of squared deviations of the z-scored original columns
    pub original_deviance: f64,
    pub reduced_columns: Vec<String>,
    pub original_columns: Vec<String>,
    pub coercion: CoercionReport,
}

/// Compare the deviance of the reduced columns with that of the original ones
///
/// Reduced candidates that did not load as numbers are coerced leniently;
/// cells that still fail are dropped and counted in the returned
/// `CoercionReport`. Original columns are z-scored independently before their
/// deviance is summed, reduced columns are used raw.
///
/// # Errors
/// * `NoReducedColumns` when no candidate is present and numeric
/// * `NoOriginalColumns` when nothing is left after removing reduced and
///   excluded columns
/// * `ZeroDeviance` when the original deviance is zero or NaN (constant
///   columns are named in the error)
pub fn reduced_vs_original_deviance(
    table: &Table,
    config: &DevianceConfig,
) -> Result<DevianceSplit> {
    let mut table = table.clone();
    let mut coercion = CoercionReport::new();

    for candidate in &config.reduced_column_candidates {
        if table.has_column(candidate) && !table.is_numeric_column(candidate) {
            let dropped = table.coerce_numeric(candidate, &LenientParser);
            coercion.record(candidate, dropped);
        }
    }
    if !coercion.is_empty() {
        warn!(
            dropped = coercion.total(),
            columns = ?coercion.dropped,
            "unparseable values treated as missing"
        );
    }

    let numeric = table.numeric_column_names();
    let reduced_columns: Vec<String> = config
        .reduced_column_candidates
        .iter()
        .filter(|c| numeric.contains(&c.as_str()))
        .cloned()
        .collect();
    debug!(columns = ?reduced_columns, "reduced columns");

    let original_columns: Vec<String> = numeric
        .iter()
        .filter(|c| !reduced_columns.iter().any(|r| r == *c) && !config.is_excluded(c))
        .map(|c| c.to_string())
        .collect();
    debug!(columns = ?original_columns, "original columns");

    if reduced_columns.is_empty() {
        return Err(DevianceError::NoReducedColumns {
            candidates: config.reduced_column_candidates.clone(),
        });
    }
    if original_columns.is_empty() {
        return Err(DevianceError::NoOriginalColumns {
            excluded: config.excluded_column_candidates.clone(),
        });
    }

    let mut original_deviance = 0.0;
    let mut degenerate_columns = Vec::new();
    for name in &original_columns {
        let values = table.numeric_values(name).unwrap_or_default();
        let contribution = sum_squared_deviations(&standardize(&values));
        if contribution.is_nan() {
            degenerate_columns.push(name.clone());
        }
        original_deviance += contribution;
    }

    let reduced_deviance: f64 = reduced_columns
        .iter()
        .map(|name| sum_squared_deviations(&table.numeric_values(name).unwrap_or_default()))
        .sum();

    if original_deviance == 0.0 || original_deviance.is_nan() {
        if !degenerate_columns.is_empty() {
            warn!(columns = ?degenerate_columns, "original columns have zero variance");
        }
        return Err(DevianceError::ZeroDeviance { degenerate_columns });
    }

    let deviance_retained = reduced_deviance / original_deviance;
    let deviance_lost = 1.0 - deviance_retained;

    debug!(
        reduced_deviance,
        original_deviance, deviance_retained, deviance_lost, "deviance split"
    );

    Ok(DevianceSplit {
        deviance_lost,
        deviance_retained,
        reduced_deviance,
        original_deviance,
        reduced_columns,
        original_columns,
        coercion,
    })
}
