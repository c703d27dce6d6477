//! Human-readable console reports

use crate::batch::TableReport;
use crate::deviance::{DevianceSplit, GroupDeviance, TableAnalysis};
use crate::table::CoercionReport;

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn format_split(split: &DevianceSplit) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Reduced columns: {}\n",
        split.reduced_columns.join(", ")
    ));
    output.push_str(&format!(
        "Original columns: {}\n",
        split.original_columns.join(", ")
    ));
    output.push_str(&format!(
        "Deviance retained: {}\n",
        percent(split.deviance_retained)
    ));
    output.push_str(&format!("Deviance lost: {}\n", percent(split.deviance_lost)));
    output
}

/// Per-group lines are included when `per_group` is set; the total always is
pub fn format_groups(groups: &GroupDeviance, per_group: bool) -> String {
    let mut output = String::from("Intra-cluster deviances:\n");
    if per_group {
        for (label, deviance) in &groups.groups {
            output.push_str(&format!("Cluster {}: {:.4}\n", label, deviance));
        }
    }
    output.push_str(&format!("Cluster total: {:.4}\n", groups.total));

    if !groups.dropped_features.is_empty() {
        output.push_str(&format!(
            "Warning: constant feature(s) dropped: {}\n",
            groups.dropped_features.join(", ")
        ));
    }
    for (label, features) in &groups.empty_features {
        output.push_str(&format!(
            "Warning: cluster {} has no values for {}; they add no deviance\n",
            label,
            features.join(", ")
        ));
    }
    output
}

pub fn format_coercion(coercion: &CoercionReport) -> String {
    coercion
        .dropped
        .iter()
        .map(|(column, dropped)| {
            format!(
                "Warning: {} value(s) in '{}' could not be parsed and were treated as missing\n",
                dropped, column
            )
        })
        .collect()
}

/// The single-table report: split, groups, composite, then problems
pub fn format_analysis(analysis: &TableAnalysis, per_group: bool) -> String {
    let mut output = String::new();
    if let Ok(split) = &analysis.split {
        output.push_str(&format_split(split));
    }
    if let Ok(groups) = &analysis.groups {
        output.push_str(&format_groups(groups, per_group));
    }
    output.push_str(&format!(
        "Total deviance lost: {:.4}\n",
        analysis.total_dev_lost
    ));
    output.push_str(&format_coercion(&analysis.coercion()));
    for error in analysis.errors() {
        output.push_str(&format!("Error: {}\n", error));
    }
    output
}

/// One line per table of a batch or multi-clustering run
pub fn format_summary(reports: &[TableReport]) -> String {
    let mut output = String::new();
    for report in reports {
        output.push_str(&format!(
            "{}: retained={:.6}, lost={:.6}, intra_total={:.6}, total_dev_lost={:.6}",
            report.filename,
            report.deviance_retained,
            report.deviance_lost,
            report.intra_cluster_total,
            report.total_dev_lost
        ));
        if let Some(error) = &report.error {
            output.push_str(&format!(" [{}]", error));
        }
        output.push('\n');
    }
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    output.push_str(&format!(
        "Processed {} table(s), {} with errors\n",
        reports.len(),
        failed
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DevianceConfig;
    use crate::deviance::analyze;
    use crate::table::{Column, Table};

    fn analysis() -> TableAnalysis {
        let table = Table::from_columns(vec![
            Column::numeric("us", &[1.0, 2.0, 3.0, 4.0]),
            Column::numeric("Principale1", &[0.0, 1.0, 0.0, 1.0]),
            Column::text("Cluster", &["x", "x", "y", "y"]),
        ])
        .unwrap();
        analyze(&table, &DevianceConfig::vmstat())
    }

    #[test]
    fn test_format_analysis() {
        let out = format_analysis(&analysis(), false);
        assert!(out.contains("Deviance retained: 25.00%"));
        assert!(out.contains("Deviance lost: 75.00%"));
        assert!(out.contains("Cluster total: 1.0000"));
        assert!(!out.contains("Cluster x:"));
        // 0.75 + (1 / 1) * 0.25
        assert!(out.contains("Total deviance lost: 1.0000"));
    }

    #[test]
    fn test_format_analysis_per_group() {
        let out = format_analysis(&analysis(), true);
        assert!(out.contains("Cluster x: 0.5000"));
        assert!(out.contains("Cluster y: 0.5000"));
    }

    #[test]
    fn test_format_groups_shows_empty_and_dropped_features() {
        let table = Table::from_columns(vec![
            Column::text("Cluster", &["x", "x", "y", "y"]),
            Column::numeric("F", &[1.0, 3.0, 5.0, 7.0]),
            Column::numeric("G", &[1.0, 2.0, f64::NAN, f64::NAN]),
            Column::numeric("K", &[4.0, 4.0, 4.0, 4.0]),
        ])
        .unwrap();
        let options = crate::deviance::GroupOptions { standardize: true };
        let groups =
            crate::deviance::within_group_deviance(&table, "Cluster", &["F", "G", "K"], options)
                .unwrap();

        let out = format_groups(&groups, false);
        assert!(out.contains("Warning: constant feature(s) dropped: K"));
        assert!(out.contains("Warning: cluster y has no values for G"));
        assert!(!out.contains("cluster x has no values"));
    }

    #[test]
    fn test_format_summary_counts_errors() {
        let reports = vec![TableReport::failed("bad.csv", "read error: boom")];
        let out = format_summary(&reports);
        assert!(out.contains("bad.csv: retained=NaN"));
        assert!(out.contains("[read error: boom]"));
        assert!(out.ends_with("Processed 1 table(s), 1 with errors\n"));
    }
}
