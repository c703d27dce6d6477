//! Property-based tests for the deviance engine
//!
//! Properties covered:
//! 1. Retained and lost deviance always sum to one
//! 2. Intra-cluster deviance is non-negative and sums to its total
//! 3. Single-row groups carry zero deviance
//! 4. Row order never changes a result
//! 5. Offsetting an original column leaves the standardized deviance unchanged

use deviance_engine::config::DevianceConfig;
use deviance_engine::deviance::{
    reduced_vs_original_deviance, stats, within_group_deviance, GroupOptions,
};
use deviance_engine::table::{Column, Table};
use proptest::prelude::*;

fn config() -> DevianceConfig {
    DevianceConfig {
        reduced_column_candidates: vec!["R".to_string()],
        excluded_column_candidates: vec!["Cluster".to_string()],
        ..DevianceConfig::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

/// Rows of (original a, original b, reduced r, cluster label)
fn rows_strategy() -> impl Strategy<Value = Vec<(f64, f64, f64, u8)>> {
    prop::collection::vec(
        (-1000.0f64..1000.0, -1000.0f64..1000.0, -50.0f64..50.0, 0u8..4),
        3..40,
    )
}

fn build(rows: &[(f64, f64, f64, u8)]) -> Table {
    let a: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let b: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let r: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let labels: Vec<String> = rows.iter().map(|r| format!("c{}", r.3)).collect();
    Table::from_columns(vec![
        Column::numeric("A", &a),
        Column::numeric("B", &b),
        Column::numeric("R", &r),
        Column::text("Cluster", &labels),
    ])
    .unwrap()
}

fn non_degenerate(rows: &[(f64, f64, f64, u8)]) -> bool {
    let a: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let b: Vec<f64> = rows.iter().map(|r| r.1).collect();
    stats::population_std(&a) > 1e-6 && stats::population_std(&b) > 1e-6
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_retained_plus_lost_is_one(rows in rows_strategy()) {
        prop_assume!(non_degenerate(&rows));
        let split = reduced_vs_original_deviance(&build(&rows), &config()).unwrap();

        prop_assert!(close(split.deviance_retained + split.deviance_lost, 1.0));
        prop_assert!(split.reduced_deviance >= 0.0);
        // Two z-scored columns of N rows carry deviance 2N
        prop_assert!(close(split.original_deviance, 2.0 * rows.len() as f64));
    }

    #[test]
    fn prop_group_deviance_non_negative(rows in rows_strategy()) {
        let groups = within_group_deviance(
            &build(&rows),
            "Cluster",
            &["A", "B", "R"],
            GroupOptions::default(),
        )
        .unwrap();

        prop_assert!(groups.total >= 0.0);
        prop_assert!(groups.groups.values().all(|d| *d >= 0.0));
        let sum: f64 = groups.groups.values().sum();
        prop_assert!(close(sum, groups.total));
        prop_assert_eq!(groups.rows, rows.len());
    }

    #[test]
    fn prop_single_row_groups_are_zero(values in prop::collection::vec(-1e6f64..1e6, 1..30)) {
        let labels: Vec<String> = (0..values.len()).map(|i| format!("g{}", i)).collect();
        let table = Table::from_columns(vec![
            Column::numeric("F", &values),
            Column::text("Cluster", &labels),
        ])
        .unwrap();
        let groups =
            within_group_deviance(&table, "Cluster", &["F"], GroupOptions::default()).unwrap();

        prop_assert_eq!(groups.groups.len(), values.len());
        prop_assert!(groups.groups.values().all(|d| *d == 0.0));
        prop_assert_eq!(groups.total, 0.0);
    }

    #[test]
    fn prop_row_order_independent(rows in rows_strategy(), seed in any::<u64>()) {
        prop_assume!(non_degenerate(&rows));
        let mut shuffled = rows.clone();
        // Deterministic Fisher-Yates driven by the seed
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }

        let original = build(&rows);
        let permuted = build(&shuffled);

        let s1 = reduced_vs_original_deviance(&original, &config()).unwrap();
        let s2 = reduced_vs_original_deviance(&permuted, &config()).unwrap();
        prop_assert!(close(s1.deviance_retained, s2.deviance_retained));
        prop_assert!(close(s1.original_deviance, s2.original_deviance));

        let options = GroupOptions::default();
        let g1 = within_group_deviance(&original, "Cluster", &["R"], options).unwrap();
        let g2 = within_group_deviance(&permuted, "Cluster", &["R"], options).unwrap();
        prop_assert_eq!(g1.groups.len(), g2.groups.len());
        for (label, d1) in &g1.groups {
            prop_assert!(close(*d1, g2.groups[label]));
        }
    }

    #[test]
    fn prop_offset_does_not_change_standardized_deviance(
        rows in rows_strategy(),
        offset in -1e4f64..1e4,
    ) {
        prop_assume!(non_degenerate(&rows));
        let shifted: Vec<_> = rows.iter().map(|r| (r.0 + offset, r.1, r.2, r.3)).collect();

        let s1 = reduced_vs_original_deviance(&build(&rows), &config()).unwrap();
        let s2 = reduced_vs_original_deviance(&build(&shifted), &config()).unwrap();
        prop_assert!((s1.original_deviance - s2.original_deviance).abs() < 1e-6);
    }

    #[test]
    fn prop_standardize_matches_manual(values in prop::collection::vec(-1e3f64..1e3, 2..40)) {
        prop_assume!(stats::population_std(&values) > 1e-6);
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        let manual: Vec<f64> = values.iter().map(|v| (v - mean) / std).collect();

        let z = stats::standardize(&values);
        for (a, b) in z.iter().zip(&manual) {
            prop_assert!(close(*a, *b));
        }
        let ssd = stats::sum_squared_deviations(&z);
        prop_assert!(close(ssd, stats::sum_squared_deviations(&manual)));
    }
}
