//! Error taxonomy for deviance computations
//!
//! Every variant aborts the single computation it applies to. Batch callers
//! record the message next to a NaN result and move on to the next table.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading tables or computing deviance metrics
#[derive(Error, Debug)]
pub enum DevianceError {
    #[error("No reduced columns detected. Expected one of: {}", .candidates.join(", "))]
    NoReducedColumns { candidates: Vec<String> },

    #[error("No original columns detected after excluding: {}", .excluded.join(", "))]
    NoOriginalColumns { excluded: Vec<String> },

    #[error(
        "Original features have zero total deviance after normalization; cannot compute deviance ratio{}",
        degenerate_suffix(.degenerate_columns)
    )]
    ZeroDeviance { degenerate_columns: Vec<String> },

    #[error("Table must contain a '{column}' column")]
    MissingGroupColumn { column: String },

    #[error("No rows with a valid '{column}' found after filtering")]
    EmptyAfterFilter { column: String },

    #[error("No feature columns found. Expected one of: {}", .requested.join(", "))]
    NoFeatureColumns { requested: Vec<String> },

    #[error("No cluster columns found. Expected columns starting with '{prefix}'")]
    NoClusterColumns { prefix: String },

    #[error("Row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path is not a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DevianceError {
    /// True for the degenerate-ratio case (zero or NaN original deviance)
    pub fn is_degenerate(&self) -> bool {
        matches!(self, DevianceError::ZeroDeviance { .. })
    }
}

fn degenerate_suffix(columns: &[String]) -> String {
    if columns.is_empty() {
        String::new()
    } else {
        format!(" (constant columns: {})", columns.join(", "))
    }
}

/// Result type for deviance operations
pub type Result<T> = std::result::Result<T, DevianceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_deviance_names_degenerate_columns() {
        let err = DevianceError::ZeroDeviance {
            degenerate_columns: vec!["B".to_string()],
        };
        assert!(err.is_degenerate());
        assert!(err.to_string().contains("constant columns: B"));
    }

    #[test]
    fn test_zero_deviance_without_columns() {
        let err = DevianceError::ZeroDeviance {
            degenerate_columns: vec![],
        };
        assert!(err.to_string().ends_with("cannot compute deviance ratio"));
    }

    #[test]
    fn test_no_reduced_columns_lists_candidates() {
        let err = DevianceError::NoReducedColumns {
            candidates: vec!["Principale1".to_string(), "Principale2".to_string()],
        };
        assert!(!err.is_degenerate());
        assert_eq!(
            err.to_string(),
            "No reduced columns detected. Expected one of: Principale1, Principale2"
        );
    }

    #[test]
    fn test_empty_after_filter_message() {
        let err = DevianceError::EmptyAfterFilter {
            column: "Cluster".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No rows with a valid 'Cluster' found after filtering"
        );
    }
}
