// Configuration for deviance decomposition
//
// Replaces hardcoded column lists with an explicit structure that can be
// loaded from TOML or picked from a preset per data source.

use crate::error::{DevianceError, Result};
use crate::table::{clean_header, DecimalSeparator};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn principal_components(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Principale{}", i)).collect()
}

/// Column selection and parsing settings for one deviance run
///
/// # Example
/// ```
/// use deviance_engine::config::DevianceConfig;
///
/// let config = DevianceConfig::default();
/// assert_eq!(config.group_column, "Cluster");
/// assert_eq!(config.reduced_column_candidates.len(), 6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevianceConfig {
    /// Candidate names of the reduced representation (principal components),
    /// in reporting order
    pub reduced_column_candidates: Vec<String>,

    /// Columns ignored entirely (metadata, labels, timestamps)
    pub excluded_column_candidates: Vec<String>,

    /// Group/cluster label column
    pub group_column: String,

    /// Prefix identifying label columns of several clusterings (`Cluster_33`)
    pub cluster_column_prefix: String,

    /// Decimal mark of the input files
    pub decimal: DecimalSeparator,

    /// Field delimiter of the input files
    pub delimiter: char,

    /// Z-score features over the labeled rows before measuring group spread
    pub standardize_group_features: bool,
}

impl Default for DevianceConfig {
    fn default() -> Self {
        Self::vmstat()
    }
}

impl DevianceConfig {
    /// vmstat samples reduced to six principal components
    pub fn vmstat() -> Self {
        Self {
            reduced_column_candidates: principal_components(6),
            excluded_column_candidates: names(&["swpd", "si", "so", "st", "Cluster", "time"]),
            group_column: "Cluster".to_string(),
            cluster_column_prefix: "Cluster_".to_string(),
            decimal: DecimalSeparator::Comma,
            delimiter: ',',
            standardize_group_features: false,
        }
    }

    /// JMeter result logs reduced to five principal components
    pub fn jmeter() -> Self {
        Self {
            reduced_column_candidates: principal_components(5),
            excluded_column_candidates: names(&[
                "responseCode",
                "responseMessage",
                "threadName",
                "dataType",
                "success",
                "failureMessage",
                "URL",
                "timeStamp",
                "label",
                "Cluster",
            ]),
            ..Self::vmstat()
        }
    }

    /// /proc/meminfo samples reduced to four principal components
    pub fn meminfo() -> Self {
        Self {
            reduced_column_candidates: principal_components(4),
            excluded_column_candidates: names(&[
                "AnonPages",
                "VmPTE",
                "Slab",
                "Colonna 25",
                "Cluster",
            ]),
            ..Self::vmstat()
        }
    }

    /// Load configuration from a TOML file; absent keys keep their defaults
    ///
    /// # Example TOML
    /// ```toml
    /// reduced_column_candidates = ["Principale1", "Principale2"]
    /// excluded_column_candidates = ["time", "Cluster"]
    /// group_column = "Cluster"
    /// decimal = "period"
    /// delimiter = ";"
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| DevianceError::Config(format!("failed to parse TOML: {}", e)))?;
        config.clean_names();
        config.validate()?;
        Ok(config)
    }

    /// Apply header cleaning to every configured column name
    pub fn clean_names(&mut self) {
        for name in self
            .reduced_column_candidates
            .iter_mut()
            .chain(self.excluded_column_candidates.iter_mut())
        {
            *name = clean_header(name);
        }
        self.group_column = clean_header(&self.group_column);
    }

    pub fn is_reduced(&self, column: &str) -> bool {
        self.reduced_column_candidates.iter().any(|c| c == column)
    }

    pub fn is_excluded(&self, column: &str) -> bool {
        self.excluded_column_candidates.iter().any(|c| c == column)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.reduced_column_candidates.is_empty() {
            return Err(DevianceError::Config(
                "reduced_column_candidates must not be empty".to_string(),
            ));
        }

        if let Some(both) = self
            .reduced_column_candidates
            .iter()
            .find(|c| self.is_excluded(c))
        {
            return Err(DevianceError::Config(format!(
                "column '{}' is both reduced and excluded",
                both
            )));
        }

        if self.group_column.trim().is_empty() {
            return Err(DevianceError::Config(
                "group_column must not be empty".to_string(),
            ));
        }

        if self.cluster_column_prefix.is_empty() {
            return Err(DevianceError::Config(
                "cluster_column_prefix must not be empty".to_string(),
            ));
        }

        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(DevianceError::Config(format!(
                "delimiter {:?} is not usable",
                self.delimiter
            )));
        }

        Ok(())
    }
}
