//! Deviance engine - how much information PCA reduction and clustering lose
//!
//! This library loads tabular performance measurements (vmstat samples,
//! JMeter logs, PCA/clustering exports) and computes:
//! - the fraction of the original features' deviance retained by a reduced
//!   representation,
//! - the intra-cluster deviance of a clustering,
//! - a composite "total deviance lost" figure combining both,
//!
//! for a single table, a directory of tables, or several clusterings at once.

pub mod batch;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod deviance;
pub mod error;
pub mod json_output;
pub mod multi_cluster;
pub mod report;
pub mod table;

pub use config::DevianceConfig;
pub use error::{DevianceError, Result};
