// Deviance decomposition engine
//
// Deviance is the sum of squared deviations from a mean (SST). Two questions
// are answered over an observation table:
//
// 1. How much of the original features' deviance survives in a reduced
//    representation such as principal components (decomposition).
// 2. How compact the groups of a clustering are, as the deviance of each
//    group around its own mean vector (within-group deviance).
//
// Both feed a composite "total deviance lost" figure. Every computation is
// pure: it reads a table and returns plain data, and every mean is taken over
// exactly the rows being summed.

mod composite;
mod decomposition;
mod groups;
pub mod stats;

pub use composite::{analyze, total_deviance, total_deviance_lost, TableAnalysis};
pub use decomposition::{reduced_vs_original_deviance, DevianceSplit};
pub use groups::{within_group_deviance, GroupDeviance, GroupOptions, TOTAL_KEY};
