//! CLI argument parsing for the `deviance` tool

use crate::config::DevianceConfig;
use crate::table::DecimalSeparator;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Built-in column layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// vmstat samples, six principal components
    Vmstat,
    /// JMeter result logs, five principal components
    Jmeter,
    /// /proc/meminfo samples, four principal components
    Meminfo,
}

impl Preset {
    pub fn config(self) -> DevianceConfig {
        match self {
            Preset::Vmstat => DevianceConfig::vmstat(),
            Preset::Jmeter => DevianceConfig::jmeter(),
            Preset::Meminfo => DevianceConfig::meminfo(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "deviance")]
#[command(version)]
#[command(
    about = "Deviance lost to PCA reduction and clustering, from CSV exports",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// TOML configuration file (overrides --preset)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in column layout
    #[arg(long, global = true, value_enum, default_value = "vmstat")]
    pub preset: Preset,

    /// Decimal mark of the input files
    #[arg(long, global = true, value_enum)]
    pub decimal: Option<DecimalSeparator>,

    /// Field delimiter of the input files
    #[arg(long, global = true, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Output format (text, json or csv)
    #[arg(long = "format", global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Deviance retained and lost by the reduced columns
    Split {
        /// Input CSV file
        file: PathBuf,
    },

    /// Intra-cluster deviance per group
    Groups {
        /// Input CSV file
        file: PathBuf,

        /// Group label column (defaults to the configured one)
        #[arg(long, value_name = "COLUMN")]
        group_column: Option<String>,

        /// Feature columns (defaults to the reduced candidates)
        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        features: Vec<String>,

        /// Z-score features before grouping
        #[arg(long)]
        standardize: bool,
    },

    /// Split, groups and total deviance lost for one file
    Analyze {
        /// Input CSV file
        file: PathBuf,

        /// List every cluster, not only the total
        #[arg(long)]
        per_group: bool,
    },

    /// Analyze every CSV file of a directory
    Batch {
        /// Directory with CSV files
        dir: PathBuf,

        /// Write the CSV summary to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Append to the summary file instead of overwriting it
        #[arg(long, requires = "output")]
        append: bool,
    },

    /// Deviance lost by several clusterings (Cluster_<k> columns) of one file
    Multi {
        /// Input CSV file
        file: PathBuf,

        /// Write the CSV summary to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Append to the summary file instead of overwriting it
        #[arg(long, requires = "output")]
        append: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_split() {
        let cli = Cli::parse_from(["deviance", "split", "data.csv"]);
        match cli.command {
            Command::Split { file } => assert_eq!(file, PathBuf::from("data.csv")),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.global.format, OutputFormat::Text);
        assert_eq!(cli.global.preset, Preset::Vmstat);
        assert!(!cli.global.debug);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "deviance",
            "analyze",
            "data.csv",
            "--format",
            "json",
            "--decimal",
            "period",
            "--delimiter",
            ";",
            "--debug",
        ]);
        assert_eq!(cli.global.format, OutputFormat::Json);
        assert_eq!(cli.global.decimal, Some(DecimalSeparator::Period));
        assert_eq!(cli.global.delimiter, Some(';'));
        assert!(cli.global.debug);
    }

    #[test]
    fn test_cli_groups_feature_list() {
        let cli = Cli::parse_from([
            "deviance",
            "groups",
            "data.csv",
            "--group-column",
            "Cluster_5",
            "--features",
            "Principale1,Principale2",
            "--standardize",
        ]);
        match cli.command {
            Command::Groups {
                group_column,
                features,
                standardize,
                ..
            } => {
                assert_eq!(group_column.as_deref(), Some("Cluster_5"));
                assert_eq!(features, vec!["Principale1", "Principale2"]);
                assert!(standardize);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_preset() {
        let cli = Cli::parse_from(["deviance", "--preset", "jmeter", "batch", "out"]);
        assert_eq!(cli.global.preset, Preset::Jmeter);
        assert_eq!(cli.global.preset.config(), DevianceConfig::jmeter());
    }

    #[test]
    fn test_cli_append_requires_output() {
        assert!(Cli::try_parse_from(["deviance", "batch", "out", "--append"]).is_err());

        let cli = Cli::parse_from(["deviance", "batch", "out", "-o", "s.csv", "--append"]);
        match cli.command {
            Command::Batch { output, append, .. } => {
                assert_eq!(output, Some(PathBuf::from("s.csv")));
                assert!(append);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["deviance"]).is_err());
    }
}
