use anyhow::{Context, Result};
use clap::Parser;
use deviance_engine::{
    batch::{BatchRunner, TableReport},
    cli::{Cli, Command, GlobalArgs, OutputFormat},
    config::DevianceConfig,
    csv_output,
    deviance::{self, GroupOptions},
    json_output::{JsonAnalysis, JsonBatch},
    multi_cluster, report,
    table::TableLoader,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolve the configuration: preset or TOML file, then flag overrides
fn build_config(global: &GlobalArgs) -> Result<DevianceConfig> {
    let mut config = match &global.config {
        Some(path) => DevianceConfig::from_toml(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => global.preset.config(),
    };
    if let Some(decimal) = global.decimal {
        config.decimal = decimal;
    }
    if let Some(delimiter) = global.delimiter {
        config.delimiter = delimiter;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Emit a summary in the requested format, optionally also as a CSV file
fn emit_summary(
    reports: &[TableReport],
    format: OutputFormat,
    output: Option<&PathBuf>,
    append: bool,
) -> Result<()> {
    if let Some(path) = output {
        if append {
            csv_output::append_summary(path, reports)
                .with_context(|| format!("Failed to append summary: {}", path.display()))?;
            eprintln!("Summary appended to: {}", path.display());
        } else {
            let file = File::create(path)
                .with_context(|| format!("Failed to create summary: {}", path.display()))?;
            csv_output::write_summary(BufWriter::new(file), reports)?;
            eprintln!("Summary written to: {}", path.display());
        }
    }
    match format {
        OutputFormat::Text => print!("{}", report::format_summary(reports)),
        OutputFormat::Json => print_json(&JsonBatch::new(reports))?,
        OutputFormat::Csv => csv_output::write_summary(io::stdout().lock(), reports)?,
    }
    Ok(())
}

fn run_split(file: &Path, config: &DevianceConfig, format: OutputFormat) -> Result<()> {
    let table = TableLoader::from_config(config)
        .load_path(file)
        .with_context(|| format!("Failed to read table: {}", file.display()))?;
    let split = deviance::reduced_vs_original_deviance(&table, config)?;

    match format {
        OutputFormat::Text => {
            print!("{}", report::format_split(&split));
            print!("{}", report::format_coercion(&split.coercion));
        }
        OutputFormat::Json => print_json(&split)?,
        OutputFormat::Csv => {
            println!("deviance_retained,deviance_lost");
            println!("{:.6},{:.6}", split.deviance_retained, split.deviance_lost);
        }
    }
    Ok(())
}

fn run_groups(
    file: &Path,
    config: &DevianceConfig,
    format: OutputFormat,
    group_column: Option<String>,
    features: Vec<String>,
    standardize: bool,
) -> Result<()> {
    let table = TableLoader::from_config(config)
        .load_path(file)
        .with_context(|| format!("Failed to read table: {}", file.display()))?;
    let group_column = group_column.unwrap_or_else(|| config.group_column.clone());
    let features = if features.is_empty() {
        config.reduced_column_candidates.clone()
    } else {
        features
    };
    let groups = deviance::within_group_deviance(
        &table,
        &group_column,
        &features,
        GroupOptions { standardize },
    )?;

    match format {
        OutputFormat::Text => {
            print!("{}", report::format_groups(&groups, true));
            print!("{}", report::format_coercion(&groups.coercion));
        }
        OutputFormat::Json => print_json(&groups.to_map())?,
        OutputFormat::Csv => {
            println!("group,deviance");
            for (label, deviance) in groups.to_map() {
                println!("{},{:.6}", label, deviance);
            }
        }
    }
    Ok(())
}

fn run_analyze(
    file: &Path,
    config: &DevianceConfig,
    format: OutputFormat,
    per_group: bool,
) -> Result<()> {
    let table = TableLoader::from_config(config)
        .load_path(file)
        .with_context(|| format!("Failed to read table: {}", file.display()))?;
    let analysis = deviance::analyze(&table, config);
    let label = file_label(file);

    match format {
        OutputFormat::Text => print!("{}", report::format_analysis(&analysis, per_group)),
        OutputFormat::Json => print_json(&JsonAnalysis::from_analysis(label.as_str(), &analysis))?,
        OutputFormat::Csv => {
            let row = TableReport::from_analysis(label.as_str(), &analysis);
            csv_output::write_summary(io::stdout().lock(), std::slice::from_ref(&row))?;
        }
    }

    if let Some(first) = analysis.errors().into_iter().next() {
        anyhow::bail!("{}", first);
    }
    Ok(())
}

fn run_batch(
    dir: &Path,
    config: DevianceConfig,
    format: OutputFormat,
    output: Option<&PathBuf>,
    append: bool,
) -> Result<()> {
    let files = BatchRunner::discover(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    if files.is_empty() {
        eprintln!("No CSV files found in '{}'. Nothing to do.", dir.display());
        return Ok(());
    }
    let runner = BatchRunner::new(config);
    let reports = runner.run(&files);
    emit_summary(&reports, format, output, append)
}

fn run_multi(
    file: &Path,
    config: &DevianceConfig,
    format: OutputFormat,
    output: Option<&PathBuf>,
    append: bool,
) -> Result<()> {
    let table = TableLoader::from_config(config)
        .load_path(file)
        .with_context(|| format!("Failed to read table: {}", file.display()))?;
    let reports = multi_cluster::process_multi_cluster(&table, config)?;
    emit_summary(&reports, format, output, append)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.global.debug);

    let config = build_config(&args.global)?;
    let format = args.global.format;

    match args.command {
        Command::Split { file } => run_split(&file, &config, format),
        Command::Groups {
            file,
            group_column,
            features,
            standardize,
        } => run_groups(&file, &config, format, group_column, features, standardize),
        Command::Analyze { file, per_group } => run_analyze(&file, &config, format, per_group),
        Command::Batch {
            dir,
            output,
            append,
        } => run_batch(&dir, config, format, output.as_ref(), append),
        Command::Multi {
            file,
            output,
            append,
        } => run_multi(&file, &config, format, output.as_ref(), append),
    }
}
