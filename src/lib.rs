//! Labelaudit: structural validation and box statistics for YOLO datasets.
//!
//! A dataset is a set of splits, each with an image folder and a label
//! folder of `.txt` files holding one `class cx cy w h` record per line.
//! Labelaudit produces two independent results from it: a per-split
//! validation report (unpaired files, malformed label files) and a flat
//! statistics table (box geometry and size classes) exported as CSV.
//!
//! # Modules
//!
//! - [`layout`]: Split names and folder path resolution
//! - [`scan`]: Folder listing and per-split entry counts
//! - [`validation`]: Image/label pairing and label file checks
//! - [`label`]: Label line parsing and size classification
//! - [`metrics`]: Dataset-wide box statistics
//! - [`export`]: Metrics CSV and plot inputs
//! - [`sink`]: Observer handles for audit decisions
//! - [`config`]: YAML configuration
//! - [`error`]: Error types for labelaudit operations

pub mod config;
pub mod error;
pub mod export;
pub mod label;
pub mod layout;
pub mod metrics;
pub mod scan;
pub mod sink;
pub mod validation;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::AuditConfig;
pub use error::AuditError;

use layout::Split;
use metrics::MetricsAggregator;
use scan::StructureScanner;
use validation::Validator;

/// The labelaudit CLI application.
#[derive(Parser)]
#[command(name = "labelaudit")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// YAML configuration file; flags override its values.
    #[arg(long, global = true, env = "LABELAUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Also append log lines to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Count image and label entries per split.
    Scan(ScanArgs),
    /// Check image/label pairing and label file format.
    Validate(ValidateArgs),
    /// Compute box statistics and optionally export them as CSV.
    Metrics(MetricsArgs),
    /// Scan, validate and export metrics in one run.
    Audit(AuditArgs),
    /// Print the chart series stored in a metrics CSV.
    PlotInputs(PlotInputsArgs),
}

/// Dataset selection shared by all dataset commands.
#[derive(clap::Args)]
struct DatasetArgs {
    /// Dataset root containing one folder per split.
    #[arg(env = "LABELAUDIT_DATASET")]
    dataset: Option<PathBuf>,

    /// Split to audit (repeatable, in report order).
    #[arg(long = "split")]
    splits: Vec<String>,

    /// Name of the image folder inside each split.
    #[arg(long)]
    images_dir_name: Option<String>,

    /// Name of the label folder inside each split.
    #[arg(long)]
    labels_dir_name: Option<String>,
}

/// Arguments for the scan subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Treat warnings as errors (exit non-zero if any image lacks a label).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the metrics subcommand.
#[derive(clap::Args)]
struct MetricsArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Write the table to this CSV file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output format for the table ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the audit subcommand.
#[derive(clap::Args)]
struct AuditArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Metrics CSV path (defaults to the configured location).
    #[arg(long)]
    csv: Option<PathBuf>,
}

/// Arguments for the plot-inputs subcommand.
#[derive(clap::Args)]
struct PlotInputsArgs {
    /// Metrics CSV written by 'metrics' or 'audit'.
    input: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_output(raw: &str) -> Result<OutputFormat, AuditError> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(AuditError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

/// Run the labelaudit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AuditError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Scan(args)) => run_scan(cli.config.as_deref(), args),
        Some(Commands::Validate(args)) => run_validate(cli.config.as_deref(), args),
        Some(Commands::Metrics(args)) => run_metrics(cli.config.as_deref(), args),
        Some(Commands::Audit(args)) => run_audit(cli.config.as_deref(), args),
        Some(Commands::PlotInputs(args)) => run_plot_inputs(args),
        None => {
            println!("labelaudit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Validation and box statistics for YOLO-style datasets.");
            println!();
            println!("Run 'labelaudit --help' for usage information.");
            Ok(())
        }
    }
}

/// Installs the process-wide `tracing` subscriber.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `info`). When
/// `log_file` is given, the same lines are appended there without colors.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), AuditError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // A subscriber may already be installed when embedded; keep it.
    if let Err(error) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
    {
        tracing::debug!(%error, "keeping the already installed tracing subscriber");
    }

    Ok(())
}

/// Merges the optional config file with command-line overrides.
fn resolve_config(
    config_path: Option<&Path>,
    args: &DatasetArgs,
) -> Result<AuditConfig, AuditError> {
    let mut config = match config_path {
        Some(path) => AuditConfig::from_yaml_file(path)?,
        None => AuditConfig::default(),
    };

    if let Some(dataset) = &args.dataset {
        config.dataset_dir = Some(dataset.clone());
    }
    if !args.splits.is_empty() {
        config.splits = args.splits.iter().map(|s| Split::from(s.as_str())).collect();
    }
    if let Some(name) = &args.images_dir_name {
        config.images_dirname = name.clone();
    }
    if let Some(name) = &args.labels_dir_name {
        config.labels_dirname = name.clone();
    }

    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AuditError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the scan subcommand.
fn run_scan(config_path: Option<&Path>, args: ScanArgs) -> Result<(), AuditError> {
    let output = parse_output(&args.output)?;
    let config = resolve_config(config_path, &args.dataset)?;
    let layout = config.layout();

    let report = StructureScanner::new(&layout).scan(&config.splits)?;

    match output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{}", report);
            Ok(())
        }
    }
}

/// Execute the validate subcommand.
fn run_validate(config_path: Option<&Path>, args: ValidateArgs) -> Result<(), AuditError> {
    let output = parse_output(&args.output)?;
    let config = resolve_config(config_path, &args.dataset)?;
    let layout = config.layout();

    let report = Validator::new(&layout).validate(&config.splits)?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(AuditError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the metrics subcommand.
fn run_metrics(config_path: Option<&Path>, args: MetricsArgs) -> Result<(), AuditError> {
    let output = parse_output(&args.output)?;
    let config = resolve_config(config_path, &args.dataset)?;
    let layout = config.layout();

    let table = MetricsAggregator::new(&layout).compute(&config.splits)?;

    if let Some(csv_path) = &args.csv {
        export::write_metrics_csv(csv_path, &table)?;
        tracing::info!(path = %csv_path.display(), "metrics CSV written");
    }

    match output {
        OutputFormat::Json => print_json(&table),
        OutputFormat::Text => {
            print!("{}", table);
            Ok(())
        }
    }
}

/// Execute the audit subcommand.
///
/// Findings are reported but do not fail the run; use `validate` for a
/// gating exit status.
fn run_audit(config_path: Option<&Path>, args: AuditArgs) -> Result<(), AuditError> {
    let config = resolve_config(config_path, &args.dataset)?;
    let layout = config.layout();

    let structure = StructureScanner::new(&layout).scan(&config.splits)?;
    print!("{}", structure);
    println!();

    let report = Validator::new(&layout).validate(&config.splits)?;
    print!("{}", report);
    println!();

    let table = MetricsAggregator::new(&layout).compute(&config.splits)?;
    print!("{}", table);

    let csv_path = args.csv.unwrap_or(config.metrics_csv);
    export::write_metrics_csv(&csv_path, &table)?;
    println!();
    println!("Metrics written to {}", csv_path.display());

    Ok(())
}

/// Execute the plot-inputs subcommand.
fn run_plot_inputs(args: PlotInputsArgs) -> Result<(), AuditError> {
    #[derive(Serialize)]
    struct PlotInputs {
        boxes: export::PlotSeries,
        box_sizes: export::PlotSeries,
    }

    let rows = export::read_metrics_csv(&args.input)?;
    let inputs = PlotInputs {
        boxes: export::box_geometry_series(&rows)?,
        box_sizes: export::box_size_series(&rows)?,
    };

    print_json(&inputs)
}
