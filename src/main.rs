//! storediff - Compare one table held in two stores

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use storediff::config::{Config, OutputFormat, SourceConfig};
use storediff::output::{render_to_stdout, Report, Side};
use storediff::source;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Structural and content diff for one table held in two stores (CSV, JSON, spreadsheets)
#[derive(Parser, Debug)]
#[command(name = "storediff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Left-hand source file
    #[arg(required_unless_present = "config", requires = "right")]
    left: Option<PathBuf>,

    /// Right-hand source file
    right: Option<PathBuf>,

    /// YAML config describing both sources; other flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Table to compare (defaults to the left file's stem)
    #[arg(long)]
    table: Option<String>,

    /// Primary key column(s) used to correlate rows (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// Column(s) to ignore in comparison (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore_column: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<CliOutputFormat>,

    /// For spreadsheets: which sheet to compare
    #[arg(long)]
    sheet: Option<String>,

    /// Only show statistics, not detailed changes
    #[arg(long)]
    stats_only: bool,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(has_diff) => {
            if has_diff {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "storediff=debug" } else { "storediff=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge the optional config file with command line flags
fn build_config(cli: Cli) -> Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(left) = cli.left {
        config.left = Some(SourceConfig::from_path(left)?);
    }
    if let Some(right) = cli.right {
        config.right = Some(SourceConfig::from_path(right)?);
    }
    for side in [&mut config.left, &mut config.right].into_iter().flatten() {
        if !cli.key.is_empty() {
            side.primary_key = cli.key.clone();
        }
        if let Some(ref sheet) = cli.sheet {
            side.sheet = Some(sheet.clone());
        }
    }

    if let Some(table) = cli.table {
        config = config.with_table(table);
    }
    config.ignore_columns.extend(cli.ignore_column);
    if let Some(format) = cli.format {
        config = config.with_output_format(format.into());
    }
    if cli.stats_only {
        config = config.with_stats_only(true);
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<bool> {
    let config = build_config(cli)?;
    let (left_config, right_config) = config.sources()?;
    let table = config.table_name()?;
    let differ = config.differ();

    let left = source::open(left_config);
    let right = source::open(right_config);
    tracing::debug!(table = %table, left = left.name(), right = right.name(), "comparing");

    let (left_table, right_table, result) =
        differ.diff_sources(left.as_ref(), right.as_ref(), &table)?;

    let report = Report::build(
        &differ,
        &table,
        Side {
            name: left.name(),
            table: &left_table,
        },
        Side {
            name: right.name(),
            table: &right_table,
        },
        &result,
    )?;
    render_to_stdout(&report, config.output_format, config.stats_only)?;

    Ok(result.has_diff())
}
