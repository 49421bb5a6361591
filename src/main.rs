use analytics::{AnalyticsEngine, HeatmapReport, RunParameters};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use configuration::{load_config, Config, LoggingSettings};
use core_types::{Highlight, MaskPolicy, MetricMode};
use ingest::{read_csv_path, Ingestor};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// The main entry point for the tradeclock application.
fn main() -> Result<()> {
    // A missing .env file is fine; configuration has defaults for everything.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config().context("Failed to load configuration")?;

    // Held until exit so buffered file logs are flushed.
    let _guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Finds the days and times of day where a strategy's trades perform best.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the day-of-week / time-of-day heatmap for a trade log.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Path to the trade log CSV.
    #[arg(long, short)]
    file: PathBuf,

    /// Per-trade metric to average. Defaults to `analysis.metric`.
    #[arg(long, value_enum)]
    metric: Option<MetricMode>,

    /// Highlighting rule. Defaults to `analysis.policy`.
    #[arg(long, value_enum)]
    policy: Option<MaskPolicy>,

    /// Reference time for the recent window (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS).
    /// Defaults to now.
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<NaiveDateTime>,

    /// Span of the recent window in days. Defaults to `analysis.recent_window_days`.
    #[arg(long)]
    recent_days: Option<i64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn parse_as_of(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(|_| format!("'{}' is neither YYYY-MM-DD nor YYYY-MM-DDTHH:MM:SS", value))
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr always, plus a daily-rotated file
/// when `logging.directory` is set. `RUST_LOG` wins over `logging.level`.
fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
    };

    // stdout is reserved for the report itself.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(filter());

    let (file_layer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tradeclock.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

/// Handles the orchestration of a single heatmap run.
fn handle_analyze(args: AnalyzeArgs, config: Config) -> Result<()> {
    let mut settings = config.analysis;
    if let Some(metric) = args.metric {
        settings.metric = metric;
    }
    if let Some(policy) = args.policy {
        settings.policy = policy;
    }
    if let Some(days) = args.recent_days {
        settings.recent_window_days = days;
    }
    let reference_time = args.as_of.unwrap_or_else(|| Local::now().naive_local());
    let params = RunParameters::from_settings(&settings, reference_time);

    let table = read_csv_path(&args.file)
        .with_context(|| format!("Failed to read trade log {}", args.file.display()))?;
    tracing::info!(file = %args.file.display(), rows = table.len(), "Trade log loaded.");

    let ingestor = Ingestor::new(config.ingest);
    let report = AnalyticsEngine::new()
        .run(&ingestor, &table, &params)
        .context("Heatmap analysis failed")?;

    match args.format {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }
    Ok(())
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn print_report(report: &HeatmapReport) {
    println!(
        "\n--- Heatmap: {} ({}) ---",
        report.parameters.metric.label(),
        report.parameters.policy
    );
    println!(
        "Trades: {} retained, {} excluded, {} since {}",
        report.total_records,
        report.excluded_records,
        report.recent_records,
        report.recent_cutoff.date()
    );
    if let Some(threshold) = report.global_threshold {
        println!("Global baseline: {}", threshold.round_dp(2));
    }

    let matrix = &report.matrix;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec![Cell::new("Time Opened")];
    header.extend(matrix.columns().iter().map(|column| Cell::new(column.label())));
    table.set_header(header);

    for (row, time_opened) in matrix.rows().iter().enumerate() {
        let mut cells = vec![Cell::new(time_opened)];
        for column in 0..matrix.columns().len() {
            cells.push(render_cell(matrix.get(row, column), report.mask.get(row, column)));
        }
        table.add_row(cells);
    }
    println!("{table}");
    println!("*  above baseline    ** above baseline in both windows");

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
}

fn render_cell(value: Option<Decimal>, highlight: Highlight) -> Cell {
    let Some(value) = value else {
        return Cell::new("-");
    };
    let text = value.round_dp(2).to_string();
    match highlight {
        Highlight::Unmarked => Cell::new(text),
        Highlight::AboveAverage => Cell::new(format!("{} *", text)).fg(Color::Yellow),
        Highlight::AboveAverageBoth => Cell::new(format!("{} **", text)).fg(Color::Green),
    }
}
