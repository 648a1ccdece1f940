//! CLI for the capm analytics library.
//!
//! Reads aligned daily prices from CSV, then prints normalized prices, daily
//! returns, or beta and CAPM expected-return tables.

use anyhow::{Context, Result, bail};
use capm::{
    CapmAnalysis, CapmConfig, PriceSeries, PriceTable, daily_return, merge_series, normalize,
};
use clap::{Args, Parser, Subcommand};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "capm")]
#[command(about = "Beta and CAPM expected returns from daily prices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate beta and CAPM expected return for every instrument
    Analyze {
        #[command(flatten)]
        table: TableArgs,
        /// Print a JSON summary instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Print every series rebased to start at 1.0
    Normalize {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Print simple daily returns
    Returns {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Align per-symbol CSV histories with a benchmark on date
    Merge {
        /// Benchmark history (date column plus one price column)
        #[arg(long)]
        benchmark_file: PathBuf,
        /// Symbol of the benchmark; defaults to its price column name
        #[arg(long)]
        benchmark_symbol: Option<String>,
        /// Instrument histories, one CSV per symbol named by its price column
        #[arg(required = true)]
        series: Vec<PathBuf>,
        #[command(flatten)]
        columns: ColumnArgs,
        /// Write the aligned table here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Column naming shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
struct ColumnArgs {
    /// Name of the benchmark column
    #[arg(long)]
    benchmark: Option<String>,
    /// Name of the date column
    #[arg(long)]
    date_column: Option<String>,
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Input table and analysis settings.
#[derive(Args, Debug, Clone)]
struct TableArgs {
    /// CSV file with a date column, instrument columns and the benchmark
    prices: PathBuf,
    #[command(flatten)]
    columns: ColumnArgs,
    /// Annual risk-free rate
    #[arg(long)]
    risk_free_rate: Option<f64>,
    /// Trading days per year used to annualize
    #[arg(long)]
    trading_days: Option<u32>,
    /// Only use the trailing number of years
    #[arg(long)]
    years: Option<u32>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { table, json } => analyze(&table, json),
        Commands::Normalize { table } => show_normalized(&table),
        Commands::Returns { table } => show_returns(&table),
        Commands::Merge {
            benchmark_file,
            benchmark_symbol,
            series,
            columns,
            output,
        } => merge(
            &benchmark_file,
            benchmark_symbol.as_deref(),
            &series,
            &columns,
            output.as_deref(),
        ),
    }
}

/// Resolve configuration: defaults, then the config file, then flags.
fn resolve_config(columns: &ColumnArgs) -> Result<CapmConfig> {
    let mut config = match &columns.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => CapmConfig::default(),
    };
    if let Some(benchmark) = &columns.benchmark {
        config.benchmark_column = benchmark.clone();
    }
    if let Some(date_column) = &columns.date_column {
        config.date_column = date_column.clone();
    }
    Ok(config)
}

fn resolve_table_config(args: &TableArgs) -> Result<CapmConfig> {
    let mut config = resolve_config(&args.columns)?;
    if let Some(rate) = args.risk_free_rate {
        config.risk_free_rate = rate;
    }
    if let Some(days) = args.trading_days {
        config.trading_days = days;
    }
    Ok(config)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Load, validate and optionally window the price table.
fn load_table(args: &TableArgs, config: &CapmConfig) -> Result<PriceTable> {
    let frame = read_csv(&args.prices)?;
    let mut table = PriceTable::new(frame, config)
        .with_context(|| format!("invalid price table {}", args.prices.display()))?;
    if let Some(years) = args.years {
        table = table.trailing_years(years)?;
    }
    info!(
        rows = table.height(),
        instruments = table.instruments().len(),
        "loaded price table"
    );
    Ok(table)
}

fn analyze(args: &TableArgs, json: bool) -> Result<()> {
    let config = resolve_table_config(args)?;
    let table = load_table(args, &config)?;
    let report = CapmAnalysis::with_config(config).run(&table)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
        return Ok(());
    }

    println!("Price table head\n{}\n", table.frame().head(Some(5)));
    println!("Price table tail\n{}\n", table.frame().tail(Some(5)));
    println!(
        "Market return: {:.4} (risk-free rate {:.4})\n",
        report.market_return, report.risk_free_rate
    );
    println!("Calculated beta values\n{}\n", report.beta_frame()?);
    println!("Calculated return using CAPM\n{}", report.return_frame()?);

    let failures = report.failures();
    if !failures.is_empty() {
        println!("\nSkipped instruments:");
        for (name, err) in failures {
            println!("  {name} - {err}");
        }
    }
    Ok(())
}

fn show_normalized(args: &TableArgs) -> Result<()> {
    let config = resolve_table_config(args)?;
    let table = load_table(args, &config)?;
    println!("{}", normalize(&table)?.frame());
    Ok(())
}

fn show_returns(args: &TableArgs) -> Result<()> {
    let config = resolve_table_config(args)?;
    let table = load_table(args, &config)?;
    println!("{}", daily_return(&table)?.frame());
    Ok(())
}

/// Read a history whose price column is the first non-date column.
fn read_series(path: &Path, date_column: &str) -> Result<PriceSeries> {
    let frame = read_csv(path)?;
    let Some(price_column) = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .find(|name| name != date_column)
    else {
        bail!("{} has no price column", path.display());
    };
    Ok(PriceSeries::from_frame(
        price_column.as_str(),
        frame,
        date_column,
        &price_column,
    )?)
}

/// Read the benchmark history, relabelled when a symbol is given.
fn read_benchmark(path: &Path, symbol: Option<&str>, date_column: &str) -> Result<PriceSeries> {
    let mut benchmark = read_series(path, date_column)?;
    if let Some(symbol) = symbol {
        benchmark = benchmark.with_symbol(symbol)?;
    }
    Ok(benchmark)
}

fn merge(
    benchmark_file: &Path,
    benchmark_symbol: Option<&str>,
    series: &[PathBuf],
    columns: &ColumnArgs,
    output: Option<&Path>,
) -> Result<()> {
    let config = resolve_config(columns)?;
    let benchmark = read_benchmark(benchmark_file, benchmark_symbol, &config.date_column)?;
    info!(symbol = benchmark.symbol(), "loaded benchmark");
    let instruments = series
        .iter()
        .map(|path| read_series(path, &config.date_column))
        .collect::<Result<Vec<_>>>()?;

    let mut frame = merge_series(&benchmark, &instruments, &config)?.into_frame();
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            CsvWriter::new(&mut file).finish(&mut frame)?;
            info!(path = %path.display(), rows = frame.height(), "wrote aligned table");
        }
        None => CsvWriter::new(std::io::stdout()).finish(&mut frame)?,
    }
    Ok(())
}
