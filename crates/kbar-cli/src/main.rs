use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use clap::{Parser, Subcommand};
use kbar_core::mapping::{DEFAULT_CONSUMER_PREFIX, write_mapping};
use kbar_core::universe::{load_universe, write_universe};
use kbar_core::validate::series_issues;
use kbar_core::{CandleStore, SourcePathResolver, schema};
use kbar_synth::catalog::{self, RowOrder};
use kbar_synth::generator::{DEFAULT_INTERVAL_SECONDS, DEFAULT_START_PRICE};
use kbar_synth::{BatchCandlePipeline, GenerationParams};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "kbar",
    about = "Generate synthetic kbar candles and symbol universes"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one random-walk candle series
    Kbar {
        /// Number of rows to generate
        #[arg(short = 'n', long)]
        length: usize,

        /// Output CSV path
        #[arg(short, long, default_value = "data/random_kbar.csv")]
        output: PathBuf,

        /// Seconds between candles
        #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECONDS)]
        interval_seconds: u64,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Instant the series ends at (RFC 3339, defaults to now)
        #[arg(long)]
        end_time: Option<DateTime<Utc>>,
    },

    /// Generate one candle file per universe symbol plus a mapping table
    Batch {
        /// Universe CSV to read symbols from
        #[arg(long, default_value = "data/universe.csv")]
        universe: PathBuf,

        /// Directory for per-symbol candle files
        #[arg(long, default_value = "data/kbar")]
        output_dir: PathBuf,

        /// Mapping CSV path
        #[arg(long, default_value = "data/kbar_mapping.csv")]
        mapping: PathBuf,

        /// Number of rows per symbol
        #[arg(short = 'n', long)]
        length: usize,

        /// Seconds between candles
        #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECONDS)]
        interval_seconds: u64,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Instant every series ends at (RFC 3339, defaults to now)
        #[arg(long)]
        end_time: Option<DateTime<Utc>>,

        /// Prefix from the consuming app's base directory to this working directory
        #[arg(long, default_value = DEFAULT_CONSUMER_PREFIX)]
        consumer_prefix: PathBuf,
    },

    /// Write the built-in instrument catalog as a universe CSV
    Universe {
        /// Output CSV path
        #[arg(short, long, default_value = "data/universe.csv")]
        output: PathBuf,

        /// Max rows to write after ordering
        #[arg(long)]
        limit: Option<usize>,

        /// Shuffle rows instead of sorting by filter/symbol/venue
        #[arg(long)]
        shuffle: bool,

        /// Random seed used with --shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check generated candle files and report issues
    Validate {
        /// Directory holding per-symbol candle files
        #[arg(long, default_value = "data/kbar")]
        output_dir: PathBuf,

        /// Symbols to validate (all if omitted, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,
    },
}

/// Series end instant, truncated to microseconds so written timestamps
/// carry at most six fractional digits.
fn resolve_anchor(end_time: Option<DateTime<Utc>>) -> DateTime<Utc> {
    end_time.unwrap_or_else(Utc::now).trunc_subsecs(6)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn cmd_kbar(
    output: &Path,
    length: usize,
    interval_seconds: u64,
    seed: Option<u64>,
    end_time: Option<DateTime<Utc>>,
) -> Result<()> {
    let params = GenerationParams::new(length, interval_seconds)?;
    let anchor = resolve_anchor(end_time);
    let mut rng = kbar_synth::rng_from_seed(seed);

    let candles = kbar_synth::generate(&params, &mut rng, anchor, DEFAULT_START_PRICE)?;
    ensure_parent(output)?;
    schema::write_csv(output, &candles)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Wrote {} rows to {}", candles.len(), output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_batch(
    universe: &Path,
    output_dir: &Path,
    mapping: &Path,
    length: usize,
    interval_seconds: u64,
    seed: Option<u64>,
    end_time: Option<DateTime<Utc>>,
    consumer_prefix: &Path,
) -> Result<()> {
    let params = GenerationParams::new(length, interval_seconds)?;
    let rows = load_universe(universe)?;
    info!("Loaded {} universe row(s) from {}", rows.len(), universe.display());

    let anchor = resolve_anchor(end_time);
    debug!("Series end at {}", schema::format_timestamp(&anchor));

    let pipeline = BatchCandlePipeline::new(
        CandleStore::new(output_dir),
        SourcePathResolver::new(consumer_prefix),
        params,
    );
    let summary = pipeline
        .run_seeded(&rows, seed, anchor)
        .with_context(|| format!("failed to generate candles into {}", output_dir.display()))?;

    write_mapping(mapping, &summary.mapping)
        .with_context(|| format!("failed to write mapping {}", mapping.display()))?;

    println!(
        "Wrote {} symbol file(s) to {} and mapping to {}",
        summary.symbols_written(),
        output_dir.display(),
        mapping.display()
    );
    Ok(())
}

fn cmd_universe(
    output: &Path,
    limit: Option<usize>,
    shuffle: bool,
    seed: Option<u64>,
) -> Result<()> {
    let order = if shuffle {
        RowOrder::Shuffled { seed }
    } else {
        RowOrder::Sorted
    };

    let rows = catalog::order_rows(catalog::build_rows(), order);
    let rows = catalog::limit_rows(rows, limit)?;
    write_universe(output, &rows)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Wrote {} rows to {} ({})",
        rows.len(),
        output.display(),
        catalog::summarize(&rows)
    );
    Ok(())
}

fn cmd_validate(store: &CandleStore, symbols: Option<&[String]>) -> Result<()> {
    let all_symbols = store.list_symbols().context("failed to list symbols")?;

    let symbols_to_check: Vec<&str> = match symbols {
        Some(list) => list.iter().map(|s| s.as_str()).collect(),
        None => all_symbols.iter().map(|s| s.as_str()).collect(),
    };

    if symbols_to_check.is_empty() {
        println!("No data to validate.");
        return Ok(());
    }

    let mut issues = 0;

    for sym in &symbols_to_check {
        match store.read_series(sym) {
            Ok(candles) => {
                for issue in series_issues(&candles) {
                    println!("WARN: {sym}: {issue}");
                    issues += 1;
                }
            }
            Err(e) => {
                println!("ERROR: {sym}: failed to read: {e}");
                issues += 1;
            }
        }
    }

    if issues == 0 {
        println!("All files valid.");
    } else {
        println!("{issues} issue(s) found.");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match &cli.command {
        Commands::Kbar {
            length,
            output,
            interval_seconds,
            seed,
            end_time,
        } => {
            cmd_kbar(output, *length, *interval_seconds, *seed, *end_time)?;
        }
        Commands::Batch {
            universe,
            output_dir,
            mapping,
            length,
            interval_seconds,
            seed,
            end_time,
            consumer_prefix,
        } => {
            cmd_batch(
                universe,
                output_dir,
                mapping,
                *length,
                *interval_seconds,
                *seed,
                *end_time,
                consumer_prefix,
            )?;
        }
        Commands::Universe {
            output,
            limit,
            shuffle,
            seed,
        } => {
            cmd_universe(output, *limit, *shuffle, *seed)?;
        }
        Commands::Validate {
            output_dir,
            symbols,
        } => {
            cmd_validate(&CandleStore::new(output_dir), symbols.as_deref())?;
        }
    }

    Ok(())
}
