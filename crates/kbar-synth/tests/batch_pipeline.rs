//! End-to-end batch runs: universe file in, candle files and mapping out.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use kbar_core::mapping::write_mapping;
use kbar_core::universe::load_universe;
use kbar_core::{CandleStore, KbarError, SourcePathResolver};
use kbar_synth::{BatchCandlePipeline, GenerationParams, SynthError};

const UNIVERSE: &str = "filters,badge,symbol,name,market,venue\n\
Stocks,STK,AAPL,Apple Inc.,equity,NASDAQ\n\
Stocks,STK,,Nameless,equity,NASDAQ\n\
Stocks,STK,AAPL,dup,equity,NYSE\n\
Funds,ETF,SPY,SPDR S&P 500 ETF Trust,fund etf,NYSE Arca\n\
Forex;Indices,USD,NDQUSD,US Tech (NDQ) / US Dollar,index cfd,easyMarkets\n";

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap()
}

fn write_universe(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("universe.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

/// Run a full batch into `out` and return the mapping file path.
fn run_batch(universe: &Path, out: &Path, seed: u64) -> Result<PathBuf, SynthError> {
    let rows = load_universe(universe)?;
    let pipeline = BatchCandlePipeline::new(
        CandleStore::new(out.join("kbar")),
        SourcePathResolver::default(),
        GenerationParams::new(25, 60)?,
    );
    let summary = pipeline.run_seeded(&rows, Some(seed), anchor())?;
    let mapping_path = out.join("kbar_mapping.csv");
    write_mapping(&mapping_path, &summary.mapping)?;
    Ok(mapping_path)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn one_file_and_mapping_row_per_unique_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let universe = write_universe(dir.path(), UNIVERSE);
    let out = dir.path().join("out");

    let mapping_path = run_batch(&universe, &out, 42).unwrap();

    let store = CandleStore::new(out.join("kbar"));
    assert_eq!(store.list_symbols().unwrap(), vec!["AAPL", "NDQUSD", "SPY"]);

    let mapping = read(&mapping_path);
    let lines: Vec<&str> = mapping.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "symbol,name,exchange,source,filters,badge,market,venue");
    assert!(lines[1].starts_with("AAPL,Apple Inc.,NASDAQ,"));
    assert!(lines[2].starts_with("SPY,"));
    assert!(lines[3].contains(",Forex;Indices,USD,index cfd,easyMarkets"));
    assert!(!mapping.contains("dup"));
}

#[test]
fn identical_inputs_produce_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let universe = write_universe(dir.path(), UNIVERSE);
    let first = dir.path().join("first");
    let second = dir.path().join("second");

    run_batch(&universe, &first, 7).unwrap();
    run_batch(&universe, &second, 7).unwrap();

    for symbol in ["AAPL", "SPY", "NDQUSD"] {
        let file = format!("kbar/{symbol}.csv");
        assert_eq!(read(&first.join(&file)), read(&second.join(&file)));
    }
    // Sources differ only by the output root.
    let a = read(&first.join("kbar_mapping.csv")).replace("first", "root");
    let b = read(&second.join("kbar_mapping.csv")).replace("second", "root");
    assert_eq!(a, b);
}

#[test]
fn different_seed_changes_series() {
    let dir = tempfile::tempdir().unwrap();
    let universe = write_universe(dir.path(), UNIVERSE);
    let a = dir.path().join("a");
    let b = dir.path().join("b");

    run_batch(&universe, &a, 1).unwrap();
    run_batch(&universe, &b, 2).unwrap();

    assert_ne!(read(&a.join("kbar/AAPL.csv")), read(&b.join("kbar/AAPL.csv")));
}

#[test]
fn generated_files_pass_validation() {
    let dir = tempfile::tempdir().unwrap();
    let universe = write_universe(dir.path(), UNIVERSE);
    let out = dir.path().join("out");
    run_batch(&universe, &out, 3).unwrap();

    let store = CandleStore::new(out.join("kbar"));
    for symbol in store.list_symbols().unwrap() {
        let candles = store.read_series(&symbol).unwrap();
        assert_eq!(candles.len(), 25);
        assert!(kbar_core::validate::series_issues(&candles).is_empty());
    }
}

#[test]
fn universe_without_symbols_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let universe = write_universe(
        dir.path(),
        "filters,badge,symbol,name,market,venue\nStocks,STK,,Apple,equity,NASDAQ\n",
    );
    let out = dir.path().join("out");

    let err = run_batch(&universe, &out, 1).unwrap_err();
    assert!(matches!(err, SynthError::Core(KbarError::EmptyUniverse(_))));
    assert!(!out.exists());
}
