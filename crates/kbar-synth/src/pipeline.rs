//! Universe → per-symbol candle files + mapping table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kbar_core::{CandleStore, MappingRow, SourcePathResolver, UniverseRow};
use rand::Rng;
use tracing::{debug, info};

use crate::error::SynthError;
use crate::generator::{self, GenerationParams, DEFAULT_START_PRICE};

/// Keep the first row for each symbol, in first-seen order.
///
/// Returns the surviving rows and how many duplicates were dropped.
pub fn dedupe_by_symbol(rows: &[UniverseRow]) -> (Vec<UniverseRow>, usize) {
    let mut seen = HashSet::new();
    let unique: Vec<UniverseRow> = rows
        .iter()
        .filter(|row| seen.insert(row.symbol.as_str()))
        .cloned()
        .collect();
    let dropped = rows.len() - unique.len();
    (unique, dropped)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// One row per generated symbol, in processing order.
    pub mapping: Vec<MappingRow>,
    pub rows_per_symbol: usize,
    pub duplicates_dropped: usize,
}

impl BatchSummary {
    pub fn symbols_written(&self) -> usize {
        self.mapping.len()
    }
}

/// Generates one candle file per unique symbol from a single RNG stream.
///
/// Symbols consume the stream in first-seen order, so adding, removing or
/// reordering a symbol changes the series of every symbol after it.
pub struct BatchCandlePipeline {
    store: CandleStore,
    resolver: SourcePathResolver,
    params: GenerationParams,
}

impl BatchCandlePipeline {
    pub fn new(store: CandleStore, resolver: SourcePathResolver, params: GenerationParams) -> Self {
        Self {
            store,
            resolver,
            params,
        }
    }

    pub fn store(&self) -> &CandleStore {
        &self.store
    }

    /// Generate and write every symbol's series.
    ///
    /// `anchor` is shared by all symbols so every series ends at the same
    /// instant. Fails before writing anything when no symbol survives dedup.
    /// A failure mid-batch leaves already written files in place.
    pub fn run<R: Rng>(
        &self,
        rows: &[UniverseRow],
        rng: &mut R,
        anchor: DateTime<Utc>,
    ) -> Result<BatchSummary, SynthError> {
        let (unique, duplicates_dropped) = dedupe_by_symbol(rows);
        if unique.is_empty() {
            return Err(SynthError::NoSymbols);
        }
        if duplicates_dropped > 0 {
            info!("Dropped {duplicates_dropped} duplicate symbol row(s)");
        }

        let mut mapping = Vec::with_capacity(unique.len());
        for row in &unique {
            let candles = generator::generate(&self.params, rng, anchor, DEFAULT_START_PRICE)?;
            let path = self.store.write_series(&row.symbol, &candles)?;
            debug!(
                "{}: wrote {} candle(s) to {}",
                row.symbol,
                candles.len(),
                path.display()
            );
            mapping.push(MappingRow::from_universe(row, self.resolver.resolve(&path)));
        }

        info!(
            "Generated {} symbol(s) x {} candle(s) at {}s interval",
            mapping.len(),
            self.params.length(),
            self.params.interval_seconds()
        );

        Ok(BatchSummary {
            mapping,
            rows_per_symbol: self.params.length(),
            duplicates_dropped,
        })
    }

    /// [`run`](Self::run) with one stream created from `seed`.
    pub fn run_seeded(
        &self,
        rows: &[UniverseRow],
        seed: Option<u64>,
        anchor: DateTime<Utc>,
    ) -> Result<BatchSummary, SynthError> {
        let mut rng = generator::rng_from_seed(seed);
        self.run(rows, &mut rng, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    fn row(symbol: &str, name: &str) -> UniverseRow {
        UniverseRow {
            symbol: symbol.into(),
            name: name.into(),
            market: "equity".into(),
            venue: "NASDAQ".into(),
            filters: "Stocks".into(),
            badge: "STK".into(),
            exchange: None,
        }
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap()
    }

    fn pipeline(dir: &Path) -> BatchCandlePipeline {
        BatchCandlePipeline::new(
            CandleStore::new(dir),
            SourcePathResolver::default(),
            GenerationParams::new(3, 60).unwrap(),
        )
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        let rows = vec![
            row("AAPL", "Apple Inc."),
            row("MSFT", "Microsoft Corporation"),
            row("AAPL", "dup"),
            row("SPY", "SPDR"),
        ];
        let (unique, dropped) = dedupe_by_symbol(&rows);
        let symbols: Vec<&str> = unique.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "SPY"]);
        assert_eq!(unique[0].name, "Apple Inc.");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn dedupe_is_case_sensitive() {
        let (unique, dropped) = dedupe_by_symbol(&[row("aapl", "a"), row("AAPL", "b")]);
        assert_eq!(unique.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn run_writes_one_file_per_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let rows = vec![row("AAPL", "Apple Inc."), row("AAPL", "dup"), row("MSFT", "Microsoft")];

        let summary = p.run_seeded(&rows, Some(42), anchor()).unwrap();

        assert_eq!(summary.symbols_written(), 2);
        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(summary.mapping[0].name, "Apple Inc.");
        assert_eq!(p.store().list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
        assert_eq!(p.store().read_series("MSFT").unwrap().len(), 3);
    }

    #[test]
    fn relative_store_paths_get_consumer_prefix() {
        let resolver = SourcePathResolver::default();
        let store = CandleStore::new("./data/kbar");
        assert_eq!(
            resolver.resolve(&store.file_path("ZZZ")),
            "../data/kbar/ZZZ.csv"
        );
    }

    #[test]
    fn run_sources_keep_absolute_store_paths() {
        let dir = tempfile::tempdir().unwrap();
        let summary = pipeline(dir.path())
            .run_seeded(&[row("AAPL", "Apple")], Some(1), anchor())
            .unwrap();
        let expected = dir.path().join("AAPL.csv");
        assert_eq!(summary.mapping[0].source, expected.to_string_lossy());
    }

    #[test]
    fn every_series_ends_at_the_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        p.run_seeded(&[row("AAPL", "a"), row("MSFT", "m")], Some(5), anchor())
            .unwrap();

        for symbol in ["AAPL", "MSFT"] {
            let candles = p.store().read_series(symbol).unwrap();
            assert_eq!(
                candles.last().unwrap().timestamp,
                anchor() - chrono::TimeDelta::seconds(60)
            );
        }
    }

    #[test]
    fn shared_stream_makes_order_matter() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let a = pipeline(dir_a.path());
        let b = pipeline(dir_b.path());

        a.run_seeded(&[row("AAPL", "a"), row("MSFT", "m")], Some(42), anchor())
            .unwrap();
        b.run_seeded(&[row("MSFT", "m"), row("AAPL", "a")], Some(42), anchor())
            .unwrap();

        // First symbol processed always draws the head of the stream.
        assert_eq!(
            a.store().read_series("AAPL").unwrap(),
            b.store().read_series("MSFT").unwrap()
        );
        assert_ne!(
            a.store().read_series("AAPL").unwrap(),
            b.store().read_series("AAPL").unwrap()
        );
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("kbar");
        let p = pipeline(&out);

        let err = p.run_seeded(&[], Some(1), anchor()).unwrap_err();
        assert!(matches!(err, SynthError::NoSymbols));
        assert!(!out.exists());
    }
}
