//! Symbol → candle file mapping consumed by the charting UI.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::KbarError;
use crate::universe::UniverseRow;

/// Column order of the mapping table. Matches the field order of [`MappingRow`].
pub const MAPPING_COLUMNS: [&str; 8] = [
    "symbol", "name", "exchange", "source", "filters", "badge", "market", "venue",
];

/// Default offset from the consumer's base directory back to the data root.
pub const DEFAULT_CONSUMER_PREFIX: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub source: String,
    pub filters: String,
    pub badge: String,
    pub market: String,
    pub venue: String,
}

impl MappingRow {
    /// Map a universe row to its candle file.
    ///
    /// `exchange` is the venue when set, else the row's `exchange` column, else empty.
    pub fn from_universe(row: &UniverseRow, source: String) -> Self {
        let exchange = if row.venue.is_empty() {
            row.exchange.clone().unwrap_or_default()
        } else {
            row.venue.clone()
        };

        Self {
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            exchange,
            source,
            filters: row.filters.clone(),
            badge: row.badge.clone(),
            market: row.market.clone(),
            venue: row.venue.clone(),
        }
    }
}

/// Rewrites candle file paths so the consumer can open them from its own
/// working directory.
///
/// The consumer resolves `source` relative to a base directory that sits one
/// level below the data root, so relative paths get `consumer_prefix`
/// (`..` by default) prepended. Absolute paths are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePathResolver {
    consumer_prefix: PathBuf,
}

impl SourcePathResolver {
    pub fn new(consumer_prefix: impl AsRef<Path>) -> Self {
        Self {
            consumer_prefix: consumer_prefix.as_ref().to_path_buf(),
        }
    }

    /// `.` segments of a relative target are dropped before joining, so
    /// `./data/kbar/AAPL.csv` maps to `../data/kbar/AAPL.csv`.
    pub fn resolve(&self, target: &Path) -> String {
        if target.is_absolute() {
            return target.to_string_lossy().into_owned();
        }

        let target: PathBuf = target
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        self.consumer_prefix.join(target).to_string_lossy().into_owned()
    }
}

impl Default for SourcePathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CONSUMER_PREFIX)
    }
}

/// Write the mapping table, header first even when `rows` is empty.
/// Creates parent directories as needed. Overwrites if the file already exists.
pub fn write_mapping(path: &Path, rows: &[MappingRow]) -> Result<(), KbarError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(MAPPING_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
