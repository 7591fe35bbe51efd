//! Symbol universe table: the catalog of instruments candles are generated for.

use std::path::Path;

use csv::StringRecord;

use crate::error::KbarError;

/// Columns every universe table must carry, in the order they are written.
pub const UNIVERSE_COLUMNS: [&str; 6] = ["filters", "badge", "symbol", "name", "market", "venue"];

/// Separator between category tags in the `filters` column.
pub const FILTER_SEPARATOR: char = ';';

/// Reject symbols that would not stay inside the candle output directory
/// when used as a file name.
pub fn check_symbol(symbol: &str) -> Result<(), KbarError> {
    if symbol.is_empty()
        || symbol == "."
        || symbol == ".."
        || symbol.contains(['/', '\\'])
    {
        return Err(KbarError::InvalidSymbol(symbol.to_string()));
    }
    Ok(())
}

/// One instrument row of the universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseRow {
    pub symbol: String,
    pub name: String,
    pub market: String,
    pub venue: String,
    /// `;`-joined ordered set of category tags.
    pub filters: String,
    pub badge: String,
    /// Optional `exchange` column, used when `venue` is blank.
    pub exchange: Option<String>,
}

impl UniverseRow {
    /// Category tags in their stored order, blanks skipped.
    pub fn filter_tags(&self) -> impl Iterator<Item = &str> {
        self.filters
            .split(FILTER_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

struct ColumnIndex {
    filters: usize,
    badge: usize,
    symbol: usize,
    name: usize,
    market: usize,
    venue: usize,
    exchange: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self, KbarError> {
        let idx = |column: &str| -> Result<usize, KbarError> {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| KbarError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        Ok(Self {
            filters: idx("filters")?,
            badge: idx("badge")?,
            symbol: idx("symbol")?,
            name: idx("name")?,
            market: idx("market")?,
            venue: idx("venue")?,
            exchange: headers.iter().position(|h| h == "exchange"),
        })
    }

    fn row(&self, record: &StringRecord) -> Result<Option<UniverseRow>, KbarError> {
        let get = |i: usize| record.get(i).unwrap_or_default().trim().to_string();

        let symbol = get(self.symbol);
        if symbol.is_empty() {
            return Ok(None);
        }
        check_symbol(&symbol)?;

        Ok(Some(UniverseRow {
            symbol,
            name: get(self.name),
            market: get(self.market),
            venue: get(self.venue),
            filters: get(self.filters),
            badge: get(self.badge),
            exchange: self.exchange.map(get).filter(|e| !e.is_empty()),
        }))
    }
}

/// Load universe rows in file order.
///
/// Rows with an empty `symbol` are discarded; a symbol containing a path
/// separator fails the load. Duplicate symbols are kept;
/// dedup is the batch pipeline's job.
pub fn load_universe(path: &Path) -> Result<Vec<UniverseRow>, KbarError> {
    if !path.exists() {
        return Err(KbarError::UniverseNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers, path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        if let Some(row) = columns.row(&record?)? {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(KbarError::EmptyUniverse(path.to_path_buf()));
    }
    Ok(rows)
}

/// Write universe rows with the standard column order.
/// Creates parent directories as needed. Overwrites if the file already exists.
pub fn write_universe(path: &Path, rows: &[UniverseRow]) -> Result<(), KbarError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(UNIVERSE_COLUMNS)?;
    for row in rows {
        wtr.write_record([
            &row.filters,
            &row.badge,
            &row.symbol,
            &row.name,
            &row.market,
            &row.venue,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
