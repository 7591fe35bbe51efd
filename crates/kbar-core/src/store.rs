use std::path::{Path, PathBuf};

use crate::candle::Candle;
use crate::error::KbarError;
use crate::schema;
use crate::universe::check_symbol;

/// Filesystem-backed store of generated candle series, one CSV per symbol.
///
/// Directory layout: `{output_dir}/{SYMBOL}.csv`
pub struct CandleStore {
    output_dir: PathBuf,
}

impl CandleStore {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path to the candle file for a given symbol.
    pub fn file_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{symbol}.csv"))
    }

    /// Write a symbol's series and return the path written.
    /// Creates the output directory as needed. Overwrites if the file already exists.
    pub fn write_series(&self, symbol: &str, candles: &[Candle]) -> Result<PathBuf, KbarError> {
        check_symbol(symbol)?;
        let path = self.file_path(symbol);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        schema::write_csv(&path, candles)?;
        Ok(path)
    }

    pub fn read_series(&self, symbol: &str) -> Result<Vec<Candle>, KbarError> {
        let path = self.file_path(symbol);
        if !path.exists() {
            return Err(KbarError::NoData {
                symbol: symbol.to_string(),
            });
        }
        schema::read_csv(&path)
    }

    /// List all symbols that have a candle file in the store.
    pub fn list_symbols(&self) -> Result<Vec<String>, KbarError> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }

        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv")
                && !symbol.is_empty()
            {
                symbols.push(symbol.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
