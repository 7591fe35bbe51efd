use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KbarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("universe file not found at {}", .0.display())]
    UniverseNotFound(PathBuf),

    #[error("universe {} is missing column {column}", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("universe {} has no rows with a symbol", .0.display())]
    EmptyUniverse(PathBuf),

    #[error("invalid symbol {0:?}: must be a plain file name")]
    InvalidSymbol(String),

    #[error("No data found for {symbol}")]
    NoData { symbol: String },

    #[error("Invalid candle: {0}")]
    InvalidCandle(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
