use kbar_core::KbarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Core(#[from] KbarError),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("no symbols to generate")]
    NoSymbols,
}
