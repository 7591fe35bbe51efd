pub mod catalog;
pub mod error;
pub mod generator;
pub mod pipeline;

pub use error::SynthError;
pub use generator::{GenerationParams, generate, rng_from_seed};
pub use pipeline::{BatchCandlePipeline, BatchSummary};
