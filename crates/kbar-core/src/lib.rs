pub mod candle;
pub mod error;
pub mod mapping;
pub mod schema;
pub mod store;
pub mod universe;
pub mod validate;

pub use candle::Candle;
pub use error::KbarError;
pub use mapping::{MappingRow, SourcePathResolver};
pub use store::CandleStore;
pub use universe::UniverseRow;
