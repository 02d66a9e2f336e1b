//! Data inputs for pulse.
//!
//! - `Tick` - one price observation from the live stream
//! - `SeedCandle` - historical candle as delivered by a history endpoint
//! - `DataSource` - pluggable seed loader, with a CSV implementation

pub mod csv;
pub mod seed;
pub mod source;
pub mod tick;
pub mod validation;

pub use self::csv::CsvLoader;
pub use seed::{prepare_seed, SeedCandle, SeedError};
pub use source::DataSource;
pub use tick::{Tick, TickError};
