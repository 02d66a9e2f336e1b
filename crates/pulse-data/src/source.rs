//! Data source trait definition.

use crate::seed::SeedCandle;

/// Trait for types that can load a historical seed.
///
/// This trait uses `anyhow::Result` for flexible error handling. Callers
/// treat a failure as transient and carry on with an empty history.
pub trait DataSource {
    fn load(&self) -> anyhow::Result<Vec<SeedCandle>>;
}
