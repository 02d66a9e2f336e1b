//! Historical seed candles and their preparation for a timeframe.

use pulse_core::{aggregate_candles, Candle, Timeframe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::validate_candle;

/// Malformed seed data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeedError {
    #[error("row {row}: column '{column}' is missing")]
    MissingField { row: usize, column: &'static str },
    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("candle at {bucket_start}s violates OHLC consistency")]
    Inconsistent { bucket_start: i64 },
}

/// Historical candle as delivered by a history endpoint.
///
/// `bucket_start` is in **seconds**; engine candles use milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedCandle {
    #[serde(rename = "bucketStart")]
    pub bucket_start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl SeedCandle {
    pub fn new(bucket_start: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            bucket_start,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Convert to an engine candle (milliseconds), rejecting broken rows.
    pub fn to_candle(&self) -> Result<Candle, SeedError> {
        let candle = Candle {
            bucket_start: self.bucket_start.saturating_mul(1000),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        };
        if validate_candle(&candle) {
            Ok(candle)
        } else {
            Err(SeedError::Inconsistent {
                bucket_start: self.bucket_start,
            })
        }
    }
}

/// Turn a raw seed into history for `timeframe`.
///
/// Broken rows are dropped with a warning, the rest are ordered, re-bucketed
/// to the timeframe and capped to the most recent `max_candles`.
pub fn prepare_seed(seed: &[SeedCandle], timeframe: Timeframe, max_candles: usize) -> Vec<Candle> {
    let mut candles: Vec<Candle> = seed
        .iter()
        .filter_map(|raw| match raw.to_candle() {
            Ok(candle) => Some(candle),
            Err(e) => {
                log::warn!("Dropping seed candle: {e}");
                None
            }
        })
        .collect();

    candles.sort_by_key(|c| c.bucket_start);

    let mut candles = aggregate_candles(&candles, timeframe);
    if candles.len() > max_candles {
        candles.drain(..candles.len() - max_candles);
    }
    candles
}
