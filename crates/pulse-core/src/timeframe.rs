//! Timeframe types, time bucketing and candle aggregation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candle::Candle;

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Unknown timeframe label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timeframe '{0}'")]
pub struct ParseTimeframeError(pub String);

/// Timeframe enumeration for chart buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5s")]
    Sec5,
    #[serde(rename = "15s")]
    Sec15,
    #[serde(rename = "30s")]
    Sec30,
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// Bucket duration in milliseconds.
    pub fn millis(&self) -> i64 {
        match self {
            Timeframe::Sec5 => 5 * SECOND_MS,
            Timeframe::Sec15 => 15 * SECOND_MS,
            Timeframe::Sec30 => 30 * SECOND_MS,
            Timeframe::Min1 => MINUTE_MS,
            Timeframe::Min5 => 5 * MINUTE_MS,
            Timeframe::Min15 => 15 * MINUTE_MS,
            Timeframe::Min30 => 30 * MINUTE_MS,
            Timeframe::Hour1 => HOUR_MS,
            Timeframe::Hour4 => 4 * HOUR_MS,
            Timeframe::Day1 => DAY_MS,
        }
    }

    /// Short label, also the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Sec5 => "5s",
            Timeframe::Sec15 => "15s",
            Timeframe::Sec30 => "30s",
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Min30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        }
    }

    /// All timeframes, shortest first.
    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::Sec5,
            Timeframe::Sec15,
            Timeframe::Sec30,
            Timeframe::Min1,
            Timeframe::Min5,
            Timeframe::Min15,
            Timeframe::Min30,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Day1,
        ]
    }

    /// Start of the bucket containing `timestamp_ms`.
    ///
    /// Floors toward negative infinity so pre-epoch timestamps bucket correctly.
    pub fn bucket_start(&self, timestamp_ms: i64) -> i64 {
        let period = self.millis();
        timestamp_ms.div_euclid(period) * period
    }

    /// First bucket boundary strictly after `timestamp_ms`.
    pub fn next_boundary(&self, timestamp_ms: i64) -> i64 {
        self.bucket_start(timestamp_ms) + self.millis()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::all()
            .iter()
            .copied()
            .find(|tf| tf.label() == s)
            .ok_or_else(|| ParseTimeframeError(s.to_string()))
    }
}

/// Aggregate candles into a larger timeframe.
///
/// Source candles must be ordered by `bucket_start`. Each target bucket takes
/// the first open, the last close and the extremes across its sources; volume
/// is summed over the sources that carry one.
pub fn aggregate_candles(candles: &[Candle], timeframe: Timeframe) -> Vec<Candle> {
    let mut aggregated: Vec<Candle> = Vec::new();

    for candle in candles {
        let bucket_start = timeframe.bucket_start(candle.bucket_start);

        match aggregated.last_mut() {
            Some(agg) if agg.bucket_start == bucket_start => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume = match (agg.volume, candle.volume) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                };
            }
            _ => {
                aggregated.push(Candle {
                    bucket_start,
                    ..*candle
                });
            }
        }
    }

    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_start_floors() {
        let tf = Timeframe::Min1;
        assert_eq!(tf.bucket_start(0), 0);
        assert_eq!(tf.bucket_start(59_999), 0);
        assert_eq!(tf.bucket_start(60_000), 60_000);
        assert_eq!(tf.bucket_start(-1), -60_000);
    }

    #[test]
    fn test_next_boundary_is_strictly_after() {
        let tf = Timeframe::Min5;
        assert_eq!(tf.next_boundary(0), 300_000);
        assert_eq!(tf.next_boundary(299_999), 300_000);
        assert_eq!(tf.next_boundary(300_000), 600_000);
    }

    #[test]
    fn test_parse_and_display() {
        for tf in Timeframe::all() {
            assert_eq!(tf.label().parse::<Timeframe>().unwrap(), *tf);
            assert_eq!(tf.to_string(), tf.label());
        }
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_aggregate_merges_buckets() {
        let candles = vec![
            Candle::new(0, 10.0, 12.0, 9.0, 11.0).with_volume(1.0),
            Candle::new(60_000, 11.0, 15.0, 10.0, 14.0).with_volume(2.0),
            Candle::new(300_000, 14.0, 14.5, 13.0, 13.5),
        ];
        let out = aggregate_candles(&candles, Timeframe::Min5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bucket_start, 0);
        assert_eq!(out[0].open, 10.0);
        assert_eq!(out[0].high, 15.0);
        assert_eq!(out[0].low, 9.0);
        assert_eq!(out[0].close, 14.0);
        assert_eq!(out[0].volume, Some(3.0));
        assert_eq!(out[1].bucket_start, 300_000);
        assert_eq!(out[1].volume, None);
    }
}
