//! Candle data structures for OHLC data.

use serde::{Deserialize, Serialize};

/// OHLC candle over one time bucket.
///
/// `bucket_start` is the bucket start in milliseconds since the Unix epoch.
/// `volume` is optional: tick streams carry no size, seeds sometimes do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub bucket_start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Candle {
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

    /// Attach a traded volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// A candle that opens at `open` and has seen a single trade at `price`.
    pub fn opened_at(bucket_start: i64, open: f64, price: f64) -> Self {
        Self {
            bucket_start,
            open,
            high: open.max(price),
            low: open.min(price),
            close: price,
            volume: None,
        }
    }

    /// Widen the extremes to include `price` without touching the close.
    pub fn extend(&mut self, price: f64) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
    }

    /// Set the close, widening the extremes if needed.
    pub fn set_close(&mut self, price: f64) {
        self.extend(price);
        self.close = price;
    }

    /// Set the close but keep it inside the current high/low envelope.
    ///
    /// Used for animated closes: the envelope is owned by real ticks, so an
    /// overshooting animation can never fabricate a new extreme.
    pub fn set_close_within(&mut self, price: f64) {
        self.close = price.clamp(self.low, self.high);
    }

    /// `low <= min(open, close) <= max(open, close) <= high`, all finite.
    pub fn is_consistent(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Trait for types that provide OHLC data.
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> Option<f64>;
}

impl Ohlc for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> Option<f64> {
        self.volume
    }
}
