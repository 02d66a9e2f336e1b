//! Live tick type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed tick.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TickError {
    #[error("tick price must be finite and positive, got {0}")]
    InvalidPrice(f64),
    #[error("tick timestamp must be non-negative, got {0}")]
    InvalidTimestamp(i64),
}

/// One timestamped price observation.
///
/// `closed` selects the ingestion path: `None` means the feed never signals
/// closes and bucket boundaries are detected from timestamps; `Some(_)` means
/// the feed tells us when a candle is final.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub price: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, rename = "isClosed", skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
}

impl Tick {
    pub fn new(price: f64, timestamp: i64) -> Self {
        Self {
            price,
            timestamp,
            closed: None,
        }
    }

    /// Tick from a feed that signals candle closes.
    pub fn with_close_signal(price: f64, timestamp: i64, closed: bool) -> Self {
        Self {
            price,
            timestamp,
            closed: Some(closed),
        }
    }

    pub fn validate(&self) -> Result<(), TickError> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(TickError::InvalidPrice(self.price));
        }
        if self.timestamp < 0 {
            return Err(TickError::InvalidTimestamp(self.timestamp));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_prices() {
        assert!(Tick::new(1.1, 0).validate().is_ok());
        assert_eq!(
            Tick::new(0.0, 0).validate(),
            Err(TickError::InvalidPrice(0.0))
        );
        assert!(Tick::new(f64::NAN, 0).validate().is_err());
        assert!(Tick::new(f64::INFINITY, 0).validate().is_err());
        assert_eq!(
            Tick::new(1.0, -5).validate(),
            Err(TickError::InvalidTimestamp(-5))
        );
    }
}
