//! Validation utilities for incoming market data.

use pulse_core::Candle;

/// Validate a candle has reasonable values.
pub fn validate_candle(candle: &Candle) -> bool {
    candle.is_consistent()
        && candle.low > 0.0
        && candle.volume.map_or(true, |v| v.is_finite() && v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_candle_valid() {
        let candle = Candle::new(0, 100.0, 105.0, 95.0, 102.0).with_volume(1000.0);
        assert!(validate_candle(&candle));
    }

    #[test]
    fn test_validate_candle_high_below_low() {
        let candle = Candle::new(0, 100.0, 90.0, 95.0, 102.0);
        assert!(!validate_candle(&candle));
    }

    #[test]
    fn test_validate_candle_close_outside_range() {
        let candle = Candle::new(0, 100.0, 101.0, 99.0, 102.0);
        assert!(!validate_candle(&candle));
    }

    #[test]
    fn test_validate_candle_negative_volume() {
        let candle = Candle::new(0, 100.0, 101.0, 99.0, 100.0).with_volume(-1.0);
        assert!(!validate_candle(&candle));
    }
}
