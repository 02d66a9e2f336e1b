//! Per-candle volume.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue};

/// Scale applied to the range proxy so it reads in basis points.
pub const RANGE_PROXY_SCALE: f64 = 10_000.0;

/// Volume configuration.
#[derive(Debug, Clone, Default)]
pub struct VolumeConfig {}

impl IndicatorConfig for VolumeConfig {}

/// Reports each candle's volume.
///
/// Tick feeds carry no trade size, so a candle without a `volume` falls back
/// to its range relative to the close, in basis points:
/// `(high - low) / close * 10_000`. A non-positive close yields 0.
#[derive(Debug, Clone)]
pub struct Volume {
    _config: VolumeConfig,
}

/// Volume of `candle`, or the range proxy when it carries none.
pub fn volume_or_proxy(candle: &Candle) -> f64 {
    match candle.volume {
        Some(v) => v,
        None if candle.close > 0.0 => (candle.high - candle.low) / candle.close * RANGE_PROXY_SCALE,
        None => 0.0,
    }
}

impl Indicator for Volume {
    type Config = VolumeConfig;

    fn new(config: Self::Config) -> Self {
        Self { _config: config }
    }

    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        self.peek(candle)
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        Some(IndicatorValue::Line(volume_or_proxy(candle)))
    }

    fn reset(&mut self) {}

    fn min_periods(&self) -> usize {
        1
    }

    fn is_overlay(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "Volume"
    }
}
