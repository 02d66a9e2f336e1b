//! Simple moving average.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};
use crate::rolling::RollingWindow;

/// SMA configuration.
#[derive(Debug, Clone)]
pub struct SmaConfig {
    /// Number of candles averaged (default: 20).
    pub period: usize,
    pub price_source: PriceSource,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self {
            period: 20,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for SmaConfig {}

/// Simple moving average over the last `period` prices.
#[derive(Debug, Clone)]
pub struct Sma {
    config: SmaConfig,
    window: RollingWindow,
}

impl Indicator for Sma {
    type Config = SmaConfig;

    fn new(config: Self::Config) -> Self {
        let window = RollingWindow::new(config.period);
        Self { config, window }
    }

    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        let value = self.peek(candle);
        self.window.push(self.config.price_source.extract(candle));
        value
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        self.window
            .mean_with(self.config.price_source.extract(candle))
            .map(IndicatorValue::Line)
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn min_periods(&self) -> usize {
        self.config.period
    }

    fn is_overlay(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "SMA"
    }
}
