//! Exponential moving average.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};
use crate::rolling::EmaState;

/// EMA configuration.
#[derive(Debug, Clone)]
pub struct EmaConfig {
    /// Smoothing period (default: 20). Multiplier is `2 / (period + 1)`.
    pub period: usize,
    pub price_source: PriceSource,
}

impl Default for EmaConfig {
    fn default() -> Self {
        Self {
            period: 20,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for EmaConfig {}

/// Exponential moving average, seeded with the SMA of the first `period` prices.
#[derive(Debug, Clone)]
pub struct Ema {
    config: EmaConfig,
    state: EmaState,
}

impl Indicator for Ema {
    type Config = EmaConfig;

    fn new(config: Self::Config) -> Self {
        let state = EmaState::new(config.period);
        Self { config, state }
    }

    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        self.state
            .push(self.config.price_source.extract(candle))
            .map(IndicatorValue::Line)
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        self.state
            .next(self.config.price_source.extract(candle))
            .map(IndicatorValue::Line)
    }

    fn reset(&mut self) {
        self.state.reset();
    }

    fn min_periods(&self) -> usize {
        self.config.period
    }

    fn is_overlay(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
