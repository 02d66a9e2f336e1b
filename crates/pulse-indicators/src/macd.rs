//! MACD (Moving Average Convergence Divergence) indicator.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};
use crate::rolling::EmaState;

/// MACD indicator configuration.
#[derive(Debug, Clone)]
pub struct MacdConfig {
    /// Fast EMA period (default: 12).
    pub fast_period: usize,
    /// Slow EMA period (default: 26).
    pub slow_period: usize,
    /// Signal line EMA period (default: 9).
    pub signal_period: usize,
    /// Price source for calculation.
    pub price_source: PriceSource,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for MacdConfig {}

/// MACD indicator.
///
/// MACD line is fast EMA minus slow EMA, the signal line is an EMA of the
/// MACD line and the histogram is their difference. Output starts once the
/// signal line exists.
#[derive(Debug, Clone)]
pub struct Macd {
    config: MacdConfig,
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
}

impl Macd {
    /// Get the configuration.
    pub fn config(&self) -> &MacdConfig {
        &self.config
    }

    fn triple(macd_line: f64, signal_line: Option<f64>) -> Option<IndicatorValue> {
        signal_line.map(|signal_line| IndicatorValue::Macd {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        })
    }
}

impl Indicator for Macd {
    type Config = MacdConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            fast: EmaState::new(config.fast_period),
            slow: EmaState::new(config.slow_period),
            signal: EmaState::new(config.signal_period),
            config,
        }
    }

    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        let price = self.config.price_source.extract(candle);
        let fast = self.fast.push(price);
        let slow = self.slow.push(price);
        let macd_line = fast.zip(slow).map(|(f, s)| f - s)?;
        let signal_line = self.signal.push(macd_line);
        Self::triple(macd_line, signal_line)
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        let price = self.config.price_source.extract(candle);
        let macd_line = self
            .fast
            .next(price)
            .zip(self.slow.next(price))
            .map(|(f, s)| f - s)?;
        Self::triple(macd_line, self.signal.next(macd_line))
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
    }

    fn min_periods(&self) -> usize {
        // Need slow_period for first MACD value, then signal_period more for signal line
        self.config.slow_period + self.config.signal_period - 1
    }

    fn is_overlay(&self) -> bool {
        // MACD is displayed in a separate pane, not overlaid on price
        false
    }

    fn name(&self) -> &str {
        "MACD"
    }
}
