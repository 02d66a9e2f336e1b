//! Relative Strength Index with Wilder smoothing.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};

/// RSI configuration.
#[derive(Debug, Clone)]
pub struct RsiConfig {
    /// Lookback in price changes (default: 14).
    pub period: usize,
    pub price_source: PriceSource,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for RsiConfig {}

#[derive(Debug, Clone, Copy, Default)]
struct RsiState {
    prev: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

/// RSI in `[0, 100]`.
///
/// The first average is the plain mean of `period` changes, later ones use
/// Wilder's `(prev * (n - 1) + x) / n`. A window with no losses reads 100, a
/// window with no movement at all reads 50.
#[derive(Debug, Clone)]
pub struct Rsi {
    config: RsiConfig,
    state: RsiState,
}

impl Rsi {
    fn advance(&self, price: f64) -> (RsiState, Option<f64>) {
        let mut state = self.state;
        let period = self.config.period;
        let Some(prev) = state.prev.replace(price) else {
            return (state, None);
        };
        if period == 0 {
            return (state, None);
        }

        let change = price - prev;
        let (gain, loss) = (change.max(0.0), (-change).max(0.0));
        state.changes += 1;
        let n = period as f64;
        if state.changes <= period {
            state.avg_gain += gain / n;
            state.avg_loss += loss / n;
            if state.changes < period {
                return (state, None);
            }
        } else {
            state.avg_gain = (state.avg_gain * (n - 1.0) + gain) / n;
            state.avg_loss = (state.avg_loss * (n - 1.0) + loss) / n;
        }

        let rsi = if state.avg_loss == 0.0 {
            if state.avg_gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            let rs = state.avg_gain / state.avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        (state, Some(rsi.clamp(0.0, 100.0)))
    }
}

impl Indicator for Rsi {
    type Config = RsiConfig;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            state: RsiState::default(),
        }
    }

    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        let (state, value) = self.advance(self.config.price_source.extract(candle));
        self.state = state;
        value.map(IndicatorValue::Line)
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        self.advance(self.config.price_source.extract(candle))
            .1
            .map(IndicatorValue::Line)
    }

    fn reset(&mut self) {
        self.state = RsiState::default();
    }

    fn min_periods(&self) -> usize {
        self.config.period + 1
    }

    fn is_overlay(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "RSI"
    }
}
