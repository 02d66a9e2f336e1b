//! Bollinger Bands.

use pulse_core::Candle;

use crate::indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};
use crate::rolling::RollingWindow;

/// Bollinger Bands configuration.
#[derive(Debug, Clone)]
pub struct BollingerConfig {
    /// Window length for the middle SMA (default: 20).
    pub period: usize,
    /// Band width in standard deviations (default: 2.0).
    pub std_dev: f64,
    pub price_source: PriceSource,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
            price_source: PriceSource::Close,
        }
    }
}

impl IndicatorConfig for BollingerConfig {}

/// SMA middle band with upper/lower bands at `± std_dev` population
/// standard deviations.
#[derive(Debug, Clone)]
pub struct Bollinger {
    config: BollingerConfig,
    window: RollingWindow,
}

impl Indicator for Bollinger {
    type Config = BollingerConfig;

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
        let (middle, std) = self
            .window
            .mean_std_with(self.config.price_source.extract(candle))?;
        let width = std * self.config.std_dev;
        Some(IndicatorValue::Bands {
            upper: middle + width,
            middle,
            lower: middle - width,
        })
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
        "BB"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::make_candles;

    #[test]
    fn test_bands_are_symmetric() {
        let candles = make_candles(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let mut bb = Bollinger::new(BollingerConfig {
            period: 8,
            ..Default::default()
        });
        let series = bb.calculate(&candles);
        match series.last() {
            Some(IndicatorValue::Bands {
                upper,
                middle,
                lower,
            }) => {
                // mean 5, population std 2
                assert!((middle - 5.0).abs() < 1e-9);
                assert!((upper - 9.0).abs() < 1e-9);
                assert!((lower - 1.0).abs() < 1e-9);
            }
            other => panic!("expected bands, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_prices_collapse_bands() {
        let candles = make_candles(&[3.0; 5]);
        let mut bb = Bollinger::new(BollingerConfig {
            period: 5,
            ..Default::default()
        });
        let series = bb.calculate(&candles);
        assert_eq!(
            series.last(),
            Some(&IndicatorValue::Bands {
                upper: 3.0,
                middle: 3.0,
                lower: 3.0
            })
        );
    }
}
