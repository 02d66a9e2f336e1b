//! Core indicator traits and types.

use pulse_core::{Candle, TimeSeries};

/// Trait for indicator configuration.
pub trait IndicatorConfig: Clone + Default {}

/// Which price to use for indicator calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    /// (High + Low) / 2
    HL2,
    /// (High + Low + Close) / 3
    HLC3,
    /// (Open + High + Low + Close) / 4
    OHLC4,
}

impl PriceSource {
    /// Extract the price from a candle based on this source.
    pub fn extract(&self, candle: &Candle) -> f64 {
        match self {
            PriceSource::Open => candle.open,
            PriceSource::High => candle.high,
            PriceSource::Low => candle.low,
            PriceSource::Close => candle.close,
            PriceSource::HL2 => (candle.high + candle.low) / 2.0,
            PriceSource::HLC3 => (candle.high + candle.low + candle.close) / 3.0,
            PriceSource::OHLC4 => (candle.open + candle.high + candle.low + candle.close) / 4.0,
        }
    }
}

/// Value of an indicator at one candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    /// Single line output (SMA, EMA, RSI, Volume).
    Line(f64),
    /// Bollinger Bands.
    Bands { upper: f64, middle: f64, lower: f64 },
    /// MACD triple.
    Macd {
        macd_line: f64,
        signal_line: f64,
        histogram: f64,
    },
}

impl IndicatorValue {
    /// The value a single-line renderer or a price-scale fit should use.
    pub fn primary(&self) -> f64 {
        match self {
            IndicatorValue::Line(v) => *v,
            IndicatorValue::Bands { middle, .. } => *middle,
            IndicatorValue::Macd { macd_line, .. } => *macd_line,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            IndicatorValue::Line(v) => v.is_finite(),
            IndicatorValue::Bands {
                upper,
                middle,
                lower,
            } => upper.is_finite() && middle.is_finite() && lower.is_finite(),
            IndicatorValue::Macd {
                macd_line,
                signal_line,
                histogram,
            } => macd_line.is_finite() && signal_line.is_finite() && histogram.is_finite(),
        }
    }
}

/// Trait for streaming technical indicators.
///
/// An indicator folds closed candles one at a time with [`update`](Indicator::update)
/// and can report the value a not-yet-closed candle would produce with
/// [`peek`](Indicator::peek) without committing it.
pub trait Indicator {
    /// The configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Create a new indicator with the given configuration.
    fn new(config: Self::Config) -> Self;

    /// Fold one closed candle into the running state and return its value.
    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue>;

    /// Value `candle` would produce if it closed now. Does not mutate state.
    fn peek(&self, candle: &Candle) -> Option<IndicatorValue>;

    /// Drop all accumulated state.
    fn reset(&mut self);

    /// Minimum number of candles required before the indicator produces output.
    fn min_periods(&self) -> usize;

    /// Whether this indicator should be overlaid on the price chart (true)
    /// or displayed in a separate pane (false).
    fn is_overlay(&self) -> bool;

    /// Human-readable name of the indicator.
    fn name(&self) -> &str;

    /// Recompute from scratch over `candles`, one slot per candle.
    fn calculate(&mut self, candles: &[Candle]) -> TimeSeries<IndicatorValue> {
        self.reset();
        candles.iter().map(|c| self.update(c)).collect()
    }
}
