//! Indicator framework for technical analysis.
//!
//! Every indicator is streaming: closed candles are folded in with
//! `Indicator::update`, and the in-progress candle is evaluated with
//! `Indicator::peek` without disturbing the folded state.

pub mod bollinger;
pub mod ema;
pub mod indicator;
pub mod macd;
mod rolling;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use bollinger::{Bollinger, BollingerConfig};
pub use ema::{Ema, EmaConfig};
pub use indicator::{Indicator, IndicatorConfig, IndicatorValue, PriceSource};
pub use macd::{Macd, MacdConfig};
pub use rsi::{Rsi, RsiConfig};
pub use sma::{Sma, SmaConfig};
pub use volume::{volume_or_proxy, Volume, VolumeConfig};
