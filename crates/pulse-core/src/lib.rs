//! Core types for the pulse chart engine.
//!
//! This crate provides the fundamental data structures shared by every other
//! crate in the workspace:
//! - `Candle` - OHLC candle data
//! - `Timeframe` - Bucket sizes, time bucketing and aggregation
//! - `TimeSeries` - Container for indicator output

pub mod candle;
pub mod series;
pub mod timeframe;

pub use candle::{Candle, Ohlc};
pub use series::TimeSeries;
pub use timeframe::{aggregate_candles, ParseTimeframeError, Timeframe};
