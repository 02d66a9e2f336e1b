//! Real-time animated candlestick chart core.
//!
//! [`ChartEngine`] owns everything for one symbol: the candle store and its
//! tick state machine, the price motion integrator, indicators, the
//! viewport, timeline markers, drawings and the frame planner. It is driven
//! by ticks and frame steps and produces [`render::FramePlan`]s; it never
//! draws or performs I/O itself.

pub mod candle_store;
pub mod config;
pub mod coords;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod events;
pub mod indicators;
pub mod motion;
pub mod render;
pub mod timeline;
pub mod trade;
pub mod viewport;

pub use candle_store::{CandleStore, LiveState, MotionCommand, StoreSettings, TickEffect};
pub use config::EngineConfig;
pub use coords::{ChartLayout, CoordinateSystem, PriceRange, ScreenPos, TimeScale, WorldPoint};
pub use drawing::{Drawing, DrawingId, DrawingManager, DrawingTool, DrawingToolKind, Shape};
pub use engine::ChartEngine;
pub use error::{ConfigurationError, TickRejected};
pub use events::{EventBus, Notification};
pub use indicators::{IndicatorEngine, IndicatorKind, IndicatorSpec, IndicatorStyle};
pub use motion::{MotionParams, PriceMotion};
pub use render::{ChartStyle, DrawOp, FramePlan, Layer, RenderPlanner, Theme};
pub use timeline::{TimelineMarkers, TimelineMode, TimelineSettings, TimelineState};
pub use trade::{TradeDirection, TradeResult, TradeSnapshot};
pub use viewport::{ViewPeriod, Viewport, ViewportSettings, ZoomDirection};

pub use pulse_core::{Candle, Timeframe};
pub use pulse_data::{SeedCandle, Tick};
