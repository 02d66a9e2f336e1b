//! The chart engine: one owned value holding every per-symbol component.
//!
//! Hosts drive it with two kinds of call:
//!
//! - [`ChartEngine::on_tick`] whenever a price arrives
//! - [`ChartEngine::step`] then [`ChartEngine::plan_frame`] once per frame
//!
//! Nothing here blocks or performs I/O. A multi-threaded host keeps the
//! engine inside a single task and forwards ticks to it.

use pulse_core::{Candle, Timeframe};
use pulse_data::{prepare_seed, SeedCandle, Tick};

use crate::candle_store::{CandleStore, MotionCommand};
use crate::config::EngineConfig;
use crate::coords::{ChartLayout, CoordinateSystem, PriceRange, ScreenPos, TimeScale};
use crate::drawing::{DrawingId, DrawingManager, DrawingTool, Shape};
use crate::error::{ConfigurationError, TickRejected};
use crate::events::{EventBus, Notification};
use crate::indicators::{IndicatorEngine, IndicatorSpec};
use crate::motion::PriceMotion;
use crate::render::{ChartStyle, FrameInput, FramePlan, RenderPlanner, Theme, TimelineOverlay};
use crate::timeline::{TimelineMarkers, TimelineState};
use crate::trade::TradeSnapshot;
use crate::viewport::{ViewPeriod, Viewport, ZoomDirection};

/// Seed for the motion jitter generator.
const MOTION_SEED: u64 = 0x5eed;

pub struct ChartEngine {
    config: EngineConfig,
    symbol: String,
    store: CandleStore,
    motion: PriceMotion,
    indicators: IndicatorEngine,
    viewport: Viewport,
    timeline: TimelineMarkers,
    drawings: DrawingManager,
    planner: RenderPlanner,
    trades: Vec<TradeSnapshot>,
    events: EventBus,
    width: f64,
    height: f64,
    /// Clock of the most recent frame.
    now_ms: i64,
    last_reported_price: Option<f64>,
}

impl ChartEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        config.viewport.validate()?;
        let timeframe = config.timeframe;
        let mut indicators = IndicatorEngine::new();
        indicators.configure(config.indicators.clone(), &[])?;

        Ok(Self {
            symbol: config.symbol.clone(),
            store: CandleStore::new(timeframe, config.store),
            motion: PriceMotion::new(config.motion_for(timeframe), MOTION_SEED),
            indicators,
            viewport: Viewport::new(config.viewport.clone()),
            timeline: TimelineMarkers::new(config.timeline, timeframe),
            drawings: DrawingManager::new(config.hit_tolerance_px),
            planner: RenderPlanner::new(config.theme.clone(), config.chart_style),
            trades: Vec::new(),
            events: EventBus::new(),
            width: 800.0,
            height: 600.0,
            now_ms: 0,
            last_reported_price: None,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.store.timeframe()
    }

    pub fn store(&self) -> &CandleStore {
        &self.store
    }

    pub fn motion(&self) -> &PriceMotion {
        &self.motion
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn timeline(&self) -> &TimelineMarkers {
        &self.timeline
    }

    pub fn drawings(&self) -> &DrawingManager {
        &self.drawings
    }

    pub fn chart_style(&self) -> ChartStyle {
        self.planner.style
    }

    /// Switch between candles, line and area. History and drawings are
    /// untouched.
    pub fn set_chart_style(&mut self, style: ChartStyle) {
        log::debug!("Chart style {:?} -> {:?}", self.planner.style, style);
        self.planner.style = style;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.planner.theme = theme;
    }

    /// Current animated price.
    pub fn visual_price(&self) -> Option<f64> {
        self.motion.visual_price()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.events.take()
    }

    // ------------------------------------------------------------------
    // History and per-symbol state
    // ------------------------------------------------------------------

    /// Re-bucket `seed` to the current timeframe and load it.
    pub fn load_history(&mut self, seed: &[SeedCandle]) {
        let candles = prepare_seed(seed, self.timeframe(), self.config.max_candles);
        self.load_candles(candles);
    }

    /// Load the outcome of a history fetch. A failed fetch leaves the chart
    /// running on an empty history.
    pub fn load_history_result(&mut self, result: anyhow::Result<Vec<SeedCandle>>) {
        match result {
            Ok(seed) => self.load_history(&seed),
            Err(err) => {
                log::warn!("History fetch failed, continuing without history: {err:#}");
                self.load_candles(Vec::new());
            }
        }
    }

    /// Replace history with candles already in this timeframe.
    pub fn load_candles(&mut self, candles: Vec<Candle>) {
        log::info!(
            "Loaded {} {} candles for {}",
            candles.len(),
            self.timeframe(),
            self.symbol
        );
        self.store.load_history(candles);
        self.motion.clear();
        if let Some(close) = self.store.last_close() {
            self.motion.reset(close);
        }
        self.last_reported_price = None;
        self.indicators.recompute(self.store.closed_candles());
        self.indicators.update_live(self.store.live_candle());
        self.events.emit(Notification::IndicatorsRecomputed);
        self.viewport.reset(self.store.display_len());
        self.refresh_warmup();
    }

    /// Switch instrument. Everything tied to the old symbol is dropped
    /// before this returns.
    pub fn set_symbol(&mut self, symbol: impl Into<String>, now_ms: i64) {
        let symbol = symbol.into();
        log::info!("Switching symbol {} -> {}", self.symbol, symbol);
        self.symbol = symbol;
        self.drawings.clear();
        self.timeline.reset(now_ms);
        self.timeline.sync_trades(&self.trades, &self.symbol, now_ms);
        self.reset_market_state(self.timeframe());
    }

    /// Switch bucket size. History must be reloaded for the new timeframe.
    pub fn set_timeframe(&mut self, timeframe: Timeframe, now_ms: i64) {
        log::info!("Switching timeframe {} -> {}", self.timeframe(), timeframe);
        self.motion.set_params(self.config.motion_for(timeframe));
        self.timeline.set_timeframe(timeframe, now_ms);
        self.reset_market_state(timeframe);
    }

    fn reset_market_state(&mut self, timeframe: Timeframe) {
        self.store.reset(timeframe);
        self.motion.clear();
        self.last_reported_price = None;
        self.indicators.recompute(&[]);
        self.indicators.update_live(None);
        self.viewport.reset(0);
        self.refresh_warmup();
    }

    /// Replace the indicator set. A styling-only change keeps every
    /// computed value.
    pub fn configure_indicators(&mut self, specs: Vec<IndicatorSpec>) -> Result<(), ConfigurationError> {
        match self.indicators.configure(specs, self.store.closed_candles()) {
            Ok(rebuilt) => {
                if rebuilt {
                    self.events.emit(Notification::IndicatorsRecomputed);
                }
                self.indicators.update_live(self.store.live_candle());
                self.refresh_warmup();
                Ok(())
            }
            Err(err) => {
                log::warn!("Rejected indicator configuration: {err}");
                Err(err)
            }
        }
    }

    fn warmup_required(&self) -> usize {
        self.config
            .min_warmup_candles
            .max(self.indicators.warmup_required())
    }

    fn refresh_warmup(&mut self) {
        let warm = self.store.history().len() >= self.warmup_required();
        if warm != self.motion.is_warm() {
            log::debug!("Motion {}", if warm { "warmed up" } else { "cold" });
            self.motion.set_warm(warm);
        }
    }

    // ------------------------------------------------------------------
    // Ticks and frames
    // ------------------------------------------------------------------

    /// Apply one tick. Rejected ticks leave the engine unchanged.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<(), TickRejected> {
        let effect = match self.store.ingest(tick, self.motion.visual_price()) {
            Ok(effect) => effect,
            Err(err) => {
                match err {
                    TickRejected::Duplicate(_) => log::debug!("Dropped tick: {err}"),
                    _ => log::warn!("Dropped tick: {err}"),
                }
                return Err(err);
            }
        };

        if effect.adopted_tail {
            self.indicators.recompute(self.store.closed_candles());
            self.events.emit(Notification::IndicatorsRecomputed);
        } else {
            for candle in &effect.finalized {
                self.indicators.on_candle_closed(candle);
            }
        }
        self.events.emit_all(
            effect
                .finalized
                .into_iter()
                .map(|candle| Notification::CandleClosed { candle }),
        );

        self.refresh_warmup();
        match effect.motion {
            MotionCommand::Target(price) if self.motion.is_warm() => {
                self.motion.set_target(price, tick.timestamp)
            }
            MotionCommand::Target(price) | MotionCommand::Reset(price) => {
                // A snap never animates, so the live close takes the price now.
                self.motion.reset(price);
                self.store.apply_visual_price(price);
            }
        }

        self.viewport.set_len(self.store.display_len());
        self.indicators.update_live(self.store.live_candle());
        Ok(())
    }

    /// Advance one frame of `dt_ms` at wall-clock `now_ms`.
    pub fn step(&mut self, dt_ms: f64, now_ms: i64) {
        self.now_ms = now_ms;

        if let Some(price) = self.motion.step(dt_ms, now_ms) {
            self.store.apply_visual_price(price);
        }
        if let Some(price) = self.motion.visual_price() {
            if self.last_reported_price != Some(price) {
                self.last_reported_price = Some(price);
                self.events.emit(Notification::PriceUpdated { price });
            }
        }
        self.indicators.update_live(self.store.live_candle());
        self.viewport.set_len(self.store.display_len());
        self.viewport.step(now_ms);

        if let Some(frozen) = self.timeline.sync_trades(&self.trades, &self.symbol, now_ms) {
            self.events.emit(Notification::TradeFreezeChanged { frozen });
        }
        if let Some(advance) = self.timeline.update(now_ms) {
            self.events.emit(Notification::TimestampsAdvanced {
                deadline: advance.deadline,
                expiration: advance.expiration,
            });
        }
    }

    /// Surface size in pixels.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Coordinate system for the current viewport and surface size.
    pub fn coordinate_system(&self) -> CoordinateSystem {
        let layout = ChartLayout::new(self.width, self.height, self.indicators.has_sub_pane());
        let (first, end) = self.viewport.visible_range();
        let prices = self
            .store
            .display_candles()
            .skip(first)
            .take(end.saturating_sub(first))
            .flat_map(|c| [c.high, c.low])
            .chain(self.motion.visual_price());
        let prices = PriceRange::fit(prices).unwrap_or(PriceRange::new(0.0, 1.0));
        CoordinateSystem::new(
            layout,
            self.viewport.start_index(),
            self.viewport.visible_count(),
            prices,
            TimeScale::from_candles(self.store.display_candles(), self.timeframe().millis()),
        )
    }

    /// Draw operations for the current state.
    pub fn plan_frame(&mut self) -> FramePlan {
        let coords = self.coordinate_system();
        let state = self.timeline.state(self.now_ms);
        let (deadline_x, expiration_x) = self
            .timeline
            .marker_positions(coords.time_to_x(state.deadline), coords.time_to_x(state.expiration));

        let input = FrameInput {
            coords: &coords,
            store: &self.store,
            indicators: &self.indicators,
            drawings: &self.drawings,
            timeline: Some(TimelineOverlay {
                deadline_x,
                expiration_x,
                state,
            }),
            trades: &self.trades,
            symbol: &self.symbol,
            visual_price: self.motion.visual_price(),
            now_ms: self.now_ms,
        };
        self.planner.plan(&input)
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Pointer pressed. Returns `true` when a drawing tool took the press.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let coords = self.coordinate_system();
        let screen = ScreenPos::new(x, y);
        let over_overlay = self.drawings.hit_test(screen, &coords).is_some();
        if self.drawings.wants_pointer(screen, &coords) {
            self.drawings.handle_press(screen, &coords);
            return true;
        }
        self.viewport.begin_pan(x, over_overlay);
        false
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let coords = self.coordinate_system();
        if self.viewport.is_panning() {
            self.viewport.drag_to(x, coords.layout.chart_width);
        } else {
            self.drawings.handle_move(ScreenPos::new(x, y), &coords);
        }
    }

    pub fn pointer_up(&mut self) {
        self.viewport.end_pan();
        self.drawings.handle_release();
    }

    pub fn pan_by_pixels(&mut self, dx: f64) {
        let chart_width = self.coordinate_system().layout.chart_width;
        self.viewport.pan_by_pixels(dx, chart_width);
    }

    /// One zoom notch around the pointer at `pointer_x`.
    pub fn zoom(&mut self, direction: ZoomDirection, pointer_x: f64) {
        let chart_width = self.coordinate_system().layout.chart_width;
        self.viewport.zoom(direction, pointer_x / chart_width);
    }

    pub fn apply_period(&mut self, period: ViewPeriod, now_ms: i64) {
        self.viewport.apply_period(period, self.timeframe(), now_ms);
    }

    // ------------------------------------------------------------------
    // Drawings
    // ------------------------------------------------------------------

    pub fn set_drawing_tool(&mut self, tool: DrawingTool) {
        self.drawings.set_tool(tool);
    }

    pub fn add_drawing(&mut self, shape: Shape) -> DrawingId {
        self.drawings.add(shape)
    }

    pub fn move_drawing(&mut self, id: DrawingId, shape: Shape) -> bool {
        self.drawings.update(id, shape)
    }

    pub fn remove_drawing(&mut self, id: DrawingId) -> bool {
        self.drawings.remove(id)
    }

    pub fn remove_selected_drawing(&mut self) -> bool {
        self.drawings.remove_selected()
    }

    pub fn clear_drawings(&mut self) {
        self.drawings.clear();
    }

    // ------------------------------------------------------------------
    // Timeline and trades
    // ------------------------------------------------------------------

    pub fn set_manual_expiration(&mut self, expiration: i64) {
        self.timeline.set_manual_expiration(expiration);
    }

    pub fn clear_manual_expiration(&mut self, now_ms: i64) {
        self.timeline.clear_manual(now_ms);
    }

    /// Replace the trade list. Freezing is re-evaluated immediately.
    pub fn set_trades(&mut self, trades: Vec<TradeSnapshot>, now_ms: i64) {
        self.trades = trades;
        if let Some(frozen) = self.timeline.sync_trades(&self.trades, &self.symbol, now_ms) {
            self.events.emit(Notification::TradeFreezeChanged { frozen });
        }
    }

    pub fn trades(&self) -> &[TradeSnapshot] {
        &self.trades
    }

    pub fn timeline_state(&mut self, now_ms: i64) -> TimelineState {
        self.timeline.state(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ChartEngine {
        ChartEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_history_load_resets_motion_to_last_close() {
        let mut e = engine();
        e.load_history(&[
            SeedCandle::new(0, 100.0, 101.0, 99.0, 100.5),
            SeedCandle::new(60, 100.5, 102.0, 100.0, 101.0),
        ]);
        assert_eq!(e.store().history().len(), 2);
        assert_eq!(e.visual_price(), Some(101.0));
        assert!(e.motion().is_warm());
        assert!(e
            .drain_notifications()
            .contains(&Notification::IndicatorsRecomputed));
    }

    #[test]
    fn test_failed_fetch_runs_empty() {
        let mut e = engine();
        e.load_history_result(Err(anyhow::anyhow!("timeout")));
        assert!(e.store().history().is_empty());
        assert_eq!(e.visual_price(), None);

        e.on_tick(&Tick::new(1.5, 10_000)).unwrap();
        assert_eq!(e.store().display_len(), 1);
        assert_eq!(e.visual_price(), Some(1.5));
    }

    #[test]
    fn test_symbol_change_resets_state() {
        let mut e = engine();
        e.load_history(&[SeedCandle::new(0, 100.0, 101.0, 99.0, 100.5)]);
        e.add_drawing(Shape::Horizontal { price: 100.0 });
        e.set_symbol("GBPUSD", 0);
        assert_eq!(e.symbol(), "GBPUSD");
        assert!(e.store().history().is_empty());
        assert!(e.drawings().drawings.is_empty());
        assert_eq!(e.visual_price(), None);
    }

    #[test]
    fn test_timeframe_change_swaps_motion_params() {
        let mut e = engine();
        let before = e.motion().params().acceleration;
        e.set_timeframe(Timeframe::Day1, 0);
        assert_eq!(e.timeframe(), Timeframe::Day1);
        assert!(e.motion().params().acceleration < before);
        assert_eq!(e.timeline().cycle_ms(), Timeframe::Day1.millis());
    }

    #[test]
    fn test_rejected_indicator_config_keeps_previous() {
        let mut e = engine();
        e.configure_indicators(vec![IndicatorSpec::new("sma", crate::indicators::IndicatorKind::Sma, 5)])
            .unwrap();
        let err = e.configure_indicators(vec![IndicatorSpec::new(
            "bad",
            crate::indicators::IndicatorKind::Ema,
            0,
        )]);
        assert!(err.is_err());
        assert!(e.indicators().get("sma").is_some());
    }
}
