//! Frame planning: turns chart state into an ordered list of draw
//! operations in screen pixels.
//!
//! The planner does no rasterization. A host walks [`FramePlan::ops`] in
//! order and forwards each primitive to whatever surface it draws on.

use std::ops::Range;
use std::str::FromStr;

use pulse_core::Candle;
use pulse_indicators::IndicatorValue;

use crate::candle_store::CandleStore;
use crate::coords::{CoordinateSystem, ScreenPos};
use crate::drawing::{
    extend_to_right, fib_levels, Drawing, DrawingManager, Shape, FIB_BAND_ALPHA,
};
use crate::error::ConfigurationError;
use crate::indicators::{IndicatorEngine, IndicatorInstance, IndicatorKind};
use crate::timeline::TimelineState;
use crate::trade::{TradeDirection, TradeSnapshot};

/// RGBA in 0..=1.
pub type Color = [f32; 4];

/// Upper bound on horizontal grid lines per frame.
const MAX_GRID_LINES: usize = 32;
/// Opacity of the area fill just under the close line.
const AREA_TOP_ALPHA: f32 = 0.35;

/// How price history is drawn in the main pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    #[default]
    Candles,
    /// Closes joined by a line.
    Line,
    /// Close line over a gradient fill.
    Area,
}

impl FromStr for ChartStyle {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "candles" | "candlestick" => Ok(Self::Candles),
            "line" => Ok(Self::Line),
            "area" => Ok(Self::Area),
            _ => Err(ConfigurationError::UnknownChartStyle(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One primitive for the draw surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Line {
        from: ScreenPos,
        to: ScreenPos,
        color: Color,
        width: f32,
        style: LineStyle,
    },
    /// Filled axis-aligned rectangle.
    Rect {
        min: ScreenPos,
        max: ScreenPos,
        fill: Color,
    },
    Circle {
        center: ScreenPos,
        radius: f64,
        fill: Color,
    },
    Text {
        pos: ScreenPos,
        text: String,
        color: Color,
        align: TextAlign,
    },
    /// Vertical gradient over a rectangle, `top` fading to `bottom`.
    Gradient {
        min: ScreenPos,
        max: ScreenPos,
        top: Color,
        bottom: Color,
    },
    /// Region between a polyline and the horizontal line at `baseline`,
    /// shaded from `top` at the line to `bottom` at the baseline.
    Area {
        points: Vec<ScreenPos>,
        baseline: f64,
        top: Color,
        bottom: Color,
    },
}

impl DrawOp {
    fn solid(from: ScreenPos, to: ScreenPos, color: Color, width: f32) -> Self {
        DrawOp::Line {
            from,
            to,
            color,
            width,
            style: LineStyle::Solid,
        }
    }

    fn text(pos: ScreenPos, text: impl Into<String>, color: Color, align: TextAlign) -> Self {
        DrawOp::Text {
            pos,
            text: text.into(),
            color,
            align,
        }
    }

    /// Every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        let p = |s: &ScreenPos| s.x.is_finite() && s.y.is_finite();
        match self {
            DrawOp::Line { from, to, .. } => p(from) && p(to),
            DrawOp::Rect { min, max, .. } | DrawOp::Gradient { min, max, .. } => p(min) && p(max),
            DrawOp::Circle { center, radius, .. } => p(center) && radius.is_finite(),
            DrawOp::Text { pos, .. } => p(pos),
            DrawOp::Area {
                points, baseline, ..
            } => baseline.is_finite() && points.iter().all(p),
        }
    }
}

/// Groups of operations, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Grid,
    Candles,
    Overlays,
    SubPane,
    Drawings,
    Timeline,
    Trades,
    CurrentPrice,
}

/// Ordered operations for one frame.
#[derive(Debug, Clone, Default)]
pub struct FramePlan {
    pub ops: Vec<DrawOp>,
    sections: Vec<(Layer, Range<usize>)>,
}

impl FramePlan {
    fn section(&mut self, layer: Layer, emit: impl FnOnce(&mut Vec<DrawOp>)) {
        let start = self.ops.len();
        emit(&mut self.ops);
        self.sections.push((layer, start..self.ops.len()));
    }

    /// Operations belonging to `layer`.
    pub fn layer(&self, layer: Layer) -> &[DrawOp] {
        self.sections
            .iter()
            .find(|(l, _)| *l == layer)
            .map(|(_, range)| &self.ops[range.clone()])
            .unwrap_or(&[])
    }

    /// Layers in emission order.
    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.sections.iter().map(|(l, _)| *l)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Colors used by the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub axis_text: Color,
    pub bullish: Color,
    pub bearish: Color,
    /// Close line and area fill.
    pub line: Color,
    pub price_line: Color,
    pub price_label_bg: Color,
    pub deadline: Color,
    pub expiration: Color,
    pub frozen: Color,
    pub trade_up: Color,
    pub trade_down: Color,
    pub guide: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Preset names accepted by [`Theme::named`].
    pub const NAMES: [&'static str; 4] = ["dark", "light", "blue", "green"];

    pub fn dark() -> Self {
        Self::from_palette(0x0F172A, 0x1E293B, 0x94A3B8, 0x10B981, 0xEF4444, 0x3B82F6)
    }

    pub fn light() -> Self {
        Self::from_palette(0xFFFFFF, 0xE5E7EB, 0x6B7280, 0x059669, 0xDC2626, 0x2563EB)
    }

    pub fn blue() -> Self {
        Self::from_palette(0x0A1929, 0x132F4C, 0x90CAF9, 0x4CAF50, 0xF44336, 0x2196F3)
    }

    pub fn green() -> Self {
        Self::from_palette(0x0A1F0A, 0x1A3D1A, 0xA5D6A7, 0x4CAF50, 0xF44336, 0x66BB6A)
    }

    /// Preset by name, ignoring case.
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "blue" => Some(Self::blue()),
            "green" => Some(Self::green()),
            _ => None,
        }
    }

    fn from_palette(
        background: u32,
        grid: u32,
        text: u32,
        bullish: u32,
        bearish: u32,
        line: u32,
    ) -> Self {
        Self {
            background: hex(background),
            grid: hex(grid),
            axis_text: hex(text),
            bullish: hex(bullish),
            bearish: hex(bearish),
            line: hex(line),
            price_line: hex(line),
            price_label_bg: hex(line),
            deadline: [1.0, 0.75, 0.2, 0.9],
            expiration: with_alpha(hex(bearish), 0.9),
            frozen: with_alpha(hex(text), 0.9),
            trade_up: hex(bullish),
            trade_down: hex(bearish),
            guide: with_alpha(hex(text), 0.3),
        }
    }
}

/// Timeline marker positions after easing, with the host-facing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineOverlay {
    pub deadline_x: f64,
    pub expiration_x: f64,
    pub state: TimelineState,
}

/// Everything the planner reads for one frame.
pub struct FrameInput<'a> {
    pub coords: &'a CoordinateSystem,
    pub store: &'a CandleStore,
    pub indicators: &'a IndicatorEngine,
    pub drawings: &'a DrawingManager,
    pub timeline: Option<TimelineOverlay>,
    pub trades: &'a [TradeSnapshot],
    pub symbol: &'a str,
    pub visual_price: Option<f64>,
    pub now_ms: i64,
}

/// Display indices covered by the viewport, padded by one on each side so
/// partially visible candles are drawn.
pub fn visible_indices(coords: &CoordinateSystem, len: usize) -> Range<usize> {
    let first = (coords.start_index.floor() - 1.0).max(0.0) as usize;
    let last = (coords.start_index + coords.visible_count).ceil() + 1.0;
    let last = (last.max(0.0) as usize).min(len);
    first.min(last)..last
}

/// Decimal places for labels at this price level.
pub fn price_decimals(price: f64) -> usize {
    let p = price.abs();
    if p >= 1000.0 {
        2
    } else if p >= 10.0 {
        3
    } else {
        5
    }
}

/// A round step giving roughly `target` lines over `span`.
pub fn nice_step(span: f64, target: f64) -> f64 {
    if !(span.is_finite() && span > 0.0 && target > 0.0) {
        return 1.0;
    }
    let raw = span / target;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

/// `HH:MM` (or `HH:MM:SS` when `seconds`) in UTC.
pub fn format_clock(ms: i64, seconds: bool) -> String {
    let secs = ms.div_euclid(1000);
    let h = secs.div_euclid(3600).rem_euclid(24);
    let m = secs.div_euclid(60).rem_euclid(60);
    let s = secs.rem_euclid(60);
    if seconds {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}")
    }
}

/// `M:SS`.
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn with_alpha(mut color: Color, alpha: f32) -> Color {
    color[3] = alpha;
    color
}

/// `0xRRGGBB`, opaque.
fn hex(rgb: u32) -> Color {
    let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

fn rgb(color: [f32; 3]) -> Color {
    [color[0], color[1], color[2], 1.0]
}

/// Builds [`FramePlan`]s.
#[derive(Debug, Clone, Default)]
pub struct RenderPlanner {
    pub theme: Theme,
    pub style: ChartStyle,
}

impl RenderPlanner {
    pub fn new(theme: Theme, style: ChartStyle) -> Self {
        Self { theme, style }
    }

    pub fn plan(&self, input: &FrameInput<'_>) -> FramePlan {
        let mut plan = FramePlan::default();
        let decimals = price_decimals(
            input
                .visual_price
                .or_else(|| input.store.last_close())
                .unwrap_or(1.0),
        );
        let range = visible_indices(input.coords, input.store.display_len());
        let candles: Vec<(usize, &Candle)> = input
            .store
            .display_candles()
            .enumerate()
            .skip(range.start)
            .take(range.len())
            .collect();

        plan.section(Layer::Grid, |ops| self.grid(ops, input, decimals));
        plan.section(Layer::Candles, |ops| match self.style {
            ChartStyle::Candles => self.candles(ops, input.coords, &candles),
            ChartStyle::Line => self.close_line(ops, input.coords, &candles),
            ChartStyle::Area => {
                self.area_fill(ops, input.coords, &candles);
                self.close_line(ops, input.coords, &candles);
            }
        });
        plan.section(Layer::Overlays, |ops| {
            for instance in input.indicators.iter().filter(|i| i.is_overlay()) {
                self.overlay(ops, input, instance, &candles);
            }
        });
        plan.section(Layer::SubPane, |ops| self.sub_pane(ops, input, &candles));
        plan.section(Layer::Drawings, |ops| self.drawings(ops, input, decimals));
        plan.section(Layer::Timeline, |ops| self.timeline(ops, input));
        plan.section(Layer::Trades, |ops| self.trades(ops, input, decimals));
        plan.section(Layer::CurrentPrice, |ops| {
            self.current_price(ops, input, decimals)
        });
        plan
    }

    fn grid(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>, decimals: usize) {
        let coords = input.coords;
        let layout = &coords.layout;
        ops.push(DrawOp::Rect {
            min: ScreenPos::new(0.0, 0.0),
            max: ScreenPos::new(layout.width, layout.height),
            fill: self.theme.background,
        });
        let prices = coords.prices;
        let step = nice_step(prices.height(), 6.0);
        let first = (prices.min / step).ceil() * step;
        for k in 0..MAX_GRID_LINES {
            let level = first + k as f64 * step;
            if level > prices.max {
                break;
            }
            let y = coords.price_to_y(level);
            ops.push(DrawOp::solid(
                ScreenPos::new(0.0, y),
                ScreenPos::new(layout.chart_width, y),
                self.theme.grid,
                1.0,
            ));
            ops.push(DrawOp::text(
                ScreenPos::new(layout.chart_width + 4.0, y),
                format!("{level:.decimals$}"),
                self.theme.axis_text,
                TextAlign::Left,
            ));
        }

        // Vertical lines every ~80px, on whole candles.
        let ppc = coords.pixels_per_candle();
        let every = (80.0 / ppc).ceil().max(1.0) as i64;
        let seconds = coords.time_scale.period() < 60_000;
        let first = (coords.start_index.floor() as i64).div_euclid(every) * every;
        let last = (coords.start_index + coords.visible_count).ceil() as i64;
        let bottom = layout.main_height + layout.sub_height;
        let mut index = first;
        while index <= last {
            let x = coords.index_to_x(index as f64);
            if (0.0..=layout.chart_width).contains(&x) {
                ops.push(DrawOp::solid(
                    ScreenPos::new(x, 0.0),
                    ScreenPos::new(x, bottom),
                    self.theme.grid,
                    1.0,
                ));
                ops.push(DrawOp::text(
                    ScreenPos::new(x, bottom + 4.0),
                    format_clock(coords.time_scale.index_to_time(index as f64), seconds),
                    self.theme.axis_text,
                    TextAlign::Center,
                ));
            }
            index += every;
        }
    }

    fn candles(&self, ops: &mut Vec<DrawOp>, coords: &CoordinateSystem, candles: &[(usize, &Candle)]) {
        let half = (coords.pixels_per_candle() * 0.35).max(0.5);
        for &(i, candle) in candles {
            let color = if candle.is_bullish() {
                self.theme.bullish
            } else {
                self.theme.bearish
            };
            let x = coords.index_to_x(i as f64);
            ops.push(DrawOp::solid(
                ScreenPos::new(x, coords.price_to_y(candle.high)),
                ScreenPos::new(x, coords.price_to_y(candle.low)),
                color,
                1.0,
            ));
            let y_open = coords.price_to_y(candle.open);
            let y_close = coords.price_to_y(candle.close);
            let (top, mut bottom) = (y_open.min(y_close), y_open.max(y_close));
            if bottom - top < 1.0 {
                bottom = top + 1.0;
            }
            ops.push(DrawOp::Rect {
                min: ScreenPos::new(x - half, top),
                max: ScreenPos::new(x + half, bottom),
                fill: color,
            });
        }
    }

    fn close_points(coords: &CoordinateSystem, candles: &[(usize, &Candle)]) -> Vec<ScreenPos> {
        candles
            .iter()
            .map(|&(i, c)| ScreenPos::new(coords.index_to_x(i as f64), coords.price_to_y(c.close)))
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect()
    }

    fn close_line(&self, ops: &mut Vec<DrawOp>, coords: &CoordinateSystem, candles: &[(usize, &Candle)]) {
        let points = Self::close_points(coords, candles);
        self.polyline(ops, points.into_iter().map(Some), self.theme.line, 2.0);
    }

    fn area_fill(&self, ops: &mut Vec<DrawOp>, coords: &CoordinateSystem, candles: &[(usize, &Candle)]) {
        let points = Self::close_points(coords, candles);
        if points.len() < 2 {
            return;
        }
        ops.push(DrawOp::Area {
            points,
            baseline: coords.layout.main_height,
            top: with_alpha(self.theme.line, AREA_TOP_ALPHA),
            bottom: with_alpha(self.theme.line, 0.0),
        });
    }

    /// Connect consecutive values of one component into line segments.
    fn polyline(
        &self,
        ops: &mut Vec<DrawOp>,
        points: impl Iterator<Item = Option<ScreenPos>>,
        color: Color,
        width: f32,
    ) {
        let mut prev: Option<ScreenPos> = None;
        for point in points {
            if let (Some(a), Some(b)) = (prev, point) {
                ops.push(DrawOp::solid(a, b, color, width));
            }
            prev = point.filter(|p| p.y.is_finite());
        }
    }

    fn overlay(
        &self,
        ops: &mut Vec<DrawOp>,
        input: &FrameInput<'_>,
        instance: &IndicatorInstance,
        candles: &[(usize, &Candle)],
    ) {
        let coords = input.coords;
        let live_index = input.store.live_index();
        let color = rgb(instance.spec.style.color);
        let width = instance.spec.style.line_width;
        let at = |i: usize, price: f64| ScreenPos::new(coords.index_to_x(i as f64), coords.price_to_y(price));

        let mut upper = Vec::with_capacity(candles.len());
        let mut middle = Vec::with_capacity(candles.len());
        let mut lower = Vec::with_capacity(candles.len());
        for &(i, _) in candles {
            match instance.value_at(i, live_index) {
                Some(IndicatorValue::Bands {
                    upper: u,
                    middle: m,
                    lower: l,
                }) => {
                    upper.push(Some(at(i, u)));
                    middle.push(Some(at(i, m)));
                    lower.push(Some(at(i, l)));
                }
                Some(value) => middle.push(Some(at(i, value.primary()))),
                None => {
                    upper.push(None);
                    middle.push(None);
                    lower.push(None);
                }
            }
        }

        if instance.spec.kind == IndicatorKind::Bollinger {
            let faded = with_alpha(color, 0.6);
            self.polyline(ops, upper.into_iter(), faded, width);
            self.polyline(ops, lower.into_iter(), faded, width);
        }
        self.polyline(ops, middle.into_iter(), color, width);
    }

    fn sub_pane(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>, candles: &[(usize, &Candle)]) {
        let coords = input.coords;
        let layout = &coords.layout;
        if !layout.has_sub_pane() {
            return;
        }
        ops.push(DrawOp::solid(
            ScreenPos::new(0.0, layout.sub_top),
            ScreenPos::new(layout.chart_width, layout.sub_top),
            self.theme.guide,
            1.0,
        ));
        let live_index = input.store.live_index();
        let half = (coords.pixels_per_candle() * 0.35).max(0.5);
        let bar_fill = |up: bool| {
            if up {
                with_alpha(self.theme.bullish, 0.5)
            } else {
                with_alpha(self.theme.bearish, 0.5)
            }
        };

        for instance in input.indicators.iter().filter(|i| !i.is_overlay()) {
            let color = rgb(instance.spec.style.color);
            let width = instance.spec.style.line_width;
            let values: Vec<(usize, &Candle, IndicatorValue)> = candles
                .iter()
                .filter_map(|&(i, c)| instance.value_at(i, live_index).map(|v| (i, c, v)))
                .collect();

            match instance.spec.kind {
                IndicatorKind::Rsi => {
                    for guide in [30.0, 70.0] {
                        let y = coords.sub_pane_y(guide, 0.0, 100.0);
                        ops.push(DrawOp::Line {
                            from: ScreenPos::new(0.0, y),
                            to: ScreenPos::new(layout.chart_width, y),
                            color: self.theme.guide,
                            width: 1.0,
                            style: LineStyle::Dashed,
                        });
                    }
                    let points = values.iter().map(|(i, _, v)| {
                        Some(ScreenPos::new(
                            coords.index_to_x(*i as f64),
                            coords.sub_pane_y(v.primary(), 0.0, 100.0),
                        ))
                    });
                    self.polyline(ops, points, color, width);
                }
                IndicatorKind::Macd => {
                    let (mut lo, mut hi) = (0.0_f64, 0.0_f64);
                    for (_, _, v) in &values {
                        if let IndicatorValue::Macd {
                            macd_line,
                            signal_line,
                            histogram,
                        } = *v
                        {
                            for x in [macd_line, signal_line, histogram] {
                                lo = lo.min(x);
                                hi = hi.max(x);
                            }
                        }
                    }
                    let zero = coords.sub_pane_y(0.0, lo, hi);
                    let mut macd_pts = Vec::with_capacity(values.len());
                    let mut signal_pts = Vec::with_capacity(values.len());
                    for (i, _, v) in &values {
                        if let IndicatorValue::Macd {
                            macd_line,
                            signal_line,
                            histogram,
                        } = *v
                        {
                            let x = coords.index_to_x(*i as f64);
                            let y = coords.sub_pane_y(histogram, lo, hi);
                            ops.push(DrawOp::Rect {
                                min: ScreenPos::new(x - half, y.min(zero)),
                                max: ScreenPos::new(x + half, y.max(zero)),
                                fill: bar_fill(histogram >= 0.0),
                            });
                            macd_pts.push(Some(ScreenPos::new(x, coords.sub_pane_y(macd_line, lo, hi))));
                            signal_pts.push(Some(ScreenPos::new(x, coords.sub_pane_y(signal_line, lo, hi))));
                        }
                    }
                    self.polyline(ops, macd_pts.into_iter(), color, width);
                    self.polyline(ops, signal_pts.into_iter(), self.theme.deadline, width);
                }
                _ => {
                    // Bars grow up from the bottom of the pane.
                    let hi = values.iter().map(|(_, _, v)| v.primary()).fold(0.0_f64, f64::max);
                    let bottom = layout.sub_top + layout.sub_height;
                    for (i, candle, v) in &values {
                        let x = coords.index_to_x(*i as f64);
                        let y = coords.sub_pane_y(v.primary(), 0.0, hi);
                        ops.push(DrawOp::Rect {
                            min: ScreenPos::new(x - half, y.min(bottom)),
                            max: ScreenPos::new(x + half, bottom),
                            fill: bar_fill(candle.is_bullish()),
                        });
                    }
                }
            }
        }
    }

    fn drawings(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>, decimals: usize) {
        let manager = input.drawings;
        for drawing in &manager.drawings {
            let selected = manager.selected == Some(drawing.id);
            let hovered = manager.hovered == Some(drawing.id);
            self.drawing(ops, input.coords, drawing, selected || hovered, selected, decimals);
        }
        if let Some(preview) = manager.preview_drawing() {
            self.drawing(ops, input.coords, &preview, false, false, decimals);
        }
    }

    fn drawing(
        &self,
        ops: &mut Vec<DrawOp>,
        coords: &CoordinateSystem,
        drawing: &Drawing,
        emphasized: bool,
        show_anchors: bool,
        decimals: usize,
    ) {
        let layout = &coords.layout;
        let color = drawing.color;
        let width = if emphasized { 2.0 } else { 1.0 };
        let mut anchors: Vec<ScreenPos> = Vec::new();

        match drawing.shape {
            Shape::Horizontal { price } => {
                let y = coords.price_to_y(price);
                ops.push(DrawOp::solid(
                    ScreenPos::new(0.0, y),
                    ScreenPos::new(layout.chart_width, y),
                    color,
                    width,
                ));
                ops.push(DrawOp::text(
                    ScreenPos::new(layout.chart_width + 4.0, y),
                    format!("{price:.decimals$}"),
                    color,
                    TextAlign::Left,
                ));
                anchors.push(ScreenPos::new(layout.chart_width * 0.5, y));
            }
            Shape::Vertical { time } => {
                let x = coords.time_to_x(time);
                ops.push(DrawOp::solid(
                    ScreenPos::new(x, 0.0),
                    ScreenPos::new(x, layout.main_height + layout.sub_height),
                    color,
                    width,
                ));
                anchors.push(ScreenPos::new(x, layout.main_height * 0.5));
            }
            Shape::TrendLine { start, end } => {
                let a = coords.point_to_screen(start);
                let b = coords.point_to_screen(end);
                ops.push(DrawOp::solid(a, extend_to_right(a, b, layout.chart_width), color, width));
                anchors.extend([a, b]);
            }
            Shape::Line { start, end } => {
                let a = coords.point_to_screen(start);
                let b = coords.point_to_screen(end);
                ops.push(DrawOp::solid(a, b, color, width));
                anchors.extend([a, b]);
            }
            Shape::Fibonacci { start, end } => {
                let x1 = coords.time_to_x(start.time);
                let x2 = coords.time_to_x(end.time);
                let (left, right) = (x1.min(x2), x1.max(x2));
                let levels = fib_levels(start.price, end.price);
                for pair in levels.windows(2) {
                    let (y1, y2) = (coords.price_to_y(pair[0].price), coords.price_to_y(pair[1].price));
                    ops.push(DrawOp::Rect {
                        min: ScreenPos::new(left, y1.min(y2)),
                        max: ScreenPos::new(right, y1.max(y2)),
                        fill: with_alpha(color, FIB_BAND_ALPHA),
                    });
                }
                for level in &levels {
                    let y = coords.price_to_y(level.price);
                    ops.push(DrawOp::solid(
                        ScreenPos::new(left, y),
                        ScreenPos::new(right, y),
                        color,
                        width,
                    ));
                    ops.push(DrawOp::text(
                        ScreenPos::new(right + 4.0, y),
                        level.label(decimals),
                        color,
                        TextAlign::Left,
                    ));
                }
                anchors.extend([coords.point_to_screen(start), coords.point_to_screen(end)]);
            }
        }

        if show_anchors {
            for center in anchors {
                ops.push(DrawOp::Circle {
                    center,
                    radius: 4.0,
                    fill: color,
                });
            }
        }
    }

    fn timeline(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>) {
        let Some(overlay) = input.timeline else {
            return;
        };
        let layout = &input.coords.layout;
        let bottom = layout.main_height + layout.sub_height;
        let (deadline_color, expiration_color) = if overlay.state.frozen {
            (self.theme.frozen, self.theme.frozen)
        } else {
            (self.theme.deadline, self.theme.expiration)
        };

        for (x, color, label) in [
            (overlay.deadline_x, deadline_color, "Deadline"),
            (overlay.expiration_x, expiration_color, "Expiration"),
        ] {
            ops.push(DrawOp::Line {
                from: ScreenPos::new(x, 0.0),
                to: ScreenPos::new(x, bottom),
                color,
                width: 1.0,
                style: LineStyle::Dashed,
            });
            ops.push(DrawOp::text(ScreenPos::new(x, 12.0), label, color, TextAlign::Center));
        }
        ops.push(DrawOp::text(
            ScreenPos::new(overlay.deadline_x, 28.0),
            format_countdown(overlay.state.seconds_left),
            deadline_color,
            TextAlign::Center,
        ));
    }

    fn trades(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>, decimals: usize) {
        let coords = input.coords;
        for trade in input.trades.iter().filter(|t| t.is_for(input.symbol)) {
            let color = match trade.direction {
                TradeDirection::Up => self.theme.trade_up,
                TradeDirection::Down => self.theme.trade_down,
            };
            let entry = ScreenPos::new(coords.time_to_x(trade.opened_at), coords.price_to_y(trade.entry_price));
            let end = ScreenPos::new(coords.time_to_x(trade.expiration), entry.y);
            ops.push(DrawOp::solid(entry, end, color, 1.5));
            ops.push(DrawOp::Circle {
                center: entry,
                radius: 5.0,
                fill: color,
            });
            ops.push(DrawOp::text(
                ScreenPos::new(entry.x, entry.y - 10.0),
                format!("{} {:.2} @ {:.*}", trade.direction, trade.stake, decimals, trade.entry_price),
                color,
                TextAlign::Left,
            ));
            if let (Some(_), Some(profit)) = (trade.result, trade.profit) {
                ops.push(DrawOp::text(
                    ScreenPos::new(end.x, end.y - 10.0),
                    format!("{profit:+.2}"),
                    if profit >= 0.0 {
                        self.theme.trade_up
                    } else {
                        self.theme.trade_down
                    },
                    TextAlign::Right,
                ));
            }
        }
    }

    fn current_price(&self, ops: &mut Vec<DrawOp>, input: &FrameInput<'_>, decimals: usize) {
        let Some(price) = input.visual_price.filter(|p| p.is_finite()) else {
            return;
        };
        let coords = input.coords;
        let layout = &coords.layout;
        let y = coords.price_to_y(price);

        if let Some(live) = input.store.live_index() {
            let x = coords.index_to_x(live as f64);
            let left = (x - coords.pixels_per_candle() * 0.5).clamp(0.0, layout.chart_width);
            if y < layout.main_height {
                ops.push(DrawOp::Gradient {
                    min: ScreenPos::new(left, y.max(0.0)),
                    max: ScreenPos::new(layout.chart_width, layout.main_height),
                    top: with_alpha(self.theme.price_line, 0.25),
                    bottom: with_alpha(self.theme.price_line, 0.0),
                });
            }
            let phase = input.now_ms.rem_euclid(1200) as f64 / 1200.0;
            ops.push(DrawOp::Circle {
                center: ScreenPos::new(x, y),
                radius: 3.0 + 3.0 * phase,
                fill: with_alpha(self.theme.price_line, (1.0 - phase) as f32 * 0.6),
            });
        }

        ops.push(DrawOp::Line {
            from: ScreenPos::new(0.0, y),
            to: ScreenPos::new(layout.chart_width, y),
            color: self.theme.price_line,
            width: 1.0,
            style: LineStyle::Dashed,
        });
        ops.push(DrawOp::Rect {
            min: ScreenPos::new(layout.chart_width, y - 9.0),
            max: ScreenPos::new(layout.width, y + 9.0),
            fill: self.theme.price_label_bg,
        });
        ops.push(DrawOp::text(
            ScreenPos::new(layout.chart_width + 4.0, y),
            format!("{price:.decimals$}"),
            [1.0, 1.0, 1.0, 1.0],
            TextAlign::Left,
        ));
    }
}
