//! Centralized coordinate system for the chart.
//!
//! Three coordinate spaces are involved:
//!
//! - **Screen coordinates** ([`ScreenPos`]): pixels from the top-left of the
//!   chart surface
//! - **Index coordinates** ([`WorldPos`]): fractional candle index and price
//! - **Time coordinates** ([`WorldPoint`]): epoch milliseconds and price, the
//!   space drawings are stored in
//!
//! A [`CoordinateSystem`] is built once per frame from the viewport and the
//! fitted price range, and every conversion goes through it.

use pulse_core::Candle;

/// Width reserved on the right for the price axis.
pub const PRICE_AXIS_WIDTH: f64 = 64.0;
/// Height reserved at the bottom for the time axis.
pub const TIME_AXIS_HEIGHT: f64 = 24.0;
/// Share of the plot height given to the indicator sub-pane.
pub const SUB_PANE_HEIGHT_RATIO: f64 = 0.2;
/// Vertical breathing room added above and below the fitted price range.
pub const PRICE_PADDING_RATIO: f64 = 0.08;

/// Screen coordinates in pixels from the top-left corner.
///
/// X increases to the right, Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: ScreenPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Distance to the segment `a`-`b`.
    #[must_use]
    pub fn distance_to_segment(self, a: ScreenPos, b: ScreenPos) -> f64 {
        let (abx, aby) = (b.x - a.x, b.y - a.y);
        let len_sq = abx * abx + aby * aby;
        if len_sq <= f64::EPSILON {
            return self.distance_to(a);
        }
        let t = (((self.x - a.x) * abx + (self.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
        self.distance_to(ScreenPos::new(a.x + t * abx, a.y + t * aby))
    }
}

impl From<(f64, f64)> for ScreenPos {
    fn from(pos: (f64, f64)) -> Self {
        Self::new(pos.0, pos.1)
    }
}

/// Chart position as a fractional candle index and a price.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPos {
    pub candle_index: f64,
    pub price: f64,
}

impl WorldPos {
    #[must_use]
    pub const fn new(candle_index: f64, price: f64) -> Self {
        Self {
            candle_index,
            price,
        }
    }
}

/// Chart position as a timestamp and a price.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub price: f64,
}

impl WorldPoint {
    #[must_use]
    pub const fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }
}

/// Visible price range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.max - self.min
    }

    /// Fit `prices` with padding. Never zero-height and never non-finite.
    #[must_use]
    pub fn fit(prices: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in prices.into_iter().filter(|p| p.is_finite()) {
            min = min.min(p);
            max = max.max(p);
        }
        if min > max {
            return None;
        }
        let span = max - min;
        let pad = if span > 0.0 {
            span * PRICE_PADDING_RATIO
        } else {
            // Flat market: open a small band around the price.
            (max.abs() * 0.001).max(1e-9)
        };
        Some(Self::new(min - pad, max + pad))
    }
}

/// Maps candle indices to timestamps and back.
///
/// Inside history the mapping follows actual bucket starts, interpolating
/// across gaps. Outside it extrapolates by one timeframe period per candle.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    buckets: Vec<i64>,
    period: i64,
}

impl TimeScale {
    #[must_use]
    pub fn new(buckets: Vec<i64>, period: i64) -> Self {
        Self {
            buckets,
            period: period.max(1),
        }
    }

    #[must_use]
    pub fn from_candles<'a>(candles: impl IntoIterator<Item = &'a Candle>, period: i64) -> Self {
        Self::new(candles.into_iter().map(|c| c.bucket_start).collect(), period)
    }

    pub fn period(&self) -> i64 {
        self.period
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[must_use]
    pub fn time_to_index(&self, time: i64) -> f64 {
        let period = self.period as f64;
        let (Some(&first), Some(&last)) = (self.buckets.first(), self.buckets.last()) else {
            return time as f64 / period;
        };
        if time <= first {
            return (time - first) as f64 / period;
        }
        let last_index = (self.buckets.len() - 1) as f64;
        if time >= last {
            return last_index + (time - last) as f64 / period;
        }
        let i = self.buckets.partition_point(|&b| b <= time) - 1;
        let (a, b) = (self.buckets[i], self.buckets[i + 1]);
        let span = (b - a).max(1) as f64;
        i as f64 + (time - a) as f64 / span
    }

    #[must_use]
    pub fn index_to_time(&self, index: f64) -> i64 {
        let period = self.period as f64;
        if !index.is_finite() {
            return self.buckets.last().copied().unwrap_or(0);
        }
        let (Some(&first), Some(&last)) = (self.buckets.first(), self.buckets.last()) else {
            return (index * period).round() as i64;
        };
        if index <= 0.0 {
            return first + (index * period).round() as i64;
        }
        let last_index = (self.buckets.len() - 1) as f64;
        if index >= last_index {
            return last + ((index - last_index) * period).round() as i64;
        }
        let i = index.floor() as usize;
        let (a, b) = (self.buckets[i], self.buckets[i + 1]);
        a + ((index - i as f64) * (b - a) as f64).round() as i64
    }
}

/// Chart layout: main price pane, optional sub-pane, and axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    /// Plot width, left of the price axis.
    pub chart_width: f64,
    /// Main pane height.
    pub main_height: f64,
    /// Top of the sub-pane (equals `main_height` when there is none).
    pub sub_top: f64,
    pub sub_height: f64,
}

impl ChartLayout {
    /// Sizes below one pixel are raised to one so no division ever hits zero.
    #[must_use]
    pub fn new(width: f64, height: f64, with_sub_pane: bool) -> Self {
        let width = if width.is_finite() { width.max(1.0) } else { 1.0 };
        let height = if height.is_finite() { height.max(1.0) } else { 1.0 };
        let chart_width = (width - PRICE_AXIS_WIDTH).max(1.0);
        let plot_height = (height - TIME_AXIS_HEIGHT).max(1.0);
        let sub_height = if with_sub_pane {
            plot_height * SUB_PANE_HEIGHT_RATIO
        } else {
            0.0
        };
        let main_height = (plot_height - sub_height).max(1.0);
        Self {
            width,
            height,
            chart_width,
            main_height,
            sub_top: main_height,
            sub_height,
        }
    }

    #[must_use]
    pub fn has_sub_pane(&self) -> bool {
        self.sub_height > 0.0
    }

    #[must_use]
    pub fn is_in_chart_area(&self, screen: ScreenPos) -> bool {
        screen.x >= 0.0
            && screen.x < self.chart_width
            && screen.y >= 0.0
            && screen.y < self.main_height
    }

    #[must_use]
    pub fn is_in_sub_pane(&self, screen: ScreenPos) -> bool {
        self.has_sub_pane()
            && screen.x >= 0.0
            && screen.x < self.chart_width
            && screen.y >= self.sub_top
            && screen.y < self.sub_top + self.sub_height
    }
}

/// Conversions for one frame.
#[derive(Debug, Clone)]
pub struct CoordinateSystem {
    pub layout: ChartLayout,
    pub start_index: f64,
    pub visible_count: f64,
    pub prices: PriceRange,
    pub time_scale: TimeScale,
}

impl CoordinateSystem {
    #[must_use]
    pub fn new(
        layout: ChartLayout,
        start_index: f64,
        visible_count: f64,
        prices: PriceRange,
        time_scale: TimeScale,
    ) -> Self {
        let prices = if prices.height() > 0.0 && prices.height().is_finite() {
            prices
        } else {
            let mid = if prices.min.is_finite() { prices.min } else { 0.0 };
            PriceRange::new(mid - 0.5, mid + 0.5)
        };
        Self {
            layout,
            start_index,
            visible_count: visible_count.max(1.0),
            prices,
            time_scale,
        }
    }

    /// Calculate the number of pixels per candle at the current zoom level.
    #[must_use]
    pub fn pixels_per_candle(&self) -> f64 {
        self.layout.chart_width / self.visible_count
    }

    /// X of the centre of candle `index`.
    #[must_use]
    pub fn index_to_x(&self, index: f64) -> f64 {
        (index - self.start_index + 0.5) * self.pixels_per_candle()
    }

    #[must_use]
    pub fn x_to_index(&self, x: f64) -> f64 {
        x / self.pixels_per_candle() + self.start_index - 0.5
    }

    #[must_use]
    pub fn price_to_y(&self, price: f64) -> f64 {
        (self.prices.max - price) / self.prices.height() * self.layout.main_height
    }

    #[must_use]
    pub fn y_to_price(&self, y: f64) -> f64 {
        self.prices.max - y / self.layout.main_height * self.prices.height()
    }

    #[must_use]
    pub fn world_to_screen(&self, world: WorldPos) -> ScreenPos {
        ScreenPos::new(self.index_to_x(world.candle_index), self.price_to_y(world.price))
    }

    #[must_use]
    pub fn screen_to_world(&self, screen: ScreenPos) -> WorldPos {
        WorldPos::new(self.x_to_index(screen.x), self.y_to_price(screen.y))
    }

    #[must_use]
    pub fn time_to_x(&self, time: i64) -> f64 {
        self.index_to_x(self.time_scale.time_to_index(time))
    }

    #[must_use]
    pub fn x_to_time(&self, x: f64) -> i64 {
        self.time_scale.index_to_time(self.x_to_index(x))
    }

    #[must_use]
    pub fn point_to_screen(&self, point: WorldPoint) -> ScreenPos {
        ScreenPos::new(self.time_to_x(point.time), self.price_to_y(point.price))
    }

    #[must_use]
    pub fn screen_to_point(&self, screen: ScreenPos) -> WorldPoint {
        WorldPoint::new(self.x_to_time(screen.x), self.y_to_price(screen.y))
    }

    /// Map a value in `[min, max]` into the sub-pane. Returns the sub-pane
    /// top when the range is degenerate.
    #[must_use]
    pub fn sub_pane_y(&self, value: f64, min: f64, max: f64) -> f64 {
        let l = &self.layout;
        let span = max - min;
        if span.is_nan() || span <= 0.0 || !value.is_finite() {
            return l.sub_top;
        }
        l.sub_top + (max - value) / span * l.sub_height
    }
}
