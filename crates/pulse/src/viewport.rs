//! Visible window over candle history.
//!
//! The window is a fractional `start_index` plus a fractional
//! `visible_count`, both in candle units. Every operation leaves
//! `0 <= start_index <= max(0, len - visible_count)`.

use pulse_config::ViewportConfig;
use pulse_core::Timeframe;

use crate::error::ConfigurationError;

/// Viewport limits and animation timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSettings {
    pub default_visible: f64,
    pub min_visible: f64,
    pub max_visible: f64,
    pub zoom_step: f64,
    pub animation_ms: i64,
    /// Empty slots kept right of the newest candle.
    pub right_padding: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            default_visible: 60.0,
            min_visible: 10.0,
            max_visible: 500.0,
            zoom_step: 1.05,
            animation_ms: 600,
            right_padding: 0.0,
        }
    }
}

impl ViewportSettings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.min_visible >= 1.0 && self.min_visible <= self.max_visible) {
            return Err(ConfigurationError::InvalidViewport(format!(
                "min_visible {} must be in 1..=max_visible {}",
                self.min_visible, self.max_visible
            )));
        }
        if !(self.zoom_step > 1.0) {
            return Err(ConfigurationError::InvalidViewport(format!(
                "zoom_step {} must exceed 1",
                self.zoom_step
            )));
        }
        if self.animation_ms < 0 || !(self.right_padding >= 0.0) {
            return Err(ConfigurationError::InvalidViewport(
                "animation_ms and right_padding must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

impl From<&ViewportConfig> for ViewportSettings {
    fn from(c: &ViewportConfig) -> Self {
        Self {
            default_visible: c.default_visible as f64,
            min_visible: c.min_visible as f64,
            max_visible: c.max_visible as f64,
            zoom_step: c.zoom_step,
            animation_ms: c.animation_ms,
            right_padding: c.right_padding_candles as f64,
        }
    }
}

/// Preset time spans for the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPeriod {
    Minutes5,
    Minutes15,
    Minutes30,
    Hour1,
    Hours4,
    Day1,
}

impl ViewPeriod {
    pub fn millis(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            ViewPeriod::Minutes5 => 5 * MINUTE,
            ViewPeriod::Minutes15 => 15 * MINUTE,
            ViewPeriod::Minutes30 => 30 * MINUTE,
            ViewPeriod::Hour1 => 60 * MINUTE,
            ViewPeriod::Hours4 => 240 * MINUTE,
            ViewPeriod::Day1 => 1440 * MINUTE,
        }
    }

    /// Candles needed to cover this span at `timeframe`, at least one.
    pub fn candle_count(&self, timeframe: Timeframe) -> f64 {
        (self.millis() / timeframe.millis()).max(1) as f64
    }
}

/// Zoom input direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// Fewer, wider candles.
    In,
    /// More, narrower candles.
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from_start: f64,
    from_count: f64,
    to_start: f64,
    to_count: f64,
    started_at: i64,
    pinned_to_end: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanAnchor {
    pointer_x: f64,
    start_index: f64,
}

/// Ease-out cubic on `t` in `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Pannable, zoomable window over `len` candles.
#[derive(Debug, Clone)]
pub struct Viewport {
    settings: ViewportSettings,
    start: f64,
    count: f64,
    len: usize,
    animation: Option<Animation>,
    pan: Option<PanAnchor>,
}

impl Viewport {
    pub fn new(settings: ViewportSettings) -> Self {
        let count = settings
            .default_visible
            .clamp(settings.min_visible, settings.max_visible);
        Self {
            settings,
            start: 0.0,
            count,
            len: 0,
            animation: None,
            pan: None,
        }
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    /// Apply new limits, keeping the current window where possible.
    pub fn set_settings(&mut self, settings: ViewportSettings) -> Result<(), ConfigurationError> {
        settings.validate()?;
        self.settings = settings;
        self.count = self
            .count
            .clamp(self.settings.min_visible, self.settings.max_visible);
        self.animation = None;
        self.clamp();
        Ok(())
    }

    pub fn start_index(&self) -> f64 {
        self.start
    }

    pub fn visible_count(&self) -> f64 {
        self.count
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn total(&self) -> f64 {
        self.len as f64 + self.settings.right_padding
    }

    fn max_start_for(&self, count: f64) -> f64 {
        (self.total() - count).max(0.0)
    }

    /// Largest valid `start_index` for the current count.
    pub fn max_start(&self) -> f64 {
        self.max_start_for(self.count)
    }

    /// Within one candle of the newest data.
    pub fn is_at_end(&self) -> bool {
        self.start >= self.max_start() - 1.0
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Whole-candle index range touched by the window, clipped to data.
    pub fn visible_range(&self) -> (usize, usize) {
        let first = self.start.floor().max(0.0) as usize;
        let end = (self.start + self.count).ceil().max(0.0) as usize;
        (first.min(self.len), end.min(self.len))
    }

    fn clamp(&mut self) {
        let max = self.max_start();
        self.start = if self.start.is_finite() {
            self.start.clamp(0.0, max)
        } else {
            max
        };
    }

    /// New data set: default width, pinned to the newest candle.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.count = self
            .settings
            .default_visible
            .clamp(self.settings.min_visible, self.settings.max_visible);
        self.animation = None;
        self.pan = None;
        self.start = self.max_start();
    }

    /// Data length changed. A window showing the newest candle follows it.
    pub fn set_len(&mut self, len: usize) {
        let follow = self.is_at_end();
        self.len = len;
        if follow {
            self.start = self.max_start();
        }
        self.clamp();
    }

    /// Start a drag at `pointer_x`. Returns `false` (and ignores the drag)
    /// when the pointer is over an interactive overlay.
    pub fn begin_pan(&mut self, pointer_x: f64, over_overlay: bool) -> bool {
        if over_overlay || !pointer_x.is_finite() {
            self.pan = None;
            return false;
        }
        self.animation = None;
        self.pan = Some(PanAnchor {
            pointer_x,
            start_index: self.start,
        });
        true
    }

    /// Continue a drag. Dragging right reveals older candles.
    pub fn drag_to(&mut self, pointer_x: f64, chart_width: f64) {
        let Some(anchor) = self.pan else {
            return;
        };
        let ppc = self.pixels_per_candle(chart_width);
        if !pointer_x.is_finite() || ppc <= 0.0 {
            return;
        }
        self.start = anchor.start_index - (pointer_x - anchor.pointer_x) / ppc;
        self.clamp();
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    /// One-shot pan by a pixel delta.
    pub fn pan_by_pixels(&mut self, dx: f64, chart_width: f64) {
        let ppc = self.pixels_per_candle(chart_width);
        if !dx.is_finite() || ppc <= 0.0 {
            return;
        }
        self.animation = None;
        self.start -= dx / ppc;
        self.clamp();
    }

    pub fn pixels_per_candle(&self, chart_width: f64) -> f64 {
        if self.count > 0.0 {
            chart_width.max(1.0) / self.count
        } else {
            0.0
        }
    }

    /// One zoom notch. `pointer_fraction` is the pointer's horizontal
    /// position across the chart, 0 at the left edge.
    pub fn zoom(&mut self, direction: ZoomDirection, pointer_fraction: f64) {
        self.animation = None;
        let s = &self.settings;
        let new_count = match direction {
            ZoomDirection::In => (self.count / s.zoom_step).max(s.min_visible),
            // Always at least one more candle so zooming out never stalls.
            ZoomDirection::Out => (self.count * s.zoom_step)
                .max(self.count + 1.0)
                .min(s.max_visible),
        };
        if new_count == self.count {
            return;
        }

        if self.is_at_end() {
            self.count = new_count;
            self.start = self.max_start();
        } else {
            let fraction = if pointer_fraction.is_finite() {
                pointer_fraction.clamp(0.0, 1.0)
            } else {
                0.5
            };
            let anchor = self.start + fraction * self.count;
            self.count = new_count;
            self.start = anchor - fraction * new_count;
        }
        self.clamp();
    }

    /// Animate to a new visible count over the configured duration.
    pub fn animate_to(&mut self, target_count: f64, now_ms: i64) {
        if !target_count.is_finite() {
            return;
        }
        let to_count = target_count.clamp(self.settings.min_visible, self.settings.max_visible);
        let pinned_to_end = self.is_at_end();
        let to_start = if pinned_to_end {
            self.max_start_for(to_count)
        } else {
            // Keep the right edge where it is.
            (self.start + self.count - to_count).clamp(0.0, self.max_start_for(to_count))
        };
        log::debug!("Viewport animating {:.1} -> {:.1} candles", self.count, to_count);
        self.animation = Some(Animation {
            from_start: self.start,
            from_count: self.count,
            to_start,
            to_count,
            started_at: now_ms,
            pinned_to_end,
        });
        if self.settings.animation_ms == 0 {
            self.step(now_ms);
        }
    }

    /// Jump to a preset span.
    pub fn apply_period(&mut self, period: ViewPeriod, timeframe: Timeframe, now_ms: i64) {
        self.animate_to(period.candle_count(timeframe), now_ms);
    }

    /// Advance any running animation. Returns `true` while animating.
    pub fn step(&mut self, now_ms: i64) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let duration = self.settings.animation_ms.max(1) as f64;
        let t = ((now_ms - anim.started_at) as f64 / duration).clamp(0.0, 1.0);
        let e = ease_out_cubic(t);

        let to_start = if anim.pinned_to_end {
            self.max_start_for(anim.to_count)
        } else {
            anim.to_start
        };
        self.count = anim.from_count + (anim.to_count - anim.from_count) * e;
        self.start = anim.from_start + (to_start - anim.from_start) * e;

        if t >= 1.0 {
            self.count = anim.to_count;
            self.animation = None;
            if anim.pinned_to_end || self.is_at_end() {
                self.start = self.max_start();
            }
            log::debug!("Viewport animation finished at {:.1} candles", self.count);
        }
        self.clamp();
        self.animation.is_some()
    }
}
