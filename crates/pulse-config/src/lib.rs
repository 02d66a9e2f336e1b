//! Configuration management for pulse.
//!
//! Loads configuration from TOML files with support for per-timeframe motion
//! parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub history: HistoryConfig,
    pub motion: MotionConfig,
    pub viewport: ViewportConfig,
    pub timeline: TimelineConfig,
    pub drawing: DrawingConfig,
    pub chart: ChartConfig,
    pub indicators: Vec<IndicatorEntry>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations.
    ///
    /// Searches in order:
    /// 1. `./pulse.toml`
    /// 2. `~/.config/pulse/pulse.toml`
    ///
    /// Returns default config if no file found.
    pub fn load_default() -> Self {
        if let Ok(config) = Self::load(Self::default_path()) {
            return config;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("pulse").join("pulse.toml");
            if let Ok(config) = Self::load(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("pulse.toml")
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let vp = &self.viewport;
        if vp.min_visible == 0 || vp.min_visible > vp.max_visible {
            return Err(ConfigError::Invalid(format!(
                "viewport.min_visible ({}) must be in 1..=max_visible ({})",
                vp.min_visible, vp.max_visible
            )));
        }
        if !(vp.zoom_step > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "viewport.zoom_step must be > 1, got {}",
                vp.zoom_step
            )));
        }
        let friction = self.motion.default.friction;
        if !(friction > 0.0 && friction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "motion.default.friction must be in (0, 1), got {friction}"
            )));
        }
        if self.history.max_candles == 0 {
            return Err(ConfigError::Invalid("history.max_candles must be > 0".into()));
        }
        for entry in &self.indicators {
            if entry.period == 0 {
                return Err(ConfigError::Invalid(format!(
                    "indicator '{}' has period 0",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    /// Get motion parameters for a specific timeframe.
    /// Falls back to default if timeframe not configured.
    pub fn motion_for_timeframe(&self, timeframe: &str) -> MotionSettings {
        self.motion
            .timeframes
            .get(timeframe)
            .map(|tf| self.motion.default.merge(tf))
            .unwrap_or_else(|| self.motion.default.clone())
    }
}

/// General application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Symbol loaded on startup.
    pub symbol: String,
    /// Timeframe label loaded on startup.
    pub timeframe: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD".to_string(),
            timeframe: "1m".to_string(),
        }
    }
}

/// Candle history limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Most recent candles kept from a seed.
    pub max_candles: usize,
    /// A tick further than this many periods past the last candle is
    /// treated as a market gap and displayed at last + 1 period.
    pub gap_cap_periods: u32,
    /// Closed candles required before motion animates instead of snapping.
    pub min_warmup_candles: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_candles: 500,
            gap_cap_periods: 3,
            min_warmup_candles: 1,
        }
    }
}

/// Motion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Default motion parameters.
    pub default: MotionSettings,
    /// Per-timeframe overrides.
    pub timeframes: HashMap<String, MotionOverride>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        // Shorter buckets move livelier.
        let table: [(&str, f64, f64); 10] = [
            ("5s", 0.26, 4e-5),
            ("15s", 0.24, 3e-5),
            ("30s", 0.22, 2.5e-5),
            ("1m", 0.20, 2e-5),
            ("5m", 0.19, 1.5e-5),
            ("15m", 0.18, 1.2e-5),
            ("30m", 0.17, 1e-5),
            ("1h", 0.16, 8e-6),
            ("4h", 0.15, 6e-6),
            ("1d", 0.14, 5e-6),
        ];
        let timeframes = table
            .iter()
            .map(|&(label, acceleration, jitter)| {
                (
                    label.to_string(),
                    MotionOverride {
                        acceleration: Some(acceleration),
                        jitter: Some(jitter),
                    },
                )
            })
            .collect();

        Self {
            default: MotionSettings::default(),
            timeframes,
        }
    }
}

/// Motion parameters (full config with all fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Spring gain toward the target, per 60 Hz frame.
    pub acceleration: f64,
    /// Micro-jitter amplitude as a fraction of price.
    pub jitter: f64,
    /// Velocity retained per 60 Hz frame.
    pub friction: f64,
    /// Gain multiplier when far from the target.
    pub far_gain: f64,
    /// Gain multiplier when almost on the target.
    pub near_gain: f64,
    /// Relative distance above which `far_gain` applies.
    pub far_threshold: f64,
    /// Relative distance below which `near_gain` applies.
    pub near_threshold: f64,
    /// Ticks older than this let residual inertia keep the price drifting.
    pub stale_tick_ms: i64,
    /// Share of previous velocity blended back in while ticks are stale.
    pub inertia_blend: f64,
    pub jitter_enabled: bool,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            acceleration: 0.20,
            jitter: 2e-5,
            friction: 0.6,
            far_gain: 2.0,
            near_gain: 0.15,
            far_threshold: 0.002,
            near_threshold: 0.0005,
            stale_tick_ms: 200,
            inertia_blend: 0.02,
            jitter_enabled: true,
        }
    }
}

impl MotionSettings {
    /// Merge with an override, using override values where present.
    pub fn merge(&self, override_config: &MotionOverride) -> Self {
        Self {
            acceleration: override_config.acceleration.unwrap_or(self.acceleration),
            jitter: override_config.jitter.unwrap_or(self.jitter),
            ..self.clone()
        }
    }
}

/// Motion override (all fields optional for partial overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionOverride {
    pub acceleration: Option<f64>,
    pub jitter: Option<f64>,
}

/// Viewport limits and animation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub default_visible: usize,
    pub min_visible: usize,
    pub max_visible: usize,
    /// Multiplicative change per wheel notch.
    pub zoom_step: f64,
    /// Duration of animated window-size changes.
    pub animation_ms: i64,
    /// Empty candle slots kept to the right of the live candle.
    pub right_padding_candles: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            default_visible: 60,
            min_visible: 10,
            max_visible: 500,
            zoom_step: 1.05,
            animation_ms: 600,
            right_padding_candles: 0,
        }
    }
}

/// Deadline/expiration marker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Gap between the entry deadline and the expiration.
    pub offset_ms: i64,
    /// Shortest expiration cycle, used when the timeframe is shorter.
    pub min_cycle_ms: i64,
    /// Marker moves larger than this are eased instead of applied directly.
    pub ease_threshold_px: f64,
    /// Fraction of the remaining distance covered per eased frame.
    pub ease_factor: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            offset_ms: 30_000,
            min_cycle_ms: 60_000,
            ease_threshold_px: 50.0,
            ease_factor: 0.15,
        }
    }
}

/// Drawing tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Pointer distance that still counts as a hit. Clamped to 15..=25.
    pub hit_tolerance_px: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            hit_tolerance_px: 20.0,
        }
    }
}

impl DrawingConfig {
    pub fn effective_hit_tolerance(&self) -> f64 {
        self.hit_tolerance_px.clamp(15.0, 25.0)
    }
}

/// Presentation of the main pane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// `candles`, `line` or `area`.
    pub style: String,
    /// `dark`, `light`, `blue` or `green`.
    pub theme: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            style: "candles".to_string(),
            theme: "dark".to_string(),
        }
    }
}

/// One configured indicator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEntry {
    pub id: String,
    /// `sma`, `ema`, `bollinger`, `rsi`, `macd` or `volume`.
    pub kind: String,
    #[serde(default = "default_indicator_period")]
    pub period: usize,
    /// RGB in 0..=1.
    #[serde(default = "default_indicator_color")]
    pub color: [f32; 3],
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

fn default_indicator_period() -> usize {
    14
}

fn default_indicator_color() -> [f32; 3] {
    [0.2, 0.6, 1.0]
}

fn default_line_width() -> f32 {
    1.5
}
