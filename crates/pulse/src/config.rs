//! Engine settings resolved from the TOML configuration.
//!
//! The engine never touches the filesystem. Hosts load a
//! [`pulse_config::Config`] and convert it here.

use std::collections::HashMap;

use pulse_config::Config;
use pulse_core::Timeframe;

use crate::candle_store::StoreSettings;
use crate::error::ConfigurationError;
use crate::indicators::IndicatorSpec;
use crate::motion::MotionParams;
use crate::render::{ChartStyle, Theme};
use crate::timeline::TimelineSettings;
use crate::viewport::ViewportSettings;

/// Everything [`crate::ChartEngine`] needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub store: StoreSettings,
    /// Seed candles kept after re-bucketing.
    pub max_candles: usize,
    /// Closed candles required before motion starts, on top of what the
    /// indicators need.
    pub min_warmup_candles: usize,
    /// Motion tuning for every timeframe.
    pub motion: HashMap<Timeframe, MotionParams>,
    pub viewport: ViewportSettings,
    pub timeline: TimelineSettings,
    pub hit_tolerance_px: f64,
    pub indicators: Vec<IndicatorSpec>,
    pub chart_style: ChartStyle,
    pub theme: Theme,
}

impl EngineConfig {
    /// Motion tuning for `timeframe`.
    pub fn motion_for(&self, timeframe: Timeframe) -> MotionParams {
        self.motion.get(&timeframe).cloned().unwrap_or_default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        // The default configuration always converts.
        Self::try_from(&Config::default()).unwrap_or_else(|_| Self {
            symbol: "EURUSD".into(),
            timeframe: Timeframe::Min1,
            store: StoreSettings::default(),
            max_candles: 500,
            min_warmup_candles: 1,
            motion: HashMap::new(),
            viewport: ViewportSettings::default(),
            timeline: TimelineSettings::default(),
            hit_tolerance_px: 20.0,
            indicators: Vec::new(),
            chart_style: ChartStyle::default(),
            theme: Theme::default(),
        })
    }
}

impl TryFrom<&Config> for EngineConfig {
    type Error = ConfigurationError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let timeframe: Timeframe = config.general.timeframe.parse()?;
        let viewport = ViewportSettings::from(&config.viewport);
        viewport.validate()?;
        let indicators = config
            .indicators
            .iter()
            .map(IndicatorSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let chart_style: ChartStyle = config.chart.style.parse()?;
        let theme = Theme::named(&config.chart.theme)
            .ok_or_else(|| ConfigurationError::UnknownTheme(config.chart.theme.clone()))?;
        let motion = Timeframe::all()
            .iter()
            .map(|tf| (*tf, MotionParams::from(&config.motion_for_timeframe(tf.label()))))
            .collect();

        Ok(Self {
            symbol: config.general.symbol.clone(),
            timeframe,
            store: StoreSettings {
                gap_cap_periods: config.history.gap_cap_periods.max(1),
            },
            max_candles: config.history.max_candles,
            min_warmup_candles: config.history.min_warmup_candles,
            motion,
            viewport,
            timeline: TimelineSettings::from(&config.timeline),
            hit_tolerance_px: config.drawing.effective_hit_tolerance(),
            indicators,
            chart_style,
            theme,
        })
    }
}
