//! Dynamic indicator registry for managing technical indicators at runtime.
//!
//! Indicators are stored as trait objects so the configured set can change
//! at runtime. Each instance keeps a value series aligned with closed
//! history and a live value for the in-progress candle.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use pulse_config::IndicatorEntry;
use pulse_core::{Candle, TimeSeries};
use pulse_indicators::{
    Bollinger, BollingerConfig, Ema, EmaConfig, Indicator, IndicatorValue, Macd, MacdConfig, Rsi,
    RsiConfig, Sma, SmaConfig, Volume, VolumeConfig,
};

use crate::error::ConfigurationError;

/// Indicator families the engine can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Bollinger,
    Rsi,
    Macd,
    Volume,
}

impl IndicatorKind {
    /// Drawn on the price pane rather than the sub-pane.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Sma | Self::Ema | Self::Bollinger)
    }
}

impl FromStr for IndicatorKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sma" => Ok(Self::Sma),
            "ema" => Ok(Self::Ema),
            "bollinger" | "bb" => Ok(Self::Bollinger),
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "volume" => Ok(Self::Volume),
            _ => Err(ConfigurationError::UnknownIndicatorKind(s.to_string())),
        }
    }
}

/// Presentation-only settings. Changing these never recomputes values.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorStyle {
    /// RGB in 0..=1.
    pub color: [f32; 3],
    pub line_width: f32,
}

impl Default for IndicatorStyle {
    fn default() -> Self {
        Self {
            color: [0.2, 0.6, 1.0],
            line_width: 1.5,
        }
    }
}

/// One requested indicator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub id: String,
    pub kind: IndicatorKind,
    /// Lookback. For MACD this is the slow period; fast and signal keep
    /// their 12/9 defaults.
    pub period: usize,
    pub style: IndicatorStyle,
}

impl IndicatorSpec {
    pub fn new(id: impl Into<String>, kind: IndicatorKind, period: usize) -> Self {
        Self {
            id: id.into(),
            kind,
            period,
            style: IndicatorStyle::default(),
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: IndicatorStyle) -> Self {
        self.style = style;
        self
    }

    /// Fields whose change invalidates computed values.
    fn identity(&self) -> (&str, IndicatorKind, usize) {
        (&self.id, self.kind, self.period)
    }

    fn build(&self) -> Box<dyn DynIndicator> {
        match self.kind {
            IndicatorKind::Sma => Box::new(Sma::new(SmaConfig {
                period: self.period,
                ..Default::default()
            })),
            IndicatorKind::Ema => Box::new(Ema::new(EmaConfig {
                period: self.period,
                ..Default::default()
            })),
            IndicatorKind::Bollinger => Box::new(Bollinger::new(BollingerConfig {
                period: self.period,
                ..Default::default()
            })),
            IndicatorKind::Rsi => Box::new(Rsi::new(RsiConfig {
                period: self.period,
                ..Default::default()
            })),
            IndicatorKind::Macd => {
                let defaults = MacdConfig::default();
                Box::new(Macd::new(MacdConfig {
                    fast_period: defaults.fast_period.min(self.period),
                    slow_period: self.period,
                    ..defaults
                }))
            }
            IndicatorKind::Volume => Box::new(Volume::new(VolumeConfig::default())),
        }
    }
}

impl TryFrom<&IndicatorEntry> for IndicatorSpec {
    type Error = ConfigurationError;

    fn try_from(entry: &IndicatorEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entry.id.clone(),
            kind: entry.kind.parse()?,
            period: entry.period,
            style: IndicatorStyle {
                color: entry.color,
                line_width: entry.line_width,
            },
        })
    }
}

/// A trait object wrapper for dynamic indicator dispatch.
///
/// This allows different indicator types to be stored and used polymorphically.
pub trait DynIndicator: Send + Sync {
    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue>;

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue>;

    fn reset(&mut self);

    /// Minimum number of periods required before the indicator produces valid output.
    fn min_periods(&self) -> usize;

    fn is_overlay(&self) -> bool;

    /// Get the human-readable name of this indicator.
    fn name(&self) -> &str;
}

impl<T> DynIndicator for T
where
    T: Indicator + Send + Sync,
{
    fn update(&mut self, candle: &Candle) -> Option<IndicatorValue> {
        Indicator::update(self, candle)
    }

    fn peek(&self, candle: &Candle) -> Option<IndicatorValue> {
        Indicator::peek(self, candle)
    }

    fn reset(&mut self) {
        Indicator::reset(self)
    }

    fn min_periods(&self) -> usize {
        Indicator::min_periods(self)
    }

    fn is_overlay(&self) -> bool {
        Indicator::is_overlay(self)
    }

    fn name(&self) -> &str {
        Indicator::name(self)
    }
}

/// A single instance of an indicator with its outputs.
pub struct IndicatorInstance {
    pub spec: IndicatorSpec,
    indicator: Box<dyn DynIndicator>,
    /// Values aligned 1:1 with closed history.
    series: TimeSeries<IndicatorValue>,
    /// Value for the live candle, refreshed every frame.
    live: Option<IndicatorValue>,
}

impl IndicatorInstance {
    fn new(spec: IndicatorSpec) -> Self {
        let indicator = spec.build();
        Self {
            spec,
            indicator,
            series: TimeSeries::new(),
            live: None,
        }
    }

    fn compute(&mut self, closed: &[Candle]) {
        self.indicator.reset();
        self.series = closed.iter().map(|c| self.indicator.update(c)).collect();
        self.live = None;
    }

    pub fn series(&self) -> &TimeSeries<IndicatorValue> {
        &self.series
    }

    pub fn live_value(&self) -> Option<IndicatorValue> {
        self.live
    }

    /// Value at display index `index`, where `live_index` is the live
    /// candle's slot if one exists.
    pub fn value_at(&self, index: usize, live_index: Option<usize>) -> Option<IndicatorValue> {
        if live_index == Some(index) {
            self.live
        } else {
            self.series.get(index).copied()
        }
    }

    pub fn name(&self) -> &str {
        self.indicator.name()
    }

    pub fn is_overlay(&self) -> bool {
        self.indicator.is_overlay()
    }

    pub fn min_periods(&self) -> usize {
        self.indicator.min_periods()
    }
}

/// Owns all indicator instances and keeps them in step with history.
#[derive(Default)]
pub struct IndicatorEngine {
    instances: Vec<IndicatorInstance>,
}

impl IndicatorEngine {
    /// Create a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configured set.
    ///
    /// When the same ids come back with the same kinds and periods, in any
    /// order, only the styles and the order are updated and `Ok(false)` is returned. Otherwise everything is
    /// rebuilt over `closed` and `Ok(true)` is returned. Invalid specs leave
    /// the current set untouched.
    pub fn configure(
        &mut self,
        specs: Vec<IndicatorSpec>,
        closed: &[Candle],
    ) -> Result<bool, ConfigurationError> {
        let mut ids = HashSet::new();
        for spec in &specs {
            if spec.period == 0 && spec.kind != IndicatorKind::Volume {
                return Err(ConfigurationError::InvalidPeriod {
                    id: spec.id.clone(),
                    period: spec.period,
                });
            }
            if !ids.insert(spec.id.as_str()) {
                return Err(ConfigurationError::DuplicateIndicatorId(spec.id.clone()));
            }
        }

        let same_set = specs.len() == self.instances.len()
            && specs.iter().all(|spec| {
                self.get(&spec.id)
                    .is_some_and(|old| old.spec.identity() == spec.identity())
            });

        if same_set {
            let mut by_id: HashMap<String, IndicatorInstance> = self
                .instances
                .drain(..)
                .map(|instance| (instance.spec.id.clone(), instance))
                .collect();
            self.instances = specs
                .into_iter()
                .filter_map(|spec| {
                    let mut instance = by_id.remove(&spec.id)?;
                    instance.spec.style = spec.style;
                    Some(instance)
                })
                .collect();
            return Ok(false);
        }

        self.instances = specs.into_iter().map(IndicatorInstance::new).collect();
        self.recompute(closed);
        Ok(true)
    }

    /// Rebuild every series from scratch.
    pub fn recompute(&mut self, closed: &[Candle]) {
        for instance in &mut self.instances {
            instance.compute(closed);
        }
        if !self.instances.is_empty() {
            log::info!(
                "Recomputed {} indicators over {} candles",
                self.instances.len(),
                closed.len()
            );
        }
    }

    /// Fold one newly closed candle into every instance.
    pub fn on_candle_closed(&mut self, candle: &Candle) {
        for instance in &mut self.instances {
            let value = instance.indicator.update(candle);
            instance.series.push(value);
        }
    }

    /// Refresh live values from the current live candle.
    pub fn update_live(&mut self, live: Option<&Candle>) {
        for instance in &mut self.instances {
            instance.live = live
                .and_then(|c| instance.indicator.peek(c))
                .filter(IndicatorValue::is_finite);
        }
    }

    /// Closed candles needed before every indicator produces output.
    pub fn warmup_required(&self) -> usize {
        self.instances
            .iter()
            .map(IndicatorInstance::min_periods)
            .max()
            .unwrap_or(0)
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorInstance> {
        self.instances.iter().find(|i| i.spec.id == id)
    }

    /// Iterate over all indicator instances.
    pub fn iter(&self) -> impl Iterator<Item = &IndicatorInstance> {
        self.instances.iter()
    }

    pub fn has_sub_pane(&self) -> bool {
        self.instances.iter().any(|i| !i.is_overlay())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
