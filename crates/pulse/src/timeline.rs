//! Trade-entry deadline and expiration markers.
//!
//! Only the expiration is stored: the deadline is always derived as
//! `expiration - offset`, whichever mode produced the expiration.

use pulse_config::TimelineConfig;
use pulse_core::Timeframe;

use crate::trade::TradeSnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSettings {
    /// Distance between deadline and expiration.
    pub offset_ms: i64,
    /// Shortest automatic cycle; short timeframes use this instead.
    pub min_cycle_ms: i64,
    /// Marker moves larger than this are eased instead of jumped.
    pub ease_threshold_px: f64,
    /// Share of the remaining distance covered per eased frame.
    pub ease_factor: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            offset_ms: 30_000,
            min_cycle_ms: 60_000,
            ease_threshold_px: 50.0,
            ease_factor: 0.15,
        }
    }
}

impl From<&TimelineConfig> for TimelineSettings {
    fn from(config: &TimelineConfig) -> Self {
        Self {
            offset_ms: config.offset_ms.max(0),
            min_cycle_ms: config.min_cycle_ms.max(1),
            ease_threshold_px: config.ease_threshold_px,
            ease_factor: config.ease_factor.clamp(0.0, 1.0),
        }
    }
}

/// Where the expiration comes from when no trade is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineMode {
    Automatic,
    Manual { expiration: i64 },
}

/// Snapshot returned to the host each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineState {
    pub deadline: i64,
    pub expiration: i64,
    /// Whole seconds to the deadline, clamped to `[0, offset]`.
    pub seconds_left: i64,
    pub can_enter_trade: bool,
    pub frozen: bool,
}

/// A rollover produced by [`TimelineMarkers::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineAdvance {
    pub deadline: i64,
    pub expiration: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Freeze {
    trade_id: String,
    expiration: i64,
}

/// First cycle boundary strictly after `now`.
fn next_cycle_boundary(now: i64, cycle: i64) -> i64 {
    (now.div_euclid(cycle) + 1) * cycle
}

#[derive(Debug, Clone)]
pub struct TimelineMarkers {
    settings: TimelineSettings,
    period_ms: i64,
    mode: TimelineMode,
    expiration: Option<i64>,
    frozen: Option<Freeze>,
    easing: MarkerEasing,
}

impl TimelineMarkers {
    pub fn new(settings: TimelineSettings, timeframe: Timeframe) -> Self {
        Self {
            settings,
            period_ms: timeframe.millis(),
            mode: TimelineMode::Automatic,
            expiration: None,
            frozen: None,
            easing: MarkerEasing::default(),
        }
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn mode(&self) -> TimelineMode {
        self.mode
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Length of one automatic cycle.
    pub fn cycle_ms(&self) -> i64 {
        self.period_ms.max(self.settings.min_cycle_ms)
    }

    /// Current expiration, if one has been computed.
    pub fn expiration(&self) -> Option<i64> {
        self.frozen
            .as_ref()
            .map(|f| f.expiration)
            .or(self.expiration)
    }

    pub fn deadline(&self) -> Option<i64> {
        self.expiration().map(|e| e - self.settings.offset_ms)
    }

    fn automatic_expiration(&self, now: i64) -> i64 {
        let cycle = self.cycle_ms();
        let mut expiration = next_cycle_boundary(now, cycle);
        while now >= expiration - self.settings.offset_ms {
            expiration += cycle;
        }
        expiration
    }

    /// Switch timeframe. The automatic cycle is recomputed immediately.
    pub fn set_timeframe(&mut self, timeframe: Timeframe, now: i64) {
        self.period_ms = timeframe.millis();
        if self.mode == TimelineMode::Automatic {
            self.expiration = Some(self.automatic_expiration(now));
        }
        self.easing.snap_next();
    }

    /// Pin the expiration. Applied instantly, overriding any easing.
    pub fn set_manual_expiration(&mut self, expiration: i64) {
        self.mode = TimelineMode::Manual { expiration };
        self.expiration = Some(expiration);
        self.easing.snap_next();
    }

    /// Return to automatic cycles.
    pub fn clear_manual(&mut self, now: i64) {
        self.mode = TimelineMode::Automatic;
        self.expiration = Some(self.automatic_expiration(now));
        self.easing.snap_next();
    }

    /// Per-frame update. Returns the new timestamps when an automatic
    /// rollover happened this frame.
    pub fn update(&mut self, now: i64) -> Option<TimelineAdvance> {
        if self.frozen.is_some() {
            return None;
        }
        match self.mode {
            TimelineMode::Manual { expiration } => {
                self.expiration = Some(expiration);
                None
            }
            TimelineMode::Automatic => match self.expiration {
                None => {
                    self.expiration = Some(self.automatic_expiration(now));
                    None
                }
                Some(current) if now >= current - self.settings.offset_ms => {
                    let expiration = self.automatic_expiration(now);
                    self.expiration = Some(expiration);
                    self.easing.snap_next();
                    log::info!("timeline advanced to expiration {}", expiration);
                    Some(TimelineAdvance {
                        deadline: expiration - self.settings.offset_ms,
                        expiration,
                    })
                }
                Some(_) => None,
            },
        }
    }

    /// Freeze on the first active trade for `symbol`, release when none is
    /// left. Returns the new frozen flag when it changed.
    pub fn sync_trades(&mut self, trades: &[TradeSnapshot], symbol: &str, now: i64) -> Option<bool> {
        let active = trades
            .iter()
            .filter(|t| t.is_for(symbol) && t.is_active(now))
            .min_by_key(|t| t.expiration);

        match (&self.frozen, active) {
            (None, Some(trade)) => {
                log::info!(
                    "timeline frozen on trade {} until {}",
                    trade.id,
                    trade.expiration
                );
                self.frozen = Some(Freeze {
                    trade_id: trade.id.clone(),
                    expiration: trade.expiration,
                });
                self.easing.snap_next();
                Some(true)
            }
            (Some(freeze), None) => {
                log::info!("timeline released from trade {}", freeze.trade_id);
                self.frozen = None;
                self.expiration = Some(match self.mode {
                    TimelineMode::Manual { expiration } => expiration,
                    TimelineMode::Automatic => self.automatic_expiration(now),
                });
                self.easing.snap_next();
                Some(false)
            }
            _ => None,
        }
    }

    /// Drop any freeze and recompute. Used on symbol change.
    pub fn reset(&mut self, now: i64) {
        self.frozen = None;
        self.expiration = Some(match self.mode {
            TimelineMode::Manual { expiration } => expiration,
            TimelineMode::Automatic => self.automatic_expiration(now),
        });
        self.easing.reset();
    }

    pub fn state(&mut self, now: i64) -> TimelineState {
        let expiration = match self.expiration() {
            Some(e) => e,
            None => {
                let e = self.automatic_expiration(now);
                self.expiration = Some(e);
                e
            }
        };
        let offset = self.settings.offset_ms;
        let deadline = expiration - offset;
        let remaining_ms = (deadline - now).max(0);
        let seconds_left = ((remaining_ms + 999) / 1000).min(offset / 1000);
        TimelineState {
            deadline,
            expiration,
            seconds_left,
            can_enter_trade: now < deadline,
            frozen: self.is_frozen(),
        }
    }

    /// Eased marker x positions for this frame, given their exact targets.
    pub fn marker_positions(&mut self, deadline_x: f64, expiration_x: f64) -> (f64, f64) {
        let s = self.settings;
        self.easing
            .advance(deadline_x, expiration_x, s.ease_threshold_px, s.ease_factor)
    }
}

/// Pixel-space smoothing for the two vertical markers.
#[derive(Debug, Clone, Default)]
struct MarkerEasing {
    deadline_x: Option<f64>,
    expiration_x: Option<f64>,
    snap: bool,
}

impl MarkerEasing {
    fn snap_next(&mut self) {
        self.snap = true;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn advance(&mut self, deadline_x: f64, expiration_x: f64, threshold: f64, factor: f64) -> (f64, f64) {
        let snap = std::mem::take(&mut self.snap);
        let step = |current: Option<f64>, target: f64| -> f64 {
            match current {
                Some(x) if !snap && x.is_finite() && (target - x).abs() > threshold => {
                    x + (target - x) * factor
                }
                _ => target,
            }
        };
        let d = step(self.deadline_x, deadline_x);
        let e = step(self.expiration_x, expiration_x);
        self.deadline_x = Some(d);
        self.expiration_x = Some(e);
        (d, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::{TradeDirection, TradeResult};

    fn markers() -> TimelineMarkers {
        TimelineMarkers::new(TimelineSettings::default(), Timeframe::Min1)
    }

    fn assert_invariant(m: &mut TimelineMarkers, now: i64) {
        let state = m.state(now);
        assert_eq!(state.deadline, state.expiration - 30_000);
    }

    #[test]
    fn test_automatic_expiration_is_next_boundary() {
        let mut m = markers();
        assert_eq!(m.update(10_000), None);
        assert_eq!(m.expiration(), Some(60_000));
        assert_eq!(m.deadline(), Some(30_000));
    }

    #[test]
    fn test_past_deadline_uses_following_cycle() {
        let mut m = markers();
        m.update(45_000);
        assert_eq!(m.expiration(), Some(120_000));
    }

    #[test]
    fn test_rollover_emits_advance() {
        let mut m = markers();
        m.update(10_000);
        assert_eq!(m.update(29_999), None);
        let advance = m.update(30_000).unwrap();
        assert_eq!(advance.expiration, 120_000);
        assert_eq!(advance.deadline, 90_000);
        assert_invariant(&mut m, 30_000);
    }

    #[test]
    fn test_short_timeframes_use_min_cycle() {
        let mut m = TimelineMarkers::new(TimelineSettings::default(), Timeframe::Sec5);
        assert_eq!(m.cycle_ms(), 60_000);
        m.update(1_000);
        assert_eq!(m.expiration(), Some(60_000));

        m.set_timeframe(Timeframe::Min5, 1_000);
        assert_eq!(m.expiration(), Some(300_000));
    }

    #[test]
    fn test_manual_expiration_is_instant() {
        let now = 1_000_000;
        let mut m = markers();
        m.update(now);
        m.set_manual_expiration(now + 300_000);
        let state = m.state(now);
        assert_eq!(state.expiration, now + 300_000);
        assert_eq!(state.deadline, now + 270_000);
        // Manual mode does not roll over on its own.
        assert_eq!(m.update(now + 280_000), None);
        assert_eq!(m.expiration(), Some(now + 300_000));
    }

    #[test]
    fn test_freeze_holds_through_rollovers() {
        let now = 1_000_000;
        let mut m = markers();
        m.set_manual_expiration(now + 300_000);
        let trade = TradeSnapshot::new("t1", "EURUSD", TradeDirection::Up, 1.1, now, now + 300_000, 5.0);
        assert_eq!(m.sync_trades(&[trade.clone()], "EURUSD", now), Some(true));

        m.clear_manual(now + 1);
        for t in (now..now + 290_000).step_by(7_000) {
            assert_eq!(m.update(t), None);
            assert_eq!(m.expiration(), Some(now + 300_000));
            assert_eq!(m.deadline(), Some(now + 270_000));
            assert_invariant(&mut m, t);
        }

        let settled = trade.settled(TradeResult::Loss, -5.0);
        assert_eq!(m.sync_trades(&[settled], "EURUSD", now + 290_000), Some(false));
        assert!(!m.is_frozen());
        assert_invariant(&mut m, now + 290_000);
    }

    #[test]
    fn test_other_symbol_trades_ignored() {
        let mut m = markers();
        let trade = TradeSnapshot::new("t1", "BTCUSD", TradeDirection::Down, 1.0, 0, 500_000, 1.0);
        assert_eq!(m.sync_trades(&[trade], "EURUSD", 0), None);
        assert!(!m.is_frozen());
    }

    #[test]
    fn test_seconds_left_clamped() {
        let mut m = markers();
        m.update(0);
        assert_eq!(m.state(0).seconds_left, 30);
        assert_eq!(m.state(15_500).seconds_left, 15);
        assert!(m.state(15_500).can_enter_trade);
        m.set_manual_expiration(40_000);
        let state = m.state(20_000);
        assert_eq!(state.seconds_left, 0);
        assert!(!state.can_enter_trade);
    }

    #[test]
    fn test_marker_easing() {
        let mut m = markers();
        // First frame snaps.
        assert_eq!(m.marker_positions(100.0, 200.0), (100.0, 200.0));
        // Small moves follow directly.
        assert_eq!(m.marker_positions(120.0, 220.0), (120.0, 220.0));
        // Large moves ease 15% per frame.
        let (d, e) = m.marker_positions(320.0, 220.0);
        assert!((d - 150.0).abs() < 1e-9);
        assert_eq!(e, 220.0);
        // Instant changes snap.
        m.set_manual_expiration(1_000_000);
        assert_eq!(m.marker_positions(900.0, 1000.0), (900.0, 1000.0));
    }
}
