//! Candle history and the live candle state machine.
//!
//! Ticks come from one of two kinds of feed. A plain feed only sends
//! prices, so a candle closes when a tick lands in a later bucket and its
//! close is the animated price at that moment. A signalling feed marks each
//! tick as open or closed, and a closing tick's price is authoritative.
//!
//! Either way a new live candle always opens at the previous close.

use std::collections::VecDeque;

use pulse_core::{Candle, Timeframe};
use pulse_data::Tick;

use crate::error::TickRejected;

/// Timestamps remembered for duplicate detection.
pub const DEDUPE_WINDOW: usize = 256;

/// Where the live candle lives.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LiveSlot {
    None,
    /// Tail of history at this index, mutated in place.
    Shared(usize),
    /// Built but not yet part of history.
    Detached(Candle),
}

/// Observable live candle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    NoHistory,
    NoLive,
    Shared,
    Detached,
}

/// What the motion engine should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    /// Animate toward this price.
    Target(f64),
    /// Snap to this price, dropping residual motion.
    Reset(f64),
}

/// Outcome of an accepted tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEffect {
    /// Candles that became final, oldest first.
    pub finalized: Vec<Candle>,
    /// A new live candle was created.
    pub live_opened: bool,
    /// The last history candle became the live candle. Anything folded over
    /// closed history must be rebuilt without it.
    pub adopted_tail: bool,
    pub motion: MotionCommand,
}

impl TickEffect {
    fn target(price: f64) -> Self {
        Self {
            finalized: Vec::new(),
            live_opened: false,
            adopted_tail: false,
            motion: MotionCommand::Target(price),
        }
    }

    fn reset(price: f64) -> Self {
        Self {
            motion: MotionCommand::Reset(price),
            ..Self::target(price)
        }
    }
}

/// Store tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreSettings {
    /// Gaps longer than this many periods are displayed as one period.
    pub gap_cap_periods: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { gap_cap_periods: 3 }
    }
}

/// Candle history plus at most one live candle.
#[derive(Debug, Clone)]
pub struct CandleStore {
    timeframe: Timeframe,
    settings: StoreSettings,
    history: Vec<Candle>,
    live: LiveSlot,
    /// Real (uncapped) bucket of the most recent accepted tick.
    current_bucket: Option<i64>,
    /// Bucket most recently closed by an explicit signal.
    closed_bucket: Option<i64>,
    /// Timestamp of the most recent accepted tick.
    last_timestamp: Option<i64>,
    seen: VecDeque<i64>,
}

impl CandleStore {
    pub fn new(timeframe: Timeframe, settings: StoreSettings) -> Self {
        Self {
            timeframe,
            settings,
            history: Vec::new(),
            live: LiveSlot::None,
            current_bucket: None,
            closed_bucket: None,
            last_timestamp: None,
            seen: VecDeque::with_capacity(DEDUPE_WINDOW),
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Drop everything and switch bucket size.
    pub fn reset(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
        self.load_history(Vec::new());
    }

    /// Replace history. All history candles are treated as closed and any
    /// live candle is discarded.
    pub fn load_history(&mut self, candles: Vec<Candle>) {
        self.history = candles;
        self.live = LiveSlot::None;
        self.current_bucket = None;
        self.closed_bucket = None;
        self.last_timestamp = None;
        self.seen.clear();
    }

    /// History, including the live candle when it is shared.
    pub fn history(&self) -> &[Candle] {
        &self.history
    }

    /// Candles that will not change again.
    pub fn closed_candles(&self) -> &[Candle] {
        match self.live {
            LiveSlot::Shared(i) => &self.history[..i],
            _ => &self.history,
        }
    }

    pub fn live_candle(&self) -> Option<&Candle> {
        match &self.live {
            LiveSlot::None => None,
            LiveSlot::Shared(i) => self.history.get(*i),
            LiveSlot::Detached(c) => Some(c),
        }
    }

    pub fn live_state(&self) -> LiveState {
        match self.live {
            LiveSlot::None if self.history.is_empty() => LiveState::NoHistory,
            LiveSlot::None => LiveState::NoLive,
            LiveSlot::Shared(_) => LiveState::Shared,
            LiveSlot::Detached(_) => LiveState::Detached,
        }
    }

    /// Number of candles on screen: history plus a detached live candle.
    pub fn display_len(&self) -> usize {
        self.history.len() + usize::from(matches!(self.live, LiveSlot::Detached(_)))
    }

    /// Display candles in order, the live one last.
    pub fn display_candles(&self) -> impl Iterator<Item = &Candle> {
        let detached = match &self.live {
            LiveSlot::Detached(c) => Some(c),
            _ => None,
        };
        self.history.iter().chain(detached)
    }

    /// Display index of the live candle.
    pub fn live_index(&self) -> Option<usize> {
        match self.live {
            LiveSlot::None => None,
            LiveSlot::Shared(i) => Some(i),
            LiveSlot::Detached(_) => Some(self.history.len()),
        }
    }

    /// Close of the most recent history candle.
    pub fn last_close(&self) -> Option<f64> {
        self.history.last().map(|c| c.close)
    }

    /// Move the live close to the animated price, inside the tick envelope.
    pub fn apply_visual_price(&mut self, price: f64) {
        if !price.is_finite() {
            return;
        }
        if let Some(live) = self.live_mut() {
            live.set_close_within(price);
        }
    }

    fn live_mut(&mut self) -> Option<&mut Candle> {
        match &mut self.live {
            LiveSlot::None => None,
            LiveSlot::Shared(i) => self.history.get_mut(*i),
            LiveSlot::Detached(c) => Some(c),
        }
    }

    /// Apply one tick. `visual` is the animated price right now, used as
    /// the close when a plain feed rolls into a new bucket.
    pub fn ingest(&mut self, tick: &Tick, visual: Option<f64>) -> Result<TickEffect, TickRejected> {
        tick.validate()?;
        if self.seen.contains(&tick.timestamp) {
            return Err(TickRejected::Duplicate(tick.timestamp));
        }

        let bucket = self.timeframe.bucket_start(tick.timestamp);
        if let Some(current) = self.reference_bucket() {
            if bucket < current {
                return Err(TickRejected::LateTick { bucket, current });
            }
        }
        if self.closed_bucket == Some(bucket) {
            return Err(TickRejected::AlreadyClosed { bucket });
        }
        if self.current_bucket == Some(bucket) {
            if let Some(last) = self.last_timestamp.filter(|&last| tick.timestamp <= last) {
                return Err(TickRejected::Stale {
                    timestamp: tick.timestamp,
                    last,
                });
            }
        }

        let effect = match tick.closed {
            None => self.ingest_plain(bucket, tick.price, visual),
            Some(false) => self.ingest_open(bucket, tick.price, visual),
            Some(true) => self.ingest_close(bucket, tick.price, visual),
        };

        self.current_bucket = Some(bucket);
        self.last_timestamp = Some(tick.timestamp);
        if self.seen.len() == DEDUPE_WINDOW {
            self.seen.pop_front();
        }
        self.seen.push_back(tick.timestamp);
        Ok(effect)
    }

    /// Bucket a new tick must not precede.
    fn reference_bucket(&self) -> Option<i64> {
        self.current_bucket
            .or_else(|| self.history.last().map(|c| c.bucket_start))
    }

    fn has_live(&self) -> bool {
        !matches!(self.live, LiveSlot::None)
    }

    fn live_is_current(&self, bucket: i64) -> bool {
        self.has_live() && self.current_bucket == Some(bucket)
    }

    /// Bucket start to display for a candle opening at real bucket `bucket`.
    /// Long gaps (closed market) collapse to a single period.
    fn effective_bucket(&self, bucket: i64) -> i64 {
        let Some(last) = self.history.last().map(|c| c.bucket_start) else {
            return bucket;
        };
        let period = self.timeframe.millis();
        let cap = period.saturating_mul(i64::from(self.settings.gap_cap_periods));
        if bucket.saturating_sub(last) > cap {
            last + period
        } else {
            bucket
        }
    }

    /// The history tail can become the live candle for `bucket`.
    fn can_adopt_tail(&self, bucket: i64) -> bool {
        !self.has_live()
            && self.current_bucket.is_none()
            && self.history.last().is_some_and(|c| c.bucket_start == bucket)
    }

    fn adopt_tail(&mut self, price: f64) -> TickEffect {
        let index = self.history.len() - 1;
        self.live = LiveSlot::Shared(index);
        self.history[index].extend(price);
        log::debug!("Adopted history tail as live candle");
        TickEffect {
            adopted_tail: true,
            ..TickEffect::target(price)
        }
    }

    /// Close the live candle at `close` and move it into history.
    fn finalize_live(&mut self, close: f64, authoritative: bool) -> Option<Candle> {
        let live = std::mem::replace(&mut self.live, LiveSlot::None);
        let candle = match live {
            LiveSlot::None => return None,
            LiveSlot::Shared(i) => {
                let candle = self.history.get_mut(i)?;
                close_candle(candle, close, authoritative);
                *candle
            }
            LiveSlot::Detached(mut candle) => {
                close_candle(&mut candle, close, authoritative);
                self.history.push(candle);
                candle
            }
        };
        log::debug!(
            "Closed candle {} at {}",
            candle.bucket_start,
            candle.close
        );
        Some(candle)
    }

    /// Implicit close of a live candle whose bucket has passed.
    fn roll_over(&mut self, visual: Option<f64>) -> Option<Candle> {
        let close = visual
            .filter(|v| v.is_finite())
            .or_else(|| self.live_candle().map(|c| c.close))?;
        self.finalize_live(close, false)
    }

    fn open_candle(&mut self, bucket: i64, price: f64, shared: bool) -> Candle {
        let open = self.last_close().unwrap_or(price);
        let candle = Candle::opened_at(self.effective_bucket(bucket), open, price);
        if shared {
            self.history.push(candle);
            self.live = LiveSlot::Shared(self.history.len() - 1);
        } else {
            self.live = LiveSlot::Detached(candle);
        }
        log::debug!("Opened candle {} at {}", candle.bucket_start, open);
        candle
    }

    fn ingest_plain(&mut self, bucket: i64, price: f64, visual: Option<f64>) -> TickEffect {
        if self.live_is_current(bucket) {
            if let Some(live) = self.live_mut() {
                live.extend(price);
            }
            return TickEffect::target(price);
        }
        if self.can_adopt_tail(bucket) {
            return self.adopt_tail(price);
        }

        let finalized: Vec<Candle> = self.roll_over(visual).into_iter().collect();
        self.open_candle(bucket, price, true);
        TickEffect {
            finalized,
            live_opened: true,
            ..TickEffect::reset(price)
        }
    }

    fn ingest_open(&mut self, bucket: i64, price: f64, visual: Option<f64>) -> TickEffect {
        if self.live_is_current(bucket) {
            if let Some(live) = self.live_mut() {
                live.extend(price);
            }
            return TickEffect::target(price);
        }

        // Safety net: the feed moved on without closing the live candle.
        let finalized: Vec<Candle> = self.roll_over(visual).into_iter().collect();
        if finalized.is_empty() && self.can_adopt_tail(bucket) {
            return self.adopt_tail(price);
        }

        self.open_candle(bucket, price, false);
        TickEffect {
            finalized,
            live_opened: true,
            ..TickEffect::reset(price)
        }
    }

    fn ingest_close(&mut self, bucket: i64, price: f64, visual: Option<f64>) -> TickEffect {
        let mut finalized = Vec::new();
        let mut adopted_tail = false;

        if !self.live_is_current(bucket) {
            finalized.extend(self.roll_over(visual));
            if finalized.is_empty() && self.can_adopt_tail(bucket) {
                self.live = LiveSlot::Shared(self.history.len() - 1);
                adopted_tail = true;
            } else {
                self.open_candle(bucket, price, false);
            }
        }

        if let Some(live) = self.live_mut() {
            live.extend(price);
        }
        finalized.extend(self.finalize_live(price, true));
        self.closed_bucket = Some(bucket);

        TickEffect {
            finalized,
            adopted_tail,
            ..TickEffect::reset(price)
        }
    }
}

fn close_candle(candle: &mut Candle, close: f64, authoritative: bool) {
    if authoritative {
        candle.set_close(close);
    } else {
        candle.set_close_within(close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn store_with(candles: Vec<Candle>) -> CandleStore {
        let mut store = CandleStore::new(Timeframe::Min1, StoreSettings::default());
        store.load_history(candles);
        store
    }

    fn seed() -> Vec<Candle> {
        vec![
            Candle::new(0, 99.0, 100.5, 98.5, 100.0),
            Candle::new(MIN, 100.0, 101.0, 99.0, 100.0),
        ]
    }

    #[test]
    fn test_plain_tick_adopts_tail() {
        let mut store = store_with(seed());
        let effect = store.ingest(&Tick::new(100.5, MIN + 10_000), None).unwrap();
        assert!(effect.adopted_tail);
        assert_eq!(effect.motion, MotionCommand::Target(100.5));
        assert_eq!(store.live_state(), LiveState::Shared);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.closed_candles().len(), 1);
        assert_eq!(store.live_candle().unwrap().high, 101.0);
    }

    #[test]
    fn test_plain_rollover_uses_visual_close() {
        let mut store = store_with(seed());
        store.ingest(&Tick::new(100.5, MIN + 10_000), None).unwrap();
        store.apply_visual_price(100.3);

        let effect = store.ingest(&Tick::new(99.8, 2 * MIN + 5_000), Some(100.3)).unwrap();
        assert_eq!(effect.finalized.len(), 1);
        assert_eq!(effect.finalized[0].close, 100.3);
        assert!(effect.live_opened);
        assert_eq!(effect.motion, MotionCommand::Reset(99.8));

        let live = store.live_candle().unwrap();
        assert_eq!(live.bucket_start, 2 * MIN);
        assert_eq!(live.open, 100.3);
        assert_eq!(live.close, 99.8);
        assert_eq!(live.high, 100.3);
        assert_eq!(live.low, 99.8);
        assert_eq!(store.closed_candles().len(), 2);
    }

    #[test]
    fn test_visual_close_stays_in_envelope() {
        let mut store = store_with(seed());
        store.ingest(&Tick::new(100.5, MIN + 10_000), None).unwrap();
        store.apply_visual_price(250.0);
        assert_eq!(store.live_candle().unwrap().close, 101.0);
    }

    #[test]
    fn test_duplicate_timestamp_is_dropped() {
        let mut store = store_with(seed());
        store.ingest(&Tick::new(100.5, MIN + 10_000), None).unwrap();
        let before = store.history().to_vec();
        let err = store.ingest(&Tick::new(120.0, MIN + 10_000), None).unwrap_err();
        assert_eq!(err, TickRejected::Duplicate(MIN + 10_000));
        assert_eq!(store.history(), &before[..]);
    }

    #[test]
    fn test_redelivered_tick_past_window_is_stale() {
        let mut store = CandleStore::new(Timeframe::Hour1, StoreSettings::default());
        let start = 10 * 3_600_000;
        let early = Tick::new(1.10, start + 1_000);
        store.ingest(&early, None).unwrap();
        for i in 0..DEDUPE_WINDOW as i64 + 10 {
            store.ingest(&Tick::new(1.20, start + 2_000 + i * 1_000), None).unwrap();
        }
        let before = *store.live_candle().unwrap();

        let err = store.ingest(&early, None).unwrap_err();
        assert_eq!(
            err,
            TickRejected::Stale {
                timestamp: early.timestamp,
                last: start + 2_000 + (DEDUPE_WINDOW as i64 + 9) * 1_000,
            }
        );
        assert_eq!(store.live_candle(), Some(&before));
    }

    #[test]
    fn test_late_tick_rejected() {
        let mut store = store_with(seed());
        store.ingest(&Tick::new(100.5, 3 * MIN), None).unwrap();
        let err = store.ingest(&Tick::new(100.0, 2 * MIN + 1), None).unwrap_err();
        assert_eq!(
            err,
            TickRejected::LateTick {
                bucket: 2 * MIN,
                current: 3 * MIN
            }
        );
    }

    #[test]
    fn test_invalid_price_rejected() {
        let mut store = store_with(seed());
        assert!(matches!(
            store.ingest(&Tick::new(-1.0, 3 * MIN), None),
            Err(TickRejected::Invalid(_))
        ));
        assert_eq!(store.live_state(), LiveState::NoLive);
    }

    #[test]
    fn test_signalled_open_creates_detached() {
        let mut store = store_with(seed());
        let effect = store
            .ingest(&Tick::with_close_signal(100.2, 2 * MIN + 1_000, false), None)
            .unwrap();
        assert!(effect.live_opened);
        assert_eq!(store.live_state(), LiveState::Detached);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.display_len(), 3);
        assert_eq!(store.live_candle().unwrap().open, 100.0);
    }

    #[test]
    fn test_signalled_open_adopts_matching_tail() {
        let mut store = store_with(seed());
        let effect = store
            .ingest(&Tick::with_close_signal(100.2, MIN + 1_000, false), None)
            .unwrap();
        assert!(effect.adopted_tail);
        assert_eq!(store.live_state(), LiveState::Shared);
        assert_eq!(store.display_len(), 2);
    }

    #[test]
    fn test_signalled_close_is_authoritative() {
        let mut store = store_with(seed());
        store
            .ingest(&Tick::with_close_signal(100.2, 2 * MIN + 1_000, false), None)
            .unwrap();
        store.apply_visual_price(100.1);
        let effect = store
            .ingest(&Tick::with_close_signal(100.7, 2 * MIN + 59_000, true), Some(100.1))
            .unwrap();
        assert_eq!(effect.finalized.len(), 1);
        assert_eq!(effect.finalized[0].close, 100.7);
        assert_eq!(effect.finalized[0].high, 100.7);
        assert_eq!(store.live_state(), LiveState::NoLive);
        assert_eq!(store.history().len(), 3);

        // Next candle opens exactly at the signalled close.
        store
            .ingest(&Tick::with_close_signal(100.9, 3 * MIN + 1_000, false), None)
            .unwrap();
        assert_eq!(store.live_candle().unwrap().open, 100.7);
    }

    #[test]
    fn test_repeat_close_for_closed_bucket_is_rejected() {
        let mut store = store_with(seed());
        store
            .ingest(&Tick::with_close_signal(100.7, 2 * MIN + 59_000, true), None)
            .unwrap();
        let err = store
            .ingest(&Tick::with_close_signal(100.8, 2 * MIN + 59_500, true), None)
            .unwrap_err();
        assert_eq!(err, TickRejected::AlreadyClosed { bucket: 2 * MIN });
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_signalled_close_of_tail_bucket() {
        let mut store = store_with(seed());
        let effect = store
            .ingest(&Tick::with_close_signal(101.5, MIN + 59_000, true), None)
            .unwrap();
        assert!(effect.adopted_tail);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.history()[1].close, 101.5);
        assert_eq!(store.history()[1].high, 101.5);
        assert_eq!(store.closed_candles().len(), 2);
    }

    #[test]
    fn test_safety_net_closes_stale_live() {
        let mut store = store_with(seed());
        store
            .ingest(&Tick::with_close_signal(100.2, 2 * MIN + 1_000, false), None)
            .unwrap();
        let effect = store
            .ingest(&Tick::with_close_signal(100.4, 3 * MIN + 1_000, false), Some(100.2))
            .unwrap();
        assert_eq!(effect.finalized.len(), 1);
        assert_eq!(effect.finalized[0].bucket_start, 2 * MIN);
        assert_eq!(store.live_candle().unwrap().open, 100.2);
        assert_eq!(store.live_state(), LiveState::Detached);
    }

    #[test]
    fn test_gap_is_capped() {
        let mut store = store_with(seed());
        store.ingest(&Tick::new(100.0, 30 * MIN), None).unwrap();
        assert_eq!(store.live_candle().unwrap().bucket_start, 2 * MIN);

        // Later ticks in the same real bucket still hit the same candle.
        store.ingest(&Tick::new(100.4, 30 * MIN + 5_000), None).unwrap();
        assert_eq!(store.display_len(), 3);
        assert_eq!(store.live_candle().unwrap().high, 100.4);
    }

    #[test]
    fn test_first_tick_without_history() {
        let mut store = CandleStore::new(Timeframe::Min1, StoreSettings::default());
        assert_eq!(store.live_state(), LiveState::NoHistory);
        store.ingest(&Tick::new(1.5, 10 * MIN + 3), None).unwrap();
        let live = store.live_candle().unwrap();
        assert_eq!(live.open, 1.5);
        assert_eq!(live.bucket_start, 10 * MIN);
    }
}
