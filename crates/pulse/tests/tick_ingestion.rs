use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse::{
    CandleStore, ChartEngine, EngineConfig, LiveState, Notification, SeedCandle, StoreSettings,
    Tick, TickRejected, Timeframe,
};

const MIN: i64 = 60_000;
/// A minute boundary, in seconds.
const BUCKET0_SECS: i64 = 1_699_999_980;
const BUCKET0: i64 = BUCKET0_SECS * 1000;

fn engine() -> ChartEngine {
    let config = EngineConfig {
        timeframe: Timeframe::Min1,
        indicators: Vec::new(),
        min_warmup_candles: 1,
        ..EngineConfig::default()
    };
    ChartEngine::new(config).unwrap()
}

fn step_frames(engine: &mut ChartEngine, from: i64, frames: i64) -> i64 {
    let mut now = from;
    for _ in 0..frames {
        now += 16;
        engine.step(16.0, now);
    }
    now
}

fn assert_consistent(store: &CandleStore) {
    for candle in store.display_candles() {
        assert!(candle.is_consistent(), "inconsistent candle {candle:?}");
    }
}

#[test]
fn test_seeded_rollover_scenario() {
    let mut engine = engine();
    engine.load_history(&[SeedCandle::new(BUCKET0_SECS, 100.0, 101.0, 99.0, 100.0)]);
    assert_eq!(engine.visual_price(), Some(100.0));

    engine.on_tick(&Tick::new(100.5, BUCKET0 + 10_000)).unwrap();
    let live = *engine.store().live_candle().unwrap();
    assert_eq!(engine.store().live_state(), LiveState::Shared);
    assert_eq!(live.high, 101.0);
    assert_eq!(live.low, 99.0);
    assert_eq!(live.close, 100.0);
    assert_eq!(engine.motion().target(), Some(100.5));

    // The close animates rather than snapping.
    let now = step_frames(&mut engine, BUCKET0 + 10_000, 1);
    let close = engine.store().live_candle().unwrap().close;
    assert!(close > 100.0 && close < 100.5, "close {close}");

    step_frames(&mut engine, now, 30);
    let visual = engine.visual_price().unwrap();
    assert!(visual > 100.0 && visual <= 101.0);
    engine.drain_notifications();

    engine.on_tick(&Tick::new(99.8, BUCKET0 + 65_000)).unwrap();
    let history = engine.store().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].bucket_start, BUCKET0);
    assert_eq!(history[0].close, visual);
    assert_eq!(history[0].high, 101.0);

    let live = engine.store().live_candle().unwrap();
    assert_eq!(live.bucket_start, BUCKET0 + MIN);
    assert_eq!(live.open, visual);
    assert_eq!(live.close, 99.8);
    assert_eq!(live.low, 99.8);
    assert_eq!(engine.visual_price(), Some(99.8));

    let notes = engine.drain_notifications();
    assert!(notes.iter().any(
        |n| matches!(n, Notification::CandleClosed { candle } if candle.close == visual)
    ));
}

#[test]
fn test_golden_rule_plain_feed() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut store = CandleStore::new(Timeframe::Min1, StoreSettings::default());
    store.load_history(vec![pulse::Candle::new(0, 1.0, 1.2, 0.9, 1.1)]);

    let mut t = 1_000;
    let mut price: f64 = 1.1;
    let mut visual = price;
    for _ in 0..2_000 {
        t += rng.random_range(500..20_000);
        price = (price + rng.random_range(-0.01..=0.01)).max(0.01);

        let effect = store.ingest(&Tick::new(price, t), Some(visual)).unwrap();
        if effect.live_opened {
            let live = store.live_candle().unwrap();
            let closed = store.closed_candles().last().unwrap();
            assert_eq!(live.open, closed.close);
        }

        // Something between the old visual price and the new tick.
        visual = visual + (price - visual) * rng.random_range(0.0..=1.0);
        store.apply_visual_price(visual);
        assert_consistent(&store);
    }
}

#[test]
fn test_golden_rule_close_signal_feed() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut store = CandleStore::new(Timeframe::Min1, StoreSettings::default());
    let mut price: f64 = 50.0;
    let mut opened = 0;

    for bucket in 0..300_i64 {
        let start = bucket * MIN;
        let ticks = rng.random_range(1..6);
        for i in 0..ticks {
            price = (price + rng.random_range(-0.5..=0.5)).max(1.0);
            let t = start + 1_000 + i * 5_000;
            let effect = store
                .ingest(&Tick::with_close_signal(price, t, false), Some(price))
                .unwrap();
            if effect.live_opened {
                opened += 1;
                if let Some(prev) = store.closed_candles().last() {
                    assert_eq!(store.live_candle().unwrap().open, prev.close);
                }
            }
            assert_consistent(&store);
        }
        // Most buckets get an explicit close; the rest roll over implicitly.
        if rng.random_bool(0.7) {
            let close = (price + rng.random_range(-0.5..=0.5)).max(1.0);
            let effect = store
                .ingest(&Tick::with_close_signal(close, start + 59_000, true), None)
                .unwrap();
            assert_eq!(effect.finalized.last().unwrap().close, close);
            assert_eq!(store.live_candle(), None);
            price = close;
        }
    }
    assert!(opened > 250);
    assert!(store.history().windows(2).all(|w| w[0].bucket_start < w[1].bucket_start));
}

#[test]
fn test_duplicate_tick_is_ignored() {
    let mut engine = engine();
    engine.load_history(&[SeedCandle::new(BUCKET0_SECS, 100.0, 101.0, 99.0, 100.0)]);
    let tick = Tick::new(100.7, BUCKET0 + 20_000);
    engine.on_tick(&tick).unwrap();
    step_frames(&mut engine, BUCKET0 + 20_000, 5);

    let history = engine.store().history().to_vec();
    let live = engine.store().live_candle().copied();
    let visual = engine.visual_price();
    let target = engine.motion().target();

    let replay = Tick::new(250.0, tick.timestamp);
    assert_eq!(engine.on_tick(&replay), Err(TickRejected::Duplicate(tick.timestamp)));
    assert_eq!(engine.on_tick(&tick), Err(TickRejected::Duplicate(tick.timestamp)));

    assert_eq!(engine.store().history(), history.as_slice());
    assert_eq!(engine.store().live_candle().copied(), live);
    assert_eq!(engine.visual_price(), visual);
    assert_eq!(engine.motion().target(), target);
}

#[test]
fn test_late_and_invalid_ticks_leave_state() {
    let mut engine = engine();
    engine.load_history(&[
        SeedCandle::new(BUCKET0_SECS, 100.0, 101.0, 99.0, 100.0),
        SeedCandle::new(BUCKET0_SECS + 60, 100.0, 101.0, 99.0, 100.5),
    ]);
    engine.on_tick(&Tick::new(100.6, BUCKET0 + 2 * MIN + 1_000)).unwrap();
    let before = engine.store().history().to_vec();

    assert!(matches!(
        engine.on_tick(&Tick::new(100.0, BUCKET0 + 30_000)),
        Err(TickRejected::LateTick { .. })
    ));
    assert!(matches!(
        engine.on_tick(&Tick::new(f64::NAN, BUCKET0 + 2 * MIN + 2_000)),
        Err(TickRejected::Invalid(_))
    ));
    assert!(matches!(
        engine.on_tick(&Tick::new(-1.0, BUCKET0 + 2 * MIN + 3_000)),
        Err(TickRejected::Invalid(_))
    ));
    assert_eq!(engine.store().history(), before.as_slice());
}

#[test]
fn test_market_gap_is_capped() {
    let mut engine = engine();
    engine.load_history(&[SeedCandle::new(BUCKET0_SECS, 100.0, 101.0, 99.0, 100.0)]);
    // Ten periods later, e.g. after a closed market.
    engine.on_tick(&Tick::new(100.2, BUCKET0 + 10 * MIN + 5_000)).unwrap();
    let live = engine.store().live_candle().unwrap();
    assert_eq!(live.bucket_start, BUCKET0 + MIN);
    assert_eq!(live.open, 100.0);
}

#[test]
fn test_engine_starts_without_history() {
    let mut engine = engine();
    engine.load_history_result(Err(anyhow::anyhow!("connection refused")));
    assert_eq!(engine.store().live_state(), LiveState::NoHistory);

    engine.on_tick(&Tick::new(1.25, BUCKET0 + 1_000)).unwrap();
    engine.on_tick(&Tick::new(1.26, BUCKET0 + 2_000)).unwrap();
    engine.on_tick(&Tick::new(1.24, BUCKET0 + MIN + 1_000)).unwrap();
    let history = engine.store().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].open, history[0].close);
}

#[test]
fn test_live_candle_tracks_ticks_while_cold() {
    let config = EngineConfig {
        timeframe: Timeframe::Min1,
        indicators: vec![pulse::IndicatorSpec::new("rsi", pulse::IndicatorKind::Rsi, 14)],
        ..EngineConfig::default()
    };
    let mut engine = ChartEngine::new(config).unwrap();
    engine.load_history(&[
        SeedCandle::new(BUCKET0_SECS, 100.0, 101.0, 99.0, 100.0),
        SeedCandle::new(BUCKET0_SECS + 60, 100.0, 101.0, 99.0, 100.0),
    ]);
    assert!(!engine.motion().is_warm());

    let bucket = BUCKET0 + 2 * MIN;
    engine.on_tick(&Tick::new(100.5, bucket + 1_000)).unwrap();
    engine.on_tick(&Tick::new(102.0, bucket + 2_000)).unwrap();
    assert_eq!(engine.store().live_candle().unwrap().close, 102.0);

    step_frames(&mut engine, bucket + 2_000, 120);
    let live = *engine.store().live_candle().unwrap();
    assert_eq!(engine.visual_price(), Some(102.0));
    assert_eq!(live.open, 100.0);
    assert_eq!(live.high, 102.0);
    assert_eq!(live.close, 102.0);

    engine.on_tick(&Tick::new(101.2, bucket + 3_000)).unwrap();
    assert_eq!(engine.store().live_candle().unwrap().close, 101.2);
}
