use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse::{
    ChartEngine, EngineConfig, SeedCandle, Timeframe, ViewPeriod, Viewport, ViewportSettings,
    ZoomDirection,
};

fn assert_clamped(vp: &Viewport) {
    let max = (vp.len() as f64 + vp.settings().right_padding - vp.visible_count()).max(0.0);
    assert!(vp.start_index() >= 0.0, "start {} < 0", vp.start_index());
    assert!(
        vp.start_index() <= max + 1e-9,
        "start {} > max {max}",
        vp.start_index()
    );
    assert!(vp.visible_count() >= vp.settings().min_visible - 1e-9);
    assert!(vp.visible_count() <= vp.settings().max_visible + 1e-9);
}

#[test]
fn test_random_pan_zoom_stays_clamped() {
    let mut rng = StdRng::seed_from_u64(5);
    for len in [0usize, 1, 9, 10, 60, 61, 500, 2_000] {
        let mut vp = Viewport::new(ViewportSettings::default());
        vp.reset(len);
        let mut now = 0;
        for _ in 0..2_000 {
            now += 16;
            match rng.random_range(0..8) {
                0 => vp.zoom(ZoomDirection::In, rng.random_range(-0.2..=1.2)),
                1 => vp.zoom(ZoomDirection::Out, rng.random_range(0.0..=1.0)),
                2 => vp.pan_by_pixels(rng.random_range(-2_000.0..=2_000.0), 800.0),
                3 => {
                    vp.begin_pan(rng.random_range(0.0..=800.0), false);
                    vp.drag_to(rng.random_range(-500.0..=1_300.0), 800.0);
                    vp.end_pan();
                }
                4 => vp.animate_to(rng.random_range(1.0..=900.0), now),
                5 => vp.set_len(vp.len() + 1),
                _ => {
                    vp.step(now);
                }
            }
            assert_clamped(&vp);
        }
    }
}

#[test]
fn test_zoom_out_grows_until_max() {
    let mut vp = Viewport::new(ViewportSettings::default());
    vp.reset(1_000);
    vp.pan_by_pixels(400.0, 800.0);
    let mut previous = vp.visible_count();
    while previous < vp.settings().max_visible {
        vp.zoom(ZoomDirection::Out, 0.3);
        assert!(vp.visible_count() > previous);
        previous = vp.visible_count();
    }
    assert_eq!(previous, 500.0);

    // A tiny zoom step still makes progress.
    let settings = ViewportSettings {
        zoom_step: 1.0001,
        ..ViewportSettings::default()
    };
    let mut vp = Viewport::new(settings);
    vp.reset(1_000);
    let before = vp.visible_count();
    vp.zoom(ZoomDirection::Out, 0.5);
    assert!(vp.visible_count() >= before + 1.0);
}

#[test]
fn test_zoom_keeps_pointer_candle() {
    let mut vp = Viewport::new(ViewportSettings::default());
    vp.reset(1_000);
    vp.pan_by_pixels(4_000.0, 800.0);
    assert!(!vp.is_at_end());

    let fraction = 0.25;
    let under_pointer = vp.start_index() + fraction * vp.visible_count();
    vp.zoom(ZoomDirection::In, fraction);
    let after = vp.start_index() + fraction * vp.visible_count();
    assert!((after - under_pointer).abs() < 1e-9);
}

#[test]
fn test_zoom_at_end_stays_pinned() {
    let mut vp = Viewport::new(ViewportSettings::default());
    vp.reset(300);
    for _ in 0..10 {
        vp.zoom(ZoomDirection::In, 0.1);
        assert!(vp.is_at_end());
        assert_eq!(vp.start_index(), vp.max_start());
    }
}

#[test]
fn test_period_switch_animates_then_settles() {
    let config = EngineConfig {
        timeframe: Timeframe::Min1,
        indicators: Vec::new(),
        ..EngineConfig::default()
    };
    let mut engine = ChartEngine::new(config).unwrap();
    let seed: Vec<SeedCandle> = (0..400)
        .map(|i| SeedCandle::new(i * 60, 1.0, 1.1, 0.9, 1.0))
        .collect();
    engine.load_history(&seed);
    assert_eq!(engine.viewport().visible_count(), 60.0);

    engine.apply_period(ViewPeriod::Hours4, 1_000);
    engine.step(16.0, 1_300);
    let mid = engine.viewport().visible_count();
    assert!(mid > 60.0 && mid < 240.0, "mid {mid}");
    assert!(engine.viewport().is_animating());

    engine.step(16.0, 1_700);
    assert!(!engine.viewport().is_animating());
    assert_eq!(engine.viewport().visible_count(), 240.0);
    assert!(engine.viewport().is_at_end());
    assert_eq!(engine.viewport().start_index(), 160.0);
}

#[test]
fn test_pan_is_suppressed_over_drawing() {
    let config = EngineConfig {
        timeframe: Timeframe::Min1,
        indicators: Vec::new(),
        ..EngineConfig::default()
    };
    let mut engine = ChartEngine::new(config).unwrap();
    let seed: Vec<SeedCandle> = (0..200)
        .map(|i| SeedCandle::new(i * 60, 100.0, 110.0, 90.0, 100.0))
        .collect();
    engine.load_history(&seed);
    engine.resize(864.0, 624.0);
    engine.step(16.0, 0);

    let coords = engine.coordinate_system();
    let y = coords.price_to_y(100.0);
    engine.add_drawing(pulse::Shape::Horizontal { price: 100.0 });
    let start = engine.viewport().start_index();

    engine.pointer_down(300.0, y);
    engine.pointer_move(700.0, y);
    engine.pointer_up();
    assert_eq!(engine.viewport().start_index(), start);

    // Away from the line the same gesture pans.
    let y_far = coords.price_to_y(108.0);
    engine.pointer_down(300.0, y_far);
    engine.pointer_move(700.0, y_far);
    engine.pointer_up();
    assert!(engine.viewport().start_index() < start);
}
