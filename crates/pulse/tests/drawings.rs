use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse::drawing::{fib_levels, FIB_RATIOS};
use pulse::{
    ChartEngine, DrawingTool, DrawingToolKind, EngineConfig, SeedCandle, Shape, Timeframe,
    ZoomDirection,
};

fn engine_with_history() -> ChartEngine {
    let config = EngineConfig {
        timeframe: Timeframe::Min1,
        indicators: Vec::new(),
        ..EngineConfig::default()
    };
    let mut engine = ChartEngine::new(config).unwrap();
    let seed: Vec<SeedCandle> = (0..300)
        .map(|i| {
            let base = 100.0 + (i as f64 * 0.1).sin() * 5.0;
            SeedCandle::new(1_700_000_040 + i * 60, base, base + 1.0, base - 1.0, base + 0.5)
        })
        .collect();
    engine.load_history(&seed);
    engine.resize(864.0, 624.0);
    engine.step(16.0, 0);
    engine
}

#[test]
fn test_fib_levels_hit_both_anchors() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..10_000 {
        let p1 = rng.random_range(-1e6..1e6);
        let p2 = rng.random_range(-1e6..1e6);
        if p1 == p2 {
            continue;
        }
        let levels = fib_levels(p1, p2);
        assert_eq!(levels[0].price, p1);
        assert_eq!(levels[levels.len() - 1].price, p2);
        for (level, ratio) in levels.iter().zip(FIB_RATIOS) {
            assert_eq!(level.ratio, ratio);
            let expected = p1 + (p2 - p1) * ratio;
            assert!((level.price - expected).abs() <= 1e-9 * p1.abs().max(p2.abs()).max(1.0));
        }
    }
}

#[test]
fn test_two_click_fibonacci_through_engine() {
    let mut engine = engine_with_history();
    engine.set_drawing_tool(DrawingTool::Place(DrawingToolKind::Fibonacci));

    assert!(engine.pointer_down(200.0, 150.0));
    engine.pointer_up();
    engine.pointer_move(500.0, 400.0);
    assert!(engine.drawings().preview_drawing().is_some());
    assert!(engine.pointer_down(500.0, 400.0));
    engine.pointer_up();

    let drawings = &engine.drawings().drawings;
    assert_eq!(drawings.len(), 1);
    let Shape::Fibonacci { start, end } = drawings[0].shape else {
        panic!("expected a fibonacci, got {:?}", drawings[0].shape);
    };
    assert!(start.time < end.time);
    assert!(start.price > end.price);
    assert_eq!(drawings[0].shape.fib_levels().len(), 7);
}

#[test]
fn test_drawings_survive_viewport_changes() {
    let mut engine = engine_with_history();
    let shape = Shape::TrendLine {
        start: pulse::WorldPoint::new(1_700_006_040_000, 101.0),
        end: pulse::WorldPoint::new(1_700_012_040_000, 103.0),
    };
    let id = engine.add_drawing(shape);

    engine.zoom(ZoomDirection::Out, 300.0);
    engine.pan_by_pixels(250.0);
    engine.resize(1_200.0, 800.0);
    engine.step(16.0, 16);
    engine.plan_frame();

    assert_eq!(engine.drawings().get(id).unwrap().shape, shape);
}

#[test]
fn test_select_drag_and_remove() {
    let mut engine = engine_with_history();
    let id = engine.add_drawing(Shape::Horizontal { price: 100.0 });
    engine.set_drawing_tool(DrawingTool::Select);

    let y = engine.coordinate_system().price_to_y(100.0);
    assert!(engine.pointer_down(300.0, y + 3.0));
    engine.pointer_move(320.0, y + 43.0);
    engine.pointer_up();

    let moved = engine.coordinate_system().y_to_price(y + 40.0);
    let Shape::Horizontal { price } = engine.drawings().get(id).unwrap().shape else {
        panic!("shape kind changed");
    };
    assert!((price - moved).abs() < 1e-9);

    assert!(engine.remove_selected_drawing());
    assert!(engine.drawings().drawings.is_empty());
}

#[test]
fn test_move_drawing_keeps_kind() {
    let mut engine = engine_with_history();
    let id = engine.add_drawing(Shape::Vertical { time: 1_700_003_040_000 });
    assert!(engine.move_drawing(id, Shape::Vertical { time: 1_700_004_040_000 }));
    assert!(!engine.move_drawing(id, Shape::Horizontal { price: 1.0 }));
    assert!(engine.remove_drawing(id));
    assert!(!engine.remove_drawing(id));
}
