//! Drawing state management.

use crate::coords::{CoordinateSystem, ScreenPos, WorldPoint};

use super::types::{Drawing, DrawingId, DrawingToolKind, Shape};

/// Hit tolerance bounds, in pixels.
pub const MIN_HIT_TOLERANCE_PX: f64 = 15.0;
pub const MAX_HIT_TOLERANCE_PX: f64 = 25.0;
/// Second clicks closer than this to the first cancel placement.
const MIN_DRAWING_SIZE_PX: f64 = 2.0;

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingTool {
    #[default]
    None,
    Select,
    Place(DrawingToolKind),
}

impl DrawingTool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            DrawingTool::None => "None",
            DrawingTool::Select => "Select",
            DrawingTool::Place(kind) => kind.name(),
        }
    }

    /// Check if this tool creates drawings.
    pub fn is_drawing_tool(&self) -> bool {
        matches!(self, DrawingTool::Place(_))
    }
}

/// Offset between the pointer and a drawing's reference point, captured
/// when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOffset {
    pub time: i64,
    pub price: f64,
}

/// Current interaction state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// First anchor placed, waiting for the second click.
    Placing { first: WorldPoint },
    /// Moving a whole drawing.
    Dragging { drawing_id: DrawingId, offset: DragOffset },
}

/// Manager for all drawing state and operations.
#[derive(Debug)]
pub struct DrawingManager {
    /// Currently selected drawing tool.
    pub tool: DrawingTool,
    /// Current interaction state.
    pub interaction: InteractionState,
    /// All completed drawings.
    pub drawings: Vec<Drawing>,
    /// Currently selected drawing.
    pub selected: Option<DrawingId>,
    /// Drawing under the pointer in select mode.
    pub hovered: Option<DrawingId>,
    /// Current cursor position in chart coordinates.
    pub cursor_pos: Option<WorldPoint>,
    hit_tolerance_px: f64,
    next_id: DrawingId,
}

impl Default for DrawingManager {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl DrawingManager {
    pub fn new(hit_tolerance_px: f64) -> Self {
        Self {
            tool: DrawingTool::None,
            interaction: InteractionState::Idle,
            drawings: Vec::new(),
            selected: None,
            hovered: None,
            cursor_pos: None,
            hit_tolerance_px: hit_tolerance_px.clamp(MIN_HIT_TOLERANCE_PX, MAX_HIT_TOLERANCE_PX),
            next_id: DrawingId::FIRST,
        }
    }

    pub fn hit_tolerance(&self) -> f64 {
        self.hit_tolerance_px
    }

    /// Set the active tool.
    pub fn set_tool(&mut self, tool: DrawingTool) {
        // Clear any in-progress drawing
        self.interaction = InteractionState::Idle;
        self.tool = tool;

        if tool != DrawingTool::Select {
            self.selected = None;
            self.hovered = None;
        }
    }

    /// Cancel the current operation.
    pub fn cancel(&mut self) {
        self.interaction = InteractionState::Idle;
        self.selected = None;
    }

    /// Add a drawing from world coordinates.
    pub fn add(&mut self, shape: Shape) -> DrawingId {
        let id = self.next_id;
        self.next_id = id.next();
        self.drawings.push(Drawing::new(id, shape));
        id
    }

    /// Replace the geometry of an existing drawing. The kind may not change.
    pub fn update(&mut self, id: DrawingId, shape: Shape) -> bool {
        match self.drawings.iter_mut().find(|d| d.id == id) {
            Some(d) if d.kind() == shape.kind() => {
                d.shape = shape;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: DrawingId) -> bool {
        let before = self.drawings.len();
        self.drawings.retain(|d| d.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.drawings.len() != before
    }

    /// Delete the selected drawing.
    pub fn remove_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.remove(id),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.drawings.clear();
        self.selected = None;
        self.hovered = None;
        self.interaction = InteractionState::Idle;
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    /// Whether a press at `screen` would be consumed by the drawing tools.
    pub fn wants_pointer(&self, screen: ScreenPos, coords: &CoordinateSystem) -> bool {
        match self.tool {
            DrawingTool::None => false,
            DrawingTool::Place(_) => true,
            DrawingTool::Select => self.hit_test(screen, coords).is_some(),
        }
    }

    /// Handle pointer press.
    pub fn handle_press(&mut self, screen: ScreenPos, coords: &CoordinateSystem) -> bool {
        let point = coords.screen_to_point(screen);
        self.cursor_pos = Some(point);

        match self.tool {
            DrawingTool::None => false,

            DrawingTool::Select => match self.hit_test(screen, coords) {
                Some(drawing_id) => {
                    self.selected = Some(drawing_id);
                    if let Some(drawing) = self.get(drawing_id) {
                        let reference = drawing.shape.reference();
                        self.interaction = InteractionState::Dragging {
                            drawing_id,
                            offset: DragOffset {
                                time: point.time - reference.time,
                                price: point.price - reference.price,
                            },
                        };
                    }
                    true
                }
                None => {
                    // Clicked on nothing - deselect
                    self.selected = None;
                    false
                }
            },

            DrawingTool::Place(kind) if kind.anchor_count() == 1 => {
                self.add(kind.shape(point, point));
                true
            }

            DrawingTool::Place(kind) => match self.interaction {
                InteractionState::Placing { first } => {
                    self.interaction = InteractionState::Idle;
                    let first_screen = coords.point_to_screen(first);
                    if first_screen.distance_to(screen) < MIN_DRAWING_SIZE_PX {
                        return false;
                    }
                    self.add(kind.shape(first, point));
                    true
                }
                _ => {
                    self.interaction = InteractionState::Placing { first: point };
                    true
                }
            },
        }
    }

    /// Handle pointer movement, with or without a button held.
    pub fn handle_move(&mut self, screen: ScreenPos, coords: &CoordinateSystem) -> bool {
        let point = coords.screen_to_point(screen);
        self.cursor_pos = Some(point);

        match self.interaction {
            InteractionState::Dragging { drawing_id, offset } => {
                let reference = WorldPoint::new(point.time - offset.time, point.price - offset.price);
                if let Some(drawing) = self.drawings.iter_mut().find(|d| d.id == drawing_id) {
                    drawing.shape = drawing.shape.moved_to(reference);
                    return true;
                }
                false
            }
            InteractionState::Placing { .. } => true,
            InteractionState::Idle => {
                if self.tool == DrawingTool::Select {
                    self.hovered = self.hit_test(screen, coords);
                }
                false
            }
        }
    }

    /// Handle pointer release.
    pub fn handle_release(&mut self) {
        if let InteractionState::Dragging { .. } = self.interaction {
            self.interaction = InteractionState::Idle;
        }
    }

    /// Check if currently in a placement or drag.
    pub fn is_interacting(&self) -> bool {
        !matches!(self.interaction, InteractionState::Idle)
    }

    /// Topmost drawing within the hit tolerance of `screen`.
    pub fn hit_test(&self, screen: ScreenPos, coords: &CoordinateSystem) -> Option<DrawingId> {
        self.drawings
            .iter()
            .rev()
            .find(|d| distance_to_shape(&d.shape, screen, coords) <= self.hit_tolerance_px)
            .map(|d| d.id)
    }

    /// Floating preview while a tool is being placed.
    pub fn preview_drawing(&self) -> Option<Drawing> {
        let cursor = self.cursor_pos?;
        match (self.tool, self.interaction) {
            (DrawingTool::Place(kind), InteractionState::Placing { first }) => {
                Some(Drawing::preview(kind.shape(first, cursor)))
            }
            (DrawingTool::Place(kind), InteractionState::Idle) if kind.anchor_count() == 1 => {
                Some(Drawing::preview(kind.shape(cursor, cursor)))
            }
            _ => None,
        }
    }
}

/// Where a trendline through `a` and `b` meets the right edge. Lines that
/// do not head right stop at `b`.
pub fn extend_to_right(a: ScreenPos, b: ScreenPos, right_x: f64) -> ScreenPos {
    let dx = b.x - a.x;
    if dx <= f64::EPSILON || right_x <= b.x {
        return b;
    }
    let slope = (b.y - a.y) / dx;
    ScreenPos::new(right_x, b.y + slope * (right_x - b.x))
}

/// Screen-space distance from `screen` to the rendered geometry of `shape`.
pub fn distance_to_shape(shape: &Shape, screen: ScreenPos, coords: &CoordinateSystem) -> f64 {
    match *shape {
        Shape::Horizontal { price } => (screen.y - coords.price_to_y(price)).abs(),
        Shape::Vertical { time } => (screen.x - coords.time_to_x(time)).abs(),
        Shape::TrendLine { start, end } => {
            let a = coords.point_to_screen(start);
            let b = coords.point_to_screen(end);
            let far = extend_to_right(a, b, coords.layout.chart_width);
            screen.distance_to_segment(a, far)
        }
        Shape::Line { start, end } => {
            let a = coords.point_to_screen(start);
            let b = coords.point_to_screen(end);
            screen.distance_to_segment(a, b)
        }
        Shape::Fibonacci { start, end } => {
            let x1 = coords.time_to_x(start.time);
            let x2 = coords.time_to_x(end.time);
            let (left, right) = (x1.min(x2), x1.max(x2));
            shape
                .fib_levels()
                .iter()
                .map(|level| {
                    let y = coords.price_to_y(level.price);
                    screen.distance_to_segment(ScreenPos::new(left, y), ScreenPos::new(right, y))
                })
                .fold(f64::INFINITY, f64::min)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ChartLayout, PriceRange, TimeScale};

    /// 600px plot, 10px per candle, 1m candles at 0..100, prices 100..110
    /// over 500px.
    fn coords() -> CoordinateSystem {
        let buckets = (0..100).map(|i| i * 60_000).collect();
        CoordinateSystem::new(
            ChartLayout::new(664.0, 524.0, false),
            0.0,
            60.0,
            PriceRange::new(100.0, 110.0),
            TimeScale::new(buckets, 60_000),
        )
    }

    #[test]
    fn test_tolerance_clamped() {
        assert_eq!(DrawingManager::new(5.0).hit_tolerance(), 15.0);
        assert_eq!(DrawingManager::new(40.0).hit_tolerance(), 25.0);
    }

    #[test]
    fn test_ids_are_per_manager_and_never_reused() {
        let mut a = DrawingManager::default();
        let mut b = DrawingManager::default();
        let first = a.add(Shape::Horizontal { price: 101.0 });
        assert_eq!(b.add(Shape::Horizontal { price: 102.0 }), first);

        a.clear();
        let second = a.add(Shape::Horizontal { price: 103.0 });
        assert_ne!(second, first);
        assert_ne!(second, DrawingId::PREVIEW);
    }

    #[test]
    fn test_preview_id_is_stable() {
        let mut manager = DrawingManager::default();
        manager.set_tool(DrawingTool::Place(DrawingToolKind::Horizontal));
        manager.cursor_pos = Some(WorldPoint::new(60_000, 105.0));
        let first = manager.preview_drawing().unwrap();
        manager.cursor_pos = Some(WorldPoint::new(120_000, 106.0));
        let second = manager.preview_drawing().unwrap();
        assert_eq!(first.id, DrawingId::PREVIEW);
        assert_eq!(second.id, DrawingId::PREVIEW);
    }

    #[test]
    fn test_single_click_horizontal() {
        let c = coords();
        let mut m = DrawingManager::default();
        m.set_tool(DrawingTool::Place(DrawingToolKind::Horizontal));
        assert!(m.handle_press(ScreenPos::new(100.0, 250.0), &c));
        assert_eq!(m.drawings.len(), 1);
        assert_eq!(m.drawings[0].shape, Shape::Horizontal { price: 105.0 });
    }

    #[test]
    fn test_two_click_placement_with_preview() {
        let c = coords();
        let mut m = DrawingManager::default();
        m.set_tool(DrawingTool::Place(DrawingToolKind::Line));

        assert!(m.handle_press(ScreenPos::new(105.0, 100.0), &c));
        assert!(m.drawings.is_empty());
        m.handle_move(ScreenPos::new(205.0, 300.0), &c);
        let preview = m.preview_drawing().unwrap();
        assert_eq!(preview.kind(), DrawingToolKind::Line);

        assert!(m.handle_press(ScreenPos::new(205.0, 300.0), &c));
        assert_eq!(m.drawings.len(), 1);
        let (start, end) = m.drawings[0].shape.endpoints().unwrap();
        assert_eq!(start.time, 600_000);
        assert_eq!(end.time, 1_200_000);
        assert!((start.price - 108.0).abs() < 1e-9);
        assert!((end.price - 104.0).abs() < 1e-9);
        assert!(m.preview_drawing().is_none());
    }

    #[test]
    fn test_degenerate_placement_cancelled() {
        let c = coords();
        let mut m = DrawingManager::default();
        m.set_tool(DrawingTool::Place(DrawingToolKind::Fibonacci));
        m.handle_press(ScreenPos::new(100.0, 100.0), &c);
        assert!(!m.handle_press(ScreenPos::new(100.5, 100.0), &c));
        assert!(m.drawings.is_empty());
        assert!(!m.is_interacting());
    }

    #[test]
    fn test_hit_test_within_tolerance() {
        let c = coords();
        let mut m = DrawingManager::new(20.0);
        let line = m.add(Shape::Line {
            start: WorldPoint::new(600_000, 108.0),
            end: WorldPoint::new(1_200_000, 108.0),
        });
        // Line sits at y = 100 from x = 105 to x = 205.
        assert_eq!(m.hit_test(ScreenPos::new(150.0, 118.0), &c), Some(line));
        assert_eq!(m.hit_test(ScreenPos::new(150.0, 125.0), &c), None);
        // Beyond the segment end.
        assert_eq!(m.hit_test(ScreenPos::new(240.0, 100.0), &c), None);
    }

    #[test]
    fn test_trendline_extends_right() {
        let c = coords();
        let mut m = DrawingManager::new(20.0);
        let trend = m.add(Shape::TrendLine {
            start: WorldPoint::new(600_000, 108.0),
            end: WorldPoint::new(1_200_000, 108.0),
        });
        assert_eq!(m.hit_test(ScreenPos::new(500.0, 100.0), &c), Some(trend));
    }

    #[test]
    fn test_delta_drag_has_no_drift() {
        let c = coords();
        let mut m = DrawingManager::new(20.0);
        let id = m.add(Shape::Horizontal { price: 105.0 });
        m.set_tool(DrawingTool::Select);

        // Grab 10px below the line.
        assert!(m.handle_press(ScreenPos::new(300.0, 260.0), &c));
        for y in [270.0, 283.0, 291.0, 310.0, 260.0] {
            m.handle_move(ScreenPos::new(300.0, y), &c);
        }
        m.handle_release();
        match m.get(id).unwrap().shape {
            Shape::Horizontal { price } => assert!((price - 105.0).abs() < 1e-9),
            other => panic!("unexpected shape {other:?}"),
        }
        assert!(!m.is_interacting());
    }

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let c = coords();
        let mut m = DrawingManager::new(20.0);
        let id = m.add(Shape::Vertical { time: 1_200_000 });
        m.set_tool(DrawingTool::Select);
        // Vertical line at x = 205.
        assert!(m.handle_press(ScreenPos::new(210.0, 50.0), &c));
        m.handle_move(ScreenPos::new(310.0, 80.0), &c);
        assert_eq!(m.get(id).unwrap().shape, Shape::Vertical { time: 1_800_000 });
    }

    #[test]
    fn test_remove_selected_and_clear() {
        let c = coords();
        let mut m = DrawingManager::new(20.0);
        m.add(Shape::Horizontal { price: 105.0 });
        m.add(Shape::Horizontal { price: 102.0 });
        m.set_tool(DrawingTool::Select);
        m.handle_press(ScreenPos::new(10.0, 250.0), &c);
        m.handle_release();
        assert!(m.remove_selected());
        assert_eq!(m.drawings.len(), 1);
        assert!(!m.remove_selected());

        m.clear();
        assert!(m.drawings.is_empty());
    }

    #[test]
    fn test_update_keeps_kind() {
        let mut m = DrawingManager::default();
        let id = m.add(Shape::Horizontal { price: 1.0 });
        assert!(m.update(id, Shape::Horizontal { price: 2.0 }));
        assert!(!m.update(id, Shape::Vertical { time: 0 }));
        assert_eq!(m.get(id).unwrap().shape, Shape::Horizontal { price: 2.0 });
    }
}
