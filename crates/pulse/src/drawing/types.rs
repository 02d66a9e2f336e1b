//! Drawing types for interactive chart annotations.

use crate::coords::WorldPoint;

/// Identifier for a drawing, unique within its `DrawingManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawingId(u64);

impl DrawingId {
    /// Carried by placement previews. Never given to a placed drawing.
    pub const PREVIEW: Self = Self(0);
    pub(super) const FIRST: Self = Self(1);

    pub(super) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Default color for drawings (cyan/teal).
pub const DEFAULT_DRAWING_COLOR: [f32; 4] = [0.0, 0.8, 0.8, 1.0];
/// Preview color (more transparent).
pub const PREVIEW_DRAWING_COLOR: [f32; 4] = [0.0, 0.8, 0.8, 0.5];
/// Fill alpha for the bands between Fibonacci levels.
pub const FIB_BAND_ALPHA: f32 = 0.08;

/// Retracement ratios, from the start anchor to the end anchor.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// The kinds of tool a user can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawingToolKind {
    Horizontal,
    Vertical,
    TrendLine,
    Line,
    Fibonacci,
}

impl DrawingToolKind {
    /// Clicks needed to place one.
    pub fn anchor_count(&self) -> usize {
        match self {
            DrawingToolKind::Horizontal | DrawingToolKind::Vertical => 1,
            DrawingToolKind::TrendLine | DrawingToolKind::Line | DrawingToolKind::Fibonacci => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DrawingToolKind::Horizontal => "Horizontal",
            DrawingToolKind::Vertical => "Vertical",
            DrawingToolKind::TrendLine => "Trend",
            DrawingToolKind::Line => "Line",
            DrawingToolKind::Fibonacci => "Fib",
        }
    }

    /// Build the shape from placement clicks. Two-anchor kinds use both
    /// points; single-anchor kinds keep only the coordinate they need.
    pub fn shape(&self, first: WorldPoint, second: WorldPoint) -> Shape {
        match self {
            DrawingToolKind::Horizontal => Shape::Horizontal { price: first.price },
            DrawingToolKind::Vertical => Shape::Vertical { time: first.time },
            DrawingToolKind::TrendLine => Shape::TrendLine {
                start: first,
                end: second,
            },
            DrawingToolKind::Line => Shape::Line {
                start: first,
                end: second,
            },
            DrawingToolKind::Fibonacci => Shape::Fibonacci {
                start: first,
                end: second,
            },
        }
    }
}

/// Geometry of a drawing, in price/time only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Horizontal { price: f64 },
    Vertical { time: i64 },
    /// Extends past `end` to the right edge of the chart.
    TrendLine { start: WorldPoint, end: WorldPoint },
    Line { start: WorldPoint, end: WorldPoint },
    Fibonacci { start: WorldPoint, end: WorldPoint },
}

impl Shape {
    pub fn kind(&self) -> DrawingToolKind {
        match self {
            Shape::Horizontal { .. } => DrawingToolKind::Horizontal,
            Shape::Vertical { .. } => DrawingToolKind::Vertical,
            Shape::TrendLine { .. } => DrawingToolKind::TrendLine,
            Shape::Line { .. } => DrawingToolKind::Line,
            Shape::Fibonacci { .. } => DrawingToolKind::Fibonacci,
        }
    }

    /// Both anchors of a two-anchor shape.
    pub fn endpoints(&self) -> Option<(WorldPoint, WorldPoint)> {
        match *self {
            Shape::TrendLine { start, end }
            | Shape::Line { start, end }
            | Shape::Fibonacci { start, end } => Some((start, end)),
            Shape::Horizontal { .. } | Shape::Vertical { .. } => None,
        }
    }

    /// The point drags are measured against. Axes a shape does not use
    /// are zero.
    pub fn reference(&self) -> WorldPoint {
        match *self {
            Shape::Horizontal { price } => WorldPoint::new(0, price),
            Shape::Vertical { time } => WorldPoint::new(time, 0.0),
            Shape::TrendLine { start, .. }
            | Shape::Line { start, .. }
            | Shape::Fibonacci { start, .. } => start,
        }
    }

    /// Same shape moved so that its reference sits at `reference`.
    #[must_use]
    pub fn moved_to(&self, reference: WorldPoint) -> Shape {
        let shift = |p: WorldPoint, from: WorldPoint| {
            WorldPoint::new(
                p.time + (reference.time - from.time),
                p.price + (reference.price - from.price),
            )
        };
        match *self {
            Shape::Horizontal { .. } => Shape::Horizontal {
                price: reference.price,
            },
            Shape::Vertical { .. } => Shape::Vertical {
                time: reference.time,
            },
            Shape::TrendLine { start, end } => Shape::TrendLine {
                start: reference,
                end: shift(end, start),
            },
            Shape::Line { start, end } => Shape::Line {
                start: reference,
                end: shift(end, start),
            },
            Shape::Fibonacci { start, end } => Shape::Fibonacci {
                start: reference,
                end: shift(end, start),
            },
        }
    }

    /// Retracement levels, or an empty list for other shapes.
    pub fn fib_levels(&self) -> Vec<FibLevel> {
        match *self {
            Shape::Fibonacci { start, end } => fib_levels(start.price, end.price).to_vec(),
            _ => Vec::new(),
        }
    }
}

/// One Fibonacci level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

impl FibLevel {
    /// `"61.8% 1.23456"`.
    pub fn label(&self, decimals: usize) -> String {
        format!("{:.1}% {:.*}", self.ratio * 100.0, decimals, self.price)
    }
}

/// Levels between `p1` (ratio 0) and `p2` (ratio 1).
///
/// Written as a weighted sum so both endpoints come back exactly.
pub fn fib_levels(p1: f64, p2: f64) -> [FibLevel; 7] {
    FIB_RATIOS.map(|ratio| FibLevel {
        ratio,
        price: p1 * (1.0 - ratio) + p2 * ratio,
    })
}

/// A placed drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub id: DrawingId,
    pub shape: Shape,
    pub color: [f32; 4],
}

impl Drawing {
    pub fn new(id: DrawingId, shape: Shape) -> Self {
        Self {
            id,
            shape,
            color: DEFAULT_DRAWING_COLOR,
        }
    }

    pub fn preview(shape: Shape) -> Self {
        Self {
            id: DrawingId::PREVIEW,
            shape,
            color: PREVIEW_DRAWING_COLOR,
        }
    }

    pub fn kind(&self) -> DrawingToolKind {
        self.shape.kind()
    }
}
