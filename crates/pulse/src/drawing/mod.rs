//! Interactive drawing tools for chart annotations.
//!
//! Drawings are stored in price/time coordinates only, so they stay attached
//! to the market across pan, zoom and resize. Pixels appear only while hit
//! testing and planning a frame.

mod state;
mod types;

pub use state::{
    distance_to_shape, extend_to_right, DragOffset, DrawingManager, DrawingTool, InteractionState,
    MAX_HIT_TOLERANCE_PX, MIN_HIT_TOLERANCE_PX,
};
pub use types::{
    fib_levels, Drawing, DrawingId, DrawingToolKind, FibLevel, Shape, DEFAULT_DRAWING_COLOR,
    FIB_BAND_ALPHA, FIB_RATIOS, PREVIEW_DRAWING_COLOR,
};
