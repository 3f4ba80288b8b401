//! Connector routing and zoom/pan math.
//!
//! Everything here is a pure function of its arguments.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Radius used to shorten connector paths at both ends.
pub const NODE_RADIUS: f64 = 50.0;
/// Side length of the square icon box.
pub const ICON_SIZE: f64 = 100.0;
/// Vertical distance from the node anchor to the top of its label.
pub const LABEL_OFFSET: f64 = 110.0;
/// Width of the label box, centered under the icon.
pub const LABEL_WIDTH: f64 = 100.0;
/// Label font size at scale 1.
pub const LABEL_FONT_SIZE: f64 = 18.0;

/// Multiplicative step applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;

/// Center a connector attaches to, given a node anchor.
///
/// The anchor is the top-middle of the icon box, so the center sits one
/// radius below it.
pub fn connection_center(anchor: Point) -> Point {
    Point::new(anchor.x, anchor.y + NODE_RADIUS)
}

/// Icon box in diagram coordinates.
pub fn icon_rect(anchor: Point) -> Rect {
    Rect::new(
        anchor.x - ICON_SIZE / 2.0,
        anchor.y,
        anchor.x + ICON_SIZE / 2.0,
        anchor.y + ICON_SIZE,
    )
}

/// Top-left corner of the label box.
pub fn label_origin(anchor: Point) -> Point {
    Point::new(anchor.x - LABEL_WIDTH / 2.0, anchor.y + LABEL_OFFSET)
}

/// Elbow path between two node anchors.
///
/// Both ends are pulled in by `radius` along the straight line between the
/// connection centers, then joined with a horizontal-vertical-horizontal zig
/// through the horizontal midpoint. Coincident anchors yield the unshortened
/// centers.
pub fn connector_path(start_anchor: Point, end_anchor: Point, radius: f64) -> [Point; 4] {
    let start = connection_center(start_anchor);
    let end = connection_center(end_anchor);
    let delta = end - start;
    let distance = delta.hypot();

    let (start, end) = if distance < f64::EPSILON {
        (start, end)
    } else {
        let shift = delta * (radius / distance);
        (start + shift, end - shift)
    };

    let mid_x = (start.x + end.x) / 2.0;
    [
        start,
        Point::new(mid_x, start.y),
        Point::new(mid_x, end.y),
        end,
    ]
}

/// Direction of a single wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelDirection {
    In,
    Out,
}

impl WheelDirection {
    /// Positive vertical deltas (scrolling down) zoom out.
    pub fn from_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            WheelDirection::Out
        } else {
            WheelDirection::In
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            WheelDirection::In => WheelDirection::Out,
            WheelDirection::Out => WheelDirection::In,
        }
    }
}

/// Zoom step and clamp range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub step: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            step: ZOOM_STEP,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

/// One wheel step of zoom-to-cursor.
///
/// Returns the clamped new scale and the offset that keeps the diagram point
/// under `pointer` at the same screen position.
pub fn apply_zoom(
    scale: f64,
    pointer: Point,
    offset: Vec2,
    direction: WheelDirection,
    limits: ZoomLimits,
) -> (f64, Vec2) {
    let stepped = match direction {
        WheelDirection::In => scale * limits.step,
        WheelDirection::Out => scale / limits.step,
    };
    let new_scale = stepped.clamp(limits.min_scale, limits.max_scale);

    let anchor = screen_to_diagram(pointer, offset, scale);
    let new_offset = pointer.to_vec2() - anchor.to_vec2() * new_scale;
    (new_scale, new_offset)
}

/// Convert a screen position into diagram coordinates.
pub fn screen_to_diagram(screen: Point, offset: Vec2, scale: f64) -> Point {
    ((screen.to_vec2() - offset) / scale).to_point()
}

/// Convert a diagram position into screen coordinates.
pub fn diagram_to_screen(diagram: Point, offset: Vec2, scale: f64) -> Point {
    (diagram.to_vec2() * scale + offset).to_point()
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}
