//! Arrow segment geometry.

use kurbo::{ParamCurveExtrema, Point, QuadBez, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Styling of an arrow segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowStyle {
    /// Length of the arrowhead along the shaft.
    pub head_size: f64,
    /// Bend of the shaft relative to its length (0 = straight).
    #[serde(default)]
    pub curvature: f64,
    /// Extra room kept around the arrow's bounds.
    #[serde(default)]
    pub padding: f64,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self { head_size: 15.0, curvature: 0.0, padding: 2.0 }
    }
}

/// Control point bending the chord `start`→`end` by `curvature` times its length.
pub fn control_point(start: Point, end: Point, curvature: f64) -> Point {
    let chord = end - start;
    let len = chord.hypot();
    let mid = start.midpoint(end);
    if len < f64::EPSILON || curvature == 0.0 {
        return mid;
    }
    let normal = Vec2::new(-chord.y / len, chord.x / len);
    mid + normal * (curvature * len)
}

/// Unit direction the head points to.
fn head_direction(start: Point, control: Point, end: Point) -> Vec2 {
    let from_control = end - control;
    let dir = if from_control.hypot2() > f64::EPSILON { from_control } else { end - start };
    let len = dir.hypot();
    if len < f64::EPSILON { Vec2::new(1.0, 0.0) } else { dir / len }
}

/// Arrowhead triangle: tip, left and right corners.
pub fn head_points(start: Point, control: Point, end: Point, head_size: f64) -> [Point; 3] {
    let dir = head_direction(start, control, end);
    let perp = Vec2::new(-dir.y, dir.x);
    let back = end - dir * head_size;
    [end, back + perp * (head_size * 0.5), back - perp * (head_size * 0.5)]
}

/// Bounds of an arrow segment: curved shaft, head, and padding.
pub fn arrow_bounds(start: Point, control: Point, end: Point, style: &ArrowStyle) -> Rect {
    let shaft = ParamCurveExtrema::bounding_box(&QuadBez::new(start, control, end));
    let [tip, left, right] = head_points(start, control, end, style.head_size);
    shaft
        .union_pt(tip)
        .union_pt(left)
        .union_pt(right)
        .inflate(style.padding, style.padding)
}

/// Point in triangle test.
pub fn point_in_triangle(point: Point, [a, b, c]: [Point; 3]) -> bool {
    fn sign(p1: Point, p2: Point, p3: Point) -> f64 {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    }

    let d1 = sign(point, a, b);
    let d2 = sign(point, b, c);
    let d3 = sign(point, c, a);

    let has_neg = (d1 < 0.0) || (d2 < 0.0) || (d3 < 0.0);
    let has_pos = (d1 > 0.0) || (d2 > 0.0) || (d3 > 0.0);

    !(has_neg && has_pos)
}
