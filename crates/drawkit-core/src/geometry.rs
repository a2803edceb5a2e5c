//! Geometry kernel: areas, rotated hit-testing, border classification and resize.
//!
//! Everything here is pure. Invalid input (non-finite coordinates, empty
//! areas) yields `None`/`false` instead of panicking.

use crate::config::MIN_SHAPE_SIZE;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Radius of the round overlay buttons.
pub const BUTTON_RADIUS: f64 = 10.0;
/// Gap between the shape's top edge and the overlay buttons.
pub const BUTTON_GAP: f64 = 4.0;
/// Horizontal distance from the center to each rotate button.
pub const ROTATE_BUTTON_SPACING: f64 = 16.0;
/// Rotate buttons always sit at least this far above the center.
pub const ROTATE_BUTTON_MIN_OFFSET: f64 = 30.0;
/// Space reserved above a drawable for its overlay buttons.
pub const OVERLAY_TOP_MARGIN: f64 = 2.0 * (BUTTON_RADIUS + BUTTON_GAP);
/// Half side of the square resize handles drawn on corners.
pub const CORNER_HANDLE_HALF: f64 = 4.0;

/// Axis-aligned bounding area in surface space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    /// Empty area at the origin.
    pub const ZERO: Area = Area { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    /// Area at `(x, y)`; negative sizes are kept as given.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized area spanned by two corner points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Area covering `rect`, normalized.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Area centered on `center` with the given size.
    pub fn centered(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Midpoint of the area, the pivot for rotations.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// All components finite and non-negative dimensions.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// True when either dimension is zero (or the area is invalid).
    pub fn is_empty(&self) -> bool {
        !self.is_valid() || self.width <= f64::EPSILON || self.height <= f64::EPSILON
    }

    /// Whether `point` lies inside or on the edge of the area.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// True when `other` lies completely inside this area.
    pub fn contains_area(&self, other: &Area) -> bool {
        other.x >= self.x - 1e-9
            && other.y >= self.y - 1e-9
            && other.right() <= self.right() + 1e-9
            && other.bottom() <= self.bottom() + 1e-9
    }

    /// Grow by `dx` on the left and right and by `dy` on the top and bottom.
    pub fn inflate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x - dx, self.y - dy, self.width + 2.0 * dx, self.height + 2.0 * dy)
    }

    /// Same size, moved by `delta`.
    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Smallest area containing both.
    pub fn union(&self, other: &Area) -> Self {
        Self::from_rect(self.to_rect().union(other.to_rect()))
    }

    /// Grow the area so it also covers `point`.
    pub fn include_point(&self, point: Point) -> Self {
        Self::from_rect(self.to_rect().union_pt(point))
    }

    /// Area extended upward by the overlay button margin.
    pub fn with_overlay_margin(&self) -> Self {
        Self::new(
            self.x,
            self.y - OVERLAY_TOP_MARGIN,
            self.width,
            self.height + OVERLAY_TOP_MARGIN,
        )
    }
}

impl From<Rect> for Area {
    fn from(rect: Rect) -> Self {
        Area::from_rect(rect)
    }
}

impl From<Area> for Rect {
    fn from(area: Area) -> Self {
        area.to_rect()
    }
}

/// Which part of a (possibly rotated) rectangle a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Border {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Right,
    Bottom,
    Left,
    Inside,
}

impl Border {
    /// True for the four corner zones.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Border::TopLeft | Border::TopRight | Border::BottomLeft | Border::BottomRight
        )
    }

    /// True for borders whose drag moves the left edge.
    fn moves_left(self) -> bool {
        matches!(self, Border::TopLeft | Border::BottomLeft | Border::Left)
    }

    fn moves_right(self) -> bool {
        matches!(self, Border::TopRight | Border::BottomRight | Border::Right)
    }

    fn moves_top(self) -> bool {
        matches!(self, Border::TopLeft | Border::TopRight | Border::Top)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Border::BottomLeft | Border::BottomRight | Border::Bottom)
    }

    /// Border across the area from this one. `Inside` maps to itself.
    pub fn opposite(self) -> Border {
        match self {
            Border::TopLeft => Border::BottomRight,
            Border::TopRight => Border::BottomLeft,
            Border::BottomLeft => Border::TopRight,
            Border::BottomRight => Border::TopLeft,
            Border::Top => Border::Bottom,
            Border::Bottom => Border::Top,
            Border::Left => Border::Right,
            Border::Right => Border::Left,
            Border::Inside => Border::Inside,
        }
    }

    /// Compass index (0 = north, clockwise in 45° steps).
    fn compass(self) -> Option<u8> {
        match self {
            Border::Top => Some(0),
            Border::TopRight => Some(1),
            Border::Right => Some(2),
            Border::BottomRight => Some(3),
            Border::Bottom => Some(4),
            Border::BottomLeft => Some(5),
            Border::Left => Some(6),
            Border::TopLeft => Some(7),
            Border::Inside => None,
        }
    }
}

/// Overlay buttons drawn around a fixed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlButton {
    /// Top-right badge that validates the shape.
    Badge,
    RotateLeft,
    RotateRight,
}

/// Cursor to display for the pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
    Move,
    Crosshair,
    NsResize,
    EwResize,
    NwseResize,
    NeswResize,
}

impl CursorHint {
    /// CSS cursor name.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorHint::Default => "default",
            CursorHint::Pointer => "pointer",
            CursorHint::Move => "move",
            CursorHint::Crosshair => "crosshair",
            CursorHint::NsResize => "ns-resize",
            CursorHint::EwResize => "ew-resize",
            CursorHint::NwseResize => "nwse-resize",
            CursorHint::NeswResize => "nesw-resize",
        }
    }
}

/// Resize cursor for a border, turned with the shape's rotation.
pub fn cursor_for_border(border: Border, rotation_deg: f64) -> CursorHint {
    let Some(base) = border.compass() else {
        return CursorHint::Move;
    };
    let steps = if rotation_deg.is_finite() {
        (rotation_deg / 45.0).round().rem_euclid(8.0) as u8
    } else {
        0
    };
    match (base + steps) % 4 {
        0 => CursorHint::NsResize,
        1 => CursorHint::NeswResize,
        2 => CursorHint::EwResize,
        _ => CursorHint::NwseResize,
    }
}

/// Rotate `point` by `degrees` (clockwise on screen) around `center`.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    Affine::rotate_about(degrees.to_radians(), center) * point
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    if (d - 360.0).abs() < 1e-9 { 0.0 } else { d }
}

fn is_finite_point(point: Point) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// True when a rotation leaves an axis-aligned box centered on its pivot unchanged.
fn is_half_turn(rotation_deg: f64) -> bool {
    let r = normalize_degrees(rotation_deg);
    r.abs() < 1e-9 || (r - 180.0).abs() < 1e-9
}

/// Bring `point` into the rectangle's unrotated frame.
fn unrotate(point: Point, center: Point, rotation_deg: f64) -> Point {
    rotate_point(point, center, -rotation_deg)
}

/// Whether `point` lies inside a rectangle of `size` centered on `center` and
/// rotated by `rotation_deg`.
pub fn is_inside_rectangle(point: Point, center: Point, size: Size, rotation_deg: f64) -> bool {
    if !is_finite_point(point) || !is_finite_point(center) || !rotation_deg.is_finite() {
        return false;
    }
    if !size.width.is_finite() || !size.height.is_finite() || size.width < 0.0 || size.height < 0.0 {
        return false;
    }
    let local = if is_half_turn(rotation_deg) { point } else { unrotate(point, center, rotation_deg) };
    (local.x - center.x).abs() <= size.width / 2.0 && (local.y - center.y).abs() <= size.height / 2.0
}

/// Classify `point` against the borders of `area` rotated about its center.
///
/// Returns `None` when the point is outside the area inflated by `margin`.
pub fn classify_border(point: Point, area: &Area, rotation_deg: f64, margin: f64) -> Option<Border> {
    if !is_finite_point(point) || area.is_empty() || !rotation_deg.is_finite() || !margin.is_finite() {
        return None;
    }
    let margin = margin.max(0.0);
    let local = unrotate(point, area.center(), rotation_deg);
    if !area.inflate(margin, margin).contains(local) {
        return None;
    }
    let dx = local.x - area.x;
    let dy = local.y - area.y;
    let near_left = dx.abs() <= margin;
    let near_right = (dx - area.width).abs() <= margin;
    let near_top = dy.abs() <= margin;
    let near_bottom = (dy - area.height).abs() <= margin;

    let border = match (near_left, near_right, near_top, near_bottom) {
        (true, _, true, _) => Border::TopLeft,
        (_, true, true, _) => Border::TopRight,
        (true, _, _, true) => Border::BottomLeft,
        (_, true, _, true) => Border::BottomRight,
        (_, _, true, _) => Border::Top,
        (_, _, _, true) => Border::Bottom,
        (true, _, _, _) => Border::Left,
        (_, true, _, _) => Border::Right,
        _ => Border::Inside,
    };
    Some(border)
}

/// Centers of the overlay buttons in the area's unrotated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonLayout {
    pub badge: Point,
    pub rotate_left: Point,
    pub rotate_right: Point,
    pub radius: f64,
}

/// Compute where the overlay buttons of `area` sit.
///
/// The badge is clamped so it never leaves a surface `max_surface_width` wide.
pub fn button_layout(area: &Area, max_surface_width: f64) -> ButtonLayout {
    let center = area.center();
    let row_y = area.y - BUTTON_RADIUS - BUTTON_GAP;
    let mut badge_x = area.right();
    if max_surface_width.is_finite() && max_surface_width > 0.0 {
        badge_x = badge_x.min(max_surface_width - BUTTON_RADIUS);
    }
    let rotate_offset = (area.height / 2.0 + BUTTON_RADIUS + BUTTON_GAP).max(ROTATE_BUTTON_MIN_OFFSET);
    let rotate_y = center.y - rotate_offset;
    ButtonLayout {
        badge: Point::new(badge_x, row_y),
        rotate_left: Point::new(center.x - ROTATE_BUTTON_SPACING, rotate_y),
        rotate_right: Point::new(center.x + ROTATE_BUTTON_SPACING, rotate_y),
        radius: BUTTON_RADIUS,
    }
}

/// Which overlay button (if any) lies under `point`. The badge wins over the
/// rotate buttons when they overlap on narrow shapes.
pub fn classify_control_button(
    point: Point,
    area: &Area,
    rotation_deg: f64,
    max_surface_width: f64,
) -> Option<ControlButton> {
    if !is_finite_point(point) || area.is_empty() || !rotation_deg.is_finite() {
        return None;
    }
    let local = unrotate(point, area.center(), rotation_deg);
    let layout = button_layout(area, max_surface_width);
    let r_sq = layout.radius * layout.radius;
    if distance_sq(local, layout.badge) <= r_sq {
        Some(ControlButton::Badge)
    } else if distance_sq(local, layout.rotate_left) <= r_sq {
        Some(ControlButton::RotateLeft)
    } else if distance_sq(local, layout.rotate_right) <= r_sq {
        Some(ControlButton::RotateRight)
    } else {
        None
    }
}

/// Options for [`resize_rectangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub lock_ratio: bool,
    pub min_size: f64,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self { lock_ratio: false, min_size: MIN_SHAPE_SIZE }
    }
}

/// Recompute `area` after dragging `border` to `point`.
///
/// The dragged edge never crosses closer than `min_size` to the opposite edge.
/// With `lock_ratio` the other dimension follows the original aspect ratio.
pub fn resize_rectangle(point: Point, area: &Area, border: Border, options: ResizeOptions) -> Option<Area> {
    if !is_finite_point(point) || !area.is_valid() || border == Border::Inside {
        return None;
    }
    let min = options.min_size.max(1.0);
    let (mut left, mut top, mut right, mut bottom) = (area.x, area.y, area.right(), area.bottom());

    if border.moves_left() {
        left = point.x.min(right - min);
    }
    if border.moves_right() {
        right = point.x.max(left + min);
    }
    if border.moves_top() {
        top = point.y.min(bottom - min);
    }
    if border.moves_bottom() {
        bottom = point.y.max(top + min);
    }

    let mut width = (right - left).max(min);
    let mut height = (bottom - top).max(min);

    if options.lock_ratio {
        if area.width <= f64::EPSILON || area.height <= f64::EPSILON {
            return None;
        }
        let ratio = area.width / area.height;
        let height_driven = matches!(border, Border::Top | Border::Bottom);
        if height_driven {
            width = height * ratio;
        } else {
            height = width / ratio;
        }
        let grow = (min / width).max(min / height).max(1.0);
        width *= grow;
        height *= grow;

        if border.moves_left() {
            left = right - width;
        } else if border.moves_right() {
            left = area.x;
        } else {
            left = area.center().x - width / 2.0;
        }
        if border.moves_top() {
            top = bottom - height;
        } else if border.moves_bottom() {
            top = area.y;
        } else {
            top = area.center().y - height / 2.0;
        }
    } else {
        if border.moves_left() {
            left = right - width;
        }
        if border.moves_top() {
            top = bottom - height;
        }
    }

    Some(Area::new(left, top, width, height))
}

/// Point of `area` a border refers to: a corner, an edge midpoint or the center.
pub fn border_point(area: &Area, border: Border) -> Point {
    let x = if border.moves_left() {
        area.x
    } else if border.moves_right() {
        area.right()
    } else {
        area.center().x
    };
    let y = if border.moves_top() {
        area.y
    } else if border.moves_bottom() {
        area.bottom()
    } else {
        area.center().y
    };
    Point::new(x, y)
}

/// [`resize_rectangle`] for an area rotated by `rotation_deg` about its center.
///
/// `point` is in surface space. The result is shifted so the border opposite
/// the dragged one keeps its on-screen position.
pub fn resize_rotated_rectangle(
    point: Point,
    area: &Area,
    rotation_deg: f64,
    border: Border,
    options: ResizeOptions,
) -> Option<Area> {
    if !rotation_deg.is_finite() {
        return None;
    }
    let center = area.center();
    let resized = resize_rectangle(unrotate(point, center, rotation_deg), area, border, options)?;
    let anchor = border.opposite();
    let before = rotate_point(border_point(area, anchor), center, rotation_deg);
    let after = rotate_point(border_point(&resized, anchor), resized.center(), rotation_deg);
    Some(resized.translate(before - after))
}

/// Corners of `area` in its unrotated frame: top-left, top-right, bottom-right, bottom-left.
pub fn corner_points(area: &Area) -> [Point; 4] {
    [
        Point::new(area.x, area.y),
        Point::new(area.right(), area.y),
        Point::new(area.right(), area.bottom()),
        Point::new(area.x, area.bottom()),
    ]
}

/// Axis-aligned bounds of `area` once rotated about its center.
pub fn rotated_bounds(area: &Area, rotation_deg: f64) -> Area {
    if is_half_turn(rotation_deg) {
        return *area;
    }
    let center = area.center();
    let mut rect: Option<Rect> = None;
    for corner in corner_points(area) {
        let p = rotate_point(corner, center, rotation_deg);
        rect = Some(match rect {
            Some(r) => r.union_pt(p),
            None => Rect::from_points(p, p),
        });
    }
    rect.map(Area::from_rect).unwrap_or(*area)
}

/// Squared distance, for comparisons that don't need the root.
pub fn distance_sq(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
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
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Perpendicular distance from `point` to the infinite line through `start`/`end`.
pub fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return distance_sq(point, start).sqrt();
    }
    let area2 = ((point.x - start.x) * dy - (point.y - start.y) * dx).abs();
    area2 / len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_center_is_always_inside() {
        let center = Point::new(40.0, 70.0);
        let size = Size::new(30.0, 10.0);
        for rotation in [0.0, 90.0, 180.0, 270.0, 33.3, -147.0, 721.0] {
            assert!(is_inside_rectangle(center, center, size, rotation), "rotation {rotation}");
        }
    }

    #[test]
    fn test_inside_rotated_quarter_turn() {
        let center = Point::new(0.0, 0.0);
        let size = Size::new(100.0, 10.0);
        // Wide and flat: (0, 40) is outside unrotated, inside after a quarter turn.
        assert!(!is_inside_rectangle(Point::new(0.0, 40.0), center, size, 0.0));
        assert!(is_inside_rectangle(Point::new(0.0, 40.0), center, size, 90.0));
        assert!(!is_inside_rectangle(Point::new(40.0, 0.0), center, size, 90.0));
        assert!(is_inside_rectangle(Point::new(40.0, 0.0), center, size, 180.0));
    }

    #[test]
    fn test_inside_rejects_non_finite() {
        assert!(!is_inside_rectangle(
            Point::new(f64::NAN, 0.0),
            Point::ZERO,
            Size::new(10.0, 10.0),
            0.0
        ));
    }

    #[test]
    fn test_classify_corners_and_edges() {
        let area = Area::new(100.0, 100.0, 50.0, 40.0);
        assert_eq!(classify_border(Point::new(101.0, 99.0), &area, 0.0, 6.0), Some(Border::TopLeft));
        assert_eq!(classify_border(Point::new(150.0, 140.0), &area, 0.0, 6.0), Some(Border::BottomRight));
        assert_eq!(classify_border(Point::new(125.0, 100.0), &area, 0.0, 6.0), Some(Border::Top));
        assert_eq!(classify_border(Point::new(103.0, 120.0), &area, 0.0, 6.0), Some(Border::Left));
        assert_eq!(classify_border(Point::new(125.0, 120.0), &area, 0.0, 6.0), Some(Border::Inside));
        assert_eq!(classify_border(Point::new(200.0, 120.0), &area, 0.0, 6.0), None);
    }

    #[test]
    fn test_classify_corner_wins_over_edge() {
        let area = Area::new(0.0, 0.0, 50.0, 50.0);
        // Within margin of both the top edge and the right edge.
        assert_eq!(classify_border(Point::new(46.0, 4.0), &area, 0.0, 6.0), Some(Border::TopRight));
    }

    #[test]
    fn test_classify_rotated() {
        let area = Area::new(0.0, 0.0, 100.0, 20.0);
        // Rotated a quarter turn around (50, 10): the top edge now faces right.
        let rotated_top = rotate_point(Point::new(50.0, 0.0), area.center(), 90.0);
        assert_eq!(classify_border(rotated_top, &area, 90.0, 6.0), Some(Border::Top));
    }

    #[test]
    fn test_classify_empty_area() {
        assert_eq!(classify_border(Point::ZERO, &Area::ZERO, 0.0, 6.0), None);
    }

    #[test]
    fn test_control_buttons() {
        let area = Area::new(100.0, 100.0, 80.0, 60.0);
        let layout = button_layout(&area, 1000.0);
        assert_eq!(classify_control_button(layout.badge, &area, 0.0, 1000.0), Some(ControlButton::Badge));
        assert_eq!(
            classify_control_button(layout.rotate_left, &area, 0.0, 1000.0),
            Some(ControlButton::RotateLeft)
        );
        assert_eq!(
            classify_control_button(layout.rotate_right, &area, 0.0, 1000.0),
            Some(ControlButton::RotateRight)
        );
        assert_eq!(classify_control_button(area.center(), &area, 0.0, 1000.0), None);
        assert!(area.center().y - layout.rotate_left.y >= ROTATE_BUTTON_MIN_OFFSET);
    }

    #[test]
    fn test_badge_clamped_to_surface() {
        let area = Area::new(150.0, 100.0, 50.0, 50.0);
        let layout = button_layout(&area, 195.0);
        assert!(layout.badge.x + layout.radius <= 195.0 + 1e-9);
    }

    #[test]
    fn test_control_buttons_follow_rotation() {
        let area = Area::new(0.0, 0.0, 80.0, 60.0);
        let layout = button_layout(&area, 0.0);
        let rotated = rotate_point(layout.rotate_right, area.center(), 45.0);
        assert_eq!(classify_control_button(rotated, &area, 45.0, 0.0), Some(ControlButton::RotateRight));
    }

    #[test]
    fn test_half_turn_classification_matches_drawing() {
        let area = Area::new(100.0, 100.0, 100.0, 60.0);
        // The local top-left corner is drawn at the bottom-right after a half turn.
        assert_eq!(classify_border(Point::new(200.0, 160.0), &area, 180.0, 6.0), Some(Border::TopLeft));
        assert_eq!(classify_border(Point::new(100.0, 100.0), &area, 180.0, 6.0), Some(Border::BottomRight));
        let badge = rotate_point(button_layout(&area, 1000.0).badge, area.center(), 180.0);
        assert!(approx(badge.x, 100.0) && approx(badge.y, 174.0));
        assert_eq!(classify_control_button(badge, &area, 180.0, 1000.0), Some(ControlButton::Badge));
    }

    #[test]
    fn test_rotated_resize_keeps_opposite_border() {
        let area = Area::new(100.0, 100.0, 100.0, 60.0);
        for rotation in [45.0, 90.0, 180.0, 300.0] {
            for border in [Border::BottomRight, Border::TopLeft, Border::Right, Border::Top] {
                let anchor = border.opposite();
                let fixed = rotate_point(border_point(&area, anchor), area.center(), rotation);
                let dragged = rotate_point(border_point(&area, border), area.center(), rotation);
                let target = dragged + (dragged - fixed) * 0.25;
                let resized =
                    resize_rotated_rectangle(target, &area, rotation, border, ResizeOptions::default()).unwrap();
                let after = rotate_point(border_point(&resized, anchor), resized.center(), rotation);
                assert!(approx(after.x, fixed.x) && approx(after.y, fixed.y), "{rotation} {border:?}");
                assert!(resized.width >= area.width - 1e-6 && resized.height >= area.height - 1e-6);
            }
        }
    }

    #[test]
    fn test_resize_top_left_scenario() {
        let area = Area::new(100.0, 100.0, 50.0, 50.0);
        let resized = resize_rectangle(Point::new(90.0, 90.0), &area, Border::TopLeft, ResizeOptions::default())
            .unwrap();
        assert!(approx(resized.x, 90.0));
        assert!(approx(resized.y, 90.0));
        assert!(approx(resized.width, 60.0));
        assert!(approx(resized.height, 60.0));
    }

    #[test]
    fn test_resize_never_below_floor() {
        let area = Area::new(100.0, 100.0, 50.0, 50.0);
        for border in [
            Border::TopLeft,
            Border::TopRight,
            Border::BottomLeft,
            Border::BottomRight,
            Border::Top,
            Border::Bottom,
            Border::Left,
            Border::Right,
        ] {
            for target in [Point::new(-500.0, -500.0), Point::new(500.0, 500.0), Point::new(125.0, 125.0)] {
                for lock_ratio in [false, true] {
                    let options = ResizeOptions { lock_ratio, min_size: 25.0 };
                    let resized = resize_rectangle(target, &area, border, options).unwrap();
                    assert!(resized.width >= 25.0 - 1e-9, "{border:?} {target:?}");
                    assert!(resized.height >= 25.0 - 1e-9, "{border:?} {target:?}");
                }
            }
        }
    }

    #[test]
    fn test_resize_crossing_opposite_edge_clamps() {
        let area = Area::new(0.0, 0.0, 100.0, 100.0);
        let resized =
            resize_rectangle(Point::new(300.0, 50.0), &area, Border::Left, ResizeOptions::default()).unwrap();
        assert!(approx(resized.x, 75.0));
        assert!(approx(resized.width, 25.0));
        assert!(approx(resized.height, 100.0));
    }

    #[test]
    fn test_resize_locked_ratio() {
        let area = Area::new(0.0, 0.0, 100.0, 50.0);
        let locked = ResizeOptions { lock_ratio: true, min_size: 25.0 };
        let resized =
            resize_rectangle(Point::new(200.0, 10.0), &area, Border::BottomRight, locked)
                .unwrap();
        assert!(approx(resized.width / resized.height, 2.0));
        assert!(approx(resized.width, 200.0));

        let resized = resize_rectangle(Point::new(50.0, 100.0), &area, Border::Bottom, locked)
            .unwrap();
        assert!(approx(resized.height, 100.0));
        assert!(approx(resized.width, 200.0));
        assert!(approx(resized.center().x, 50.0));
    }

    #[test]
    fn test_resize_inside_is_none() {
        let area = Area::new(0.0, 0.0, 10.0, 10.0);
        assert!(resize_rectangle(Point::ZERO, &area, Border::Inside, ResizeOptions::default()).is_none());
    }

    #[test]
    fn test_cursor_rotates_with_shape() {
        assert_eq!(cursor_for_border(Border::Top, 0.0), CursorHint::NsResize);
        assert_eq!(cursor_for_border(Border::Top, 90.0), CursorHint::EwResize);
        assert_eq!(cursor_for_border(Border::TopLeft, 0.0), CursorHint::NwseResize);
        assert_eq!(cursor_for_border(Border::TopLeft, 90.0), CursorHint::NeswResize);
        assert_eq!(cursor_for_border(Border::Inside, 0.0), CursorHint::Move);
    }

    #[test]
    fn test_rotated_bounds() {
        let area = Area::new(0.0, 0.0, 100.0, 20.0);
        let b = rotated_bounds(&area, 90.0);
        assert!(approx(b.width, 20.0));
        assert!(approx(b.height, 100.0));
        assert!(approx(b.center().x, 50.0));
    }

    #[test]
    fn test_distances() {
        assert!(approx(point_to_segment_dist(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0)), 3.0));
        assert!(approx(perpendicular_distance(Point::new(20.0, 4.0), Point::ZERO, Point::new(10.0, 0.0)), 4.0));
        assert!(approx(distance_sq(Point::ZERO, Point::new(3.0, 4.0)), 25.0));
    }
}
