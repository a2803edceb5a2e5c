//! Snapping helpers for path endpoints.

use crate::geometry::distance_sq;
use kurbo::Point;

/// Default angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Result of a point snap.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Index of the candidate that was snapped to, if any.
    pub target: Option<usize>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self { point, target: None }
    }

    /// Whether the point was pulled onto a target.
    pub fn is_snapped(&self) -> bool {
        self.target.is_some()
    }
}

/// Result of an angle snap operation.
#[derive(Debug, Clone, Copy)]
pub struct AngleSnapResult {
    /// The (possibly) snapped endpoint.
    pub point: Point,
    /// The resulting angle in degrees (0-360).
    pub angle_degrees: f64,
    /// The original angle in degrees (0-360).
    pub original_angle_degrees: f64,
    /// Whether the endpoint moved onto an increment.
    pub snapped: bool,
    /// Distance from start point (preserved).
    pub distance: f64,
}

/// How a line endpoint should be snapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleSnap {
    /// Leave the endpoint alone.
    Off,
    /// Snap only when within `margin` degrees of an increment.
    Within { increment: f64, margin: f64 },
    /// Always snap to the nearest increment (Shift held).
    Always { increment: f64 },
}

/// Snap an angle to the nearest increment, normalized to [0, 360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= 0.0 || !increment.is_finite() {
        return angle_degrees.rem_euclid(360.0);
    }
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

/// Angular distance between two angles in degrees, in [0, 180].
fn angle_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Snap a line endpoint to angle increments around `start`, preserving length.
pub fn snap_line_endpoint(start: Point, end: Point, mode: AngleSnap) -> AngleSnapResult {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < 0.001 || !distance.is_finite() {
        return AngleSnapResult {
            point: end,
            angle_degrees: 0.0,
            original_angle_degrees: 0.0,
            snapped: false,
            distance: 0.0,
        };
    }

    let original = dy.atan2(dx).to_degrees().rem_euclid(360.0);
    let unsnapped = AngleSnapResult {
        point: end,
        angle_degrees: original,
        original_angle_degrees: original,
        snapped: false,
        distance,
    };

    let (increment, margin) = match mode {
        AngleSnap::Off => return unsnapped,
        AngleSnap::Within { increment, margin } => (increment, margin),
        AngleSnap::Always { increment } => (increment, 180.0),
    };

    let snapped_angle = snap_angle(original, increment);
    if angle_delta(snapped_angle, original) > margin {
        return unsnapped;
    }
    let radians = snapped_angle.to_radians();
    AngleSnapResult {
        point: Point::new(start.x + distance * radians.cos(), start.y + distance * radians.sin()),
        angle_degrees: snapped_angle,
        original_angle_degrees: original,
        snapped: true,
        distance,
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Snap a point to the nearest candidate strictly within `margin`.
pub fn snap_to_points(point: Point, candidates: &[Point], margin: f64) -> SnapResult {
    let mut best: Option<usize> = None;
    let mut best_dist_sq = margin * margin;

    for (index, candidate) in candidates.iter().enumerate() {
        let dist_sq = distance_sq(point, *candidate);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = Some(index);
        }
    }

    match best {
        Some(index) => SnapResult { point: candidates[index], target: Some(index) },
        None => SnapResult::none(point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < f64::EPSILON);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < f64::EPSILON);
        assert!((snap_angle(-10.0, 15.0) - 345.0).abs() < f64::EPSILON);
        assert!((snap_angle(358.0, 15.0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_within_margin() {
        let start = Point::new(0.0, 0.0);
        // ~2 degrees off horizontal.
        let end = Point::new(100.0, 3.5);
        let result = snap_line_endpoint(start, end, AngleSnap::Within { increment: 15.0, margin: 4.0 });
        assert!(result.snapped);
        assert!(result.point.y.abs() < 1e-9);
        assert!((result.point.x - result.distance).abs() < 1e-9);
    }

    #[test]
    fn test_no_snap_outside_margin() {
        let start = Point::new(0.0, 0.0);
        // ~7 degrees off horizontal.
        let end = Point::new(100.0, 12.3);
        let result = snap_line_endpoint(start, end, AngleSnap::Within { increment: 15.0, margin: 4.0 });
        assert!(!result.snapped);
        assert_eq!(result.point, end);

        let forced = snap_line_endpoint(start, end, AngleSnap::Always { increment: 15.0 });
        assert!(forced.snapped);
        assert!(forced.point.y.abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_line() {
        let p = Point::new(5.0, 5.0);
        let result = snap_line_endpoint(p, p, AngleSnap::Always { increment: 15.0 });
        assert!(!result.snapped);
        assert_eq!(result.point, p);
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(23.0, 37.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(23.0, 37.0), 0.0), Point::new(23.0, 37.0));
    }

    #[test]
    fn test_snap_to_points_picks_nearest() {
        let candidates = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(12.0, 0.0)];
        let result = snap_to_points(Point::new(11.5, 1.0), &candidates, 5.0);
        assert_eq!(result.target, Some(2));
        assert_eq!(result.point, Point::new(12.0, 0.0));

        let miss = snap_to_points(Point::new(50.0, 50.0), &candidates, 5.0);
        assert!(!miss.is_snapped());
    }
}
