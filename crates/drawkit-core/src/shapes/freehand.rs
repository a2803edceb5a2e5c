//! Freehand curve.

use super::{DrawableId, DrawableTrait, RasterCache, StyleParams};
use crate::assets::AssetResolver;
use crate::config::{MIN_POINT_DISTANCE, SMOOTHING_MARGIN};
use crate::geometry::{Area, distance_sq, perpendicular_distance, point_to_segment_dist};
use crate::surface::{Surface, trace_path};
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_min_distance() -> f64 {
    MIN_POINT_DISTANCE
}

fn default_smoothing() -> f64 {
    SMOOTHING_MARGIN
}

/// A freehand stroke (series of absolute points).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreehandCurve {
    pub(crate) id: DrawableId,
    points: Vec<Point>,
    area: Area,
    style: StyleParams,
    /// Points closer than this to the previous one are dropped.
    #[serde(default = "default_min_distance")]
    min_distance: f64,
    /// Corners within this distance of their chord are drawn straight.
    #[serde(default = "default_smoothing")]
    smoothing_margin: f64,
    #[serde(skip)]
    cache: RasterCache,
}

impl FreehandCurve {
    /// Start a stroke at `start`.
    pub fn new(start: Point, style: StyleParams) -> Self {
        let half = style.line_width.max(0.0) / 2.0;
        Self {
            id: Uuid::new_v4(),
            points: vec![start],
            area: Area::new(start.x - half, start.y - half, 2.0 * half, 2.0 * half),
            style,
            min_distance: MIN_POINT_DISTANCE,
            smoothing_margin: SMOOTHING_MARGIN,
            cache: RasterCache::default(),
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, style: StyleParams) -> Self {
        let mut curve = Self {
            id: Uuid::new_v4(),
            points,
            area: Area::ZERO,
            style,
            min_distance: MIN_POINT_DISTANCE,
            smoothing_margin: SMOOTHING_MARGIN,
            cache: RasterCache::default(),
        };
        curve.recompute_area();
        curve
    }

    /// Override the point filter distance and the smoothing margin.
    pub fn with_margins(mut self, min_distance: f64, smoothing_margin: f64) -> Self {
        self.min_distance = min_distance;
        self.smoothing_margin = smoothing_margin;
        self
    }

    /// Raw points in drawing order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn half_width(&self) -> f64 {
        self.style.line_width.max(0.0) / 2.0
    }

    /// Append a point unless it is too close to the previous one.
    /// Returns whether the point was kept.
    pub fn add_point(&mut self, point: Point) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        let too_close = self
            .points
            .last()
            .is_some_and(|last| distance_sq(*last, point) < self.min_distance * self.min_distance);
        if too_close {
            return false;
        }
        self.points.push(point);
        let half = self.half_width();
        let dot = Area::new(point.x - half, point.y - half, 2.0 * half, 2.0 * half);
        self.area = if self.points.len() == 1 { dot } else { self.area.union(&dot) };
        self.cache.invalidate();
        true
    }

    /// Drop the most recent point, keeping at least the first one.
    pub fn remove_last_point(&mut self) -> Option<Point> {
        if self.points.len() <= 1 {
            return None;
        }
        let removed = self.points.pop();
        self.recompute_area();
        removed
    }

    fn recompute_area(&mut self) {
        let half = self.half_width();
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            self.area = Area::ZERO;
            return;
        };
        let mut area = Area::new(first.x, first.y, 0.0, 0.0);
        for p in iter {
            area = area.include_point(*p);
        }
        self.area = area.inflate(half, half);
        self.cache.invalidate();
    }

    /// Smoothed outline: quadratic curves through midpoints of consecutive
    /// points, straight where the corner is within the smoothing margin.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(&first) = self.points.first() else {
            return path;
        };
        path.move_to(first);
        if self.points.len() < 3 {
            for p in &self.points[1..] {
                path.line_to(*p);
            }
            return path;
        }
        let mut current = first;
        for pair in self.points[1..].windows(2) {
            let (ctrl, next) = (pair[0], pair[1]);
            let mid = ctrl.midpoint(next);
            if perpendicular_distance(ctrl, current, mid) < self.smoothing_margin {
                path.line_to(mid);
            } else {
                path.quad_to(ctrl, mid);
            }
            current = mid;
        }
        if let Some(&last) = self.points.last() {
            path.line_to(last);
        }
        path
    }
}

impl DrawableTrait for FreehandCurve {
    fn id(&self) -> DrawableId {
        self.id
    }

    fn style(&self) -> &StyleParams {
        &self.style
    }

    fn set_style(&mut self, style: StyleParams) {
        self.style = style;
        self.recompute_area();
    }

    fn area(&self) -> Area {
        self.area
    }

    /// Scale the points so the stroke fills `area`.
    fn set_area(&mut self, area: Area) {
        if !area.is_valid() {
            return;
        }
        let half = self.half_width();
        let old = self.area.inflate(-half, -half);
        let new = area.inflate(-half, -half);
        let sx = if old.width > f64::EPSILON { new.width.max(0.0) / old.width } else { 1.0 };
        let sy = if old.height > f64::EPSILON { new.height.max(0.0) / old.height } else { 1.0 };
        for p in &mut self.points {
            p.x = new.x + (p.x - old.x) * sx;
            p.y = new.y + (p.y - old.y) * sy;
        }
        self.recompute_area();
    }

    fn hit_test(&self, point: Point, margin: f64) -> bool {
        let reach = margin + self.half_width();
        match self.points.as_slice() {
            [] => false,
            [only] => distance_sq(*only, point) <= reach * reach,
            points => points
                .windows(2)
                .any(|w| point_to_segment_dist(point, w[0], w[1]) <= reach),
        }
    }

    fn paint(&self, surface: &mut dyn Surface, _assets: &dyn AssetResolver) {
        let Some(&first) = self.points.first() else { return };
        surface.begin_path();
        if self.points.len() == 1 {
            // A single tap leaves a dot.
            surface.arc(first, self.half_width().max(0.5), 0.0, std::f64::consts::TAU);
            surface.fill(self.style.stroke_color());
            return;
        }
        trace_path(surface, &self.to_path());
        surface.stroke(&self.style.stroke_params());
    }

    fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
        self.area = self.area.translate(delta);
        self.cache.invalidate();
    }

    fn anchor(&self) -> Option<Point> {
        self.points.last().copied()
    }

    fn cache_mut(&mut self) -> &mut RasterCache {
        &mut self.cache
    }
}
