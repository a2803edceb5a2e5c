//! Multi-segment path with optional curves and arrowheads.
//!
//! Segment coordinates are stored relative to the path's area origin, so a
//! translation only moves the area. Any change that affects the extent
//! recomputes the area and rebases the segments onto the new origin.

use super::arrow::{ArrowStyle, arrow_bounds, control_point, head_points, point_in_triangle};
use super::{DrawContext, DrawableId, DrawableTrait, RasterCache, StyleParams};
use crate::assets::AssetResolver;
use crate::geometry::{Area, CORNER_HANDLE_HALF, distance_sq, point_to_segment_dist};
use crate::input::Instant;
use crate::surface::{StrokeParams, Surface, trace_path};
use kurbo::{BezPath, ParamCurve, Point, QuadBez, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Samples per curved segment for hit-testing.
const CURVE_SAMPLES: usize = 16;

fn default_hit_ttl() -> Duration {
    Duration::from_millis(100)
}

/// One element of a path. Coordinates are relative to the area origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    Start { end: Point },
    Line { end: Point },
    Curve { control: Point, end: Point },
    Arrow { control: Point, end: Point, head: ArrowStyle },
}

impl PathSegment {
    /// End point of the segment.
    pub fn end(&self) -> Point {
        match *self {
            PathSegment::Start { end }
            | PathSegment::Line { end }
            | PathSegment::Curve { end, .. }
            | PathSegment::Arrow { end, .. } => end,
        }
    }

    /// Control point of curved and arrow segments.
    pub fn control(&self) -> Option<Point> {
        match *self {
            PathSegment::Curve { control, .. } | PathSegment::Arrow { control, .. } => Some(control),
            _ => None,
        }
    }

    /// Apply `f` to every coordinate of the segment.
    fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        match self {
            PathSegment::Start { end } | PathSegment::Line { end } => *end = f(*end),
            PathSegment::Curve { control, end } | PathSegment::Arrow { control, end, .. } => {
                *control = f(*control);
                *end = f(*end);
            }
        }
    }
}

/// Kind of segment a path tool appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentKind {
    #[default]
    Line,
    Curve,
    Arrow,
}

/// A path or arrow drawable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathShape {
    pub(crate) id: DrawableId,
    segments: Vec<PathSegment>,
    area: Area,
    style: StyleParams,
    #[serde(default)]
    is_closed: bool,
    /// Widest stroke used so far; the area keeps room for it.
    max_line_width: f64,
    /// Bend applied to new curve segments.
    #[serde(default)]
    curvature: f64,
    /// Styling of new arrow segments.
    #[serde(default)]
    arrow: ArrowStyle,
    #[serde(skip)]
    hit_cache: Option<(usize, Instant)>,
    #[serde(skip, default = "default_hit_ttl")]
    hit_cache_ttl: Duration,
    #[serde(skip)]
    cache: RasterCache,
}

impl PathShape {
    /// Start a path at `start` (surface coordinates).
    pub fn new(start: Point, style: StyleParams) -> Self {
        let max_line_width = style.line_width.max(0.0);
        let mut path = Self {
            id: Uuid::new_v4(),
            segments: vec![PathSegment::Start { end: Point::ZERO }],
            area: Area::new(start.x, start.y, 0.0, 0.0),
            style,
            is_closed: false,
            max_line_width,
            curvature: 0.0,
            arrow: ArrowStyle::default(),
            hit_cache: None,
            hit_cache_ttl: default_hit_ttl(),
            cache: RasterCache::default(),
        };
        path.recompute_area();
        path
    }

    /// Bend applied to curve segments pushed from now on.
    pub fn with_curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    /// Head styling of arrow segments pushed from now on.
    pub fn with_arrow_style(mut self, arrow: ArrowStyle) -> Self {
        self.arrow = arrow;
        self
    }

    /// How long [`PathShape::find_point`] remembers a hit.
    pub fn with_hit_cache_ttl(mut self, ttl: Duration) -> Self {
        self.hit_cache_ttl = ttl;
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether the last segment returns to the first vertex.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Number of vertices (one per segment).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn to_abs(&self, rel: Point) -> Point {
        Point::new(self.area.x + rel.x, self.area.y + rel.y)
    }

    fn to_rel(&self, abs: Point) -> Point {
        Point::new(abs.x - self.area.x, abs.y - self.area.y)
    }

    /// Vertex positions in surface coordinates.
    pub fn vertices(&self) -> Vec<Point> {
        self.segments.iter().map(|s| self.to_abs(s.end())).collect()
    }

    /// First vertex in surface coordinates.
    pub fn first_point(&self) -> Option<Point> {
        self.segments.first().map(|s| self.to_abs(s.end()))
    }

    /// The segment at `index` with absolute coordinates.
    fn abs_segment(&self, index: usize) -> Option<PathSegment> {
        let mut seg = *self.segments.get(index)?;
        seg.map_points(|p| self.to_abs(p));
        Some(seg)
    }

    fn build_segment(&self, kind: SegmentKind, start: Point, end: Point) -> PathSegment {
        match kind {
            SegmentKind::Line => PathSegment::Line { end },
            SegmentKind::Curve => PathSegment::Curve { control: control_point(start, end, self.curvature), end },
            SegmentKind::Arrow => PathSegment::Arrow {
                control: control_point(start, end, self.arrow.curvature),
                end,
                head: self.arrow,
            },
        }
    }

    /// Same segment shape with fresh control points for new endpoints (absolute).
    fn rebuild_segment(&self, seg: &PathSegment, start: Point, end: Point) -> PathSegment {
        match seg {
            PathSegment::Start { .. } => PathSegment::Start { end },
            PathSegment::Line { .. } => PathSegment::Line { end },
            PathSegment::Curve { .. } => PathSegment::Curve { control: control_point(start, end, self.curvature), end },
            PathSegment::Arrow { head, .. } => {
                PathSegment::Arrow { control: control_point(start, end, head.curvature), end, head: *head }
            }
        }
    }

    /// Append a segment ending at `end` (surface coordinates).
    pub fn push(&mut self, kind: SegmentKind, end: Point) -> bool {
        if self.is_closed || !end.x.is_finite() || !end.y.is_finite() {
            return false;
        }
        let Some(start) = self.vertices().last().copied() else {
            return false;
        };
        let mut seg = self.build_segment(kind, start, end);
        seg.map_points(|p| self.to_rel(p));
        self.segments.push(seg);
        self.recompute_area();
        true
    }

    /// Move the end of the last segment (live preview while dragging).
    pub fn set_last_end(&mut self, end: Point) -> bool {
        if self.segments.len() < 2 || !end.x.is_finite() || !end.y.is_finite() {
            return false;
        }
        let last = self.segments.len() - 1;
        self.set_vertex(last, end);
        self.recompute_area();
        true
    }

    /// Remove the last segment; the start segment always stays.
    pub fn remove_last_segment(&mut self) -> Option<PathSegment> {
        if self.segments.len() <= 1 {
            return None;
        }
        let removed = self.abs_segment(self.segments.len() - 1);
        self.segments.pop();
        self.is_closed = false;
        self.hit_cache = None;
        self.recompute_area();
        removed
    }

    /// Close the path. When the last point lies within `margin` of the first
    /// it is snapped onto it; otherwise a closing line segment is appended.
    /// Returns true when the last point was snapped.
    pub fn close(&mut self, margin: f64) -> bool {
        if self.is_closed || self.segments.len() < 2 {
            return false;
        }
        let vertices = self.vertices();
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        let snapped = if distance_sq(first, last) <= margin * margin {
            let index = self.segments.len() - 1;
            self.set_vertex(index, first);
            true
        } else {
            let seg = PathSegment::Line { end: self.to_rel(first) };
            self.segments.push(seg);
            false
        };
        self.is_closed = true;
        self.recompute_area();
        snapped
    }

    /// Index of the vertex within `margin` of `point`, nearest first.
    ///
    /// A hit is remembered for a short while so a quick follow-up query keeps
    /// targeting the same vertex even where vertices crowd together.
    pub fn find_point(&mut self, point: Point, margin: f64, now: Instant) -> Option<usize> {
        let vertices = self.vertices();
        let limit = margin * margin;
        if let Some((index, at)) = self.hit_cache {
            let fresh = now.saturating_duration_since(at) <= self.hit_cache_ttl;
            if fresh && vertices.get(index).is_some_and(|v| distance_sq(*v, point) <= limit) {
                return Some(index);
            }
        }
        let found = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (i, distance_sq(*v, point)))
            .filter(|(_, d)| *d <= limit)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        self.hit_cache = found.map(|i| (i, now));
        found
    }

    /// Move vertex `index` to `to` (surface coordinates).
    pub fn move_point(&mut self, index: usize, to: Point) -> bool {
        if index >= self.segments.len() || !to.x.is_finite() || !to.y.is_finite() {
            return false;
        }
        self.set_vertex(index, to);
        if self.is_closed {
            let last = self.segments.len() - 1;
            if index == 0 {
                self.set_vertex(last, to);
            } else if index == last {
                self.set_vertex(0, to);
            }
        }
        self.recompute_area();
        true
    }

    /// Set vertex `index` and refresh the control points of the segments
    /// touching it. Does not recompute the area.
    fn set_vertex(&mut self, index: usize, to: Point) {
        let vertices = self.vertices();
        for i in [index, index + 1] {
            let Some(seg) = self.segments.get(i) else { continue };
            let start = if i == 0 {
                None
            } else if i == index + 1 {
                Some(to)
            } else {
                Some(vertices[i - 1])
            };
            let end = if i == index { to } else { vertices[i] };
            let mut rebuilt = match start {
                Some(start) => self.rebuild_segment(seg, start, end),
                None => PathSegment::Start { end },
            };
            rebuilt.map_points(|p| self.to_rel(p));
            self.segments[i] = rebuilt;
        }
        self.cache.invalidate();
    }

    /// Drop trailing segments until the last vertex is `anchor`.
    /// Returns false (and changes nothing) when no vertex matches.
    pub fn truncate_to_anchor(&mut self, anchor: Point) -> bool {
        let vertices = self.vertices();
        let Some(keep) = vertices.iter().rposition(|v| distance_sq(*v, anchor) < 0.25) else {
            return false;
        };
        if keep + 1 == self.segments.len() {
            return true;
        }
        self.segments.truncate(keep + 1);
        self.is_closed = false;
        self.hit_cache = None;
        self.recompute_area();
        true
    }

    /// Bounds of the stroke only. Paths carry no badge or rotate buttons, so
    /// unlike figures no top margin is reserved; their vertex handles are
    /// painted straight onto the overlay around each vertex.
    fn recompute_area(&mut self) {
        self.max_line_width = self.max_line_width.max(self.style.line_width.max(0.0));
        let half = self.max_line_width / 2.0;
        let mut bounds: Option<Rect> = None;
        let mut include = |r: Rect| {
            bounds = Some(match bounds {
                Some(b) => b.union(r),
                None => r,
            });
        };
        let mut previous: Option<Point> = None;
        for index in 0..self.segments.len() {
            let Some(seg) = self.abs_segment(index) else { continue };
            let end = seg.end();
            include(Rect::from_points(end, end));
            match seg {
                PathSegment::Curve { control, .. } => include(Rect::from_points(control, control)),
                PathSegment::Arrow { control, head, .. } => {
                    let start = previous.unwrap_or(end);
                    include(arrow_bounds(start, control, end, &head));
                }
                _ => {}
            }
            previous = Some(end);
        }
        let Some(bounds) = bounds else { return };
        let new_area = Area::from_rect(bounds).inflate(half, half);
        let shift = Vec2::new(self.area.x - new_area.x, self.area.y - new_area.y);
        for seg in &mut self.segments {
            seg.map_points(|p| p + shift);
        }
        self.area = new_area;
        self.cache.invalidate();
    }

    /// Shaft outline in surface coordinates (arrowheads excluded).
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for index in 0..self.segments.len() {
            let Some(seg) = self.abs_segment(index) else { continue };
            match seg {
                PathSegment::Start { end } => path.move_to(end),
                PathSegment::Line { end } => path.line_to(end),
                PathSegment::Curve { control, end } | PathSegment::Arrow { control, end, .. } => {
                    path.quad_to(control, end)
                }
            }
        }
        if self.is_closed {
            path.close_path();
        }
        path
    }

    /// Arrowhead triangles in surface coordinates.
    pub fn heads(&self) -> Vec<[Point; 3]> {
        let vertices = self.vertices();
        (1..self.segments.len())
            .filter_map(|i| match self.abs_segment(i)? {
                PathSegment::Arrow { control, end, head } => {
                    Some(head_points(vertices[i - 1], control, end, head.head_size))
                }
                _ => None,
            })
            .collect()
    }

    /// Polyline approximation of the shaft, one chain per segment.
    fn polylines(&self) -> Vec<Vec<Point>> {
        let vertices = self.vertices();
        (1..self.segments.len())
            .filter_map(|i| {
                let seg = self.abs_segment(i)?;
                let start = vertices[i - 1];
                Some(match seg.control() {
                    Some(control) => {
                        let quad = QuadBez::new(start, control, seg.end());
                        (0..=CURVE_SAMPLES).map(|k| quad.eval(k as f64 / CURVE_SAMPLES as f64)).collect()
                    }
                    None => vec![start, seg.end()],
                })
            })
            .collect()
    }

    /// True when `point` is on the stroke (within `margin`).
    pub fn hit_stroke(&self, point: Point, margin: f64) -> bool {
        let reach = margin + self.style.line_width.max(0.0) / 2.0;
        if self.segments.len() == 1 {
            return self.first_point().is_some_and(|p| distance_sq(p, point) <= reach * reach);
        }
        self.polylines()
            .iter()
            .any(|line| line.windows(2).any(|w| point_to_segment_dist(point, w[0], w[1]) <= reach))
            || self.heads().into_iter().any(|tri| point_in_triangle(point, tri))
    }
}

impl DrawableTrait for PathShape {
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

    /// Scale all coordinates so the path fills `area`.
    fn set_area(&mut self, area: Area) {
        if !area.is_valid() {
            return;
        }
        let half = self.max_line_width / 2.0;
        let old = self.area.inflate(-half, -half);
        let new = area.inflate(-half, -half);
        let sx = if old.width > f64::EPSILON { new.width.max(0.0) / old.width } else { 1.0 };
        let sy = if old.height > f64::EPSILON { new.height.max(0.0) / old.height } else { 1.0 };
        // Relative coordinates are measured from the area origin, which sits
        // `half` outside the inner box on both axes.
        for seg in &mut self.segments {
            seg.map_points(|p| Point::new(half + (p.x - half) * sx, half + (p.y - half) * sy));
        }
        self.area = Area::new(area.x, area.y, self.area.width, self.area.height);
        self.hit_cache = None;
        self.recompute_area();
    }

    fn hit_test(&self, point: Point, margin: f64) -> bool {
        self.hit_stroke(point, margin)
    }

    fn paint(&self, surface: &mut dyn Surface, _assets: &dyn AssetResolver) {
        if self.segments.len() == 1 {
            if let Some(p) = self.first_point() {
                surface.begin_path();
                surface.arc(p, self.style.line_width.max(1.0) / 2.0, 0.0, std::f64::consts::TAU);
                surface.fill(self.style.stroke_color());
            }
            return;
        }
        let path = self.to_path();
        if let Some(fill) = self.style.fill().filter(|_| self.is_closed) {
            surface.begin_path();
            trace_path(surface, &path);
            surface.fill(fill);
        }
        surface.begin_path();
        trace_path(surface, &path);
        surface.stroke(&self.style.stroke_params());

        for [tip, left, right] in self.heads() {
            surface.begin_path();
            surface.move_to(tip);
            surface.line_to(left);
            surface.line_to(right);
            surface.close_path();
            surface.fill(self.style.stroke_color());
        }
    }

    fn paint_decorations(&self, surface: &mut dyn Surface, _ctx: &DrawContext<'_>) {
        let handle = StrokeParams::solid(super::DECORATION_COLOR, 1.0);
        for v in self.vertices() {
            surface.begin_path();
            surface.rect(Rect::new(
                v.x - CORNER_HANDLE_HALF,
                v.y - CORNER_HANDLE_HALF,
                v.x + CORNER_HANDLE_HALF,
                v.y + CORNER_HANDLE_HALF,
            ));
            surface.stroke(&handle);
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.area = self.area.translate(delta);
        self.hit_cache = None;
        self.cache.invalidate();
    }

    fn anchor(&self) -> Option<Point> {
        self.segments.last().map(|s| self.to_abs(s.end()))
    }

    fn cache_mut(&mut self) -> &mut RasterCache {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_from(points: &[(f64, f64)]) -> PathShape {
        let style = StyleParams { line_width: 4.0, ..StyleParams::default() };
        let mut path = PathShape::new(Point::new(points[0].0, points[0].1), style);
        for &(x, y) in &points[1..] {
            path.push(SegmentKind::Line, Point::new(x, y));
        }
        path
    }

    fn assert_encloses(path: &PathShape) {
        let area = path.area();
        for v in path.vertices() {
            assert!(area.contains_area(&Area::new(v.x - 2.0, v.y - 2.0, 4.0, 4.0)), "{v:?} not in {area:?}");
        }
    }

    #[test]
    fn test_decorations_are_vertex_handles_only() {
        use crate::assets::NoAssets;
        use crate::surface::{DrawCommand, RecordingSurface};

        let path = path_from(&[(20.0, 20.0), (120.0, 30.0), (80.0, 90.0)]);
        let mut surface = RecordingSurface::new(200, 200);
        path.paint_decorations(&mut surface, &DrawContext::decorated(&NoAssets, None, 200.0));
        let commands = surface.commands();
        assert_eq!(commands.len(), path.vertices().len());
        assert!(commands.iter().all(|c| matches!(c, DrawCommand::Stroke { .. })));
    }

    #[test]
    fn test_vertices_survive_rebasing() {
        let path = path_from(&[(50.0, 50.0), (10.0, 80.0), (90.0, 20.0)]);
        assert_eq!(path.vertices(), vec![Point::new(50.0, 50.0), Point::new(10.0, 80.0), Point::new(90.0, 20.0)]);
        let area = path.area();
        assert!((area.x - 8.0).abs() < 1e-9);
        assert!((area.y - 18.0).abs() < 1e-9);
        assert!((area.width - 84.0).abs() < 1e-9);
        assert_encloses(&path);
    }

    #[test]
    fn test_close_within_margin_snaps() {
        let mut path = path_from(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (5.0, 3.0)]);
        assert!(path.close(10.0));
        assert!(path.is_closed());
        assert_eq!(path.len(), 4);
        assert_eq!(path.vertices()[3], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_close_outside_margin_appends() {
        let mut path = path_from(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (50.0, 50.0)]);
        assert!(!path.close(10.0));
        assert!(path.is_closed());
        assert_eq!(path.len(), 5);
        assert_eq!(path.vertices()[4], Point::new(0.0, 0.0));
        assert!(!path.push(SegmentKind::Line, Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_find_point_and_cache() {
        let start = Instant::now();
        let mut path = path_from(&[(0.0, 0.0), (10.0, 0.0), (40.0, 0.0)]);
        assert_eq!(path.find_point(Point::new(9.0, 1.0), 6.0, start), Some(1));
        // (5, 0) is equally close to vertices 0 and 1; the cached hit wins.
        assert_eq!(path.find_point(Point::new(5.0, 0.0), 6.0, start + Duration::from_millis(50)), Some(1));
        assert_eq!(path.find_point(Point::new(2.0, 0.0), 6.0, start + Duration::from_millis(500)), Some(0));
        assert_eq!(path.find_point(Point::new(25.0, 20.0), 6.0, start), None);
    }

    #[test]
    fn test_move_point_recomputes_area() {
        let mut path = path_from(&[(0.0, 0.0), (10.0, 0.0)]);
        assert!(path.move_point(1, Point::new(10.0, 50.0)));
        assert_eq!(path.vertices()[1], Point::new(10.0, 50.0));
        assert_encloses(&path);
        assert!(!path.move_point(7, Point::ZERO));
    }

    #[test]
    fn test_remove_and_set_last_end() {
        let mut path = path_from(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        assert!(path.remove_last_segment().is_some());
        assert_eq!(path.len(), 2);
        assert!(path.set_last_end(Point::new(30.0, 30.0)));
        assert_eq!(path.anchor(), Some(Point::new(30.0, 30.0)));
        assert!(path.remove_last_segment().is_some());
        assert!(path.remove_last_segment().is_none());
    }

    #[test]
    fn test_translate_moves_vertices() {
        let mut path = path_from(&[(0.0, 0.0), (10.0, 10.0)]);
        path.translate(Vec2::new(5.0, 5.0));
        assert_eq!(path.vertices(), vec![Point::new(5.0, 5.0), Point::new(15.0, 15.0)]);
    }

    #[test]
    fn test_resize_scales_coordinates() {
        let mut path = path_from(&[(0.0, 0.0), (10.0, 10.0)]);
        path.set_area(Area::new(-2.0, -2.0, 24.0, 24.0));
        assert_eq!(path.vertices()[1], Point::new(20.0, 20.0));
        assert_encloses(&path);
    }

    #[test]
    fn test_arrow_bounds_cover_head() {
        let style = StyleParams { line_width: 2.0, ..StyleParams::default() };
        let mut path = PathShape::new(Point::new(0.0, 0.0), style)
            .with_arrow_style(ArrowStyle { head_size: 20.0, curvature: 0.0, padding: 0.0 });
        path.push(SegmentKind::Arrow, Point::new(100.0, 0.0));
        let area = path.area();
        assert!(area.y <= -10.0);
        assert!(area.bottom() >= 10.0);
        assert!(path.hit_test(Point::new(95.0, 2.0), 0.0));
    }

    #[test]
    fn test_curve_hit_follows_bend() {
        let style = StyleParams { line_width: 2.0, ..StyleParams::default() };
        let mut path = PathShape::new(Point::new(0.0, 0.0), style).with_curvature(0.5);
        path.push(SegmentKind::Curve, Point::new(100.0, 0.0));
        // The curve peaks at y = 25 (half the control offset of 50).
        assert!(path.hit_test(Point::new(50.0, 25.0), 2.0));
        assert!(!path.hit_test(Point::new(50.0, 0.0), 2.0));
        assert!(path.area().bottom() >= 50.0);
    }

    #[test]
    fn test_truncate_to_anchor() {
        let mut path = path_from(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
        assert!(path.truncate_to_anchor(Point::new(10.0, 0.0)));
        assert_eq!(path.len(), 2);
        assert!(!path.truncate_to_anchor(Point::new(99.0, 99.0)));
        assert_eq!(path.len(), 2);
    }
}
