//! Line, curve and arrow paths built segment by segment.

use super::{Gesture, GesturePhase, HandlerContext, InteractionHandler, Step, ToolKind};
use crate::geometry::{CursorHint, distance_sq};
use crate::input::{Key, KeyInput, PointerEvent};
use crate::render;
use crate::shapes::{ArrowStyle, Drawable, DrawableTrait, PathShape, SegmentKind};
use crate::snap::{AngleSnap, snap_line_endpoint, snap_to_points};
use crate::surface::RasterImage;
use kurbo::Point;

/// Bend given to segments drawn with the curve tool.
pub const DEFAULT_CURVATURE: f64 = 0.25;

/// Each release freezes the pending segment and stamps the path onto the
/// main surface over the raster it started from.
#[derive(Debug, Clone)]
pub struct PathHandler {
    kind: SegmentKind,
    /// Main surface before the path was started.
    base: Option<RasterImage>,
}

impl PathHandler {
    /// Handler appending segments of `kind`.
    pub fn new(kind: SegmentKind) -> Self {
        Self { kind, base: None }
    }

    pub fn tool(&self) -> ToolKind {
        match self.kind {
            SegmentKind::Line => ToolKind::Line,
            SegmentKind::Curve => ToolKind::Curve,
            SegmentKind::Arrow => ToolKind::Arrow,
        }
    }

    fn path_mut(gesture: &mut Gesture) -> Option<&mut PathShape> {
        match gesture.drawable.as_mut() {
            Some(Drawable::Path(path)) => Some(path),
            _ => None,
        }
    }

    fn new_path(&self, start: Point, cx: &HandlerContext<'_>) -> PathShape {
        let path = PathShape::new(start, cx.style.clone()).with_hit_cache_ttl(cx.config.hit_cache());
        match self.kind {
            SegmentKind::Line => path,
            SegmentKind::Curve => path.with_curvature(DEFAULT_CURVATURE),
            SegmentKind::Arrow => path.with_arrow_style(ArrowStyle::default()),
        }
    }

    /// Start a new path at `position`, with its first segment pending.
    fn begin(&mut self, gesture: &mut Gesture, position: Point, cx: &mut HandlerContext<'_>) {
        self.base = Some(cx.main.get_image_buffer(None));
        let mut path = self.new_path(position, cx);
        path.push(self.kind, position);
        gesture.drawable = Some(path.into());
        gesture.start = Some(position);
        gesture.phase = GesturePhase::Active;
        gesture.extended_area = true;
        cx.redraw(gesture);
    }

    /// Put the pre-path raster back on main; the path lives on the overlay
    /// while it is edited.
    fn lift(&self, cx: &mut HandlerContext<'_>) {
        cx.main.clear();
        if let Some(base) = &self.base {
            cx.main.put_image_buffer(base, 0, 0);
        }
    }

    /// Main = base + path.
    fn restamp(&self, gesture: &mut Gesture, cx: &mut HandlerContext<'_>) {
        self.lift(cx);
        if let Some(drawable) = gesture.drawable.as_mut() {
            render::stamp(&mut *cx.main, drawable, cx.assets);
        }
    }

    /// Freeze the path (Fixed), stamp it and record a snapshot.
    fn freeze(&self, gesture: &mut Gesture, cx: &mut HandlerContext<'_>) -> bool {
        if gesture.drawable.is_none() {
            return false;
        }
        gesture.phase = GesturePhase::Fixed;
        gesture.saved_area = None;
        self.restamp(gesture, cx);
        let anchor = gesture.drawable.as_ref().and_then(|d| d.anchor());
        cx.push_snapshot(anchor);
        cx.redraw(gesture);
        true
    }

    /// Leave the path as stamped and forget it.
    fn finish(&mut self, gesture: &mut Gesture, cx: &mut HandlerContext<'_>) -> bool {
        let committed = match gesture.phase {
            GesturePhase::Active | GesturePhase::Moving | GesturePhase::EditingPoint(_) => {
                self.drop_degenerate_segment(gesture, cx);
                self.freeze(gesture, cx)
            }
            _ => false,
        };
        self.base = None;
        gesture.clear();
        cx.clear_overlay();
        committed
    }

    /// A click without drag leaves a zero-length segment behind.
    fn drop_degenerate_segment(&self, gesture: &mut Gesture, cx: &HandlerContext<'_>) {
        if gesture.phase != GesturePhase::Active {
            return;
        }
        let min = cx.config.min_point_distance;
        if let Some(path) = Self::path_mut(gesture) {
            let vertices = path.vertices();
            let n = vertices.len();
            if n >= 2 && distance_sq(vertices[n - 2], vertices[n - 1]) < min * min {
                path.remove_last_segment();
            }
        }
    }

    /// Whether `position` would close the path.
    fn closes_at(path: &PathShape, position: Point, margin: f64) -> bool {
        path.len() >= 3
            && !path.is_closed()
            && path.first_point().is_some_and(|first| distance_sq(first, position) <= margin * margin)
    }

    /// Pending endpoint: snapped onto the first point, else to angle increments.
    fn snapped_end(path: &PathShape, event: &PointerEvent, cx: &HandlerContext<'_>) -> Point {
        let position = event.position;
        if let Some(first) = path.first_point().filter(|_| path.len() >= 3) {
            let snap = snap_to_points(position, &[first], cx.config.close_margin);
            if snap.is_snapped() {
                return snap.point;
            }
        }
        let vertices = path.vertices();
        let Some(previous) = vertices.len().checked_sub(2).map(|i| vertices[i]) else {
            return position;
        };
        let increment = cx.config.angle_snap_increment;
        let mode = if event.modifiers.shift {
            AngleSnap::Always { increment }
        } else {
            AngleSnap::Within { increment, margin: cx.config.angle_snap_margin }
        };
        snap_line_endpoint(previous, position, mode).point
    }

    fn fixed_down(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let position = event.position;
        let margin = cx.config.border_margin;
        let close_margin = cx.config.close_margin;
        let Some(path) = Self::path_mut(&mut gesture) else {
            return Step::new(gesture);
        };

        if Self::closes_at(path, position, close_margin) {
            path.close(close_margin);
            self.restamp(&mut gesture, cx);
            let anchor = gesture.drawable.as_ref().and_then(|d| d.anchor());
            cx.push_snapshot(anchor);
            self.base = None;
            gesture.clear();
            cx.clear_overlay();
            log::debug!("Path closed and committed");
            return Step::new(gesture).with_cursor(CursorHint::Crosshair).committed(true);
        }

        if let Some(index) = path.find_point(position, margin, event.time) {
            let vertex = path.vertices()[index];
            gesture.start = Some(vertex);
            gesture.phase = GesturePhase::EditingPoint(index);
            self.lift(cx);
            cx.redraw(&mut gesture);
            return Step::new(gesture).with_cursor(CursorHint::Move);
        }

        if path.hit_test(position, margin) {
            gesture.begin_drag(GesturePhase::Moving, position);
            self.lift(cx);
            cx.redraw(&mut gesture);
            return Step::new(gesture).with_cursor(CursorHint::Move);
        }

        if path.is_closed() {
            let committed = self.finish(&mut gesture, cx);
            self.begin(&mut gesture, position, cx);
            return Step::new(gesture).with_cursor(CursorHint::Crosshair).committed(committed);
        }

        path.push(self.kind, position);
        gesture.phase = GesturePhase::Active;
        self.lift(cx);
        cx.redraw(&mut gesture);
        Step::new(gesture).with_cursor(CursorHint::Crosshair)
    }

    fn fixed_cursor(gesture: &mut Gesture, event: &PointerEvent, cx: &HandlerContext<'_>) -> CursorHint {
        let margin = cx.config.border_margin;
        let Some(path) = Self::path_mut(gesture) else {
            return CursorHint::Crosshair;
        };
        if Self::closes_at(path, event.position, cx.config.close_margin) {
            CursorHint::Pointer
        } else if path.find_point(event.position, margin, event.time).is_some() || path.hit_test(event.position, margin) {
            CursorHint::Move
        } else {
            CursorHint::Crosshair
        }
    }
}

impl InteractionHandler for PathHandler {
    fn end_action(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = self.finish(&mut gesture, cx);
        Step::new(gesture).committed(committed)
    }

    fn pointer_down(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Idle => {
                self.begin(&mut gesture, event.position, cx);
                Step::new(gesture).with_cursor(CursorHint::Crosshair)
            }
            GesturePhase::Fixed => self.fixed_down(gesture, event, cx),
            _ => Step::new(gesture),
        }
    }

    fn pointer_move(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Active => {
                if let Some(path) = Self::path_mut(&mut gesture) {
                    let end = Self::snapped_end(path, event, cx);
                    if path.set_last_end(end) {
                        cx.redraw(&mut gesture);
                    }
                }
                Step::new(gesture).with_cursor(CursorHint::Crosshair)
            }
            GesturePhase::EditingPoint(index) => {
                if Self::path_mut(&mut gesture).is_some_and(|p| p.move_point(index, event.position)) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Moving => {
                if gesture.drag_to(event.position, event) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Fixed => {
                let cursor = Self::fixed_cursor(&mut gesture, event, cx);
                Step::new(gesture).with_cursor(cursor)
            }
            _ => Step::new(gesture).with_cursor(CursorHint::Crosshair),
        }
    }

    fn pointer_up(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Active | GesturePhase::EditingPoint(_) | GesturePhase::Moving => {
                if gesture.phase == GesturePhase::Moving {
                    gesture.throttle.reset();
                    gesture.drag_to(event.position, event);
                }
                self.drop_degenerate_segment(&mut gesture, cx);
                let committed = self.freeze(&mut gesture, cx);
                Step::new(gesture).committed(committed)
            }
            _ => Step::new(gesture),
        }
    }

    /// Document moves keep feeding the path; nothing to do here.
    fn pointer_leave(&mut self, gesture: Gesture, _cx: &mut HandlerContext<'_>) -> Step {
        Step::new(gesture)
    }

    fn key_down(&mut self, mut gesture: Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> Step {
        match (key.key, gesture.phase) {
            (Key::Escape, GesturePhase::Active) => {
                if let Some(path) = Self::path_mut(&mut gesture) {
                    path.remove_last_segment();
                }
                gesture.phase = GesturePhase::Fixed;
                self.restamp(&mut gesture, cx);
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Escape, GesturePhase::EditingPoint(index)) => {
                let original = gesture.start;
                if let (Some(path), Some(to)) = (Self::path_mut(&mut gesture), original) {
                    path.move_point(index, to);
                }
                gesture.phase = GesturePhase::Fixed;
                self.restamp(&mut gesture, cx);
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Escape, GesturePhase::Moving) => {
                gesture.restore_saved_area();
                gesture.phase = GesturePhase::Fixed;
                self.restamp(&mut gesture, cx);
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Enter, _) => {
                let committed = self.finish(&mut gesture, cx);
                Step::new(gesture).committed(committed)
            }
            (Key::Delete | Key::Backspace, GesturePhase::Fixed) => {
                self.lift(cx);
                cx.push_snapshot(None);
                self.base = None;
                gesture.clear();
                cx.clear_overlay();
                Step::new(gesture).committed(true)
            }
            _ => Step::new(gesture),
        }
    }

    /// Cut the path back to the restored anchor, or drop it when the
    /// restored state predates it.
    fn on_undo(&mut self, mut gesture: Gesture, anchor: Option<Point>, cx: &mut HandlerContext<'_>) -> Step {
        let kept = match (Self::path_mut(&mut gesture), anchor) {
            (Some(path), Some(anchor)) => path.truncate_to_anchor(anchor),
            _ => false,
        };
        if kept {
            gesture.phase = GesturePhase::Fixed;
            gesture.saved_area = None;
            cx.redraw(&mut gesture);
        } else {
            self.base = None;
            gesture.clear();
            cx.clear_overlay();
        }
        Step::new(gesture)
    }

    fn validate(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = self.finish(&mut gesture, cx);
        Step::new(gesture).committed(committed)
    }

    fn restyle(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        if let Some(path) = Self::path_mut(&mut gesture) {
            path.set_style(cx.style.clone());
            if gesture.phase == GesturePhase::Fixed {
                self.restamp(&mut gesture, cx);
            }
            cx.redraw(&mut gesture);
        }
        Step::new(gesture)
    }
}
