//! Freehand drawing.

use super::{Gesture, GesturePhase, HandlerContext, InteractionHandler, Step};
use crate::geometry::CursorHint;
use crate::input::{Key, KeyInput, PointerEvent};
use crate::shapes::{Drawable, FreehandCurve};
use kurbo::Point;

/// Strokes are previewed on the overlay and stamped into main on release.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreehandHandler;

impl FreehandHandler {
    fn curve_mut(gesture: &mut Gesture) -> Option<&mut FreehandCurve> {
        match gesture.drawable.as_mut() {
            Some(Drawable::Freehand(curve)) => Some(curve),
            _ => None,
        }
    }

    /// Commit the stroke in progress, if any.
    fn finish(&self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = gesture.phase == GesturePhase::Active && cx.commit(&mut gesture);
        if !committed {
            gesture.clear();
            cx.clear_overlay();
        }
        Step::new(gesture).committed(committed)
    }
}

impl InteractionHandler for FreehandHandler {
    fn end_action(&mut self, gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        self.finish(gesture, cx)
    }

    fn pointer_down(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        // A release missed outside the window still ends the previous stroke.
        let committed = gesture.phase == GesturePhase::Active && cx.commit(&mut gesture);
        let curve = FreehandCurve::new(event.position, cx.style.clone())
            .with_margins(cx.config.min_point_distance, cx.config.smoothing_margin);
        gesture.drawable = Some(curve.into());
        gesture.start = Some(event.position);
        gesture.phase = GesturePhase::Active;
        cx.redraw_plain(&mut gesture);
        Step::new(gesture).with_cursor(CursorHint::Crosshair).committed(committed)
    }

    fn pointer_move(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Active {
            let added = Self::curve_mut(&mut gesture).is_some_and(|curve| curve.add_point(event.position));
            if added {
                cx.redraw_plain(&mut gesture);
            }
        }
        Step::new(gesture).with_cursor(CursorHint::Crosshair)
    }

    fn pointer_up(&mut self, gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let mut gesture = gesture;
        if let Some(curve) = Self::curve_mut(&mut gesture) {
            curve.add_point(event.position);
        }
        self.finish(gesture, cx).with_cursor(CursorHint::Crosshair)
    }

    /// Leaving the canvas ends the stroke drawn so far.
    fn pointer_leave(&mut self, gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        self.finish(gesture, cx)
    }

    fn key_down(&mut self, mut gesture: Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> Step {
        match key.key {
            Key::Escape if gesture.phase == GesturePhase::Active => {
                if Self::curve_mut(&mut gesture).is_some_and(|c| c.remove_last_point().is_some()) {
                    cx.redraw_plain(&mut gesture);
                }
                Step::new(gesture)
            }
            Key::Enter => self.finish(gesture, cx),
            _ => Step::new(gesture),
        }
    }

    fn on_undo(&mut self, mut gesture: Gesture, _anchor: Option<Point>, cx: &mut HandlerContext<'_>) -> Step {
        gesture.clear();
        cx.clear_overlay();
        Step::new(gesture)
    }
}
