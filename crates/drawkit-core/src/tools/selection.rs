//! Rectangular pixel selection with a clipboard.

use super::{Gesture, GesturePhase, HandlerContext, InteractionHandler, Step, hover_cursor};
use crate::geometry::{Area, Border, CursorHint, ResizeOptions, classify_border, cursor_for_border};
use crate::input::{Key, KeyInput, PointerEvent};
use crate::shapes::{Drawable, DrawableTrait, SelectionArea};
use crate::surface::{PixelRect, RasterImage};
use kurbo::Point;

/// Smallest selection kept after a drag.
const MIN_SELECTION: f64 = 1.0;

/// Operations on the current selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionAction {
    Copy,
    Cut,
    Paste,
    Delete,
    /// Round the corners of the selected pixels.
    CornerRadius(f64),
    /// Make near-white pixels transparent.
    TransparencyThreshold(u8),
}

/// Pixels edited through the selection float in its buffer until committed.
#[derive(Debug, Clone, Default)]
pub struct SelectionHandler {
    clipboard: Option<RasterImage>,
}

impl SelectionHandler {
    /// Pixels last copied or cut.
    pub fn clipboard(&self) -> Option<&RasterImage> {
        self.clipboard.as_ref()
    }

    fn selection_mut(gesture: &mut Gesture) -> Option<&mut SelectionArea> {
        match gesture.drawable.as_mut() {
            Some(Drawable::Selection(selection)) => Some(selection),
            _ => None,
        }
    }

    fn selection(gesture: &Gesture) -> Option<&SelectionArea> {
        gesture.drawable.as_ref().and_then(|d| d.as_selection())
    }

    fn region(selection: &SelectionArea) -> Option<PixelRect> {
        PixelRect::covering(selection.area().to_rect()).filter(|r| r.width > 0 && r.height > 0)
    }

    fn begin(gesture: &mut Gesture, position: Point, cx: &mut HandlerContext<'_>) {
        let selection = SelectionArea::new(Area::new(position.x, position.y, 0.0, 0.0), cx.style.clone());
        gesture.drawable = Some(selection.into());
        gesture.start = Some(position);
        gesture.phase = GesturePhase::Active;
        cx.redraw(gesture);
    }

    /// Stamp floating pixels back into main and drop the selection.
    fn finish(gesture: &mut Gesture, cx: &mut HandlerContext<'_>) -> bool {
        let floating = Self::selection(gesture).is_some_and(|s| s.has_buffer());
        let committed = if floating { cx.commit(gesture) } else { false };
        gesture.clear();
        cx.clear_overlay();
        committed
    }

    /// Move the pixels under the selection from main into its buffer.
    fn lift(gesture: &mut Gesture, cx: &mut HandlerContext<'_>) -> bool {
        let Some(selection) = Self::selection_mut(gesture) else {
            return false;
        };
        if selection.has_buffer() {
            return true;
        }
        let Some(region) = Self::region(selection) else {
            return false;
        };
        let rect = kurbo::Rect::new(
            region.x as f64,
            region.y as f64,
            region.x as f64 + region.width as f64,
            region.y as f64 + region.height as f64,
        );
        let pixels = cx.main.get_image_buffer(Some(region));
        cx.main.clear_rect(rect);
        selection.set_area(Area::from_rect(rect));
        selection.set_buffer(Some(pixels));
        true
    }

    /// Copy the selected pixels (floating or on main) to the clipboard.
    fn copy(&mut self, gesture: &Gesture, cx: &HandlerContext<'_>) -> bool {
        let Some(selection) = Self::selection(gesture) else {
            return false;
        };
        let pixels = match selection.buffer() {
            Some(buffer) => Some(buffer.clone()),
            None => Self::region(selection).map(|region| cx.main.get_image_buffer(Some(region))),
        };
        match pixels {
            Some(pixels) => {
                log::debug!("Copied {}x{} selection", pixels.width(), pixels.height());
                self.clipboard = Some(pixels);
                true
            }
            None => false,
        }
    }

    /// Remove the selected pixels and record the result.
    fn erase(gesture: &mut Gesture, cx: &mut HandlerContext<'_>) -> bool {
        let Some(selection) = Self::selection_mut(gesture) else {
            return false;
        };
        if selection.take_buffer().is_none() {
            cx.main.clear_rect(selection.area().to_rect());
        }
        let anchor = selection.anchor();
        cx.push_snapshot(anchor);
        true
    }

    /// Run `action` on the current selection.
    pub fn apply(&mut self, mut gesture: Gesture, action: SelectionAction, cx: &mut HandlerContext<'_>) -> Step {
        let mut committed = false;
        match action {
            SelectionAction::Copy => {
                self.copy(&gesture, cx);
            }
            SelectionAction::Cut => {
                if self.copy(&gesture, cx) {
                    committed = Self::erase(&mut gesture, cx);
                    cx.redraw(&mut gesture);
                }
            }
            SelectionAction::Delete => {
                committed = Self::erase(&mut gesture, cx);
                gesture.clear();
                cx.clear_overlay();
            }
            SelectionAction::Paste => {
                let Some(pixels) = self.clipboard.clone() else {
                    return Step::new(gesture);
                };
                let origin = Self::selection(&gesture).map(|s| s.area().origin()).unwrap_or(Point::ZERO);
                committed = Self::finish(&mut gesture, cx);
                let area = Area::new(origin.x, origin.y, pixels.width() as f64, pixels.height() as f64);
                let mut selection = SelectionArea::new(area, cx.style.clone());
                selection.set_buffer(Some(pixels));
                gesture.drawable = Some(selection.into());
                gesture.phase = GesturePhase::Fixed;
                cx.redraw(&mut gesture);
            }
            SelectionAction::CornerRadius(radius) => {
                if Self::lift(&mut gesture, cx) {
                    if let Some(selection) = Self::selection_mut(&mut gesture) {
                        selection.edit_buffer(|b| b.apply_corner_radius(radius));
                    }
                    cx.redraw(&mut gesture);
                }
            }
            SelectionAction::TransparencyThreshold(threshold) => {
                if Self::lift(&mut gesture, cx) {
                    if let Some(selection) = Self::selection_mut(&mut gesture) {
                        selection.edit_buffer(|b| b.apply_transparency_threshold(threshold));
                    }
                    cx.redraw(&mut gesture);
                }
            }
        }
        Step::new(gesture).committed(committed)
    }
}

impl InteractionHandler for SelectionHandler {
    fn end_action(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = Self::finish(&mut gesture, cx);
        Step::new(gesture).committed(committed)
    }

    fn pointer_down(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let position = event.position;
        match gesture.phase {
            GesturePhase::Idle => {
                Self::begin(&mut gesture, position, cx);
                Step::new(gesture).with_cursor(CursorHint::Crosshair)
            }
            GesturePhase::Fixed => {
                let area = gesture.drawable.as_ref().map(|d| d.area()).unwrap_or(Area::ZERO);
                match classify_border(position, &area, 0.0, cx.config.border_margin) {
                    Some(Border::Inside) => {
                        gesture.begin_drag(GesturePhase::Moving, position);
                        Step::new(gesture).with_cursor(CursorHint::Move)
                    }
                    Some(border) => {
                        gesture.begin_drag(GesturePhase::Resizing(border), position);
                        Step::new(gesture).with_cursor(cursor_for_border(border, 0.0))
                    }
                    None => {
                        let committed = Self::finish(&mut gesture, cx);
                        Self::begin(&mut gesture, position, cx);
                        Step::new(gesture).with_cursor(CursorHint::Crosshair).committed(committed)
                    }
                }
            }
            _ => Step::new(gesture),
        }
    }

    fn pointer_move(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let position = event.position;
        match gesture.phase {
            GesturePhase::Active => {
                let start = gesture.start.unwrap_or(position);
                if let Some(selection) = Self::selection_mut(&mut gesture) {
                    selection.set_area(Area::from_points(start, position));
                }
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(CursorHint::Crosshair)
            }
            GesturePhase::Resizing(border) => {
                let options = ResizeOptions { lock_ratio: event.modifiers.shift, min_size: MIN_SELECTION };
                if gesture.drawable.as_mut().is_some_and(|d| d.resize_from_border(position, border, options)) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(cursor_for_border(border, 0.0))
            }
            GesturePhase::Moving => {
                if gesture.drag_to(position, event) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Fixed => {
                let area = gesture.drawable.as_ref().map(|d| d.area()).unwrap_or(Area::ZERO);
                let border = classify_border(position, &area, 0.0, cx.config.border_margin);
                Step::new(gesture).with_cursor(hover_cursor(border, 0.0))
            }
            _ => Step::new(gesture).with_cursor(CursorHint::Crosshair),
        }
    }

    fn pointer_up(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Active => {
                let area = gesture.drawable.as_ref().map(|d| d.area()).unwrap_or(Area::ZERO);
                if area.width < MIN_SELECTION || area.height < MIN_SELECTION {
                    gesture.clear();
                    cx.clear_overlay();
                    return Step::new(gesture);
                }
                gesture.phase = GesturePhase::Fixed;
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Moving => {
                gesture.throttle.reset();
                if gesture.drag_to(event.position, event) {
                    cx.redraw(&mut gesture);
                }
                gesture.phase = GesturePhase::Fixed;
                gesture.saved_area = None;
                Step::new(gesture)
            }
            GesturePhase::Resizing(_) => {
                gesture.phase = GesturePhase::Fixed;
                gesture.saved_area = None;
                Step::new(gesture)
            }
            _ => Step::new(gesture),
        }
    }

    fn pointer_leave(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Active {
            gesture.clear();
            cx.clear_overlay();
        }
        Step::new(gesture).with_cursor(CursorHint::Default)
    }

    fn key_down(&mut self, mut gesture: Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> Step {
        for (c, action) in [('c', SelectionAction::Copy), ('x', SelectionAction::Cut), ('v', SelectionAction::Paste)] {
            if key.is_shortcut(c) {
                return self.apply(gesture, action, cx);
            }
        }
        match (key.key, gesture.phase) {
            (Key::Delete | Key::Backspace, GesturePhase::Fixed) => self.apply(gesture, SelectionAction::Delete, cx),
            (Key::Escape, GesturePhase::Active) => {
                gesture.clear();
                cx.clear_overlay();
                Step::new(gesture)
            }
            (Key::Escape, GesturePhase::Moving | GesturePhase::Resizing(_)) => {
                gesture.restore_saved_area();
                gesture.phase = GesturePhase::Fixed;
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Enter, _) => {
                let committed = Self::finish(&mut gesture, cx);
                Step::new(gesture).committed(committed)
            }
            _ => Step::new(gesture),
        }
    }

    /// Floating pixels belong to the state that was just undone.
    fn on_undo(&mut self, mut gesture: Gesture, _anchor: Option<Point>, cx: &mut HandlerContext<'_>) -> Step {
        gesture.clear();
        cx.clear_overlay();
        Step::new(gesture)
    }

    fn validate(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = Self::finish(&mut gesture, cx);
        Step::new(gesture).committed(committed)
    }
}
