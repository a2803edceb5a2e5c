//! Squares, circles, rounded rectangles, text boxes and images.

use super::{Gesture, GesturePhase, HandlerContext, InteractionHandler, Step, ToolKind, hover_cursor};
use crate::geometry::{
    Area, Border, ControlButton, CursorHint, ResizeOptions, classify_border, classify_control_button,
    cursor_for_border,
};
use crate::input::{Key, KeyInput, PointerEvent};
use crate::shapes::{Drawable, DrawableTrait, Figure, FigureKind, ImageSource};
use kurbo::{Point, Size};

/// Drag to size, then edit the fixed figure until it is validated.
#[derive(Debug, Clone)]
pub struct ShapeHandler {
    kind: FigureKind,
    /// Image placed by the image tool.
    image: Option<ImageSource>,
}

impl ShapeHandler {
    /// Handler placing figures of `kind`.
    pub fn new(kind: FigureKind) -> Self {
        Self { kind, image: None }
    }

    pub fn tool(&self) -> ToolKind {
        match self.kind {
            FigureKind::Square => ToolKind::Square,
            FigureKind::Circle => ToolKind::Circle,
            FigureKind::RoundedRect => ToolKind::RoundedRect,
            FigureKind::Text => ToolKind::Text,
            FigureKind::Image => ToolKind::Image,
        }
    }

    /// Image placed by the next click. Only image tools accept one.
    pub fn set_image(&mut self, source: ImageSource) -> bool {
        if self.kind != FigureKind::Image {
            return false;
        }
        self.image = Some(source);
        true
    }

    fn figure_mut(gesture: &mut Gesture) -> Option<&mut Figure> {
        match gesture.drawable.as_mut() {
            Some(Drawable::Figure(figure)) => Some(figure),
            _ => None,
        }
    }

    /// Start a figure at `position`. Images are placed at full size right away.
    fn begin(&self, gesture: &mut Gesture, position: Point, cx: &mut HandlerContext<'_>) -> CursorHint {
        if self.kind == FigureKind::Image {
            let Some(source) = self.image.clone() else {
                log::debug!("Image tool used without an image");
                return CursorHint::Default;
            };
            let size = cx.config.default_shape_size;
            let figure = Figure::image(position, Size::new(size, size), source, cx.style.clone());
            gesture.drawable = Some(figure.into());
            gesture.phase = GesturePhase::Fixed;
            cx.redraw(gesture);
            return CursorHint::Move;
        }
        let figure = Figure::new(self.kind, Area::new(position.x, position.y, 0.0, 0.0), cx.style.clone());
        gesture.drawable = Some(figure.into());
        gesture.start = Some(position);
        gesture.phase = GesturePhase::Active;
        cx.redraw(gesture);
        CursorHint::Crosshair
    }

    /// End the sizing drag: a click gets the default size, small drags the
    /// minimum size, text boxes grow to fit their text.
    fn settle(gesture: &mut Gesture, cx: &mut HandlerContext<'_>) {
        let start = gesture.start;
        let min = cx.config.min_shape_size;
        let default_size = cx.config.default_shape_size;
        let Some(figure) = Self::figure_mut(gesture) else { return };
        let area = figure.area();
        let settled = if area.width < min && area.height < min {
            let center = start.unwrap_or_else(|| area.center());
            Area::centered(center, Size::new(default_size, default_size))
        } else {
            Area::new(area.x, area.y, area.width.max(min), area.height.max(min))
        };
        figure.set_area(settled);
        if figure.kind() == FigureKind::Text {
            figure.fit_text(&*cx.overlay);
        }
        gesture.phase = GesturePhase::Fixed;
    }

    fn fixed_down(&self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let position = event.position;
        let Some((area, rotation)) = gesture.drawable.as_ref().map(|d| (d.area(), d.rotation())) else {
            return Step::new(gesture);
        };
        let step_degrees = cx.config.rotation_step_degrees;

        match classify_control_button(position, &area, rotation, cx.max_width()) {
            Some(button @ (ControlButton::RotateLeft | ControlButton::RotateRight)) => {
                let degrees = if button == ControlButton::RotateLeft { -step_degrees } else { step_degrees };
                if let Some(figure) = Self::figure_mut(&mut gesture) {
                    figure.rotate_by(degrees);
                }
                gesture.phase = GesturePhase::Rotating;
                cx.redraw(&mut gesture);
                return Step::new(gesture).with_cursor(CursorHint::Pointer);
            }
            Some(ControlButton::Badge) => {
                let committed = cx.commit(&mut gesture);
                return Step::new(gesture).with_cursor(CursorHint::Crosshair).committed(committed);
            }
            None => {}
        }

        match classify_border(position, &area, rotation, cx.config.border_margin) {
            Some(Border::Inside) => {
                gesture.begin_drag(GesturePhase::Moving, position);
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            Some(border) => {
                gesture.begin_drag(GesturePhase::Resizing(border), position);
                gesture.hovered = Some(border);
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(cursor_for_border(border, rotation))
            }
            None => {
                let committed = cx.commit(&mut gesture);
                let cursor = self.begin(&mut gesture, position, cx);
                Step::new(gesture).with_cursor(cursor).committed(committed)
            }
        }
    }

    /// Cursor and hovered border over a fixed figure.
    fn hover(gesture: &mut Gesture, position: Point, cx: &mut HandlerContext<'_>) -> CursorHint {
        let Some((area, rotation)) = gesture.drawable.as_ref().map(|d| (d.area(), d.rotation())) else {
            return CursorHint::Crosshair;
        };
        let button = classify_control_button(position, &area, rotation, cx.max_width());
        let border = if button.is_some() {
            None
        } else {
            classify_border(position, &area, rotation, cx.config.border_margin)
        };
        let hovered = border.filter(|b| *b != Border::Inside);
        if hovered != gesture.hovered {
            gesture.hovered = hovered;
            cx.redraw(gesture);
        }
        match button {
            Some(_) => CursorHint::Pointer,
            None => hover_cursor(border, rotation),
        }
    }

    /// Apply text editing keys to a fixed text figure.
    fn edit_text(gesture: &mut Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> bool {
        let Some(figure) = Self::figure_mut(gesture).filter(|f| f.kind() == FigureKind::Text) else {
            return false;
        };
        match key.key {
            Key::Char(c) if !key.modifiers.command() => figure.push_char(c),
            Key::Enter if key.modifiers.shift => figure.push_char('\n'),
            Key::Backspace => {
                figure.pop_char();
            }
            _ => return false,
        }
        figure.fit_text(&*cx.overlay);
        cx.redraw(gesture);
        true
    }
}

impl InteractionHandler for ShapeHandler {
    fn end_action(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Active {
            Self::settle(&mut gesture, cx);
        }
        let committed = cx.commit(&mut gesture);
        Step::new(gesture).committed(committed)
    }

    fn pointer_down(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Idle => {
                let cursor = self.begin(&mut gesture, event.position, cx);
                Step::new(gesture).with_cursor(cursor)
            }
            GesturePhase::Fixed => self.fixed_down(gesture, event, cx),
            _ => Step::new(gesture),
        }
    }

    fn pointer_move(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        let position = event.position;
        match gesture.phase {
            GesturePhase::Active => {
                let Some(start) = gesture.start else {
                    return Step::new(gesture);
                };
                let mut end = position;
                if event.modifiers.shift {
                    let side = (position.x - start.x).abs().max((position.y - start.y).abs());
                    end = Point::new(
                        start.x + side.copysign(position.x - start.x),
                        start.y + side.copysign(position.y - start.y),
                    );
                }
                if let Some(figure) = Self::figure_mut(&mut gesture) {
                    figure.set_area(Area::from_points(start, end));
                }
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(CursorHint::Crosshair)
            }
            GesturePhase::Resizing(border) => {
                let options = ResizeOptions { lock_ratio: event.modifiers.shift, min_size: cx.config.min_shape_size };
                let rotation = gesture.drawable.as_ref().map(|d| d.rotation()).unwrap_or(0.0);
                if gesture.drawable.as_mut().is_some_and(|d| d.resize_from_border(position, border, options)) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(cursor_for_border(border, rotation))
            }
            GesturePhase::Moving => {
                if gesture.drag_to(position, event) {
                    cx.redraw(&mut gesture);
                }
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Fixed => {
                let cursor = Self::hover(&mut gesture, position, cx);
                Step::new(gesture).with_cursor(cursor)
            }
            GesturePhase::Rotating => Step::new(gesture).with_cursor(CursorHint::Pointer),
            _ => Step::new(gesture).with_cursor(CursorHint::Crosshair),
        }
    }

    fn pointer_up(&mut self, mut gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Active => {
                Self::settle(&mut gesture, cx);
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Moving => {
                gesture.throttle.reset();
                gesture.drag_to(event.position, event);
                gesture.phase = GesturePhase::Fixed;
                gesture.saved_area = None;
                cx.redraw(&mut gesture);
                Step::new(gesture).with_cursor(CursorHint::Move)
            }
            GesturePhase::Resizing(_) | GesturePhase::Rotating => {
                gesture.phase = GesturePhase::Fixed;
                gesture.saved_area = None;
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            _ => Step::new(gesture),
        }
    }

    /// An unfinished figure is dropped; a fixed one stays visible.
    fn pointer_leave(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        match gesture.phase {
            GesturePhase::Active => {
                gesture.clear();
                cx.clear_overlay();
            }
            GesturePhase::Resizing(_) | GesturePhase::Moving | GesturePhase::Rotating => {
                gesture.phase = GesturePhase::Fixed;
                gesture.saved_area = None;
                gesture.hovered = None;
                cx.redraw(&mut gesture);
            }
            _ => {
                if gesture.hovered.take().is_some() {
                    cx.redraw(&mut gesture);
                }
            }
        }
        Step::new(gesture).with_cursor(CursorHint::Default)
    }

    fn key_down(&mut self, mut gesture: Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Fixed && Self::edit_text(&mut gesture, key, cx) {
            return Step::new(gesture);
        }
        match (key.key, gesture.phase) {
            (Key::Escape, GesturePhase::Active) => {
                Self::settle(&mut gesture, cx);
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Escape, GesturePhase::Resizing(_) | GesturePhase::Moving) => {
                gesture.restore_saved_area();
                gesture.phase = GesturePhase::Fixed;
                cx.redraw(&mut gesture);
                Step::new(gesture)
            }
            (Key::Enter, _) => {
                if gesture.phase == GesturePhase::Active {
                    Self::settle(&mut gesture, cx);
                }
                let committed = cx.commit(&mut gesture);
                Step::new(gesture).committed(committed)
            }
            (Key::Delete | Key::Backspace, GesturePhase::Fixed) => {
                gesture.clear();
                cx.clear_overlay();
                Step::new(gesture)
            }
            _ => Step::new(gesture),
        }
    }

    /// Main was restored underneath; an uncommitted figure stays editable.
    fn on_undo(&mut self, mut gesture: Gesture, _anchor: Option<Point>, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Active {
            Self::settle(&mut gesture, cx);
        }
        cx.redraw(&mut gesture);
        Step::new(gesture)
    }

    fn validate(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        if gesture.phase == GesturePhase::Active {
            Self::settle(&mut gesture, cx);
        }
        let committed = cx.commit(&mut gesture);
        Step::new(gesture).committed(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::button_layout;
    use crate::input::Modifiers;
    use crate::tools::testing::Bench;

    fn draw_box(bench: &mut Bench, handler: &mut ShapeHandler, to: f64) {
        let down = bench.event(100.0, 100.0, 0);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        let mv = bench.event(to, to, 10);
        bench.run(|g, cx| handler.pointer_move(g, &mv, cx));
        let up = bench.event(to, to, 20);
        bench.run(|g, cx| handler.pointer_up(g, &up, cx));
    }

    fn draw_square(bench: &mut Bench, handler: &mut ShapeHandler) {
        draw_box(bench, handler, 150.0);
    }

    fn area(bench: &Bench) -> Area {
        bench.gesture().drawable.as_ref().map(|d| d.area()).unwrap_or(Area::ZERO)
    }

    #[test]
    fn test_drag_creates_fixed_figure() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Square);
        draw_square(&mut bench, &mut handler);
        assert_eq!(bench.gesture().phase, GesturePhase::Fixed);
        assert_eq!(area(&bench), Area::new(100.0, 100.0, 50.0, 50.0));
        // Shape modes only record history on validation.
        assert!(bench.history.is_empty());
    }

    #[test]
    fn test_click_gives_default_size() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Circle);
        let down = bench.event(100.0, 100.0, 0);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        bench.run(|g, cx| handler.pointer_up(g, &down, cx));
        assert_eq!(area(&bench), Area::new(50.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn test_resize_top_left() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Square);
        draw_square(&mut bench, &mut handler);
        let down = bench.event(100.0, 100.0, 100);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        assert!(matches!(bench.gesture().phase, GesturePhase::Resizing(Border::TopLeft)));
        let mv = bench.event(90.0, 90.0, 110);
        bench.run(|g, cx| handler.pointer_move(g, &mv, cx));
        let up = bench.event(90.0, 90.0, 120);
        bench.run(|g, cx| handler.pointer_up(g, &up, cx));
        assert_eq!(area(&bench), Area::new(90.0, 90.0, 60.0, 60.0));
        assert_eq!(bench.gesture().phase, GesturePhase::Fixed);
    }

    #[test]
    fn test_move_is_throttled_and_escape_restores() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Square);
        draw_square(&mut bench, &mut handler);
        let down = bench.event(125.0, 125.0, 100);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        assert_eq!(bench.gesture().phase, GesturePhase::Moving);
        let mv = bench.event(135.0, 125.0, 130);
        bench.run(|g, cx| handler.pointer_move(g, &mv, cx));
        assert!((area(&bench).x - 110.0).abs() < 1e-9);
        // Within the throttle interval: ignored.
        let mv = bench.event(145.0, 125.0, 140);
        bench.run(|g, cx| handler.pointer_move(g, &mv, cx));
        assert!((area(&bench).x - 110.0).abs() < 1e-9);
        let esc = bench.key(Key::Escape, 150);
        bench.run(|g, cx| handler.key_down(g, &esc, cx));
        assert_eq!(area(&bench), Area::new(100.0, 100.0, 50.0, 50.0));
    }

    #[test]
    fn test_rotate_buttons_and_badge() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Square);
        draw_box(&mut bench, &mut handler, 200.0);
        let layout = button_layout(&area(&bench), 300.0);

        let down = bench.event(layout.rotate_right.x, layout.rotate_right.y, 100);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        bench.run(|g, cx| handler.pointer_up(g, &down, cx));
        let rotation = bench.gesture().drawable.as_ref().map(|d| d.rotation());
        assert_eq!(rotation, Some(11.25));
        assert_eq!(bench.gesture().phase, GesturePhase::Fixed);

        let layout = button_layout(&area(&bench), 300.0);
        let badge = kurbo::Affine::rotate_about(11.25_f64.to_radians(), area(&bench).center()) * layout.badge;
        let down = bench.event(badge.x, badge.y, 200);
        let step = bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        assert!(step.committed);
        assert!(bench.gesture().is_idle());
        assert_eq!(bench.history.len(), 1);
        assert!(!bench.main.pixels().is_blank());
    }

    #[test]
    fn test_text_typing_grows_box() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Text);
        let down = bench.event(50.0, 50.0, 0);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        bench.run(|g, cx| handler.pointer_up(g, &down, cx));
        let width = area(&bench).width;
        for (i, c) in "a fairly long caption".chars().enumerate() {
            let key = bench.key(Key::Char(c), 10 + i as u64);
            bench.run(|g, cx| handler.key_down(g, &key, cx));
        }
        assert!(area(&bench).width > width);
        let text = bench.gesture().drawable.as_ref().and_then(|d| d.as_figure()).map(|f| f.text().to_string());
        assert_eq!(text.as_deref(), Some("a fairly long caption"));

        let enter = bench.key(Key::Enter, 100).with_modifiers(Modifiers::NONE);
        let step = bench.run(|g, cx| handler.key_down(g, &enter, cx));
        assert!(step.committed);
    }

    #[test]
    fn test_leave_drops_unfinished_figure() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::RoundedRect);
        let down = bench.event(100.0, 100.0, 0);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        bench.run(|g, cx| handler.pointer_leave(g, cx));
        assert!(bench.gesture().is_idle());

        draw_square(&mut bench, &mut handler);
        bench.run(|g, cx| handler.pointer_leave(g, cx));
        assert_eq!(bench.gesture().phase, GesturePhase::Fixed);
        assert!(!bench.overlay.pixels().is_blank());
    }

    #[test]
    fn test_image_tool_needs_source() {
        let mut bench = Bench::new();
        let mut handler = ShapeHandler::new(FigureKind::Image);
        let down = bench.event(100.0, 100.0, 0);
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        assert!(bench.gesture().is_idle());

        assert!(handler.set_image(ImageSource::Asset("logo".into())));
        bench.run(|g, cx| handler.pointer_down(g, &down, cx));
        assert_eq!(bench.gesture().phase, GesturePhase::Fixed);
        assert_eq!(area(&bench).center(), Point::new(100.0, 100.0));
    }
}
