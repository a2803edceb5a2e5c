//! Canvas engine: routes input to the active handler.

use crate::assets::AssetResolver;
use crate::config::EngineConfig;
use crate::geometry::CursorHint;
use crate::history::History;
use crate::input::{Instant, KeyInput, MouseButton, PointerEvent};
use crate::render;
use crate::shapes::{Drawable, ImageSource, StyleParams};
use crate::surface::{RasterFormat, Surface, SurfaceError};
use crate::tools::{Gesture, Handler, HandlerContext, SelectionAction, Step, ToolKind};
use std::sync::Arc;

/// A drawing canvas: a main surface holding committed pixels, an overlay
/// for the drawable being edited, and the handler of the current tool.
pub struct Canvas {
    main: Box<dyn Surface>,
    overlay: Box<dyn Surface>,
    history: History,
    assets: Arc<dyn AssetResolver>,
    config: EngineConfig,
    style: StyleParams,
    handler: Handler,
    gesture: Gesture,
    cursor: CursorHint,
}

impl Canvas {
    /// A canvas whose history is sized and debounced from `config`.
    pub fn with_config(
        main: Box<dyn Surface>,
        overlay: Box<dyn Surface>,
        assets: Arc<dyn AssetResolver>,
        config: EngineConfig,
    ) -> Self {
        let history = History::with_debounce(config.history_capacity, config.undo_debounce());
        Self::new(main, overlay, history, assets, config)
    }

    /// A canvas recording into an existing `history`.
    pub fn new(
        main: Box<dyn Surface>,
        overlay: Box<dyn Surface>,
        history: History,
        assets: Arc<dyn AssetResolver>,
        config: EngineConfig,
    ) -> Self {
        let gesture = Gesture::new(config.drag_throttle());
        let mut canvas = Self {
            main,
            overlay,
            history,
            assets,
            config,
            style: StyleParams::default(),
            handler: Handler::for_tool(ToolKind::default()),
            gesture,
            cursor: CursorHint::Default,
        };
        canvas.run(|h, g, cx| h.as_handler_mut().start_action(g, cx));
        canvas
    }

    /// Hand the gesture to the handler and keep what comes back.
    fn run(&mut self, f: impl FnOnce(&mut Handler, Gesture, &mut HandlerContext<'_>) -> Step) -> bool {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::new(self.config.drag_throttle()));
        let mut cx = HandlerContext {
            main: self.main.as_mut(),
            overlay: self.overlay.as_mut(),
            history: &mut self.history,
            assets: self.assets.as_ref(),
            config: &self.config,
            style: &self.style,
        };
        let Step { gesture, cursor, committed } = f(&mut self.handler, gesture, &mut cx);
        self.gesture = gesture;
        if let Some(cursor) = cursor {
            self.cursor = cursor;
        }
        committed
    }

    /// Tool whose handler receives input.
    pub fn tool(&self) -> ToolKind {
        self.handler.tool()
    }

    /// Switch tools. The current drawable is finished first.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if tool == self.tool() {
            return false;
        }
        let committed = self.run(|h, g, cx| h.as_handler_mut().end_action(g, cx));
        log::debug!("Tool {:?} -> {:?}", self.tool(), tool);
        self.handler = Handler::for_tool(tool);
        self.run(|h, g, cx| h.as_handler_mut().start_action(g, cx));
        committed
    }

    /// Left-button press. Returns true when the step changed history.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> bool {
        if event.button != MouseButton::Left {
            return false;
        }
        self.run(|h, g, cx| h.as_handler_mut().pointer_down(g, event, cx))
    }

    /// Pointer motion over the canvas.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> bool {
        self.run(|h, g, cx| h.as_handler_mut().pointer_move(g, event, cx))
    }

    /// Release of the left button.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> bool {
        if event.button != MouseButton::Left {
            return false;
        }
        self.run(|h, g, cx| h.as_handler_mut().pointer_up(g, event, cx))
    }

    /// The pointer left the canvas.
    pub fn pointer_leave(&mut self) -> bool {
        self.run(|h, g, cx| h.as_handler_mut().pointer_leave(g, cx))
    }

    /// A pointer move reported outside the canvas, in canvas coordinates.
    /// Only handlers that extend past the canvas edge receive it.
    pub fn document_pointer_move(&mut self, event: &PointerEvent) -> bool {
        if !self.gesture.accepts_document_moves() {
            return false;
        }
        self.pointer_move(event)
    }

    /// The pointer entered an external control panel.
    pub fn panel_enter(&mut self) {
        self.gesture.over_panel = true;
    }

    /// The pointer left an external control panel.
    pub fn panel_leave(&mut self) {
        self.gesture.over_panel = false;
    }

    /// Ctrl+Z undoes; every other key goes to the handler.
    pub fn key_down(&mut self, key: &KeyInput) -> bool {
        if key.is_shortcut('z') {
            return self.undo_at(key.time);
        }
        self.run(|h, g, cx| h.as_handler_mut().key_down(g, key, cx))
    }

    /// Drop the latest history state and put the previous one on main.
    pub fn undo_at(&mut self, now: Instant) -> bool {
        if !self.history.undo_at(now) {
            return false;
        }
        render::restore_snapshot(self.main.as_mut(), self.history.current());
        let anchor = self.history.current().anchor();
        log::debug!("Undo, {} states left", self.history.len());
        self.run(|h, g, cx| h.as_handler_mut().on_undo(g, anchor, cx));
        true
    }

    /// [`Canvas::undo_at`] using the current time.
    pub fn undo(&mut self) -> bool {
        self.undo_at(Instant::now())
    }

    /// Style new drawables are created with.
    pub fn style(&self) -> &StyleParams {
        &self.style
    }

    /// Set the style for new drawables and apply it to the one being edited.
    pub fn set_style(&mut self, style: StyleParams) {
        self.style = style;
        self.run(|h, g, cx| h.as_handler_mut().restyle(g, cx));
    }

    /// Commit the drawable being edited.
    pub fn validate(&mut self) -> bool {
        self.run(|h, g, cx| h.as_handler_mut().validate(g, cx))
    }

    /// Run a selection action. No-op unless the selection tool is active.
    pub fn selection_action(&mut self, action: SelectionAction) -> bool {
        self.run(|h, g, cx| h.selection_action(g, action, cx))
    }

    /// Image placed by the image tool on the next click.
    pub fn set_image(&mut self, source: ImageSource) -> bool {
        self.handler.set_image(source)
    }

    /// The drawable currently being edited.
    pub fn active_drawable(&self) -> Option<&Drawable> {
        self.gesture.drawable.as_ref()
    }

    /// Current gesture state.
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Cursor the host should display.
    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    /// Settings the canvas was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Undo stack of committed states.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Surface holding committed pixels.
    pub fn main(&self) -> &dyn Surface {
        self.main.as_ref()
    }

    /// Surface previewing the drawable being edited.
    pub fn overlay(&self) -> &dyn Surface {
        self.overlay.as_ref()
    }

    /// Encode the committed drawing. The drawable being edited is not included.
    pub fn export(&self, format: RasterFormat, quality: u8) -> Result<Vec<u8>, SurfaceError> {
        self.main.to_encoded_image(format, quality)
    }

    /// Finish the current drawable and hand the history back.
    pub fn shutdown(mut self) -> History {
        self.run(|h, g, cx| h.as_handler_mut().end_action(g, cx));
        log::info!("Canvas shut down with {} history states", self.history.len());
        self.history
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("tool", &self.tool())
            .field("phase", &self.gesture.phase)
            .field("history", &self.history.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::input::{Key, Modifiers};
    use crate::surface::RecordingSurface;
    use crate::tools::GesturePhase;
    use kurbo::Point;
    use std::time::Duration;

    struct Clock(Instant);

    impl Clock {
        fn at(&self, ms: u64) -> Instant {
            self.0 + Duration::from_millis(ms)
        }

        fn pointer(&self, x: f64, y: f64, ms: u64) -> PointerEvent {
            PointerEvent::new(Point::new(x, y), self.at(ms)).pressed(true)
        }
    }

    fn canvas_with(config: EngineConfig) -> (Canvas, Clock) {
        let canvas = Canvas::with_config(
            Box::new(RecordingSurface::new(200, 200)),
            Box::new(RecordingSurface::new(200, 200)),
            Arc::new(NoAssets),
            config,
        );
        (canvas, Clock(Instant::now()))
    }

    fn canvas() -> (Canvas, Clock) {
        canvas_with(EngineConfig::default())
    }

    fn stroke(canvas: &mut Canvas, clock: &Clock, from: (f64, f64), to: (f64, f64), ms: u64) {
        canvas.pointer_down(&clock.pointer(from.0, from.1, ms));
        canvas.pointer_move(&clock.pointer(to.0, to.1, ms + 10));
        canvas.pointer_up(&clock.pointer(to.0, to.1, ms + 20));
    }

    #[test]
    fn test_history_capacity_from_config() {
        let config = EngineConfig { history_capacity: 2, ..EngineConfig::default() };
        let (mut canvas, clock) = canvas_with(config);
        assert_eq!(canvas.history().capacity(), 2);
        for i in 0..4u64 {
            let x = 10.0 + i as f64 * 40.0;
            stroke(&mut canvas, &clock, (x, 10.0), (x + 20.0, 40.0), i * 100);
        }
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_freehand_commit_and_undo() {
        let (mut canvas, clock) = canvas();
        stroke(&mut canvas, &clock, (10.0, 10.0), (50.0, 50.0), 0);
        stroke(&mut canvas, &clock, (100.0, 100.0), (150.0, 120.0), 100);
        assert_eq!(canvas.history().len(), 2);
        let after_first = canvas.history().iter().next().map(|s| s.raster.clone());

        let undo = KeyInput::new(Key::Char('z'), clock.at(500)).with_modifiers(Modifiers::CTRL);
        assert!(canvas.key_down(&undo));
        assert_eq!(canvas.history().len(), 1);
        assert_eq!(Some(canvas.main().get_image_buffer(None)), after_first);

        // Debounced.
        let again = KeyInput::new(Key::Char('z'), clock.at(600)).with_modifiers(Modifiers::CTRL);
        assert!(!canvas.key_down(&again));
        assert_eq!(canvas.history().len(), 1);

        assert!(canvas.undo_at(clock.at(1000)));
        assert!(canvas.main().get_image_buffer(None).is_blank());
        assert!(!canvas.undo_at(clock.at(2000)));
    }

    #[test]
    fn test_switching_tool_finishes_drawable() {
        let (mut canvas, clock) = canvas();
        canvas.set_tool(ToolKind::Square);
        stroke(&mut canvas, &clock, (20.0, 20.0), (80.0, 80.0), 0);
        assert_eq!(canvas.gesture().phase, GesturePhase::Fixed);
        assert!(canvas.active_drawable().is_some());
        assert!(canvas.history().is_empty());

        assert!(canvas.set_tool(ToolKind::Freehand));
        assert!(canvas.active_drawable().is_none());
        assert_eq!(canvas.history().len(), 1);
        assert!(canvas.overlay().get_image_buffer(None).is_blank());
        assert!(!canvas.set_tool(ToolKind::Freehand));
    }

    #[test]
    fn test_document_moves_need_extended_area() {
        let (mut canvas, clock) = canvas();
        canvas.set_tool(ToolKind::Line);
        assert!(!canvas.document_pointer_move(&clock.pointer(250.0, 10.0, 0)));
        stroke(&mut canvas, &clock, (10.0, 10.0), (100.0, 100.0), 10);
        assert!(canvas.gesture().accepts_document_moves());
        canvas.panel_enter();
        assert!(!canvas.gesture().accepts_document_moves());
        canvas.panel_leave();
        assert!(canvas.gesture().accepts_document_moves());
    }

    #[test]
    fn test_non_primary_button_ignored() {
        let (mut canvas, clock) = canvas();
        let event = clock.pointer(10.0, 10.0, 0).with_button(MouseButton::Right);
        assert!(!canvas.pointer_down(&event));
        assert!(canvas.gesture().is_idle());
    }

    #[test]
    fn test_selection_action_outside_selection_mode() {
        let (mut canvas, _clock) = canvas();
        assert!(!canvas.selection_action(SelectionAction::Paste));
        assert!(!canvas.set_image(ImageSource::Asset("logo".into())));
    }

    #[test]
    fn test_export_and_shutdown() {
        let (mut canvas, clock) = canvas();
        assert!(matches!(canvas.export(RasterFormat::Png, 90), Err(SurfaceError::Unsupported(_))));
        canvas.pointer_down(&clock.pointer(10.0, 10.0, 0));
        canvas.pointer_move(&clock.pointer(40.0, 40.0, 10));
        // Stroke still in progress; shutdown commits it.
        let history = canvas.shutdown();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_set_style_restyles_active() {
        let (mut canvas, clock) = canvas();
        canvas.set_tool(ToolKind::Circle);
        stroke(&mut canvas, &clock, (20.0, 20.0), (80.0, 80.0), 0);
        let style = StyleParams { line_width: 9.0, ..StyleParams::default() };
        canvas.set_style(style);
        let width = canvas.active_drawable().map(|d| d.style().line_width);
        assert_eq!(width, Some(9.0));
    }
}
