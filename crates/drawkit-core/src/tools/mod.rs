//! Interaction handlers: one state machine per drawing mode.
//!
//! Handlers receive the gesture context by value and hand it back in a
//! [`Step`], so the canvas owns all state between events.

mod freehand;
mod path;
mod selection;
mod shape;

pub use freehand::FreehandHandler;
pub use path::PathHandler;
pub use selection::{SelectionAction, SelectionHandler};
pub use shape::ShapeHandler;

use crate::assets::AssetResolver;
use crate::config::EngineConfig;
use crate::geometry::{Area, Border, CursorHint, cursor_for_border};
use crate::history::{History, HistorySnapshot};
use crate::input::{KeyInput, PointerEvent, Throttle};
use crate::render;
use crate::shapes::{DrawContext, Drawable, FigureKind, ImageSource, SegmentKind, StyleParams};
use crate::surface::Surface;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Freehand,
    Line,
    Curve,
    Arrow,
    Square,
    Circle,
    RoundedRect,
    Text,
    Image,
    Selection,
}

impl ToolKind {
    /// Every tool, in toolbar order.
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Freehand,
        ToolKind::Line,
        ToolKind::Curve,
        ToolKind::Arrow,
        ToolKind::Square,
        ToolKind::Circle,
        ToolKind::RoundedRect,
        ToolKind::Text,
        ToolKind::Image,
        ToolKind::Selection,
    ];

    /// Segment appended by path tools.
    pub fn segment_kind(self) -> Option<SegmentKind> {
        match self {
            ToolKind::Line => Some(SegmentKind::Line),
            ToolKind::Curve => Some(SegmentKind::Curve),
            ToolKind::Arrow => Some(SegmentKind::Arrow),
            _ => None,
        }
    }

    /// Figure created by shape tools.
    pub fn figure_kind(self) -> Option<FigureKind> {
        match self {
            ToolKind::Square => Some(FigureKind::Square),
            ToolKind::Circle => Some(FigureKind::Circle),
            ToolKind::RoundedRect => Some(FigureKind::RoundedRect),
            ToolKind::Text => Some(FigureKind::Text),
            ToolKind::Image => Some(FigureKind::Image),
            _ => None,
        }
    }
}

/// Where a handler's gesture stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Drawing or sizing a new drawable.
    Active,
    /// Drawable frozen, waiting for edits or validation.
    Fixed,
    Resizing(Border),
    Rotating,
    Moving,
    /// Dragging one vertex of a path.
    EditingPoint(usize),
}

/// State of the gesture in progress, owned by the canvas between events.
#[derive(Debug, Clone)]
pub struct Gesture {
    pub phase: GesturePhase,
    /// The drawable being edited.
    pub drawable: Option<Drawable>,
    /// Pointer position when the gesture began.
    pub start: Option<Point>,
    /// Pointer offset from the drawable origin while moving.
    pub offset: Vec2,
    /// Area before a resize or move, restored on Escape.
    pub saved_area: Option<Area>,
    /// Border under the pointer.
    pub hovered: Option<Border>,
    /// Pointer moves outside the canvas are accepted.
    pub extended_area: bool,
    /// The pointer is over an external control panel.
    pub over_panel: bool,
    pub throttle: Throttle,
}

impl Gesture {
    /// Idle gesture throttling drags to `drag_throttle`.
    pub fn new(drag_throttle: Duration) -> Self {
        Self {
            phase: GesturePhase::Idle,
            drawable: None,
            start: None,
            offset: Vec2::ZERO,
            saved_area: None,
            hovered: None,
            extended_area: false,
            over_panel: false,
            throttle: Throttle::new(drag_throttle),
        }
    }

    /// Back to Idle, keeping panel tracking and the throttle interval.
    pub fn clear(&mut self) {
        self.phase = GesturePhase::Idle;
        self.drawable = None;
        self.start = None;
        self.offset = Vec2::ZERO;
        self.saved_area = None;
        self.hovered = None;
        self.extended_area = false;
        self.throttle.reset();
    }

    /// True when no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        self.phase == GesturePhase::Idle
    }

    /// Whether pointer moves reported outside the canvas should be handled.
    pub fn accepts_document_moves(&self) -> bool {
        self.extended_area && !self.over_panel
    }

    /// Remember the pointer offset and area before dragging the drawable.
    fn begin_drag(&mut self, phase: GesturePhase, position: Point) {
        if let Some(area) = self.drawable.as_ref().map(|d| d.area()) {
            self.offset = position - area.origin();
            self.saved_area = Some(area);
        }
        self.throttle.reset();
        self.phase = phase;
    }

    /// Move the drawable so the pointer keeps its grab offset. Throttled.
    fn drag_to(&mut self, position: Point, event: &PointerEvent) -> bool {
        if !self.throttle.ready(event.time) {
            return false;
        }
        let offset = self.offset;
        match self.drawable.as_mut() {
            Some(drawable) => {
                let delta = (position - offset) - drawable.area().origin();
                drawable.translate(delta);
                true
            }
            None => false,
        }
    }

    /// Undo a resize or move (Escape).
    fn restore_saved_area(&mut self) {
        let saved = self.saved_area.take();
        if let (Some(area), Some(drawable)) = (saved, self.drawable.as_mut()) {
            let current = drawable.area();
            if current.size() == area.size() {
                drawable.translate(area.origin() - current.origin());
            } else {
                drawable.set_area(area);
            }
        }
    }
}

/// Result of a handler call.
#[derive(Debug)]
pub struct Step {
    pub gesture: Gesture,
    /// Cursor to show; `None` keeps the current one.
    pub cursor: Option<CursorHint>,
    /// A history snapshot was pushed.
    pub committed: bool,
}

impl Step {
    /// Step with no cursor change and no commit.
    pub fn new(gesture: Gesture) -> Self {
        Self { gesture, cursor: None, committed: false }
    }

    /// Cursor to show after this step.
    pub fn with_cursor(mut self, cursor: CursorHint) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Mark the step as having changed history. Sticky once set.
    pub fn committed(mut self, committed: bool) -> Self {
        self.committed |= committed;
        self
    }
}

/// What handlers may touch while processing an event.
pub struct HandlerContext<'a> {
    pub main: &'a mut dyn Surface,
    pub overlay: &'a mut dyn Surface,
    pub history: &'a mut History,
    pub assets: &'a dyn AssetResolver,
    pub config: &'a EngineConfig,
    /// Parameters new drawables are created with.
    pub style: &'a StyleParams,
}

impl HandlerContext<'_> {
    /// Width of the surfaces, used to clamp the badge.
    pub fn max_width(&self) -> f64 {
        self.overlay.width() as f64
    }

    /// Redraw the gesture's drawable on the overlay with its decorations.
    pub fn redraw(&mut self, gesture: &mut Gesture) {
        let ctx = DrawContext::decorated(self.assets, gesture.hovered, self.max_width());
        render::redraw_overlay(&mut *self.overlay, gesture.drawable.as_mut(), &ctx);
    }

    /// Redraw the gesture's drawable on the overlay, undecorated.
    pub fn redraw_plain(&mut self, gesture: &mut Gesture) {
        let ctx = DrawContext::plain(self.assets);
        render::redraw_overlay(&mut *self.overlay, gesture.drawable.as_mut(), &ctx);
    }

    /// Erase the preview surface.
    pub fn clear_overlay(&mut self) {
        self.overlay.clear();
    }

    /// Record the main surface in history.
    pub fn push_snapshot(&mut self, anchor: Option<Point>) {
        let raster = self.main.get_image_buffer(None);
        self.history.push(HistorySnapshot::new(raster, anchor));
    }

    /// Stamp the gesture's drawable into main, record it and reset the
    /// gesture. Returns whether anything was committed.
    pub fn commit(&mut self, gesture: &mut Gesture) -> bool {
        let Some(mut drawable) = gesture.drawable.take() else {
            gesture.clear();
            self.clear_overlay();
            return false;
        };
        render::stamp(&mut *self.main, &mut drawable, self.assets);
        self.clear_overlay();
        self.push_snapshot(drawable.anchor());
        log::debug!("Committed drawable {}", drawable.id());
        gesture.clear();
        true
    }
}

/// Cursor for a pointer hovering a fixed drawable.
pub fn hover_cursor(border: Option<Border>, rotation_deg: f64) -> CursorHint {
    match border {
        Some(border) => cursor_for_border(border, rotation_deg),
        None => CursorHint::Crosshair,
    }
}

/// Contract every drawing mode implements.
pub trait InteractionHandler {
    /// Called when the mode becomes active.
    fn start_action(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        gesture.clear();
        cx.clear_overlay();
        Step::new(gesture).with_cursor(CursorHint::Crosshair)
    }

    /// Called when the mode is left. Surfaces must end fully drawn or cleared.
    fn end_action(&mut self, gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step;

    fn pointer_down(&mut self, gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step;

    fn pointer_move(&mut self, gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step;

    fn pointer_up(&mut self, gesture: Gesture, event: &PointerEvent, cx: &mut HandlerContext<'_>) -> Step;

    /// The pointer left the canvas.
    fn pointer_leave(&mut self, gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step;

    fn key_down(&mut self, gesture: Gesture, key: &KeyInput, cx: &mut HandlerContext<'_>) -> Step;

    /// The main surface was just restored to a snapshot with `anchor`.
    fn on_undo(&mut self, gesture: Gesture, anchor: Option<Point>, cx: &mut HandlerContext<'_>) -> Step;

    /// Commit the drawable right away.
    fn validate(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        let committed = cx.commit(&mut gesture);
        Step::new(gesture).committed(committed)
    }

    /// Apply `cx.style` to the drawable being edited.
    fn restyle(&mut self, mut gesture: Gesture, cx: &mut HandlerContext<'_>) -> Step {
        if let Some(drawable) = gesture.drawable.as_mut() {
            drawable.set_style(cx.style.clone());
            cx.redraw(&mut gesture);
        }
        Step::new(gesture)
    }
}

/// The handler for the active mode.
#[derive(Debug, Clone)]
pub enum Handler {
    Freehand(FreehandHandler),
    Path(PathHandler),
    Shape(ShapeHandler),
    Selection(SelectionHandler),
}

impl Handler {
    /// Fresh handler for `tool`.
    pub fn for_tool(tool: ToolKind) -> Self {
        if let Some(kind) = tool.segment_kind() {
            return Handler::Path(PathHandler::new(kind));
        }
        if let Some(kind) = tool.figure_kind() {
            return Handler::Shape(ShapeHandler::new(kind));
        }
        match tool {
            ToolKind::Selection => Handler::Selection(SelectionHandler::default()),
            _ => Handler::Freehand(FreehandHandler),
        }
    }

    /// Tool this handler serves.
    pub fn tool(&self) -> ToolKind {
        match self {
            Handler::Freehand(_) => ToolKind::Freehand,
            Handler::Path(h) => h.tool(),
            Handler::Shape(h) => h.tool(),
            Handler::Selection(_) => ToolKind::Selection,
        }
    }

    pub fn as_handler_mut(&mut self) -> &mut dyn InteractionHandler {
        match self {
            Handler::Freehand(h) => h,
            Handler::Path(h) => h,
            Handler::Shape(h) => h,
            Handler::Selection(h) => h,
        }
    }

    /// Run a selection action; other modes ignore it.
    pub fn selection_action(
        &mut self,
        gesture: Gesture,
        action: SelectionAction,
        cx: &mut HandlerContext<'_>,
    ) -> Step {
        match self {
            Handler::Selection(h) => h.apply(gesture, action, cx),
            _ => {
                log::debug!("Selection action {:?} ignored outside selection mode", action);
                Step::new(gesture)
            }
        }
    }

    /// Provide the image the image tool places. Returns false for other modes.
    pub fn set_image(&mut self, source: ImageSource) -> bool {
        match self {
            Handler::Shape(h) => h.set_image(source),
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::assets::NoAssets;
    use crate::input::Instant;
    use crate::surface::RecordingSurface;

    /// Surfaces and services a handler test drives events through.
    pub struct Bench {
        pub main: RecordingSurface,
        pub overlay: RecordingSurface,
        pub history: History,
        pub config: EngineConfig,
        pub style: StyleParams,
        pub gesture: Option<Gesture>,
        pub t0: Instant,
    }

    impl Bench {
        pub fn new() -> Self {
            let config = EngineConfig::default();
            Self {
                main: RecordingSurface::new(300, 300),
                overlay: RecordingSurface::new(300, 300),
                history: History::with_debounce(config.history_capacity, config.undo_debounce()),
                gesture: Some(Gesture::new(config.drag_throttle())),
                config,
                style: StyleParams::default(),
                t0: Instant::now(),
            }
        }

        pub fn event(&self, x: f64, y: f64, ms: u64) -> PointerEvent {
            PointerEvent::new(Point::new(x, y), self.t0 + Duration::from_millis(ms)).pressed(true)
        }

        pub fn key(&self, key: crate::input::Key, ms: u64) -> KeyInput {
            KeyInput::new(key, self.t0 + Duration::from_millis(ms))
        }

        pub fn gesture(&self) -> &Gesture {
            self.gesture.as_ref().expect("gesture present between calls")
        }

        /// Run one handler call and keep the returned gesture.
        pub fn run(&mut self, f: impl FnOnce(Gesture, &mut HandlerContext<'_>) -> Step) -> Step {
            let gesture = self.gesture.take().expect("gesture present between calls");
            let mut cx = HandlerContext {
                main: &mut self.main,
                overlay: &mut self.overlay,
                history: &mut self.history,
                assets: &NoAssets,
                config: &self.config,
                style: &self.style,
            };
            let step = f(gesture, &mut cx);
            self.gesture = Some(step.gesture.clone());
            step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_for_tool() {
        for tool in ToolKind::ALL {
            assert_eq!(Handler::for_tool(tool).tool(), tool);
        }
    }

    #[test]
    fn test_gesture_clear_keeps_panel_state() {
        let mut gesture = Gesture::new(Duration::from_millis(25));
        gesture.over_panel = true;
        gesture.extended_area = true;
        gesture.phase = GesturePhase::Fixed;
        assert!(!gesture.accepts_document_moves());
        gesture.clear();
        assert!(gesture.is_idle());
        assert!(gesture.over_panel);
        assert!(!gesture.extended_area);
    }

    #[test]
    fn test_hover_cursor() {
        assert_eq!(hover_cursor(None, 0.0), CursorHint::Crosshair);
        assert_eq!(hover_cursor(Some(Border::Inside), 0.0), CursorHint::Move);
        assert_eq!(hover_cursor(Some(Border::TopLeft), 0.0), CursorHint::NwseResize);
    }
}
