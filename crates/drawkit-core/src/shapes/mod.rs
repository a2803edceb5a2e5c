//! Drawable definitions for the canvas.

mod arrow;
mod cache;
mod figure;
mod freehand;
mod image;
mod path;
mod selection;
mod style;
mod text;

pub use arrow::{ArrowStyle, arrow_bounds, control_point, head_points};
pub use cache::RasterCache;
pub use figure::{Figure, FigureKind};
pub use freehand::FreehandCurve;
pub use image::{ImageFormat, ImageSource, fit_within};
pub use path::{PathSegment, PathShape, SegmentKind};
pub use selection::SelectionArea;
pub use style::{BorderStyle, RgbaColor, StrokeStyle, StyleParams, TextStyle};
pub use text::{TEXT_PADDING, TextLayout, layout_text};

use crate::assets::AssetResolver;
use crate::geometry::{Area, Border, ResizeOptions, resize_rectangle};
use crate::surface::Surface;
use kurbo::{Point, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawables.
pub type DrawableId = Uuid;

/// Color of selection frames and handles.
pub const DECORATION_COLOR: Color = Color::from_rgba8(59, 130, 246, 255);
/// Color of the hovered resize handle.
pub const HIGHLIGHT_COLOR: Color = Color::from_rgba8(249, 115, 22, 255);
/// Color of the validation badge.
pub const BADGE_COLOR: Color = Color::from_rgba8(34, 197, 94, 255);

/// What a draw call should produce besides the drawable itself.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub assets: &'a dyn AssetResolver,
    /// Draw the selection overlay (frame, handles, buttons).
    pub decorations: bool,
    /// Border under the pointer, highlighted in the overlay.
    pub hovered: Option<Border>,
    /// Width of the target surface, used to keep buttons on screen.
    pub max_width: f64,
}

impl<'a> DrawContext<'a> {
    /// Plain rendering, as stamped into the main surface.
    pub fn plain(assets: &'a dyn AssetResolver) -> Self {
        Self { assets, decorations: false, hovered: None, max_width: f64::INFINITY }
    }

    /// Rendering with the editing overlay.
    pub fn decorated(assets: &'a dyn AssetResolver, hovered: Option<Border>, max_width: f64) -> Self {
        Self { assets, decorations: true, hovered, max_width }
    }
}

/// Common behavior of all drawables.
pub trait DrawableTrait {
    fn id(&self) -> DrawableId;

    fn style(&self) -> &StyleParams;

    /// Replace the style. Invalidates the raster cache.
    fn set_style(&mut self, style: StyleParams);

    /// Bounding box in surface coordinates, stroke included.
    fn area(&self) -> Area;

    /// Fit the drawable into `area`.
    fn set_area(&mut self, area: Area);

    /// Rotation in degrees.
    fn rotation(&self) -> f64 {
        0.0
    }

    /// Check if a point hits this drawable, with `margin` pixels of tolerance.
    fn hit_test(&self, point: Point, margin: f64) -> bool;

    /// Vector rendering in surface coordinates.
    fn paint(&self, surface: &mut dyn Surface, assets: &dyn AssetResolver);

    /// Editing overlay drawn on top of the drawable.
    fn paint_decorations(&self, _surface: &mut dyn Surface, _ctx: &DrawContext<'_>) {}

    /// Region `paint` may touch.
    fn visual_bounds(&self) -> Area {
        self.area()
    }

    /// Resize by dragging `border` to `point`. Returns whether the area changed.
    fn resize_from_border(&mut self, point: Point, border: Border, options: ResizeOptions) -> bool {
        match resize_rectangle(point, &self.area(), border, options) {
            Some(area) => {
                self.set_area(area);
                true
            }
            None => false,
        }
    }

    fn translate(&mut self, delta: Vec2);

    /// Last placed point, recorded with history snapshots.
    fn anchor(&self) -> Option<Point>;

    fn cache_mut(&mut self) -> &mut RasterCache;

    fn invalidate_cache(&mut self) {
        self.cache_mut().invalidate();
    }

    /// Draw through the raster cache, then the overlay when requested.
    fn draw(&mut self, surface: &mut dyn Surface, ctx: &DrawContext<'_>)
    where
        Self: Sized,
    {
        let bounds = self.visual_bounds();
        let mut cache = std::mem::take(self.cache_mut());
        cache.draw(surface, bounds, |s| self.paint(s, ctx.assets));
        *self.cache_mut() = cache;
        if ctx.decorations {
            self.paint_decorations(surface, ctx);
        }
    }
}

/// Enum wrapper for all drawable types (for serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Drawable {
    Freehand(FreehandCurve),
    Path(PathShape),
    Figure(Figure),
    Selection(SelectionArea),
}

macro_rules! dispatch {
    ($self:expr, $d:ident => $body:expr) => {
        match $self {
            Drawable::Freehand($d) => $body,
            Drawable::Path($d) => $body,
            Drawable::Figure($d) => $body,
            Drawable::Selection($d) => $body,
        }
    };
}

impl Drawable {
    /// Stable identifier, kept across persistence.
    pub fn id(&self) -> DrawableId {
        dispatch!(self, d => d.id())
    }

    pub fn style(&self) -> &StyleParams {
        dispatch!(self, d => d.style())
    }

    /// Replace the style.
    pub fn set_style(&mut self, style: StyleParams) {
        dispatch!(self, d => d.set_style(style))
    }

    /// Unrotated bounding area.
    pub fn area(&self) -> Area {
        dispatch!(self, d => d.area())
    }

    /// Move or resize to `area`.
    pub fn set_area(&mut self, area: Area) {
        dispatch!(self, d => d.set_area(area))
    }

    /// Rotation in degrees; zero for everything but figures.
    pub fn rotation(&self) -> f64 {
        dispatch!(self, d => d.rotation())
    }

    /// Whether `point` hits the drawable within `margin` pixels.
    pub fn hit_test(&self, point: Point, margin: f64) -> bool {
        dispatch!(self, d => d.hit_test(point, margin))
    }

    /// Paint directly, bypassing the raster cache.
    pub fn paint(&self, surface: &mut dyn Surface, assets: &dyn AssetResolver) {
        dispatch!(self, d => d.paint(surface, assets))
    }

    /// Region painting may touch.
    pub fn visual_bounds(&self) -> Area {
        dispatch!(self, d => d.visual_bounds())
    }

    /// Drag `border` to `point`. Returns false when the resize was rejected.
    pub fn resize_from_border(&mut self, point: Point, border: Border, options: ResizeOptions) -> bool {
        dispatch!(self, d => d.resize_from_border(point, border, options))
    }

    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, d => d.translate(delta))
    }

    /// Last placed point, if any.
    pub fn anchor(&self) -> Option<Point> {
        dispatch!(self, d => d.anchor())
    }

    pub fn invalidate_cache(&mut self) {
        dispatch!(self, d => d.invalidate_cache())
    }

    /// Draw through the drawable's raster cache.
    pub fn draw(&mut self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        dispatch!(self, d => d.draw(surface, ctx))
    }

    /// Give the drawable a fresh identifier, as done when pasting.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        match self {
            Drawable::Freehand(d) => d.id = new_id,
            Drawable::Path(d) => d.id = new_id,
            Drawable::Figure(d) => d.id = new_id,
            Drawable::Selection(d) => d.id = new_id,
        }
    }

    pub fn as_figure(&self) -> Option<&Figure> {
        match self {
            Drawable::Figure(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathShape> {
        match self {
            Drawable::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_freehand(&self) -> Option<&FreehandCurve> {
        match self {
            Drawable::Freehand(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&SelectionArea> {
        match self {
            Drawable::Selection(s) => Some(s),
            _ => None,
        }
    }
}

impl From<FreehandCurve> for Drawable {
    fn from(curve: FreehandCurve) -> Self {
        Drawable::Freehand(curve)
    }
}

impl From<PathShape> for Drawable {
    fn from(path: PathShape) -> Self {
        Drawable::Path(path)
    }
}

impl From<Figure> for Drawable {
    fn from(figure: Figure) -> Self {
        Drawable::Figure(figure)
    }
}

impl From<SelectionArea> for Drawable {
    fn from(selection: SelectionArea) -> Self {
        Drawable::Selection(selection)
    }
}
