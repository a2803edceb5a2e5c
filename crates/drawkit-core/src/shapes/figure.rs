//! Rotatable box figures: squares, circles, rounded rectangles, text and images.

use super::image::{ImageSource, fit_within};
use super::style::TextStyle;
use super::text::{draw_text_block, layout_text, padded_size};
use super::{
    BADGE_COLOR, DECORATION_COLOR, DrawContext, DrawableId, DrawableTrait, HIGHLIGHT_COLOR, RasterCache,
    StyleParams,
};
use crate::assets::AssetResolver;
use crate::geometry::{
    Area, Border, CORNER_HANDLE_HALF, ResizeOptions, button_layout, is_inside_rectangle, normalize_degrees,
    resize_rotated_rectangle, rotated_bounds,
};
use crate::surface::{StrokeParams, Surface, trace_shape};
use kurbo::{Ellipse, Point, Rect, RoundedRect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a figure draws inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FigureKind {
    Square,
    Circle,
    RoundedRect,
    Text,
    Image,
}

impl FigureKind {
    /// Whether resizing keeps the aspect ratio by default.
    pub fn locks_ratio(&self) -> bool {
        matches!(self, FigureKind::Image)
    }
}

/// A box-shaped drawable rotated about its center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub(crate) id: DrawableId,
    kind: FigureKind,
    area: Area,
    /// Rotation in degrees, within [0, 360).
    rotation: f64,
    style: StyleParams,
    /// Corner radius of rounded rectangles; 0 picks a size-relative radius.
    #[serde(default)]
    corner_radius: f64,
    #[serde(default)]
    image: Option<ImageSource>,
    #[serde(skip)]
    cache: RasterCache,
}

impl Figure {
    /// Unrotated figure with no text or image.
    pub fn new(kind: FigureKind, area: Area, style: StyleParams) -> Self {
        let mut style = style;
        if kind == FigureKind::Text && style.text.is_none() {
            style.text = Some(TextStyle { color: style.color, ..TextStyle::default() });
        }
        Self {
            id: Uuid::new_v4(),
            kind,
            area,
            rotation: 0.0,
            style,
            corner_radius: 0.0,
            image: None,
            cache: RasterCache::default(),
        }
    }

    /// Image figure centered on `center`, sized to fit `max_size` when the
    /// source size is known.
    pub fn image(center: Point, max_size: Size, source: ImageSource, style: StyleParams) -> Self {
        let size = match source.source_size() {
            Some((w, h)) => {
                let (w, h) = fit_within(w as f64, h as f64, max_size.width, max_size.height);
                Size::new(w, h)
            }
            None => max_size,
        };
        let mut figure = Self::new(FigureKind::Image, Area::centered(center, size), style);
        figure.image = Some(source);
        figure
    }

    /// Corner radius of a rounded rectangle.
    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius.max(0.0);
        self.cache.invalidate();
        self
    }

    pub fn kind(&self) -> FigureKind {
        self.kind
    }

    /// Image shown by image figures.
    pub fn image_source(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    /// Pivot of the rotation.
    pub fn center(&self) -> Point {
        self.area.center()
    }

    /// Set the rotation in degrees, normalized to [0, 360). Non-finite values are ignored.
    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation = normalize_degrees(degrees);
            self.cache.invalidate();
        }
    }

    /// Add `degrees` to the rotation, normalized to [0, 360).
    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Embedded text, empty when there is none.
    pub fn text(&self) -> &str {
        self.style.text.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }

    fn text_mut(&mut self) -> &mut TextStyle {
        let color = self.style.color;
        self.cache.invalidate();
        self.style.text.get_or_insert_with(|| TextStyle { color, ..TextStyle::default() })
    }

    /// Replace the embedded text.
    pub fn set_text(&mut self, text: &str) {
        self.text_mut().text = text.to_string();
    }

    /// Append `c` to the embedded text.
    pub fn push_char(&mut self, c: char) {
        self.text_mut().text.push(c);
    }

    /// Remove the last character of the embedded text.
    pub fn pop_char(&mut self) -> Option<char> {
        self.text_mut().text.pop()
    }

    /// Grow the box (about its center) so the text fits. Never shrinks.
    pub fn fit_text(&mut self, surface: &dyn Surface) -> bool {
        let Some(style) = self.style.text.as_ref().filter(|t| !t.text.is_empty()) else {
            return false;
        };
        let needed = padded_size(&layout_text(surface, style));
        let width = self.area.width.max(needed.width);
        let height = self.area.height.max(needed.height);
        if width <= self.area.width && height <= self.area.height {
            return false;
        }
        self.area = Area::centered(self.area.center(), Size::new(width, height));
        self.cache.invalidate();
        true
    }

    fn local_rect(&self) -> Rect {
        Rect::new(
            -self.area.width / 2.0,
            -self.area.height / 2.0,
            self.area.width / 2.0,
            self.area.height / 2.0,
        )
    }

    fn rounded_radius(&self, rect: Rect) -> f64 {
        if self.corner_radius > 0.0 {
            self.corner_radius
        } else {
            rect.width().min(rect.height()) * 0.15
        }
    }

    /// Trace this figure's outline for `rect` (local coordinates).
    fn trace_outline(&self, surface: &mut dyn Surface, rect: Rect, extra_radius: f64) {
        surface.begin_path();
        match self.kind {
            FigureKind::Circle => trace_shape(surface, &Ellipse::from_rect(rect)),
            FigureKind::RoundedRect => {
                let radius = self.rounded_radius(self.local_rect()) + extra_radius;
                trace_shape(surface, &RoundedRect::from_rect(rect, radius));
            }
            _ => surface.rect(rect),
        }
    }

    fn paint_image(&self, surface: &mut dyn Surface, assets: &dyn AssetResolver, rect: Rect) {
        let resolved = self.image.as_ref().and_then(|source| assets.resolve(source));
        match resolved {
            Some(image) => surface.draw_image(&image, rect),
            None => {
                log::debug!("Image for figure {} unavailable, drawing placeholder", self.id);
                let stroke = StrokeParams::solid(Color::from_rgba8(150, 150, 150, 255), 1.0);
                surface.begin_path();
                surface.rect(rect);
                surface.move_to(Point::new(rect.x0, rect.y0));
                surface.line_to(Point::new(rect.x1, rect.y1));
                surface.move_to(Point::new(rect.x1, rect.y0));
                surface.line_to(Point::new(rect.x0, rect.y1));
                surface.stroke(&stroke);
            }
        }
    }

    fn corner_handles(&self) -> [(Border, Point); 4] {
        let r = self.local_rect();
        [
            (Border::TopLeft, Point::new(r.x0, r.y0)),
            (Border::TopRight, Point::new(r.x1, r.y0)),
            (Border::BottomRight, Point::new(r.x1, r.y1)),
            (Border::BottomLeft, Point::new(r.x0, r.y1)),
        ]
    }
}

impl DrawableTrait for Figure {
    fn id(&self) -> DrawableId {
        self.id
    }

    fn style(&self) -> &StyleParams {
        &self.style
    }

    fn set_style(&mut self, style: StyleParams) {
        // The text content belongs to the figure, not to the tool parameters.
        let text = self.style.text.as_ref().map(|t| t.text.clone());
        self.style = style;
        if let Some(text) = text {
            self.text_mut().text = text;
        }
        self.cache.invalidate();
    }

    fn area(&self) -> Area {
        self.area
    }

    fn set_area(&mut self, area: Area) {
        if area.is_valid() {
            self.area = area;
            self.cache.invalidate();
        }
    }

    fn rotation(&self) -> f64 {
        self.rotation
    }

    fn hit_test(&self, point: Point, margin: f64) -> bool {
        let size = Size::new(self.area.width + 2.0 * margin, self.area.height + 2.0 * margin);
        is_inside_rectangle(point, self.area.center(), size, self.rotation)
    }

    fn visual_bounds(&self) -> Area {
        let extent = self.style.half_extent() + 1.0;
        rotated_bounds(&self.area.inflate(extent, extent), self.rotation)
    }

    fn paint(&self, surface: &mut dyn Surface, assets: &dyn AssetResolver) {
        if self.area.is_empty() {
            return;
        }
        let center = self.area.center();
        let rect = self.local_rect();
        surface.save();
        surface.translate(center.x, center.y);
        surface.rotate(self.rotation.to_radians());

        match self.kind {
            FigureKind::Image => self.paint_image(surface, assets, rect),
            FigureKind::Text => {
                if let Some(fill) = self.style.fill() {
                    surface.begin_path();
                    surface.rect(rect);
                    surface.fill(fill);
                }
            }
            _ => {
                if let Some(fill) = self.style.fill() {
                    self.trace_outline(surface, rect, 0.0);
                    surface.fill(fill);
                }
                if self.style.line_width > 0.0 {
                    self.trace_outline(surface, rect, 0.0);
                    surface.stroke(&self.style.stroke_params());
                }
            }
        }

        if let Some(border) = &self.style.border {
            let offset = border.offset();
            self.trace_outline(surface, rect.inflate(offset, offset), offset);
            surface.stroke(&StrokeParams::solid(border.color.with_opacity(border.opacity), border.line_width));
        }

        if let Some(text) = self.style.text.as_ref().filter(|t| !t.text.is_empty()) {
            surface.save();
            surface.rotate(text.rotation.to_radians());
            draw_text_block(surface, text, Point::ZERO);
            surface.restore();
        }

        surface.restore();
    }

    fn paint_decorations(&self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        let center = self.area.center();
        let rect = self.local_rect();
        surface.save();
        surface.translate(center.x, center.y);
        surface.rotate(self.rotation.to_radians());

        surface.begin_path();
        surface.rect(rect);
        surface.stroke(&StrokeParams::solid(DECORATION_COLOR, 1.0).with_dash(vec![4.0, 4.0]));

        for (border, p) in self.corner_handles() {
            surface.begin_path();
            surface.rect(Rect::new(
                p.x - CORNER_HANDLE_HALF,
                p.y - CORNER_HANDLE_HALF,
                p.x + CORNER_HANDLE_HALF,
                p.y + CORNER_HANDLE_HALF,
            ));
            if ctx.hovered == Some(border) {
                surface.fill(HIGHLIGHT_COLOR);
            } else {
                surface.fill(Color::from_rgba8(255, 255, 255, 255));
                surface.stroke(&StrokeParams::solid(DECORATION_COLOR, 1.0));
            }
        }

        let layout = button_layout(&self.area, ctx.max_width);
        let local = |p: Point| Point::new(p.x - center.x, p.y - center.y);
        let r = layout.radius;

        // Validation badge with a check mark.
        let badge = local(layout.badge);
        surface.begin_path();
        surface.arc(badge, r, 0.0, std::f64::consts::TAU);
        surface.fill(BADGE_COLOR);
        surface.begin_path();
        surface.move_to(badge + Vec2::new(-r * 0.45, 0.0));
        surface.line_to(badge + Vec2::new(-r * 0.1, r * 0.35));
        surface.line_to(badge + Vec2::new(r * 0.5, -r * 0.35));
        surface.stroke(&StrokeParams::solid(Color::from_rgba8(255, 255, 255, 255), 2.0));

        // Rotate buttons: circles with an open arc hinting the direction.
        for (button, clockwise) in [(layout.rotate_left, false), (layout.rotate_right, true)] {
            let c = local(button);
            surface.begin_path();
            surface.arc(c, r, 0.0, std::f64::consts::TAU);
            surface.fill(Color::from_rgba8(255, 255, 255, 255));
            surface.stroke(&StrokeParams::solid(DECORATION_COLOR, 1.0));
            let (start, end) = if clockwise { (-2.4, 0.6) } else { (-0.7, 2.3) };
            surface.begin_path();
            surface.arc(c, r * 0.55, start, end);
            surface.stroke(&StrokeParams::solid(DECORATION_COLOR, 1.5));
        }

        surface.restore();
    }

    /// Resize in the figure's unrotated frame, keeping the opposite border in place on screen.
    fn resize_from_border(&mut self, point: Point, border: Border, options: ResizeOptions) -> bool {
        let options = ResizeOptions { lock_ratio: options.lock_ratio || self.kind.locks_ratio(), ..options };
        match resize_rotated_rectangle(point, &self.area, self.rotation, border, options) {
            Some(area) => {
                self.set_area(area);
                true
            }
            None => false,
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.area = self.area.translate(delta);
        self.cache.invalidate();
    }

    fn anchor(&self) -> Option<Point> {
        Some(self.area.center())
    }

    fn cache_mut(&mut self) -> &mut RasterCache {
        &mut self.cache
    }
}
