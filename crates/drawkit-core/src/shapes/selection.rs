//! Rectangular pixel selection.

use super::{DECORATION_COLOR, DrawContext, DrawableId, DrawableTrait, RasterCache, StyleParams};
use crate::assets::AssetResolver;
use crate::geometry::{Area, CORNER_HANDLE_HALF, corner_points};
use crate::surface::{RasterImage, StrokeParams, Surface};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A selected region, optionally carrying a copy of the pixels under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionArea {
    pub(crate) id: DrawableId,
    area: Area,
    style: StyleParams,
    #[serde(skip)]
    buffer: Option<RasterImage>,
    #[serde(skip)]
    cache: RasterCache,
}

impl SelectionArea {
    /// Selection without buffered pixels.
    pub fn new(area: Area, style: StyleParams) -> Self {
        Self { id: Uuid::new_v4(), area, style, buffer: None, cache: RasterCache::default() }
    }

    /// Pixels floating with the selection.
    pub fn buffer(&self) -> Option<&RasterImage> {
        self.buffer.as_ref()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// Replace the floating pixels.
    pub fn set_buffer(&mut self, buffer: Option<RasterImage>) {
        self.buffer = buffer;
        self.cache.invalidate();
    }

    /// Edit the buffered pixels in place.
    pub fn edit_buffer(&mut self, edit: impl FnOnce(&mut RasterImage)) -> bool {
        match self.buffer.as_mut() {
            Some(buffer) => {
                edit(buffer);
                self.cache.invalidate();
                true
            }
            None => false,
        }
    }

    /// Detach the floating pixels.
    pub fn take_buffer(&mut self) -> Option<RasterImage> {
        self.cache.invalidate();
        self.buffer.take()
    }
}

impl DrawableTrait for SelectionArea {
    fn id(&self) -> DrawableId {
        self.id
    }

    fn style(&self) -> &StyleParams {
        &self.style
    }

    fn set_style(&mut self, style: StyleParams) {
        self.style = style;
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

    fn hit_test(&self, point: Point, margin: f64) -> bool {
        self.area.inflate(margin, margin).contains(point)
    }

    /// Only the buffered pixels; the frame is part of the overlay.
    fn paint(&self, surface: &mut dyn Surface, _assets: &dyn AssetResolver) {
        if let Some(buffer) = &self.buffer {
            surface.draw_image(buffer, self.area.to_rect());
        }
    }

    fn paint_decorations(&self, surface: &mut dyn Surface, _ctx: &DrawContext<'_>) {
        surface.begin_path();
        surface.rect(self.area.to_rect());
        surface.stroke(&StrokeParams::solid(DECORATION_COLOR, 1.0).with_dash(vec![5.0, 3.0]));
        let h = CORNER_HANDLE_HALF;
        surface.begin_path();
        for p in corner_points(&self.area) {
            surface.rect(Rect::new(p.x - h, p.y - h, p.x + h, p.y + h));
        }
        surface.fill(DECORATION_COLOR);
    }

    fn translate(&mut self, delta: Vec2) {
        self.area = self.area.translate(delta);
        self.cache.invalidate();
    }

    fn anchor(&self) -> Option<Point> {
        Some(self.area.origin())
    }

    fn cache_mut(&mut self) -> &mut RasterCache {
        &mut self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn test_paint_only_buffer() {
        let mut sel = SelectionArea::new(Area::new(10.0, 10.0, 20.0, 20.0), StyleParams::default());
        let mut surface = RecordingSurface::new(50, 50);
        sel.paint(&mut surface, &NoAssets);
        assert!(surface.commands().is_empty());

        sel.set_buffer(Some(RasterImage::new(20, 20)));
        sel.paint(&mut surface, &NoAssets);
        assert!(matches!(surface.commands(), [DrawCommand::Image { width: 20, height: 20, .. }]));
    }

    #[test]
    fn test_edit_buffer() {
        let mut sel = SelectionArea::new(Area::new(0.0, 0.0, 4.0, 4.0), StyleParams::default());
        assert!(!sel.edit_buffer(|b| b.clear()));
        sel.set_buffer(Some(RasterImage::new(4, 4)));
        assert!(sel.edit_buffer(|b| b.set_pixel(0, 0, [1, 2, 3, 255])));
        assert_eq!(sel.buffer().and_then(|b| b.pixel(0, 0)), Some([1, 2, 3, 255]));
        assert!(sel.take_buffer().is_some());
        assert!(!sel.has_buffer());
    }

    #[test]
    fn test_hit_test_with_margin() {
        let sel = SelectionArea::new(Area::new(0.0, 0.0, 10.0, 10.0), StyleParams::default());
        assert!(sel.hit_test(Point::new(12.0, 5.0), 3.0));
        assert!(!sel.hit_test(Point::new(12.0, 5.0), 0.0));
    }
}
