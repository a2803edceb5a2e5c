//! CPU surface backed by a tiny-skia pixmap.

use crate::codec;
use crate::error::{RenderResult, RendererError};
use crate::text::TextRenderer;
use drawkit_core::surface::{
    FontSpec, LineCap, LineJoin, PixelRect, RasterFormat, RasterImage, RecordingSurface, StrokeParams, Surface,
    SurfaceError, TextMetrics, approximate_text_metrics,
};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape};
use peniko::Color;
use std::sync::Arc;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Stroke,
    StrokeDash, Transform,
};

/// Flattening tolerance for arcs, in pixels.
const ARC_TOLERANCE: f64 = 0.1;

#[derive(Clone)]
struct SavedState {
    transform: Affine,
    clip: Option<Mask>,
}

/// Canvas-style surface rasterizing into RGBA pixels.
///
/// Paths are kept in device space: points are transformed as they are added,
/// so later transform changes do not move them.
pub struct PixmapSurface {
    pixmap: Pixmap,
    path: BezPath,
    transform: Affine,
    clip: Option<Mask>,
    stack: Vec<SavedState>,
    text: Option<Arc<TextRenderer>>,
}

impl std::fmt::Debug for PixmapSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixmapSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("text", &self.text.is_some())
            .finish_non_exhaustive()
    }
}

fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => {
                pb.cubic_to(c1.x as f32, c1.y as f32, c2.x as f32, c2.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn paint_for(color: Color) -> Paint<'static> {
    let rgba = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint.anti_alias = true;
    paint
}

fn premultiply(px: &[u8]) -> PremultipliedColorU8 {
    let a = px[3] as u32;
    let m = |v: u8| ((v as u32 * a + 127) / 255) as u8;
    PremultipliedColorU8::from_rgba(m(px[0]), m(px[1]), m(px[2]), px[3]).unwrap_or(PremultipliedColorU8::TRANSPARENT)
}

fn demultiply(px: PremultipliedColorU8) -> [u8; 4] {
    let a = px.alpha();
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let d = |v: u8| ((v as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
    [d(px.red()), d(px.green()), d(px.blue()), a]
}

fn raster_to_pixmap(image: &RasterImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.data().chunks_exact(4)) {
        *dst = premultiply(src);
    }
    Some(pixmap)
}

impl PixmapSurface {
    /// Transparent surface. Fails for zero or oversized dimensions.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RendererError::InvalidDimensions { width, height })?;
        Ok(Self { pixmap, path: BezPath::new(), transform: Affine::IDENTITY, clip: None, stack: Vec::new(), text: None })
    }

    /// Render text with `text`; without one, text is measured approximately
    /// and not drawn.
    pub fn with_text(mut self, text: Option<Arc<TextRenderer>>) -> Self {
        self.text = text;
        self
    }

    /// Backing pixmap, premultiplied.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Current transform from user space to pixels.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    fn push_el(&mut self, el: PathEl) {
        let el = self.transform * el;
        self.path.push(el);
    }

    /// Start a subpath at `p` unless one is open.
    fn ensure_subpath(&mut self, p: Point) {
        if self.path.elements().is_empty() {
            self.move_to(p);
        }
    }

    fn current_path(&self) -> Option<tiny_skia::Path> {
        if self.path.elements().is_empty() {
            return None;
        }
        to_skia_path(&self.path)
    }

    fn draw_pixmap_with(&mut self, source: &Pixmap, transform: Affine) {
        let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, to_skia_transform(transform), self.clip.as_ref());
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn save(&mut self) {
        self.stack.push(SavedState { transform: self.transform, clip: self.clip.clone() });
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.transform = state.transform;
            self.clip = state.clip;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform *= Affine::translate((dx, dy));
    }

    fn rotate(&mut self, radians: f64) {
        self.transform *= Affine::rotate(radians);
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
    }

    fn move_to(&mut self, p: Point) {
        self.push_el(PathEl::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_subpath(p);
        self.push_el(PathEl::LineTo(p));
    }

    fn quadratic_curve_to(&mut self, ctrl: Point, to: Point) {
        self.ensure_subpath(ctrl);
        self.push_el(PathEl::QuadTo(ctrl, to));
    }

    fn bezier_curve_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.ensure_subpath(ctrl1);
        self.push_el(PathEl::CurveTo(ctrl1, ctrl2, to));
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        if !(radius.is_finite() && radius > 0.0) {
            return;
        }
        let tau = std::f64::consts::TAU;
        let sweep = (end_angle - start_angle).clamp(-tau, tau);
        let arc = kurbo::Arc {
            center,
            radii: kurbo::Vec2::new(radius, radius),
            start_angle,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        let start = center + radius * kurbo::Vec2::from_angle(start_angle);
        if self.path.elements().is_empty() {
            self.move_to(start);
        } else {
            self.push_el(PathEl::LineTo(start));
        }
        for el in arc.append_iter(ARC_TOLERANCE) {
            self.push_el(el);
        }
    }

    fn rect(&mut self, rect: Rect) {
        for el in rect.path_elements(ARC_TOLERANCE) {
            self.push_el(el);
        }
    }

    fn close_path(&mut self) {
        if !self.path.elements().is_empty() {
            self.path.close_path();
        }
    }

    fn fill(&mut self, color: Color) {
        let Some(path) = self.current_path() else {
            return;
        };
        let paint = paint_for(color);
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), self.clip.as_ref());
    }

    fn stroke(&mut self, params: &StrokeParams) {
        if !(params.width.is_finite() && params.width > 0.0) {
            return;
        }
        let Some(path) = self.current_path() else {
            return;
        };
        let mut stroke = Stroke {
            width: params.width as f32,
            line_cap: match params.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match params.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            ..Stroke::default()
        };
        if !params.dash.is_empty() {
            // tiny-skia wants an even number of positive intervals.
            let mut dash: Vec<f32> = params.dash.iter().map(|&d| d.max(0.1) as f32).collect();
            if dash.len() % 2 == 1 {
                dash.extend_from_within(..);
            }
            stroke.dash = StrokeDash::new(dash, 0.0);
        }
        let paint = paint_for(params.color);
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), self.clip.as_ref());
    }

    fn clip(&mut self) {
        let Some(path) = self.current_path() else {
            return;
        };
        match self.clip.as_mut() {
            Some(mask) => mask.intersect_path(&path, FillRule::Winding, true, Transform::identity()),
            None => {
                let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
                    return;
                };
                mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
                self.clip = Some(mask);
            }
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        let Some(renderer) = self.text.clone() else {
            log::debug!("No font loaded, skipping text");
            return;
        };
        if let Some(glyphs) = renderer.rasterize(text, font, color) {
            let transform = self.transform * Affine::translate(origin.to_vec2());
            self.draw_pixmap_with(&glyphs, transform);
        }
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> TextMetrics {
        match &self.text {
            Some(renderer) => renderer.measure(text, font),
            None => approximate_text_metrics(text, font),
        }
    }

    fn draw_image(&mut self, image: &RasterImage, dest: Rect) {
        if image.is_empty() || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let Some(source) = raster_to_pixmap(image) else {
            return;
        };
        let scale = kurbo::Vec2::new(dest.width() / image.width() as f64, dest.height() / image.height() as f64);
        let transform = self.transform * Affine::translate(dest.origin().to_vec2()) * Affine::scale_non_uniform(scale.x, scale.y);
        self.draw_pixmap_with(&source, transform);
    }

    fn clear_rect(&mut self, rect: Rect) {
        let path = self.transform * rect.to_path(ARC_TOLERANCE);
        let Some(path) = to_skia_path(&path) else {
            return;
        };
        let mut paint = Paint::default();
        paint.blend_mode = BlendMode::Clear;
        paint.anti_alias = false;
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), self.clip.as_ref());
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn get_image_buffer(&self, region: Option<PixelRect>) -> RasterImage {
        let mut data = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for px in self.pixmap.pixels() {
            data.extend_from_slice(&demultiply(*px));
        }
        let full = RasterImage::from_rgba(self.pixmap.width(), self.pixmap.height(), data)
            .unwrap_or_else(|| RasterImage::new(self.pixmap.width(), self.pixmap.height()));
        match region {
            Some(rect) => full.sub_image(rect),
            None => full,
        }
    }

    /// Replace pixels at (x, y), ignoring transform and clip.
    fn put_image_buffer(&mut self, image: &RasterImage, x: i32, y: i32) {
        let width = self.pixmap.width() as i64;
        let height = self.pixmap.height() as i64;
        let pixels = self.pixmap.pixels_mut();
        for (row, line) in image.data().chunks_exact(image.width().max(1) as usize * 4).enumerate() {
            let ty = y as i64 + row as i64;
            if ty < 0 || ty >= height {
                continue;
            }
            for (col, px) in line.chunks_exact(4).enumerate() {
                let tx = x as i64 + col as i64;
                if tx < 0 || tx >= width {
                    continue;
                }
                pixels[(ty * width + tx) as usize] = premultiply(px);
            }
        }
    }

    fn to_encoded_image(&self, format: RasterFormat, quality: u8) -> Result<Vec<u8>, SurfaceError> {
        Ok(codec::encode(&self.get_image_buffer(None), format, quality)?)
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn Surface> {
        match PixmapSurface::new(width, height) {
            Ok(surface) => Box::new(surface.with_text(self.text.clone())),
            Err(e) => {
                log::warn!("Offscreen allocation failed ({}), using an empty surface", e);
                Box::new(RecordingSurface::new(0, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::from_rgba8(255, 0, 0, 255)
    }

    fn surface() -> PixmapSurface {
        PixmapSurface::new(64, 64).unwrap()
    }

    fn pixel(s: &PixmapSurface, x: u32, y: u32) -> [u8; 4] {
        s.get_image_buffer(None).pixel(x, y).unwrap_or_default()
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(PixmapSurface::new(0, 10), Err(RendererError::InvalidDimensions { width: 0, height: 10 })));
    }

    #[test]
    fn test_fill_rect() {
        let mut s = surface();
        s.begin_path();
        s.rect(Rect::new(10.0, 10.0, 30.0, 30.0));
        s.fill(red());
        assert_eq!(pixel(&s, 20, 20), [255, 0, 0, 255]);
        assert_eq!(pixel(&s, 5, 5)[3], 0);
    }

    #[test]
    fn test_transform_applies_to_path_points() {
        let mut s = surface();
        s.save();
        s.translate(32.0, 32.0);
        s.rotate(std::f64::consts::FRAC_PI_2);
        s.begin_path();
        // (5..15, -2..2) rotated by 90deg lands at (30..34, 37..47).
        s.rect(Rect::new(5.0, -2.0, 15.0, 2.0));
        s.restore();
        s.fill(red());
        assert_eq!(pixel(&s, 32, 42)[3], 255);
        assert_eq!(pixel(&s, 42, 32)[3], 0);
    }

    #[test]
    fn test_stroke_and_arc() {
        let mut s = surface();
        s.begin_path();
        s.arc(Point::new(32.0, 32.0), 20.0, 0.0, std::f64::consts::TAU);
        s.stroke(&StrokeParams::solid(red(), 4.0));
        assert!(pixel(&s, 52, 32)[3] > 200);
        assert_eq!(pixel(&s, 32, 32)[3], 0);
        s.fill(red());
        assert_eq!(pixel(&s, 32, 32)[3], 255);
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut s = surface();
        s.begin_path();
        s.move_to(Point::new(0.0, 10.0));
        s.line_to(Point::new(64.0, 10.0));
        s.stroke(&StrokeParams::solid(red(), 2.0).with_dash(vec![8.0, 8.0]));
        let row: Vec<u8> = (0..64).map(|x| pixel(&s, x, 10)[3]).collect();
        assert!(row.iter().any(|&a| a > 200));
        assert!(row.iter().any(|&a| a == 0));
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut s = surface();
        s.save();
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 32.0, 64.0));
        s.clip();
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 64.0, 64.0));
        s.fill(red());
        s.restore();
        assert_eq!(pixel(&s, 10, 10)[3], 255);
        assert_eq!(pixel(&s, 50, 10)[3], 0);
    }

    #[test]
    fn test_image_roundtrip_and_clear_rect() {
        let mut s = surface();
        let mut raster = RasterImage::new(4, 4);
        raster.set_pixel(1, 2, [10, 20, 30, 255]);
        raster.set_pixel(2, 2, [200, 100, 50, 128]);
        s.put_image_buffer(&raster, 8, 8);
        let back = s.get_image_buffer(Some(PixelRect::new(8, 8, 4, 4)));
        assert_eq!(back.pixel(1, 2), Some([10, 20, 30, 255]));
        let semi = back.pixel(2, 2).unwrap_or_default();
        assert_eq!(semi[3], 128);
        assert!((semi[0] as i32 - 200).abs() <= 2);

        s.clear_rect(Rect::new(0.0, 0.0, 64.0, 64.0));
        assert!(s.get_image_buffer(None).is_blank());
    }

    #[test]
    fn test_draw_image_scales_to_dest() {
        let mut s = surface();
        let mut raster = RasterImage::new(2, 2);
        raster.fill_rect(PixelRect::new(0, 0, 2, 2), [0, 255, 0, 255]);
        s.draw_image(&raster, Rect::new(10.0, 10.0, 30.0, 30.0));
        assert_eq!(pixel(&s, 20, 20), [0, 255, 0, 255]);
        assert_eq!(pixel(&s, 35, 35)[3], 0);
    }

    #[test]
    fn test_offscreen_and_encode() {
        let s = surface();
        let mut off = s.create_offscreen(8, 8);
        assert_eq!((off.width(), off.height()), (8, 8));
        off.begin_path();
        off.rect(Rect::new(0.0, 0.0, 8.0, 8.0));
        off.fill(red());
        let png = off.to_encoded_image(RasterFormat::Png, 100).unwrap();
        assert_eq!(codec::decode(&png).unwrap().pixel(3, 3), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_text_without_font_uses_approximation() {
        let mut s = surface();
        let font = FontSpec { size: 10.0, ..FontSpec::default() };
        assert_eq!(s.measure_text("abcd", &font), approximate_text_metrics("abcd", &font));
        s.fill_text("abcd", Point::new(0.0, 0.0), &font, red());
        assert!(s.get_image_buffer(None).is_blank());
    }
}
