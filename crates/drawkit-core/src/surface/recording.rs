//! In-memory surface that records draw calls.
//!
//! Pixels are approximated: fills and strokes paint the device-space bounding
//! box of the current path. That is enough to observe stamping, clearing and
//! snapshot restoration without a real rasterizer.

use super::{
    FontSpec, PixelRect, RasterFormat, RasterImage, StrokeParams, Surface, SurfaceError, TextMetrics,
    approximate_text_metrics,
};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Vec2};
use peniko::Color;

/// One recorded operation, in device space.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill { color: Color, bounds: Rect },
    Stroke { color: Color, width: f64, bounds: Rect },
    Clip { bounds: Rect },
    Text { text: String, origin: Point, size: f64 },
    Image { width: u32, height: u32, dest: Rect },
    ClearRect(Rect),
    Clear,
    PutImage { x: i32, y: i32, width: u32, height: u32 },
}

/// Headless [`Surface`] implementation.
#[derive(Debug)]
pub struct RecordingSurface {
    pixels: RasterImage,
    transform: Affine,
    stack: Vec<Affine>,
    path: BezPath,
    has_current: bool,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// Blank recording surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RasterImage::new(width, height),
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            path: BezPath::new(),
            has_current: false,
            commands: Vec::new(),
        }
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Coarse raster approximating what was drawn.
    pub fn pixels(&self) -> &RasterImage {
        &self.pixels
    }

    fn paint_bounds(&mut self, bounds: Rect, color: Color) {
        if let Some(rect) = PixelRect::covering(bounds) {
            let c = color.to_rgba8();
            self.pixels.fill_rect(rect, [c.r, c.g, c.b, c.a]);
        }
    }

    fn path_bounds(&self) -> Option<Rect> {
        if self.path.elements().is_empty() {
            None
        } else {
            Some(self.path.bounding_box())
        }
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform *= Affine::translate(Vec2::new(dx, dy));
    }

    fn rotate(&mut self, radians: f64) {
        self.transform *= Affine::rotate(radians);
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.has_current = false;
    }

    fn move_to(&mut self, p: Point) {
        self.path.move_to(self.transform * p);
        self.has_current = true;
    }

    fn line_to(&mut self, p: Point) {
        if !self.has_current {
            self.move_to(p);
        } else {
            self.path.line_to(self.transform * p);
        }
    }

    fn quadratic_curve_to(&mut self, ctrl: Point, to: Point) {
        if !self.has_current {
            self.move_to(ctrl);
        }
        self.path.quad_to(self.transform * ctrl, self.transform * to);
    }

    fn bezier_curve_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        if !self.has_current {
            self.move_to(ctrl1);
        }
        self.path.curve_to(self.transform * ctrl1, self.transform * ctrl2, self.transform * to);
    }

    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64) {
        let arc = kurbo::Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle,
            sweep_angle: end_angle - start_angle,
            x_rotation: 0.0,
        };
        let start = center + Vec2::from_angle(start_angle) * radius;
        self.line_to(start);
        for el in arc.append_iter(0.1) {
            let el = self.transform * el;
            self.path.push(el);
        }
    }

    fn rect(&mut self, rect: Rect) {
        self.move_to(Point::new(rect.x0, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y1));
        self.line_to(Point::new(rect.x0, rect.y1));
        self.close_path();
    }

    fn close_path(&mut self) {
        if self.has_current {
            self.path.push(PathEl::ClosePath);
            self.has_current = false;
        }
    }

    fn fill(&mut self, color: Color) {
        let Some(bounds) = self.path_bounds() else { return };
        self.paint_bounds(bounds, color);
        self.commands.push(DrawCommand::Fill { color, bounds });
    }

    fn stroke(&mut self, params: &StrokeParams) {
        let Some(bounds) = self.path_bounds() else { return };
        let half = params.width / 2.0;
        let bounds = bounds.inflate(half, half);
        self.paint_bounds(bounds, params.color);
        self.commands.push(DrawCommand::Stroke { color: params.color, width: params.width, bounds });
    }

    fn clip(&mut self) {
        if let Some(bounds) = self.path_bounds() {
            self.commands.push(DrawCommand::Clip { bounds });
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color) {
        let metrics = self.measure_text(text, font);
        let local = Rect::from_origin_size(origin, (metrics.width, metrics.height));
        let bounds = self.transform.transform_rect_bbox(local);
        self.paint_bounds(bounds, color);
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin: self.transform * origin,
            size: font.size,
        });
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> TextMetrics {
        approximate_text_metrics(text, font)
    }

    fn draw_image(&mut self, image: &RasterImage, dest: Rect) {
        let bounds = self.transform.transform_rect_bbox(dest);
        if let Some(rect) = PixelRect::covering(bounds) {
            let scaled = image.scaled(rect.width, rect.height);
            self.pixels.draw_over(&scaled, rect.x, rect.y);
        }
        self.commands.push(DrawCommand::Image { width: image.width(), height: image.height(), dest: bounds });
    }

    fn clear_rect(&mut self, rect: Rect) {
        if let Some(px) = PixelRect::covering(rect) {
            self.pixels.fill_rect(px, [0, 0, 0, 0]);
        }
        self.commands.push(DrawCommand::ClearRect(rect));
    }

    fn clear(&mut self) {
        self.pixels.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn get_image_buffer(&self, region: Option<PixelRect>) -> RasterImage {
        match region {
            Some(rect) => self.pixels.sub_image(rect),
            None => self.pixels.clone(),
        }
    }

    fn put_image_buffer(&mut self, image: &RasterImage, x: i32, y: i32) {
        self.pixels.blit(image, x, y);
        self.commands.push(DrawCommand::PutImage { x, y, width: image.width(), height: image.height() });
    }

    fn to_encoded_image(&self, _format: RasterFormat, _quality: u8) -> Result<Vec<u8>, SurfaceError> {
        Err(SurfaceError::Unsupported("recording surfaces cannot encode images"))
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn Surface> {
        Box::new(RecordingSurface::new(width, height))
    }
}
