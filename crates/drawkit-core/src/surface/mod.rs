//! The 2D drawing context the engine renders into.
//!
//! Path construction follows the familiar immediate-mode canvas model: a
//! current path is built with `move_to`/`line_to`/... under the current
//! transform and consumed by `fill`, `stroke` or `clip`.

mod recording;

pub use crate::raster::{PixelRect, RasterImage};
pub use recording::{DrawCommand, RecordingSurface};

use kurbo::{BezPath, PathEl, Point, Rect, Shape};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Operation not supported by this surface: {0}")]
    Unsupported(&'static str),
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Encoded raster formats for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }

    /// Usual file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Shape of stroke ends.
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Shape of stroke corners.
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

/// Parameters of a stroke operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeParams {
    pub color: Color,
    pub width: f64,
    /// Alternating dash/gap lengths; empty for a solid line.
    pub dash: Vec<f64>,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl StrokeParams {
    /// Solid stroke of `width` with round caps and joins.
    pub fn solid(color: Color, width: f64) -> Self {
        Self { color, width, dash: Vec::new(), cap: LineCap::Round, join: LineJoin::Round }
    }

    /// Dash lengths, alternating on and off.
    pub fn with_dash(mut self, dash: Vec<f64>) -> Self {
        self.dash = dash;
        self
    }
}

/// Font selection for text operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self { family: "sans-serif".to_string(), size: 16.0, bold: false, italic: false }
    }
}

/// Measured extent of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    /// Line height.
    pub height: f64,
}

/// Rough text measurement used when no font is available.
pub fn approximate_text_metrics(text: &str, font: &FontSpec) -> TextMetrics {
    let factor = if font.bold { 0.65 } else { 0.6 };
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let lines = text.lines().count().max(1);
    TextMetrics {
        width: widest as f64 * font.size * factor,
        height: lines as f64 * font.size * 1.2,
    }
}

/// Abstract 2D drawing context.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotate the current transform clockwise by `radians`.
    fn rotate(&mut self, radians: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn quadratic_curve_to(&mut self, ctrl: Point, to: Point);
    fn bezier_curve_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point);
    /// Circular arc around `center`, angles in radians.
    fn arc(&mut self, center: Point, radius: f64, start_angle: f64, end_angle: f64);
    fn rect(&mut self, rect: Rect);
    fn close_path(&mut self);

    fn fill(&mut self, color: Color);
    fn stroke(&mut self, params: &StrokeParams);
    /// Intersect the clip region with the current path.
    fn clip(&mut self);

    /// Draw text with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, font: &FontSpec, color: Color);
    fn measure_text(&self, text: &str, font: &FontSpec) -> TextMetrics;

    /// Draw `image` scaled into `dest` under the current transform.
    fn draw_image(&mut self, image: &RasterImage, dest: Rect);

    /// Clear a device-space rectangle to transparent.
    fn clear_rect(&mut self, rect: Rect);
    fn clear(&mut self);

    /// Read pixels back; `None` reads the whole surface.
    fn get_image_buffer(&self, region: Option<PixelRect>) -> RasterImage;
    /// Replace pixels at device position (`x`, `y`).
    fn put_image_buffer(&mut self, image: &RasterImage, x: i32, y: i32);

    fn to_encoded_image(&self, format: RasterFormat, quality: u8) -> Result<Vec<u8>, SurfaceError>;

    /// New blank surface of the same kind.
    fn create_offscreen(&self, width: u32, height: u32) -> Box<dyn Surface>;
}

/// Replay a kurbo path into the surface's current path.
pub fn trace_path(surface: &mut dyn Surface, path: &BezPath) {
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => surface.move_to(p),
            PathEl::LineTo(p) => surface.line_to(p),
            PathEl::QuadTo(c, p) => surface.quadratic_curve_to(c, p),
            PathEl::CurveTo(c1, c2, p) => surface.bezier_curve_to(c1, c2, p),
            PathEl::ClosePath => surface.close_path(),
        }
    }
}

/// Trace any kurbo shape (ellipse, rounded rect, ...).
pub fn trace_shape(surface: &mut dyn Surface, shape: &impl Shape) {
    trace_path(surface, &shape.to_path(0.1));
}
