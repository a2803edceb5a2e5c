//! Text measurement and rasterization with ab_glyph.

use crate::error::{RenderResult, RendererError};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use drawkit_core::surface::{FontSpec, TextMetrics};
use peniko::Color;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Regular/bold font pairs tried by [`TextRenderer::load_system`].
const SYSTEM_FONTS: &[(&str, &str)] = &[
    ("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf", "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
    ("/usr/share/fonts/TTF/DejaVuSans.ttf", "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf"),
    ("/usr/share/fonts/dejavu/DejaVuSans.ttf", "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf"),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    ("/System/Library/Fonts/Supplemental/Arial.ttf", "/System/Library/Fonts/Supplemental/Arial Bold.ttf"),
    ("C:\\Windows\\Fonts\\arial.ttf", "C:\\Windows\\Fonts\\arialbd.ttf"),
];

/// Lays out and rasterizes single lines of text.
#[derive(Clone)]
pub struct TextRenderer {
    regular: FontArc,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer").field("bold", &self.bold.is_some()).finish_non_exhaustive()
    }
}

fn load_font(bytes: Vec<u8>) -> RenderResult<FontArc> {
    FontArc::try_from_vec(bytes).map_err(|e| RendererError::Font(e.to_string()))
}

impl TextRenderer {
    /// Use the TrueType/OpenType font in `bytes` for all text.
    pub fn from_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        Ok(Self { regular: load_font(bytes)?, bold: None })
    }

    /// Font used for bold text instead of the regular one.
    pub fn with_bold(mut self, bytes: Vec<u8>) -> RenderResult<Self> {
        self.bold = Some(load_font(bytes)?);
        Ok(self)
    }

    /// First usable font from the usual system locations.
    pub fn load_system() -> Option<Self> {
        for (regular, bold) in SYSTEM_FONTS {
            let Ok(bytes) = std::fs::read(regular) else {
                continue;
            };
            let Ok(renderer) = Self::from_bytes(bytes) else {
                log::debug!("Unusable system font {}", regular);
                continue;
            };
            log::info!("Using system font {}", regular);
            let renderer = match std::fs::read(bold) {
                Ok(bytes) => renderer.clone().with_bold(bytes).unwrap_or(renderer),
                Err(_) => renderer,
            };
            return Some(renderer);
        }
        log::warn!("No system font found, text will not be rendered");
        None
    }

    fn font(&self, spec: &FontSpec) -> &FontArc {
        match (&self.bold, spec.bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }

    /// Glyph ids of `text` with their pen x positions, and the advance width.
    fn layout(&self, text: &str, spec: &FontSpec) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font(spec).as_scaled(PxScale::from(spec.size as f32));
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        (glyphs, caret)
    }

    /// Advance width and line height of `text`.
    pub fn measure(&self, text: &str, spec: &FontSpec) -> TextMetrics {
        let (_, width) = self.layout(text, spec);
        TextMetrics { width: width as f64, height: spec.size * LINE_HEIGHT }
    }

    /// Render one line into a pixmap the size of its line box, glyphs
    /// centered vertically. `None` for empty text.
    pub fn rasterize(&self, text: &str, spec: &FontSpec, color: Color) -> Option<Pixmap> {
        let metrics = self.measure(text, spec);
        let width = metrics.width.ceil() as u32;
        let height = metrics.height.ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        let font = self.font(spec);
        let scale = PxScale::from(spec.size as f32);
        let scaled = font.as_scaled(scale);
        let baseline = (metrics.height as f32 - (scaled.ascent() - scaled.descent())) / 2.0 + scaled.ascent();

        let mut coverage = vec![0.0f32; width as usize * height as usize];
        let (glyphs, _) = self.layout(text, spec);
        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(x, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, c| {
                let px = gx as i64 + bounds.min.x as i64;
                let py = gy as i64 + bounds.min.y as i64;
                if px >= 0 && py >= 0 && px < width as i64 && py < height as i64 {
                    let cell = &mut coverage[py as usize * width as usize + px as usize];
                    *cell = cell.max(c);
                }
            });
        }

        let mut pixmap = Pixmap::new(width, height)?;
        let rgba = color.to_rgba8();
        for (pixel, c) in pixmap.pixels_mut().iter_mut().zip(coverage) {
            if c <= 0.0 {
                continue;
            }
            let a = (rgba.a as f32 * c.min(1.0)).round() as u8;
            let premul = |v: u8| ((v as u32 * a as u32 + 127) / 255) as u8;
            if let Some(color) = PremultipliedColorU8::from_rgba(premul(rgba.r), premul(rgba.g), premul(rgba.b), a) {
                *pixel = color;
            }
        }
        Some(pixmap)
    }
}
