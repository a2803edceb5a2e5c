//! Style parameters copied into drawables.

use crate::surface::{FontSpec, StrokeParams};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|v| v * 17);
                Some(Self::new(nibble(0)?, nibble(1)?, nibble(2)?, 255))
            }
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `#rrggbbaa` hex string.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Color with an extra opacity factor applied.
    pub fn with_opacity(&self, opacity: f64) -> Color {
        let color: Color = (*self).into();
        color.multiply_alpha(opacity.clamp(0.0, 1.0) as f32)
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for RgbaColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self { r: rgba.r, g: rgba.g, b: rgba.b, a: rgba.a }
    }
}

impl From<RgbaColor> for Color {
    fn from(color: RgbaColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Dash style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash array scaled to the line width.
    pub fn dash_pattern(&self, line_width: f64) -> Vec<f64> {
        let w = line_width.max(1.0);
        match self {
            StrokeStyle::Solid => Vec::new(),
            StrokeStyle::Dashed => vec![w * 4.0, w * 3.0],
            StrokeStyle::Dotted => vec![w, w * 2.0],
        }
    }
}

/// Ring drawn around a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub color: RgbaColor,
    pub line_width: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Gap between the figure and the ring.
    #[serde(default)]
    pub interval: f64,
}

impl BorderStyle {
    /// Distance from the figure edge to the middle of the ring.
    pub fn offset(&self) -> f64 {
        self.line_width / 2.0 + self.interval
    }
}

/// Text attached to a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub text: String,
    pub font: String,
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    pub color: RgbaColor,
    /// Extra rotation in degrees, added to the figure's own rotation.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: "sans-serif".to_string(),
            font_size: 18.0,
            bold: false,
            italic: false,
            color: RgbaColor::black(),
            rotation: 0.0,
        }
    }
}

impl TextStyle {
    /// Font used to lay out the text.
    pub fn font_spec(&self) -> FontSpec {
        FontSpec { family: self.font.clone(), size: self.font_size, bold: self.bold, italic: self.italic }
    }
}

fn default_opacity() -> f64 {
    1.0
}

/// Drawing parameters of a drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    pub color: RgbaColor,
    pub line_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub filled: bool,
    /// Fill color; falls back to `color` when unset.
    #[serde(default)]
    pub fill_color: Option<RgbaColor>,
    #[serde(default)]
    pub dash: StrokeStyle,
    #[serde(default)]
    pub border: Option<BorderStyle>,
    #[serde(default)]
    pub text: Option<TextStyle>,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            color: RgbaColor::black(),
            line_width: 2.0,
            opacity: 1.0,
            filled: false,
            fill_color: None,
            dash: StrokeStyle::Solid,
            border: None,
            text: None,
        }
    }
}

impl StyleParams {
    /// Stroke color with opacity applied.
    pub fn stroke_color(&self) -> Color {
        self.color.with_opacity(self.opacity)
    }

    /// Fill color with opacity applied, when filling is enabled.
    pub fn fill(&self) -> Option<Color> {
        self.filled
            .then(|| self.fill_color.unwrap_or(self.color).with_opacity(self.opacity))
    }

    /// Stroke parameters for outlines drawn with this style.
    pub fn stroke_params(&self) -> StrokeParams {
        StrokeParams::solid(self.stroke_color(), self.line_width)
            .with_dash(self.dash.dash_pattern(self.line_width))
    }

    /// Half of the widest stroke this style paints, border ring included.
    pub fn half_extent(&self) -> f64 {
        let own = self.line_width.max(0.0) / 2.0;
        match &self.border {
            Some(border) => own.max(border.offset() + border.line_width / 2.0),
            None => own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(RgbaColor::from_hex("#ff0080"), Some(RgbaColor::new(255, 0, 128, 255)));
        assert_eq!(RgbaColor::from_hex("00000080"), Some(RgbaColor::new(0, 0, 0, 128)));
        assert_eq!(RgbaColor::from_hex("#fff"), Some(RgbaColor::white()));
        assert_eq!(RgbaColor::from_hex("#ggg"), None);
        assert_eq!(RgbaColor::from_hex("#12345"), None);
        assert_eq!(RgbaColor::new(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_peniko_roundtrip() {
        let c = RgbaColor::new(10, 20, 30, 40);
        let color: Color = c.into();
        assert_eq!(RgbaColor::from(color), c);
    }

    #[test]
    fn test_opacity_applied() {
        let style = StyleParams { opacity: 0.5, ..StyleParams::default() };
        let rgba = style.stroke_color().to_rgba8();
        assert!((rgba.a as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_fill_only_when_filled() {
        let style = StyleParams::default();
        assert!(style.fill().is_none());
        let style = StyleParams { filled: true, fill_color: Some(RgbaColor::white()), ..style };
        assert_eq!(style.fill().map(|c| c.to_rgba8().r), Some(255));
    }

    #[test]
    fn test_dash_patterns() {
        assert!(StrokeStyle::Solid.dash_pattern(2.0).is_empty());
        assert_eq!(StrokeStyle::Dashed.dash_pattern(2.0), vec![8.0, 6.0]);
    }

    #[test]
    fn test_half_extent_includes_border() {
        let mut style = StyleParams { line_width: 4.0, ..StyleParams::default() };
        assert!((style.half_extent() - 2.0).abs() < f64::EPSILON);
        style.border = Some(BorderStyle { color: RgbaColor::black(), line_width: 2.0, opacity: 1.0, interval: 3.0 });
        assert!((style.half_extent() - 5.0).abs() < f64::EPSILON);
    }
}
