//! Text layout for figures.

use super::style::TextStyle;
use crate::surface::Surface;
use kurbo::{Point, Size};

/// Space kept between text and the figure edge.
pub const TEXT_PADDING: f64 = 8.0;

/// Measured lines of a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Each line with its measured width.
    pub lines: Vec<(String, f64)>,
    pub line_height: f64,
    /// Size of the whole block, padding excluded.
    pub size: Size,
}

/// Measure `style.text` line by line on `surface`.
pub fn layout_text(surface: &dyn Surface, style: &TextStyle) -> TextLayout {
    let font = style.font_spec();
    let mut line_height: f64 = font.size * 1.2;
    let mut width: f64 = 0.0;
    let lines: Vec<(String, f64)> = style
        .text
        .split('\n')
        .map(|line| {
            let metrics = surface.measure_text(line, &font);
            line_height = line_height.max(metrics.height);
            width = width.max(metrics.width);
            (line.to_string(), metrics.width)
        })
        .collect();
    let height = line_height * lines.len() as f64;
    TextLayout { lines, line_height, size: Size::new(width, height) }
}

/// Draw the block centered on `center` (current surface coordinates).
pub fn draw_text_block(surface: &mut dyn Surface, style: &TextStyle, center: Point) {
    if style.text.is_empty() {
        return;
    }
    let layout = layout_text(surface, style);
    let font = style.font_spec();
    let color = style.color.into();
    let top = center.y - layout.size.height / 2.0;
    for (i, (line, width)) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let origin = Point::new(center.x - width / 2.0, top + i as f64 * layout.line_height);
        surface.fill_text(line, origin, &font, color);
    }
}

/// Size a figure needs to show the text with padding.
pub fn padded_size(layout: &TextLayout) -> Size {
    Size::new(layout.size.width + 2.0 * TEXT_PADDING, layout.size.height + 2.0 * TEXT_PADDING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn style(text: &str) -> TextStyle {
        TextStyle { text: text.to_string(), font_size: 10.0, ..TextStyle::default() }
    }

    #[test]
    fn test_layout_multiline() {
        let surface = RecordingSurface::new(10, 10);
        let layout = layout_text(&surface, &style("abcd\nab\n"));
        assert_eq!(layout.lines.len(), 3);
        assert!((layout.size.width - 24.0).abs() < 1e-9);
        assert!((layout.size.height - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_skips_empty_lines() {
        let mut surface = RecordingSurface::new(100, 100);
        draw_text_block(&mut surface, &style("a\n\nb"), Point::new(50.0, 50.0));
        let texts = surface.commands().iter().filter(|c| matches!(c, DrawCommand::Text { .. })).count();
        assert_eq!(texts, 2);
    }

    #[test]
    fn test_padded_size() {
        let surface = RecordingSurface::new(10, 10);
        let size = padded_size(&layout_text(&surface, &style("ab")));
        assert!((size.width - (12.0 + 2.0 * TEXT_PADDING)).abs() < 1e-9);
    }
}
