//! Owned RGBA pixel buffers.

use serde::{Deserialize, Serialize};

/// Integer pixel rectangle. May extend past a buffer's bounds; reads outside
/// come back transparent and writes outside are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Rectangle at `(x, y)`, origin may be negative.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest pixel rectangle covering a floating point rectangle.
    pub fn covering(rect: kurbo::Rect) -> Option<Self> {
        let rect = rect.abs();
        if !(rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()) {
            return None;
        }
        let x0 = rect.x0.floor();
        let y0 = rect.y0.floor();
        let x1 = rect.x1.ceil();
        let y1 = rect.y1.ceil();
        Some(Self::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Straight (non-premultiplied) RGBA8 image, row-major.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterImage {
    /// Fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, data: vec![0; width as usize * height as usize * 4] }
    }

    /// Wrap existing RGBA bytes; `None` when the length doesn't match.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Straight RGBA bytes, row by row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// RGBA at `(x, y)`, `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.index(x as i64, y as i64)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.index(x as i64, y as i64) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    /// Overwrite a rectangle with a single color, clipped to the image.
    pub fn fill_rect(&mut self, rect: PixelRect, rgba: [u8; 4]) {
        let x0 = (rect.x as i64).max(0);
        let y0 = (rect.y as i64).max(0);
        let x1 = (rect.x as i64 + rect.width as i64).min(self.width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(self.height as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(i) = self.index(x, y) {
                    self.data[i..i + 4].copy_from_slice(&rgba);
                }
            }
        }
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Copy of a region; pixels outside the image are transparent.
    pub fn sub_image(&self, rect: PixelRect) -> RasterImage {
        let mut out = RasterImage::new(rect.width, rect.height);
        for y in 0..rect.height {
            for x in 0..rect.width {
                let sx = rect.x as i64 + x as i64;
                let sy = rect.y as i64 + y as i64;
                if let (Some(src), Some(dst)) = (self.index(sx, sy), out.index(x as i64, y as i64)) {
                    out.data[dst..dst + 4].copy_from_slice(&self.data[src..src + 4]);
                }
            }
        }
        out
    }

    /// Replace pixels at (`x`, `y`) with `src`, including its transparency.
    pub fn blit(&mut self, src: &RasterImage, x: i32, y: i32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let (Some(s), Some(d)) = (
                    src.index(sx as i64, sy as i64),
                    self.index(x as i64 + sx as i64, y as i64 + sy as i64),
                ) else {
                    continue;
                };
                self.data[d..d + 4].copy_from_slice(&src.data[s..s + 4]);
            }
        }
    }

    /// Source-over composite `src` at (`x`, `y`).
    pub fn draw_over(&mut self, src: &RasterImage, x: i32, y: i32) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let (Some(s), Some(d)) = (
                    src.index(sx as i64, sy as i64),
                    self.index(x as i64 + sx as i64, y as i64 + sy as i64),
                ) else {
                    continue;
                };
                let src_px = [src.data[s], src.data[s + 1], src.data[s + 2], src.data[s + 3]];
                let dst_px = [self.data[d], self.data[d + 1], self.data[d + 2], self.data[d + 3]];
                self.data[d..d + 4].copy_from_slice(&blend_over(src_px, dst_px));
            }
        }
    }

    /// Nearest-neighbour rescale.
    pub fn scaled(&self, width: u32, height: u32) -> RasterImage {
        let mut out = RasterImage::new(width, height);
        if self.is_empty() || width == 0 || height == 0 {
            return out;
        }
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                if let Some(px) = self.pixel(sx, sy) {
                    out.set_pixel(x, y, px);
                }
            }
        }
        out
    }

    /// Make the pixels outside rounded corners of `radius` transparent.
    pub fn apply_corner_radius(&mut self, radius: f64) {
        if !radius.is_finite() || radius <= 0.0 || self.is_empty() {
            return;
        }
        let w = self.width as f64;
        let h = self.height as f64;
        let r = radius.min(w / 2.0).min(h / 2.0);
        for y in 0..self.height {
            for x in 0..self.width {
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                let cx = if px < r { r } else if px > w - r { w - r } else { continue };
                let cy = if py < r { r } else if py > h - r { h - r } else { continue };
                let dx = px - cx;
                let dy = py - cy;
                if dx * dx + dy * dy > r * r {
                    if let Some(i) = self.index(x as i64, y as i64) {
                        self.data[i + 3] = 0;
                    }
                }
            }
        }
    }

    /// Make every pixel whose red, green and blue are all at least `threshold`
    /// fully transparent. A threshold of 255 clears pure white only.
    pub fn apply_transparency_threshold(&mut self, threshold: u8) {
        for px in self.data.chunks_exact_mut(4) {
            if px[0] >= threshold && px[1] >= threshold && px[2] >= threshold {
                px[3] = 0;
            }
        }
    }
}

fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(RasterImage::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(RasterImage::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_sub_image_outside_is_transparent() {
        let mut img = RasterImage::new(4, 4);
        img.fill_rect(PixelRect::new(0, 0, 4, 4), [255, 0, 0, 255]);
        let sub = img.sub_image(PixelRect::new(2, 2, 4, 4));
        assert_eq!(sub.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(sub.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = RasterImage::new(3, 3);
        let mut src = RasterImage::new(2, 2);
        src.fill_rect(PixelRect::new(0, 0, 2, 2), [1, 2, 3, 255]);
        dst.blit(&src, 2, 2);
        assert_eq!(dst.pixel(2, 2), Some([1, 2, 3, 255]));
        assert_eq!(dst.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_over_keeps_destination_under_transparency() {
        let mut dst = RasterImage::new(1, 1);
        dst.set_pixel(0, 0, [0, 0, 255, 255]);
        dst.draw_over(&RasterImage::new(1, 1), 0, 0);
        assert_eq!(dst.pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_corner_radius() {
        let mut img = RasterImage::new(20, 20);
        img.fill_rect(PixelRect::new(0, 0, 20, 20), [10, 10, 10, 255]);
        img.apply_corner_radius(8.0);
        assert_eq!(img.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(img.pixel(10, 10).map(|p| p[3]), Some(255));
        assert_eq!(img.pixel(10, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_transparency_threshold() {
        let mut img = RasterImage::new(2, 1);
        img.set_pixel(0, 0, [250, 250, 250, 255]);
        img.set_pixel(1, 0, [20, 250, 250, 255]);
        img.apply_transparency_threshold(240);
        assert_eq!(img.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(img.pixel(1, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_scaled() {
        let mut img = RasterImage::new(2, 2);
        img.set_pixel(1, 1, [9, 9, 9, 255]);
        let big = img.scaled(4, 4);
        assert_eq!(big.pixel(3, 3), Some([9, 9, 9, 255]));
        assert_eq!(big.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
