//! PNG/JPEG encoding and decoding of rasters.

use crate::error::{RenderResult, RendererError};
use drawkit_core::surface::{RasterFormat, RasterImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Background JPEG output is flattened onto.
const JPEG_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Encode `raster`. `quality` (1-100) only affects JPEG.
pub fn encode(raster: &RasterImage, format: RasterFormat, quality: u8) -> RenderResult<Vec<u8>> {
    if raster.is_empty() {
        return Err(RendererError::InvalidDimensions { width: raster.width(), height: raster.height() });
    }
    let mut buffer = Vec::new();
    match format {
        RasterFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(raster.data(), raster.width(), raster.height(), ExtendedColorType::Rgba8)
            .map_err(|e| RendererError::Encode(e.to_string()))?,
        RasterFormat::Jpeg => {
            let rgb = flatten_alpha(raster, JPEG_BACKGROUND);
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .write_image(&rgb, raster.width(), raster.height(), ExtendedColorType::Rgb8)
                .map_err(|e| RendererError::Encode(e.to_string()))?
        }
    }
    log::debug!("Encoded {}x{} raster as {:?} ({} bytes)", raster.width(), raster.height(), format, buffer.len());
    Ok(buffer)
}

/// Decode PNG or JPEG bytes.
pub fn decode(bytes: &[u8]) -> RenderResult<RasterImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba(width, height, rgba.into_raw())
        .ok_or_else(|| RendererError::Decode("pixel buffer size mismatch".to_string()))
}

/// Composite straight RGBA over an opaque background, dropping alpha.
fn flatten_alpha(raster: &RasterImage, background: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(raster.data().len() / 4 * 3);
    for px in raster.data().chunks_exact(4) {
        let a = px[3] as u32;
        for c in 0..3 {
            let value = (px[c] as u32 * a + background[c] as u32 * (255 - a) + 127) / 255;
            rgb.push(value as u8);
        }
    }
    rgb
}
