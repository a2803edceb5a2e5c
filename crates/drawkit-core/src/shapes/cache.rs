//! Per-drawable raster cache.

use crate::geometry::Area;
use crate::surface::{PixelRect, RasterImage, Surface};
use kurbo::{Point, Rect};

/// Caches larger than this are not kept; the drawable paints directly.
const MAX_CACHE_PIXELS: u64 = 4096 * 4096;

#[derive(Debug, Clone)]
struct CachedRaster {
    image: RasterImage,
    origin: Point,
}

/// Raster of a drawable's own rendering, rebuilt lazily after invalidation.
#[derive(Debug, Clone, Default)]
pub struct RasterCache {
    entry: Option<CachedRaster>,
}

impl RasterCache {
    /// Drop the raster; the next draw rebuilds it.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Whether a raster is ready to blit.
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    /// Blit the cached raster onto `surface`, rendering it through `paint`
    /// first when stale. `bounds` must cover everything `paint` touches.
    pub fn draw(&mut self, surface: &mut dyn Surface, bounds: Area, paint: impl FnOnce(&mut dyn Surface)) {
        if self.entry.is_none() {
            let Some(px) = PixelRect::covering(bounds.to_rect()) else {
                log::debug!("Skipping draw of drawable with invalid bounds {:?}", bounds);
                return;
            };
            if px.width == 0 || px.height == 0 {
                return;
            }
            if px.width as u64 * px.height as u64 > MAX_CACHE_PIXELS {
                log::debug!("Drawable too large to cache ({}x{}), painting directly", px.width, px.height);
                paint(surface);
                return;
            }
            let mut offscreen = surface.create_offscreen(px.width, px.height);
            offscreen.translate(-(px.x as f64), -(px.y as f64));
            paint(offscreen.as_mut());
            self.entry = Some(CachedRaster {
                image: offscreen.get_image_buffer(None),
                origin: Point::new(px.x as f64, px.y as f64),
            });
        }
        if let Some(entry) = &self.entry {
            let dest = Rect::from_origin_size(
                entry.origin,
                (entry.image.width() as f64, entry.image.height() as f64),
            );
            surface.draw_image(&entry.image, dest);
        }
    }
}
