//! Drawing drawables onto the main and overlay surfaces.

use crate::assets::AssetResolver;
use crate::history::Restore;
use crate::shapes::{DrawContext, Drawable};
use crate::surface::Surface;

/// Draw `drawable` through its raster cache.
pub fn draw_drawable(surface: &mut dyn Surface, drawable: &mut Drawable, ctx: &DrawContext<'_>) {
    drawable.draw(surface, ctx);
}

/// Clear the overlay and redraw `drawable` (if any) on it.
pub fn redraw_overlay(overlay: &mut dyn Surface, drawable: Option<&mut Drawable>, ctx: &DrawContext<'_>) {
    overlay.clear();
    if let Some(drawable) = drawable {
        drawable.draw(overlay, ctx);
    }
}

/// Commit `drawable` into the main surface, without decorations.
pub fn stamp(main: &mut dyn Surface, drawable: &mut Drawable, assets: &dyn AssetResolver) {
    drawable.draw(main, &DrawContext::plain(assets));
}

/// Put a history state back on the main surface.
pub fn restore_snapshot(main: &mut dyn Surface, restore: Restore<'_>) {
    match restore {
        Restore::Snapshot(snapshot) => {
            main.clear();
            main.put_image_buffer(&snapshot.raster, 0, 0);
        }
        Restore::Blank => main.clear(),
    }
}
