//! drawkit render library
//!
//! CPU implementation of the drawkit [`Surface`](drawkit_core::Surface) on
//! tiny-skia, with ab_glyph text and PNG/JPEG codecs.

mod assets;
pub mod codec;
mod error;
mod pixmap;
mod text;

pub use assets::DecodingAssets;
pub use error::{RenderResult, RendererError};
pub use pixmap::PixmapSurface;
pub use text::{LINE_HEIGHT, TextRenderer};

use drawkit_core::{Canvas, EngineConfig};
use std::sync::Arc;

/// A canvas drawing into two pixmap surfaces of the given size.
pub fn pixmap_canvas(
    width: u32,
    height: u32,
    text: Option<Arc<TextRenderer>>,
    assets: Arc<DecodingAssets>,
    config: EngineConfig,
) -> RenderResult<Canvas> {
    let main = PixmapSurface::new(width, height)?.with_text(text.clone());
    let overlay = PixmapSurface::new(width, height)?.with_text(text);
    log::info!("Created {}x{} pixmap canvas", width, height);
    Ok(Canvas::with_config(Box::new(main), Box::new(overlay), assets, config))
}
