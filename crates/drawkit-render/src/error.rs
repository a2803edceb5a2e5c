//! Render backend errors.

use drawkit_core::surface::SurfaceError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failures of the pixmap backend and its codecs.
pub enum RendererError {
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Image decoding failed: {0}")]
    Decode(String),
    #[error("Image encoding failed: {0}")]
    Encode(String),
    #[error("Font loading failed: {0}")]
    Font(String),
}

pub type RenderResult<T> = Result<T, RendererError>;

impl From<RendererError> for SurfaceError {
    fn from(err: RendererError) -> Self {
        match err {
            RendererError::InvalidDimensions { width, height } => SurfaceError::InvalidDimensions { width, height },
            other => SurfaceError::Encode(other.to_string()),
        }
    }
}
