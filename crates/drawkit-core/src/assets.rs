//! Resolution of image sources to decoded rasters.

use crate::shapes::ImageSource;
use crate::surface::RasterImage;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Turns an [`ImageSource`] into pixels.
///
/// Resolvers are shared by the engine and every drawable that paints an
/// image, so implementations cache internally.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, source: &ImageSource) -> Option<Arc<RasterImage>>;
}

/// Resolver backed by pre-decoded rasters registered under asset keys.
///
/// Inline sources need a decoder and are not resolved here.
#[derive(Default)]
pub struct MemoryAssets {
    images: RwLock<HashMap<String, Arc<RasterImage>>>,
}

impl MemoryAssets {
    /// Empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `key`, replacing any previous image.
    pub fn insert(&self, key: impl Into<String>, image: RasterImage) {
        match self.images.write() {
            Ok(mut images) => {
                images.insert(key.into(), Arc::new(image));
            }
            Err(e) => log::warn!("Asset cache lock poisoned: {}", e),
        }
    }

    /// Number of registered images.
    pub fn len(&self) -> usize {
        self.images.read().map(|images| images.len()).unwrap_or(0)
    }

    /// True when no image is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve(&self, source: &ImageSource) -> Option<Arc<RasterImage>> {
        match source {
            ImageSource::Asset(key) => {
                let found = self.images.read().ok()?.get(key).cloned();
                if found.is_none() {
                    log::debug!("Unknown image asset: {}", key);
                }
                found
            }
            ImageSource::Inline { .. } => {
                log::debug!("Inline image sources need a decoding resolver");
                None
            }
        }
    }
}

/// Resolver that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _source: &ImageSource) -> Option<Arc<RasterImage>> {
        None
    }
}
