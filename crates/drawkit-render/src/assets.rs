//! Asset resolver that decodes inline images.

use crate::codec;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use drawkit_core::assets::{AssetResolver, MemoryAssets};
use drawkit_core::shapes::ImageSource;
use drawkit_core::surface::RasterImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Decoded inline images are cached by their base64 payload.
#[derive(Default)]
pub struct DecodingAssets {
    named: MemoryAssets,
    decoded: Mutex<HashMap<String, Option<Arc<RasterImage>>>>,
}

impl DecodingAssets {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register pixels under an asset key.
    pub fn insert(&self, key: impl Into<String>, image: RasterImage) {
        self.named.insert(key, image);
    }

    /// Decode encoded bytes and register them under an asset key.
    pub fn insert_encoded(&self, key: impl Into<String>, bytes: &[u8]) -> crate::RenderResult<()> {
        let image = codec::decode(bytes)?;
        self.named.insert(key, image);
        Ok(())
    }

    fn decode_inline(data_base64: &str) -> Option<Arc<RasterImage>> {
        let bytes = match STANDARD.decode(data_base64) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Invalid base64 image data: {}", e);
                return None;
            }
        };
        match codec::decode(&bytes) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

impl AssetResolver for DecodingAssets {
    fn resolve(&self, source: &ImageSource) -> Option<Arc<RasterImage>> {
        match source {
            ImageSource::Asset(_) => self.named.resolve(source),
            ImageSource::Inline { data_base64, .. } => {
                let mut decoded = match self.decoded.lock() {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        log::warn!("Image cache lock poisoned: {}", e);
                        return Self::decode_inline(data_base64);
                    }
                };
                // Failures are cached too so a broken image is reported once.
                decoded.entry(data_base64.clone()).or_insert_with(|| Self::decode_inline(data_base64)).clone()
            }
        }
    }
}
