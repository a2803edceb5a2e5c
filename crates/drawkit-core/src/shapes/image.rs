//! Image sources for image figures.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }
}

/// Where an image figure gets its pixels from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Encoded bytes stored with the drawable.
    Inline {
        format: ImageFormat,
        /// Base64 of the encoded bytes.
        data_base64: String,
        source_width: u32,
        source_height: u32,
    },
    /// Key understood by the engine's asset resolver.
    Asset(String),
}

impl ImageSource {
    /// Create an inline source from raw encoded bytes.
    pub fn inline(format: ImageFormat, data: &[u8], source_width: u32, source_height: u32) -> Self {
        ImageSource::Inline { format, data_base64: STANDARD.encode(data), source_width, source_height }
    }

    /// Decode the base64 payload of an inline source.
    pub fn data(&self) -> Option<Vec<u8>> {
        match self {
            ImageSource::Inline { data_base64, .. } => STANDARD.decode(data_base64).ok(),
            ImageSource::Asset(_) => None,
        }
    }

    /// Intrinsic pixel size, when known without decoding.
    pub fn source_size(&self) -> Option<(u32, u32)> {
        match self {
            ImageSource::Inline { source_width, source_height, .. } => Some((*source_width, *source_height)),
            ImageSource::Asset(_) => None,
        }
    }

    /// Check that an inline payload is valid base64 in the declared format.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ImageSource::Inline { format, data_base64, .. } => {
                let bytes = STANDARD.decode(data_base64).map_err(|e| format!("invalid base64 image data: {e}"))?;
                match ImageFormat::from_magic_bytes(&bytes) {
                    Some(detected) if detected == *format => Ok(()),
                    Some(detected) => Err(format!("image data is {detected:?}, declared {format:?}")),
                    None => Err("unrecognized image data".to_string()),
                }
            }
            ImageSource::Asset(key) if key.is_empty() => Err("empty asset key".to_string()),
            ImageSource::Asset(_) => Ok(()),
        }
    }
}

/// Largest size with the source's aspect ratio that fits in `max_width` x `max_height`.
pub fn fit_within(source_width: f64, source_height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if source_width <= 0.0 || source_height <= 0.0 || max_width <= 0.0 || max_height <= 0.0 {
        return (max_width.max(0.0), max_height.max(0.0));
    }
    let aspect = source_width / source_height;
    let target_aspect = max_width / max_height;

    if aspect > target_aspect {
        // Image is wider than target - fit to width
        (max_width, max_width / aspect)
    } else {
        (max_height * aspect, max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(&[0x00]), None);
    }

    #[test]
    fn test_inline_roundtrip_and_validate() {
        let bytes = [0x89, 0x50, 0x4E, 0x47, 1, 2, 3];
        let source = ImageSource::inline(ImageFormat::Png, &bytes, 10, 20);
        assert_eq!(source.data().as_deref(), Some(&bytes[..]));
        assert_eq!(source.source_size(), Some((10, 20)));
        assert!(source.validate().is_ok());

        let wrong = ImageSource::inline(ImageFormat::Jpeg, &bytes, 10, 20);
        assert!(wrong.validate().is_err());
        assert!(ImageSource::Asset(String::new()).validate().is_err());
    }

    #[test]
    fn test_fit_within() {
        let (w, h) = fit_within(200.0, 100.0, 100.0, 100.0);
        assert!((w - 100.0).abs() < f64::EPSILON);
        assert!((h - 50.0).abs() < f64::EPSILON);
        let (w, h) = fit_within(100.0, 400.0, 100.0, 100.0);
        assert!((w - 25.0).abs() < f64::EPSILON);
        assert!((h - 100.0).abs() < f64::EPSILON);
    }
}
