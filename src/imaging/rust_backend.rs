//! Pure Rust decoding backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format`, falling back to the declared media type |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | Extension → media type | [`media_type_for_extension`] |

use super::backend::{DecodeError, DecodedImage, ImageDecoder};
use image::{ImageError, ImageFormat};

/// Formats whose decoders are compiled in, with their extensions and media types.
const FORMAT_CANDIDATES: &[(&str, &str, ImageFormat)] = &[
    ("jpg", "image/jpeg", ImageFormat::Jpeg),
    ("jpeg", "image/jpeg", ImageFormat::Jpeg),
    ("png", "image/png", ImageFormat::Png),
    ("gif", "image/gif", ImageFormat::Gif),
    ("tif", "image/tiff", ImageFormat::Tiff),
    ("tiff", "image/tiff", ImageFormat::Tiff),
    ("webp", "image/webp", ImageFormat::WebP),
];

/// Media type for a file extension, case-insensitive. `None` when unknown.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    FORMAT_CANDIDATES
        .iter()
        .find(|(candidate, _, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, media_type, _)| *media_type)
}

/// Media type of a payload judged by its magic bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|fmt| fmt.to_mime_type())
}

/// Decoder built on the `image` crate.
///
/// The payload's magic bytes win over the declared media type: files dropped
/// from a desktop often carry a type derived from a wrong extension.
pub struct RustDecoder;

impl RustDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_format(bytes: &[u8], media_type: &str) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_mime_type(media_type))
        .filter(|fmt| fmt.reading_enabled())
}

impl ImageDecoder for RustDecoder {
    fn decode(&self, bytes: &[u8], media_type: &str) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let format = detect_format(bytes, media_type).ok_or(DecodeError::UnknownFormat)?;
        let pixels = image::load_from_memory_with_format(bytes, format).map_err(|e| match e {
            ImageError::Unsupported(_) => DecodeError::UnknownFormat,
            other => DecodeError::Malformed(other.to_string()),
        })?;
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(DecodeError::ZeroSized);
        }
        Ok(DecodedImage::new(&pixels))
    }
}
