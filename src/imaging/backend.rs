//! Image decoding backend trait and shared types.
//!
//! The [`ImageDecoder`] trait turns an encoded payload into a displayable
//! [`DecodedImage`]. The production implementation is
//! [`RustDecoder`](super::rust_backend::RustDecoder), built on the `image`
//! crate. Decoding runs on tokio's blocking pool, so implementations must be
//! `Send + Sync`.

use crate::types::Size;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("decoding failed: {0}")]
    Malformed(String),
    #[error("image has zero width or height")]
    ZeroSized,
}

/// Natural pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn size(self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Outcome of a successful decode. The pixels themselves are dropped once
/// decoding has proven the payload readable; the surface draws the encoded
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub dimensions: Dimensions,
}

impl DecodedImage {
    pub fn new(pixels: &DynamicImage) -> Self {
        Self {
            dimensions: Dimensions {
                width: pixels.width(),
                height: pixels.height(),
            },
        }
    }
}

/// Trait for image decoders.
pub trait ImageDecoder: Send + Sync {
    /// Decode an encoded payload. `media_type` is the declared type of the
    /// source and may be used as a format hint.
    fn decode(&self, bytes: &[u8], media_type: &str) -> Result<DecodedImage, DecodeError>;
}
