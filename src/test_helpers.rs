//! Shared test utilities for the framefill test suite.
//!
//! Provides payload generators and ready-made canvases.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let canvas = test_canvas();
//! let frame = canvas.create_frame(FrameOptions::default());
//! canvas.ingest_from_binary(png_source(80, 40), Some(frame)).await;
//! ```

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::fetch::tests::MockFetcher;
use crate::imaging::backend::tests::MockDecoder;
use crate::imaging::{Dimensions, RustDecoder};
use crate::ingest::ImageSource;
use crate::surface::SceneSurface;

// =========================================================================
// Payloads
// =========================================================================

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// A valid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// A valid JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn png_source(width: u32, height: u32) -> ImageSource {
    ImageSource::new(
        format!("{width}x{height}.png"),
        "image/png",
        png_bytes(width, height),
    )
}

// =========================================================================
// Canvases
// =========================================================================

/// 1200x800 canvas with the real decoder and a fetcher that knows no URLs.
pub fn test_canvas() -> Canvas<SceneSurface> {
    Canvas::with_backends(
        SceneSurface::new(1200.0, 800.0),
        CanvasConfig::default(),
        Arc::new(RustDecoder::new()),
        Box::new(MockFetcher::new()),
    )
}

/// 1200x800 canvas whose decoder reports `dims` in order, whatever the bytes.
pub fn mock_canvas(dims: Vec<Dimensions>) -> Canvas<SceneSurface> {
    Canvas::with_backends(
        SceneSurface::new(1200.0, 800.0),
        CanvasConfig::default(),
        Arc::new(MockDecoder::with_dimensions(dims)),
        Box::new(MockFetcher::new()),
    )
}
