//! High-level image operations.
//!
//! These functions combine calculations with the decoded image types. They
//! take decoded dimensions and surface geometry and return placements.

use super::backend::Dimensions;
use super::calculations::calculate_cover_fit;
use super::params::{CoverFit, Placement};
use crate::types::{Point, Rect, Size};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Cover-fit decoded dimensions into a frame rectangle.
pub fn fit_to_frame(dims: Dimensions, frame: Rect) -> CoverFit {
    calculate_cover_fit(dims.size(), frame)
}

/// Placement for an image that belongs to no frame: natural size, centered
/// on the surface.
pub fn center_on_surface(surface: Size) -> Placement {
    Placement::natural(Point::new(surface.width / 2.0, surface.height / 2.0))
}

/// Encode a payload as a `data:` URI.
pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}
