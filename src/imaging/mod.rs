//! Image handling: decoding and cover-fit geometry.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Cover fit** | [`calculate_cover_fit`] |
//! | **Data URI** | `base64` standard engine |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit math (unit testable)
//! - **Parameters**: Data structures describing where an image is drawn
//! - **Backend**: [`ImageDecoder`] trait + [`RustDecoder`]
//! - **Operations**: High-level functions combining calculations + decoded images

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{DecodeError, DecodedImage, Dimensions, ImageDecoder};
pub use calculations::{calculate_cover_fit, calculate_cover_scale, calculate_fill_dimensions};
pub use operations::{center_on_surface, encode_data_uri, fit_to_frame};
pub use params::{CoverFit, Crop, Placement};
pub use rust_backend::{RustDecoder, media_type_for_extension, sniff_media_type};
