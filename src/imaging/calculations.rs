//! Pure calculation functions for fitting images into frames.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CoverFit;
use crate::types::{Rect, Size};

/// Uniform scale that makes `image` cover `frame` completely.
///
/// When the image is proportionally wider than the frame, matching the
/// frame's height makes the scaled width at least the frame's width, so the
/// height fits exactly and the width overflows. The taller case is symmetric.
///
/// # Examples
/// ```
/// # use framefill::imaging::calculate_cover_scale;
/// use framefill::types::Size;
/// // 800x400 into 300x200: wider, so height matches → 200 / 400
/// assert_eq!(calculate_cover_scale(Size::new(800.0, 400.0), Size::new(300.0, 200.0)), 0.5);
///
/// // 400x800 into 300x200: taller, so width matches → 300 / 400
/// assert_eq!(calculate_cover_scale(Size::new(400.0, 800.0), Size::new(300.0, 200.0)), 0.75);
/// ```
pub fn calculate_cover_scale(image: Size, frame: Size) -> f64 {
    if image.aspect() > frame.aspect() {
        frame.height / image.height
    } else {
        frame.width / image.width
    }
}

/// Dimensions needed to fill a target area while keeping the source aspect ratio.
///
/// One dimension matches the target exactly, the other may exceed it.
pub fn calculate_fill_dimensions(source: Size, target: Size) -> Size {
    source.scaled(calculate_cover_scale(source, target))
}

/// Cover-fit an image of natural size `image` into the frame rectangle.
///
/// The scaled image is centered on the frame and clipped to the frame's
/// axis-aligned bounds in absolute surface coordinates. Calling this again
/// with the same inputs yields the same fit.
pub fn calculate_cover_fit(image: Size, frame: Rect) -> CoverFit {
    let scale = calculate_cover_scale(image, frame.size());
    CoverFit {
        scale,
        scaled: image.scaled(scale),
        center: frame.center(),
        clip: frame,
    }
}
