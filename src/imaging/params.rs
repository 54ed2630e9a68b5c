//! Parameter types produced by the fit calculations.
//!
//! These structs describe *where* an image sits, not how it got there. The
//! [`calculations`](super::calculations) module produces them and the
//! ingestion pipeline stores them on each [`Image`](crate::frame::Image).
//!
//! ## Types
//!
//! - [`Placement`]: uniform scale, center point and optional clip rectangle of an image.
//! - [`CoverFit`]: the full result of a cover fit, including the scaled size.
//! - [`Crop`]: how much of the scaled image the clip hides on each axis.

use crate::types::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Where an image is drawn on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Uniform scale applied to the natural size.
    pub scale: f64,
    /// Center of the scaled image in surface coordinates.
    pub center: Point,
    /// Absolute, unrotated clip rectangle. `None` draws the whole image.
    pub clip: Option<Rect>,
}

impl Placement {
    /// Natural size, centered at `center`, unclipped.
    pub fn natural(center: Point) -> Self {
        Self {
            scale: 1.0,
            center,
            clip: None,
        }
    }

    /// Top-left corner of the scaled image for a given natural size.
    pub fn origin(&self, natural: Size) -> Point {
        let scaled = natural.scaled(self.scale);
        Point::new(
            self.center.x - scaled.width / 2.0,
            self.center.y - scaled.height / 2.0,
        )
    }
}

/// Result of fitting an image into a frame so that it covers it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverFit {
    pub scale: f64,
    /// Natural size times `scale`.
    pub scaled: Size,
    pub center: Point,
    /// The frame's rectangle.
    pub clip: Rect,
}

impl CoverFit {
    pub fn placement(&self) -> Placement {
        Placement {
            scale: self.scale,
            center: self.center,
            clip: Some(self.clip),
        }
    }

    /// Overflow hidden by the clip, in scaled pixels.
    pub fn crop(&self) -> Crop {
        Crop {
            horizontal: (self.scaled.width - self.clip.width).max(0.0),
            vertical: (self.scaled.height - self.clip.height).max(0.0),
        }
    }
}

/// Total overflow per axis. Half of it is hidden on each side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Crop {
    pub horizontal: f64,
    pub vertical: f64,
}
