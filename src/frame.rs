//! Frames, placeholders and the images they hold.
//!
//! A [`FrameRecord`] ties together a [`Frame`] (geometry + style), an
//! optional [`Placeholder`] and at most one [`Image`]. The record's methods
//! are the only way to attach or detach an image, so the placeholder's
//! visibility always mirrors the absence of an image.

use crate::imaging::{Dimensions, Placement};
use crate::types::{FrameId, ImageId, Point, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Drop shadow drawn under a frame card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Shadow {
    /// CSS color.
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "rgba(0, 0, 0, 0.15)".to_string(),
            blur: 12.0,
            offset_x: 0.0,
            offset_y: 4.0,
        }
    }
}

/// Card styling and interaction locks for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub corner_radius: f64,
    pub shadow: Shadow,
    /// Rotation keeps the aspect ratio fixed.
    pub lock_rotation: bool,
    pub lock_movement_x: bool,
    pub lock_movement_y: bool,
    pub resizable: bool,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            fill: "#ffffff".to_string(),
            stroke: "#d4d4d8".to_string(),
            stroke_width: 1.0,
            corner_radius: 12.0,
            shadow: Shadow::default(),
            lock_rotation: true,
            lock_movement_x: false,
            lock_movement_y: false,
            resizable: true,
        }
    }
}

/// A rectangle that can host one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    geometry: Rect,
    style: FrameStyle,
}

impl Frame {
    pub fn new(geometry: Rect, style: FrameStyle) -> Self {
        Self { geometry, style }
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn style(&self) -> &FrameStyle {
        &self.style
    }

    pub(crate) fn set_position(&mut self, left: f64, top: f64) {
        self.geometry.left = left;
        self.geometry.top = top;
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.geometry.width = width;
        self.geometry.height = height;
    }
}

/// The "add image" text shown while a frame is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub label: String,
    pub center: Point,
    pub visible: bool,
}

impl Placeholder {
    pub fn centered_in(label: impl Into<String>, frame: Rect) -> Self {
        Self {
            label: label.into(),
            center: frame.center(),
            visible: true,
        }
    }

    pub fn recenter(&mut self, frame: Rect) {
        self.center = frame.center();
    }
}

/// Options for [`Canvas::create_frame`](crate::canvas::Canvas::create_frame).
///
/// Unset fields fall back to the canvas' configured frame defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameOptions {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub label: Option<String>,
    /// Skip the placeholder entirely.
    pub no_placeholder: bool,
}

impl FrameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = Some(left);
        self.top = Some(top);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn without_placeholder(mut self) -> Self {
        self.no_placeholder = true;
        self
    }
}

/// A decoded image placed on the surface.
#[derive(Debug, Clone)]
pub struct Image {
    id: ImageId,
    name: String,
    media_type: String,
    data_uri: Arc<str>,
    natural: Dimensions,
    placement: Placement,
}

impl Image {
    pub(crate) fn new(
        id: ImageId,
        name: String,
        media_type: String,
        data_uri: String,
        natural: Dimensions,
        placement: Placement,
    ) -> Self {
        Self {
            id,
            name,
            media_type,
            data_uri: data_uri.into(),
            natural,
            placement,
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn natural(&self) -> Dimensions {
        self.natural
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    /// A lightweight, detached description of this image.
    pub fn handle(&self, frame: Option<FrameId>) -> ImageHandle {
        ImageHandle {
            id: self.id,
            frame,
            natural: self.natural,
            placement: self.placement,
        }
    }
}

/// What a successful ingestion resolves with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageHandle {
    pub id: ImageId,
    /// The frame holding the image, `None` for a free image.
    pub frame: Option<FrameId>,
    pub natural: Dimensions,
    pub placement: Placement,
}

/// Registry entry for one frame.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    id: FrameId,
    frame: Frame,
    image: Option<Image>,
    placeholder: Option<Placeholder>,
    version: u64,
    committed: u64,
}

impl FrameRecord {
    pub fn new(id: FrameId, frame: Frame, placeholder: Option<Placeholder>) -> Self {
        Self {
            id,
            frame,
            image: None,
            placeholder,
            version: 0,
            committed: 0,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn geometry(&self) -> Rect {
        self.frame.geometry()
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    /// Whether the placeholder is currently shown. `false` without one.
    pub fn placeholder_visible(&self) -> bool {
        self.placeholder.as_ref().is_some_and(|p| p.visible)
    }

    /// Token of the most recently started ingestion.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Token of the ingestion whose image the frame currently shows, or of
    /// the last one that did. `0` before any commit.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Start a new ingestion: bump and return the token.
    pub(crate) fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Whether ingestion `ticket` may still commit: no ingestion started
    /// after it has committed yet. Failed ingestions never commit, so they
    /// cannot shut out an older one.
    pub(crate) fn accepts(&self, ticket: u64) -> bool {
        ticket > self.committed
    }

    /// Attach the image produced by ingestion `ticket`, returning the image
    /// it replaced.
    pub(crate) fn commit_image(&mut self, ticket: u64, image: Image) -> Option<Image> {
        self.committed = self.committed.max(ticket);
        self.set_image(image)
    }

    /// Attach `image`, hiding the placeholder. Returns the image it replaced.
    pub(crate) fn set_image(&mut self, image: Image) -> Option<Image> {
        if let Some(placeholder) = self.placeholder.as_mut() {
            placeholder.visible = false;
        }
        self.image.replace(image)
    }

    /// Detach the image, showing the placeholder again.
    pub(crate) fn take_image(&mut self) -> Option<Image> {
        let image = self.image.take();
        if let Some(placeholder) = self.placeholder.as_mut() {
            placeholder.visible = true;
        }
        image
    }

    pub(crate) fn image_mut(&mut self) -> Option<&mut Image> {
        self.image.as_mut()
    }

    /// Move the frame and keep the placeholder centered on it.
    pub(crate) fn set_position(&mut self, left: f64, top: f64) {
        self.frame.set_position(left, top);
        self.sync_placeholder();
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.frame.set_size(width, height);
        self.sync_placeholder();
    }

    fn sync_placeholder(&mut self) {
        let geometry = self.frame.geometry();
        if let Some(placeholder) = self.placeholder.as_mut() {
            placeholder.recenter(geometry);
        }
    }
}
