//! Input adapters: file selection, drag-and-drop and clipboard paste.
//!
//! Each adapter turns an external event into a call to
//! [`Canvas::ingest_from_binary`] with a resolved target:
//!
//! | Channel | Target |
//! |---|---|
//! | File picker | the activated frame |
//! | Drop | the frame under the drop point, else none |
//! | Paste | the selected frame, else none |
//!
//! Untargeted images end up centered on the surface, not at the drop point.

use crate::canvas::Canvas;
use crate::config::InputConfig;
use crate::frame::ImageHandle;
use crate::ingest::{ImageSource, is_image_type};
use crate::surface::{RenderSurface, Visual};
use crate::types::{FrameId, Point};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PickError {
    #[error("file picker unavailable: {0}")]
    Unavailable(String),
    #[error("could not read chosen file: {0}")]
    Io(#[from] std::io::Error),
}

/// A single-use file selection dialog.
///
/// Controls are created per activation and dropped when the activation ends,
/// whether a file was chosen, the dialog was cancelled or it failed.
#[async_trait(?Send)]
pub trait PickerControl {
    /// `Ok(None)` means the user cancelled.
    async fn choose(&mut self) -> Result<Option<ImageSource>, PickError>;
}

pub trait FilePicker {
    type Control: PickerControl;

    /// `accept` is a media type filter such as `image/*`.
    fn create_control(&self, accept: &str) -> Self::Control;
}

/// Detects two activations of one frame within a time window.
#[derive(Debug, Clone)]
pub struct ActivationTracker {
    window: Duration,
    last: Option<(FrameId, Instant)>,
}

impl ActivationTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Record an activation. Returns `true` when it completes a double
    /// activation; the pair is then consumed.
    pub fn register(&mut self, frame: FrameId, at: Instant) -> bool {
        let double = matches!(
            self.last,
            Some((prev, when)) if prev == frame && at.saturating_duration_since(when) <= self.window
        );
        self.last = if double { None } else { Some((frame, at)) };
        double
    }
}

/// The element that accepts dropped files.
#[derive(Debug, Clone, PartialEq)]
pub struct DropZone {
    pub name: String,
    pub hovered: bool,
    pub opacity: f64,
}

/// What the host should do with a drag event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResponse {
    /// `true` when the event was consumed and the host default (opening the
    /// file) must be suppressed.
    pub prevent_default: bool,
}

/// One item read from the clipboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ClipboardEntry {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InputState {
    drop_zone: Option<DropZone>,
    paste_enabled: bool,
    activation: ActivationTracker,
    hover_opacity: f64,
    accept: String,
}

impl InputState {
    pub(crate) fn new(config: &InputConfig) -> Self {
        Self {
            drop_zone: None,
            paste_enabled: false,
            activation: ActivationTracker::new(Duration::from_millis(config.double_activation_ms)),
            hover_opacity: config.drag_hover_opacity,
            accept: config.accept.clone(),
        }
    }

    fn set_hover(&mut self, hovered: bool) -> DragResponse {
        let hover_opacity = self.hover_opacity;
        match self.drop_zone.as_mut() {
            Some(zone) => {
                zone.hovered = hovered;
                zone.opacity = if hovered { hover_opacity } else { 1.0 };
                DragResponse {
                    prevent_default: true,
                }
            }
            None => DragResponse {
                prevent_default: false,
            },
        }
    }
}

impl<S: RenderSurface> Canvas<S> {
    // =========================================================================
    // File selection
    // =========================================================================

    /// Feed a primary activation (click, tap) on a frame. A second activation
    /// on the same frame within `input.double_activation_ms` opens the file
    /// picker for it.
    pub async fn activate_frame<P: FilePicker>(
        &self,
        frame: FrameId,
        at: Instant,
        picker: &P,
    ) -> Option<ImageHandle> {
        let double = self.input.borrow_mut().activation.register(frame, at);
        if !double {
            return None;
        }
        debug!(%frame, "double activation");
        self.open_file_picker(frame, picker).await
    }

    /// Run one file selection for `frame` and ingest the chosen file.
    pub async fn open_file_picker<P: FilePicker>(
        &self,
        frame: FrameId,
        picker: &P,
    ) -> Option<ImageHandle> {
        let accept = self.input.borrow().accept.clone();
        let chosen = {
            let mut control = picker.create_control(&accept);
            control.choose().await
        };
        match chosen {
            Ok(Some(source)) => self.ingest_from_binary(source, Some(frame)).await,
            Ok(None) => {
                debug!(%frame, "file selection cancelled");
                None
            }
            Err(e) => {
                warn!(%frame, error = %e, "file selection failed");
                None
            }
        }
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Start accepting drops on the named zone (`"canvas"` by default).
    pub fn enable_drag_and_drop(&self, zone: Option<&str>) {
        let name = zone.unwrap_or("canvas").to_string();
        debug!(zone = %name, "drag and drop enabled");
        self.input.borrow_mut().drop_zone = Some(DropZone {
            name,
            hovered: false,
            opacity: 1.0,
        });
    }

    pub fn disable_drag_and_drop(&self) {
        self.input.borrow_mut().drop_zone = None;
    }

    pub fn drop_zone(&self) -> Option<DropZone> {
        self.input.borrow().drop_zone.clone()
    }

    pub fn drag_over(&self) -> DragResponse {
        self.input.borrow_mut().set_hover(true)
    }

    pub fn drag_leave(&self) -> DragResponse {
        self.input.borrow_mut().set_hover(false)
    }

    /// Handle dropped files at a client-space point. Only the first file is
    /// used. Ignored while drag-and-drop is disabled.
    pub async fn drop_files(&self, client: Point, files: Vec<ImageSource>) -> Option<ImageHandle> {
        if !self.input.borrow_mut().set_hover(false).prevent_default {
            debug!("drop ignored, drag and drop disabled");
            return None;
        }
        let file = files.into_iter().next()?;
        let target = self.resolve_drop_target(client);
        debug!(source = %file.name, ?target, "file dropped");
        self.ingest_from_binary(file, target).await
    }

    /// The frame under a client-space point, if any.
    pub fn resolve_drop_target(&self, client: Point) -> Option<FrameId> {
        let local = self.surface.borrow().client_to_local(client);
        self.registry.borrow().lookup(local)
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    pub fn enable_clipboard_paste(&self) {
        self.input.borrow_mut().paste_enabled = true;
    }

    pub fn disable_clipboard_paste(&self) {
        self.input.borrow_mut().paste_enabled = false;
    }

    pub fn clipboard_paste_enabled(&self) -> bool {
        self.input.borrow().paste_enabled
    }

    /// The selected frame, if the surface's active object is one.
    pub fn resolve_paste_target(&self) -> Option<FrameId> {
        match self.surface.borrow().active_object() {
            Some(Visual::Frame(id)) if self.registry.borrow().contains(id) => Some(id),
            _ => None,
        }
    }

    /// Handle a paste. The first image entry is ingested; everything else is
    /// ignored.
    pub async fn paste(&self, entries: Vec<ClipboardEntry>) -> Option<ImageHandle> {
        if !self.clipboard_paste_enabled() {
            return None;
        }
        let entry = entries
            .into_iter()
            .find(|entry| is_image_type(&entry.media_type))?;
        let target = self.resolve_paste_target();
        debug!(media_type = %entry.media_type, ?target, "image pasted");
        self.ingest_from_binary(
            ImageSource::new("clipboard", entry.media_type, entry.bytes),
            target,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::fetch::tests::MockFetcher;
    use crate::frame::FrameOptions;
    use crate::imaging::RustDecoder;
    use crate::surface::SceneSurface;
    use crate::test_helpers::{png_bytes, png_source, test_canvas};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;

    enum Outcome {
        Choose(ImageSource),
        Cancel,
        Fail,
    }

    /// Picker that counts the controls it creates and how many were dropped.
    struct ScriptedPicker {
        outcome: RefCell<Option<Outcome>>,
        created: Rc<Cell<usize>>,
        dropped: Rc<Cell<usize>>,
        accepts: RefCell<Vec<String>>,
    }

    impl ScriptedPicker {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome: RefCell::new(Some(outcome)),
                created: Rc::new(Cell::new(0)),
                dropped: Rc::new(Cell::new(0)),
                accepts: RefCell::new(Vec::new()),
            }
        }
    }

    struct ScriptedControl {
        outcome: Option<Outcome>,
        dropped: Rc<Cell<usize>>,
    }

    impl Drop for ScriptedControl {
        fn drop(&mut self) {
            self.dropped.set(self.dropped.get() + 1);
        }
    }

    #[async_trait(?Send)]
    impl PickerControl for ScriptedControl {
        async fn choose(&mut self) -> Result<Option<ImageSource>, PickError> {
            match self.outcome.take() {
                Some(Outcome::Choose(source)) => Ok(Some(source)),
                Some(Outcome::Fail) => Err(PickError::Unavailable("no display".into())),
                Some(Outcome::Cancel) | None => Ok(None),
            }
        }
    }

    impl FilePicker for ScriptedPicker {
        type Control = ScriptedControl;

        fn create_control(&self, accept: &str) -> ScriptedControl {
            self.created.set(self.created.get() + 1);
            self.accepts.borrow_mut().push(accept.to_string());
            ScriptedControl {
                outcome: self.outcome.borrow_mut().take(),
                dropped: Rc::clone(&self.dropped),
            }
        }
    }

    // =========================================================================
    // Activation tracking
    // =========================================================================

    #[test]
    fn double_activation_within_window() {
        let mut tracker = ActivationTracker::new(Duration::from_millis(400));
        let t0 = Instant::now();
        assert!(!tracker.register(FrameId(1), t0));
        assert!(tracker.register(FrameId(1), t0 + Duration::from_millis(200)));
        // The pair was consumed; a third click starts over.
        assert!(!tracker.register(FrameId(1), t0 + Duration::from_millis(300)));
    }

    #[test]
    fn slow_or_split_activations_do_not_count() {
        let mut tracker = ActivationTracker::new(Duration::from_millis(400));
        let t0 = Instant::now();
        assert!(!tracker.register(FrameId(1), t0));
        assert!(!tracker.register(FrameId(1), t0 + Duration::from_millis(900)));
        assert!(!tracker.register(FrameId(2), t0 + Duration::from_millis(1000)));
        assert!(!tracker.register(FrameId(1), t0 + Duration::from_millis(1100)));
    }

    // =========================================================================
    // File selection
    // =========================================================================

    #[tokio::test]
    async fn double_activation_opens_picker_and_ingests() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        let picker = ScriptedPicker::new(Outcome::Choose(png_source(30, 10)));
        let t0 = Instant::now();

        assert!(canvas.activate_frame(frame, t0, &picker).await.is_none());
        assert_eq!(picker.created.get(), 0);

        let handle = canvas
            .activate_frame(frame, t0 + Duration::from_millis(100), &picker)
            .await
            .unwrap();

        assert_eq!(handle.frame, Some(frame));
        assert_eq!(picker.created.get(), 1);
        assert_eq!(picker.dropped.get(), 1);
        assert_eq!(picker.accepts.borrow().as_slice(), &["image/*".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_selection_releases_control() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        let picker = ScriptedPicker::new(Outcome::Cancel);

        assert!(canvas.open_file_picker(frame, &picker).await.is_none());

        assert_eq!(picker.created.get(), 1);
        assert_eq!(picker.dropped.get(), 1);
        assert!(canvas.registry().get(frame).unwrap().placeholder_visible());
    }

    #[tokio::test]
    async fn failed_selection_releases_control() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        let picker = ScriptedPicker::new(Outcome::Fail);

        assert!(canvas.open_file_picker(frame, &picker).await.is_none());
        assert_eq!(picker.created.get(), picker.dropped.get());
    }

    #[tokio::test]
    async fn each_selection_gets_its_own_control() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        let picker = ScriptedPicker::new(Outcome::Cancel);

        canvas.open_file_picker(frame, &picker).await;
        canvas.open_file_picker(frame, &picker).await;

        assert_eq!(picker.created.get(), 2);
        assert_eq!(picker.dropped.get(), 2);
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    #[test]
    fn drag_hover_toggles_zone_opacity() {
        let canvas = test_canvas();
        canvas.enable_drag_and_drop(None);

        assert!(canvas.drag_over().prevent_default);
        let zone = canvas.drop_zone().unwrap();
        assert_eq!(zone.name, "canvas");
        assert!(zone.hovered);
        assert_eq!(zone.opacity, 0.5);

        assert!(canvas.drag_leave().prevent_default);
        let zone = canvas.drop_zone().unwrap();
        assert!(!zone.hovered);
        assert_eq!(zone.opacity, 1.0);
    }

    #[test]
    fn disabled_drag_events_are_not_consumed() {
        let canvas = test_canvas();
        assert!(!canvas.drag_over().prevent_default);
        canvas.enable_drag_and_drop(Some("board"));
        canvas.disable_drag_and_drop();
        assert!(!canvas.drag_over().prevent_default);
        assert!(canvas.drop_zone().is_none());
    }

    #[tokio::test]
    async fn drop_inside_frame_targets_it() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        canvas.enable_drag_and_drop(None);
        canvas.drag_over();

        let handle = canvas
            .drop_files(Point::new(300.0, 250.0), vec![png_source(40, 20)])
            .await
            .unwrap();

        assert_eq!(handle.frame, Some(frame));
        assert!(!canvas.drop_zone().unwrap().hovered);
    }

    #[tokio::test]
    async fn drop_outside_frames_is_centered_on_surface() {
        let canvas = test_canvas();
        canvas.create_frame(FrameOptions::default());
        canvas.enable_drag_and_drop(None);

        let handle = canvas
            .drop_files(Point::new(1000.0, 700.0), vec![png_source(40, 20)])
            .await
            .unwrap();

        assert_eq!(handle.frame, None);
        assert_eq!(handle.placement.center, Point::new(600.0, 400.0));
    }

    #[tokio::test]
    async fn drop_uses_only_first_file() {
        let canvas = test_canvas();
        canvas.enable_drag_and_drop(None);

        canvas
            .drop_files(
                Point::new(0.0, 0.0),
                vec![png_source(4, 4), png_source(8, 8)],
            )
            .await
            .unwrap();

        assert_eq!(canvas.free_images().len(), 1);
    }

    #[test]
    fn drop_maps_client_point_through_viewport() {
        let canvas = Canvas::with_backends(
            SceneSurface::new(1200.0, 800.0).with_viewport(Point::new(100.0, 100.0), 2.0),
            CanvasConfig::default(),
            Arc::new(RustDecoder::new()),
            Box::new(MockFetcher::new()),
        );
        let frame = canvas.create_frame(FrameOptions::default());

        // Client (800, 600) is local (350, 250) with this viewport.
        assert_eq!(canvas.resolve_drop_target(Point::new(800.0, 600.0)), Some(frame));
        assert_eq!(canvas.resolve_drop_target(Point::new(100.0, 100.0)), None);
    }

    #[tokio::test]
    async fn drop_while_disabled_is_ignored() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());

        assert!(
            canvas
                .drop_files(Point::new(300.0, 250.0), vec![png_source(4, 4)])
                .await
                .is_none()
        );
        assert!(canvas.registry().get(frame).unwrap().image().is_none());
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    #[tokio::test]
    async fn paste_targets_selected_frame() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        canvas.surface_mut().set_active(Some(Visual::Frame(frame)));
        canvas.enable_clipboard_paste();

        let handle = canvas
            .paste(vec![
                ClipboardEntry::new("text/plain", b"caption".to_vec()),
                ClipboardEntry::new("image/png", png_bytes(16, 16)),
            ])
            .await
            .unwrap();

        assert_eq!(handle.frame, Some(frame));
        let registry = canvas.registry();
        assert_eq!(registry.get(frame).unwrap().image().unwrap().name(), "clipboard");
    }

    #[tokio::test]
    async fn paste_without_selection_is_untargeted() {
        let canvas = test_canvas();
        let frame = canvas.create_frame(FrameOptions::default());
        canvas.surface_mut().set_active(Some(Visual::Placeholder(frame)));
        canvas.enable_clipboard_paste();

        let handle = canvas
            .paste(vec![ClipboardEntry::new("image/png", png_bytes(16, 16))])
            .await
            .unwrap();

        assert_eq!(handle.frame, None);
        assert!(canvas.registry().get(frame).unwrap().image().is_none());
    }

    #[tokio::test]
    async fn paste_ignores_non_image_entries() {
        let canvas = test_canvas();
        canvas.enable_clipboard_paste();
        let renders = canvas.surface().render_count();

        assert!(
            canvas
                .paste(vec![ClipboardEntry::new("text/html", b"<b>hi</b>".to_vec())])
                .await
                .is_none()
        );
        assert_eq!(canvas.surface().render_count(), renders);
    }

    #[tokio::test]
    async fn paste_while_disabled_is_ignored() {
        let canvas = test_canvas();
        canvas.enable_clipboard_paste();
        canvas.disable_clipboard_paste();

        assert!(
            canvas
                .paste(vec![ClipboardEntry::new("image/png", png_bytes(4, 4))])
                .await
                .is_none()
        );
        assert!(canvas.free_images().is_empty());
    }
}
