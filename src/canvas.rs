//! The canvas controller and frame factory.
//!
//! A [`Canvas`] owns the [`FrameRegistry`], the list of free images and the
//! [`RenderSurface`]. It lives on the UI thread: state sits behind
//! `RefCell`/`Cell`, every method takes `&self`, and the async ingestion
//! methods (see [`ingest`](crate::ingest)) never hold a borrow across an
//! `.await`. Frames are created here; images arrive through the ingestion
//! pipeline and the input adapters in [`input`](crate::input).
//!
//! ```text
//! create_frame ──► FrameRegistry ◄── ingest_* ◄── input adapters
//!      │                 │                │
//!      └──────────► RenderSurface ◄───────┘
//! ```

use crate::config::CanvasConfig;
use crate::fetch::{FetchError, HttpFetcher, RemoteFetcher};
use crate::frame::{Frame, FrameOptions, FrameRecord, Image, Placeholder};
use crate::imaging::{Dimensions, ImageDecoder, Placement, RustDecoder, fit_to_frame};
use crate::input::InputState;
use crate::registry::FrameRegistry;
use crate::surface::{RenderSurface, Visual};
use crate::types::{FrameId, ImageId, Rect, Size};
use serde::Serialize;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("{0} is not registered")]
    MissingFrame(FrameId),
    #[error("frame size must be positive, got {width}x{height}")]
    InvalidGeometry { width: f64, height: f64 },
    #[error("remote fetcher unavailable: {0}")]
    Fetcher(#[from] FetchError),
}

/// Handle returned by [`Canvas::subscribe_geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type GeometryListener = Box<dyn FnMut(FrameId, Rect)>;

pub struct Canvas<S> {
    pub(crate) config: CanvasConfig,
    pub(crate) surface: RefCell<S>,
    pub(crate) registry: RefCell<FrameRegistry>,
    pub(crate) free_images: RefCell<Vec<Image>>,
    pub(crate) decoder: Arc<dyn ImageDecoder>,
    pub(crate) fetcher: Box<dyn RemoteFetcher>,
    pub(crate) input: RefCell<InputState>,
    listeners: RefCell<Vec<(SubscriptionId, GeometryListener)>>,
    /// Listeners taken out of `listeners` while a notification runs.
    notifying: RefCell<Vec<SubscriptionId>>,
    /// Running listeners unsubscribed mid-notification.
    pending_unsubscribes: RefCell<Vec<SubscriptionId>>,
    next_frame_id: Cell<u64>,
    next_image_id: Cell<u64>,
    next_subscription_id: Cell<u64>,
}

impl<S: RenderSurface> Canvas<S> {
    /// Canvas with the `image`-crate decoder and an HTTP fetcher.
    pub fn new(surface: S, config: CanvasConfig) -> Result<Self, CanvasError> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Self::with_backends(
            surface,
            config,
            Arc::new(RustDecoder::new()),
            Box::new(fetcher),
        ))
    }

    pub fn with_backends(
        surface: S,
        config: CanvasConfig,
        decoder: Arc<dyn ImageDecoder>,
        fetcher: Box<dyn RemoteFetcher>,
    ) -> Self {
        let input = InputState::new(&config.input);
        Self {
            config,
            surface: RefCell::new(surface),
            registry: RefCell::new(FrameRegistry::new()),
            free_images: RefCell::new(Vec::new()),
            decoder,
            fetcher,
            input: RefCell::new(input),
            listeners: RefCell::new(Vec::new()),
            notifying: RefCell::new(Vec::new()),
            pending_unsubscribes: RefCell::new(Vec::new()),
            next_frame_id: Cell::new(1),
            next_image_id: Cell::new(1),
            next_subscription_id: Cell::new(1),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn registry(&self) -> Ref<'_, FrameRegistry> {
        self.registry.borrow()
    }

    /// Images that belong to no frame, in ingestion order.
    pub fn free_images(&self) -> Ref<'_, [Image]> {
        Ref::map(self.free_images.borrow(), Vec::as_slice)
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }

    /// Create and register a frame with a centered placeholder.
    ///
    /// Unset options fall back to `config.frames`. Non-positive sizes are
    /// clamped to one pixel.
    pub fn create_frame(&self, options: FrameOptions) -> FrameId {
        let defaults = &self.config.frames;
        let requested = Size::new(
            options.width.unwrap_or(defaults.width),
            options.height.unwrap_or(defaults.height),
        );
        if !requested.is_positive() {
            warn!(
                width = requested.width,
                height = requested.height,
                "non-positive frame size clamped to 1px"
            );
        }

        let geometry = Rect::new(
            options.left.unwrap_or(defaults.left),
            options.top.unwrap_or(defaults.top),
            positive_or_one(requested.width),
            positive_or_one(requested.height),
        );
        let id = FrameId(self.next_frame_id.replace(self.next_frame_id.get() + 1));
        let placeholder = (!options.no_placeholder).then(|| {
            let label = options.label.clone().unwrap_or_else(|| defaults.label.clone());
            Placeholder::centered_in(label, geometry)
        });
        let has_placeholder = placeholder.is_some();

        self.registry.borrow_mut().insert(FrameRecord::new(
            id,
            Frame::new(geometry, defaults.style.clone()),
            placeholder,
        ));

        let mut surface = self.surface.borrow_mut();
        surface.add(Visual::Frame(id));
        if has_placeholder {
            surface.add(Visual::Placeholder(id));
        }
        surface.render_all();
        debug!(frame = %id, ?geometry, "frame created");
        id
    }

    /// Move a frame's top-left corner. The placeholder follows synchronously,
    /// then geometry subscribers are notified.
    pub fn move_frame(&self, id: FrameId, left: f64, top: f64) -> Result<(), CanvasError> {
        let geometry = {
            let mut registry = self.registry.borrow_mut();
            let record = registry.get_mut(id).ok_or(CanvasError::MissingFrame(id))?;
            record.set_position(left, top);
            record.geometry()
        };
        self.geometry_changed(id, geometry);
        Ok(())
    }

    pub fn resize_frame(&self, id: FrameId, width: f64, height: f64) -> Result<(), CanvasError> {
        if !Size::new(width, height).is_positive() {
            return Err(CanvasError::InvalidGeometry { width, height });
        }
        let geometry = {
            let mut registry = self.registry.borrow_mut();
            let record = registry.get_mut(id).ok_or(CanvasError::MissingFrame(id))?;
            record.set_size(width, height);
            record.geometry()
        };
        self.geometry_changed(id, geometry);
        Ok(())
    }

    /// Recompute the cover fit of a frame's image against its current bounds.
    /// Does nothing for an empty frame.
    pub fn refit_image(&self, id: FrameId) -> Result<(), CanvasError> {
        let refitted = {
            let mut registry = self.registry.borrow_mut();
            let record = registry.get_mut(id).ok_or(CanvasError::MissingFrame(id))?;
            let geometry = record.geometry();
            match record.image_mut() {
                Some(image) => {
                    image.set_placement(fit_to_frame(image.natural(), geometry).placement());
                    true
                }
                None => false,
            }
        };
        if refitted {
            self.surface.borrow_mut().render_all();
        }
        Ok(())
    }

    /// Register a callback run after every frame geometry change.
    pub fn subscribe_geometry<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(FrameId, Rect) + 'static,
    {
        let id = SubscriptionId(
            self.next_subscription_id
                .replace(self.next_subscription_id.get() + 1),
        );
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already gone. Safe to call
    /// from inside a listener, including on itself.
    pub fn unsubscribe_geometry(&self, id: SubscriptionId) -> bool {
        {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|(sid, _)| *sid != id);
            if listeners.len() != before {
                return true;
            }
        }
        if !self.notifying.borrow().contains(&id) {
            return false;
        }
        let mut pending = self.pending_unsubscribes.borrow_mut();
        if pending.contains(&id) {
            return false;
        }
        pending.push(id);
        true
    }

    fn geometry_changed(&self, id: FrameId, geometry: Rect) {
        // Listeners run without the list borrowed so they may subscribe and
        // unsubscribe. Removals of running listeners are applied afterwards.
        let mut running = std::mem::take(&mut *self.listeners.borrow_mut());
        let outer = self.notifying.borrow().len();
        self.notifying
            .borrow_mut()
            .extend(running.iter().map(|(sid, _)| *sid));

        for (sid, listener) in running.iter_mut() {
            if self.pending_unsubscribes.borrow().contains(sid) {
                continue;
            }
            listener(id, geometry);
        }

        self.notifying.borrow_mut().truncate(outer);
        {
            let mut pending = self.pending_unsubscribes.borrow_mut();
            running.retain(|(sid, _)| !pending.contains(sid));
            let notifying = self.notifying.borrow();
            pending.retain(|sid| notifying.contains(sid));
        }
        let mut listeners = self.listeners.borrow_mut();
        running.append(&mut listeners);
        *listeners = running;
        drop(listeners);

        self.surface.borrow_mut().render_all();
    }

    pub(crate) fn allocate_image_id(&self) -> ImageId {
        ImageId(self.next_image_id.replace(self.next_image_id.get() + 1))
    }

    /// Serializable picture of the current state.
    pub fn snapshot(&self) -> SceneSnapshot {
        let surface = self.surface.borrow().size();
        let frames = self
            .registry
            .borrow()
            .iter()
            .map(|record| FrameSnapshot {
                id: record.id(),
                geometry: record.geometry(),
                label: record.placeholder().map(|p| p.label.clone()),
                placeholder_visible: record.placeholder_visible(),
                image: record.image().map(ImageSnapshot::from),
            })
            .collect();
        let free_images = self
            .free_images
            .borrow()
            .iter()
            .map(ImageSnapshot::from)
            .collect();
        SceneSnapshot {
            surface,
            frames,
            free_images,
        }
    }
}

fn positive_or_one(value: f64) -> f64 {
    if value > 0.0 { value } else { 1.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub surface: Size,
    pub frames: Vec<FrameSnapshot>,
    pub free_images: Vec<ImageSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub id: FrameId,
    pub geometry: Rect,
    pub label: Option<String>,
    pub placeholder_visible: bool,
    pub image: Option<ImageSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSnapshot {
    pub id: ImageId,
    pub name: String,
    pub media_type: String,
    pub natural: Dimensions,
    pub placement: Placement,
}

impl From<&Image> for ImageSnapshot {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id(),
            name: image.name().to_string(),
            media_type: image.media_type().to_string(),
            natural: image.natural(),
            placement: image.placement(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SceneSurface;
    use crate::test_helpers::{mock_canvas, png_source, test_canvas};
    use crate::types::Point;
    use std::rc::Rc;

    #[test]
    fn default_frame_geometry_and_placeholder() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());

        let registry = canvas.registry();
        let record = registry.get(id).unwrap();
        assert_eq!(record.geometry(), Rect::new(200.0, 200.0, 300.0, 200.0));
        let placeholder = record.placeholder().unwrap();
        assert_eq!(placeholder.center, Point::new(350.0, 300.0));
        assert_eq!(placeholder.label, "Click to add image");
        assert!(placeholder.visible);
        assert!(record.image().is_none());
    }

    #[test]
    fn create_frame_adds_visuals_and_renders() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::new().label("Drop a photo"));

        let surface = canvas.surface();
        assert_eq!(
            surface.objects(),
            &[Visual::Frame(id), Visual::Placeholder(id)]
        );
        assert_eq!(surface.render_count(), 1);
        drop(surface);
        assert_eq!(
            canvas.registry().get(id).unwrap().placeholder().unwrap().label,
            "Drop a photo"
        );
    }

    #[test]
    fn frame_ids_are_unique_under_rapid_creation() {
        let canvas = test_canvas();
        let ids: Vec<FrameId> = (0..100)
            .map(|_| canvas.create_frame(FrameOptions::default()))
            .collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 100);
        assert_eq!(canvas.registry().len(), 100);
    }

    #[test]
    fn frame_without_placeholder() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::new().without_placeholder());
        assert!(canvas.registry().get(id).unwrap().placeholder().is_none());
        assert!(!canvas.surface().contains(Visual::Placeholder(id)));
    }

    #[test]
    fn non_positive_size_is_clamped() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::new().size(0.0, -20.0));
        let geometry = canvas.registry().get(id).unwrap().geometry();
        assert_eq!(geometry.size(), Size::new(1.0, 1.0));
    }

    #[test]
    fn move_frame_recenters_placeholder_and_notifies() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        canvas.subscribe_geometry(move |frame, rect| sink.borrow_mut().push((frame, rect)));

        canvas.move_frame(id, 0.0, 0.0).unwrap();

        let center = canvas.registry().get(id).unwrap().placeholder().unwrap().center;
        assert_eq!(center, Point::new(150.0, 100.0));
        assert_eq!(
            seen.borrow().as_slice(),
            &[(id, Rect::new(0.0, 0.0, 300.0, 200.0))]
        );
    }

    #[test]
    fn every_move_notification_is_delivered() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        canvas.subscribe_geometry(move |_, _| c.set(c.get() + 1));

        for step in 0..5 {
            canvas.move_frame(id, step as f64, step as f64).unwrap();
        }
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = canvas.subscribe_geometry(move |_, _| c.set(c.get() + 1));

        canvas.move_frame(id, 1.0, 1.0).unwrap();
        assert!(canvas.unsubscribe_geometry(sub));
        assert!(!canvas.unsubscribe_geometry(sub));
        canvas.move_frame(id, 2.0, 2.0).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_can_unsubscribe_itself() {
        let canvas = Rc::new(test_canvas());
        let id = canvas.create_frame(FrameOptions::default());
        let count = Rc::new(Cell::new(0));
        let own_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let removed = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&canvas);
        let (c, me, r) = (Rc::clone(&count), Rc::clone(&own_id), Rc::clone(&removed));
        let sub = canvas.subscribe_geometry(move |_, _| {
            c.set(c.get() + 1);
            if let (Some(canvas), Some(sub)) = (weak.upgrade(), me.get()) {
                r.set(Some(canvas.unsubscribe_geometry(sub)));
            }
        });
        own_id.set(Some(sub));

        canvas.move_frame(id, 1.0, 1.0).unwrap();
        canvas.move_frame(id, 2.0, 2.0).unwrap();

        assert_eq!(count.get(), 1);
        assert_eq!(removed.get(), Some(true));
        assert!(!canvas.unsubscribe_geometry(sub));
    }

    #[test]
    fn listener_unsubscribed_by_another_is_skipped() {
        let canvas = Rc::new(test_canvas());
        let id = canvas.create_frame(FrameOptions::default());
        let later_calls = Rc::new(Cell::new(0));
        let target: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&canvas);
        let t = Rc::clone(&target);
        canvas.subscribe_geometry(move |_, _| {
            if let (Some(canvas), Some(sub)) = (weak.upgrade(), t.get()) {
                canvas.unsubscribe_geometry(sub);
            }
        });
        let calls = Rc::clone(&later_calls);
        let later = canvas.subscribe_geometry(move |_, _| calls.set(calls.get() + 1));
        target.set(Some(later));

        canvas.move_frame(id, 1.0, 1.0).unwrap();
        canvas.move_frame(id, 2.0, 2.0).unwrap();

        assert_eq!(later_calls.get(), 0);
        assert!(!canvas.unsubscribe_geometry(later));
    }

    #[test]
    fn move_unknown_frame_is_error() {
        let canvas = test_canvas();
        assert_eq!(
            canvas.move_frame(FrameId(42), 0.0, 0.0),
            Err(CanvasError::MissingFrame(FrameId(42)))
        );
    }

    #[test]
    fn resize_rejects_non_positive_sizes() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());
        assert!(matches!(
            canvas.resize_frame(id, 0.0, 10.0),
            Err(CanvasError::InvalidGeometry { .. })
        ));
        canvas.resize_frame(id, 100.0, 50.0).unwrap();
        let record = canvas.registry().get(id).unwrap().clone();
        assert_eq!(record.geometry(), Rect::new(200.0, 200.0, 100.0, 50.0));
        assert_eq!(record.placeholder().unwrap().center, Point::new(250.0, 225.0));
    }

    #[tokio::test]
    async fn refit_uses_current_bounds() {
        let canvas = mock_canvas(vec![Dimensions {
            width: 800,
            height: 400,
        }]);
        let id = canvas.create_frame(FrameOptions::default());
        canvas
            .try_ingest_from_binary(png_source(1, 1), Some(id))
            .await
            .unwrap();

        canvas.resize_frame(id, 100.0, 100.0).unwrap();
        canvas.refit_image(id).unwrap();

        let placement = canvas.registry().get(id).unwrap().image().unwrap().placement();
        assert_eq!(placement.scale, 0.25);
        assert_eq!(placement.clip, Some(Rect::new(200.0, 200.0, 100.0, 100.0)));
    }

    #[test]
    fn refit_on_empty_frame_is_noop() {
        let canvas = test_canvas();
        let id = canvas.create_frame(FrameOptions::default());
        let renders = canvas.surface().render_count();
        canvas.refit_image(id).unwrap();
        assert_eq!(canvas.surface().render_count(), renders);
    }

    #[test]
    fn snapshot_lists_frames_in_order() {
        let canvas = Canvas::with_backends(
            SceneSurface::new(640.0, 480.0),
            CanvasConfig::default(),
            Arc::new(RustDecoder::new()),
            Box::new(crate::fetch::tests::MockFetcher::new()),
        );
        let a = canvas.create_frame(FrameOptions::new().at(0.0, 0.0));
        let b = canvas.create_frame(FrameOptions::new().at(320.0, 0.0).label("second"));

        let snap = canvas.snapshot();
        assert_eq!(snap.surface, Size::new(640.0, 480.0));
        assert_eq!(snap.frames.len(), 2);
        assert_eq!(snap.frames[0].id, a);
        assert_eq!(snap.frames[1].id, b);
        assert_eq!(snap.frames[1].label.as_deref(), Some("second"));
        assert!(snap.free_images.is_empty());
    }
}
