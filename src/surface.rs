//! The render surface seam.
//!
//! The canvas never draws anything itself. It tells a [`RenderSurface`]
//! which visuals exist and when to redraw; the surface owns stacking order,
//! selection and the viewport transform. [`SceneSurface`] is an in-memory
//! implementation used by the CLI and tests.

use crate::types::{FrameId, ImageId, Point, Size};

/// Handle to something the surface draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visual {
    Frame(FrameId),
    Placeholder(FrameId),
    Image(ImageId),
}

/// What the canvas needs from the drawing surface.
pub trait RenderSurface {
    fn add(&mut self, visual: Visual);
    fn remove(&mut self, visual: Visual);
    /// Request a redraw of everything.
    fn render_all(&mut self);
    /// The currently selected visual, if any.
    fn active_object(&self) -> Option<Visual>;
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    /// Convert viewport (client) coordinates into surface-local coordinates.
    fn client_to_local(&self, client: Point) -> Point;

    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// In-memory surface: keeps visuals in stacking order and counts redraws.
#[derive(Debug, Clone)]
pub struct SceneSurface {
    size: Size,
    /// Client-space position of the surface's top-left corner.
    offset: Point,
    /// Client pixels per surface pixel.
    zoom: f64,
    objects: Vec<Visual>,
    active: Option<Visual>,
    renders: usize,
}

impl SceneSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            offset: Point::default(),
            zoom: 1.0,
            objects: Vec::new(),
            active: None,
            renders: 0,
        }
    }

    /// Where the surface sits in the viewport, and at which zoom.
    pub fn with_viewport(mut self, offset: Point, zoom: f64) -> Self {
        self.offset = offset;
        self.zoom = zoom;
        self
    }

    pub fn set_active(&mut self, visual: Option<Visual>) {
        self.active = visual;
    }

    /// Visuals in stacking order, bottom first.
    pub fn objects(&self) -> &[Visual] {
        &self.objects
    }

    pub fn contains(&self, visual: Visual) -> bool {
        self.objects.contains(&visual)
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl RenderSurface for SceneSurface {
    fn add(&mut self, visual: Visual) {
        if !self.objects.contains(&visual) {
            self.objects.push(visual);
        }
    }

    fn remove(&mut self, visual: Visual) {
        self.objects.retain(|v| *v != visual);
        if self.active == Some(visual) {
            self.active = None;
        }
    }

    fn render_all(&mut self) {
        self.renders += 1;
    }

    fn active_object(&self) -> Option<Visual> {
        self.active
    }

    fn width(&self) -> f64 {
        self.size.width
    }

    fn height(&self) -> f64 {
        self.size.height
    }

    fn client_to_local(&self, client: Point) -> Point {
        Point::new(
            (client.x - self.offset.x) / self.zoom,
            (client.y - self.offset.y) / self.zoom,
        )
    }
}
