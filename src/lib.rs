//! # framefill
//!
//! Photo frames on a drawing surface. Frames are rectangles that each hold
//! at most one image; images arrive from file pickers, drag-and-drop,
//! clipboard paste or a URL, and are scaled to cover their frame, centered
//! on it and clipped to it.
//!
//! # Architecture
//!
//! ```text
//!  input adapters ─┐
//!  (pick/drop/paste)│
//!                   ▼
//!  ImageSource ─► ingest ─► decode (blocking pool) ─► cover fit ─► FrameRecord
//!                                                                     │
//!                         RenderSurface ◄── add / remove / render_all ◄┘
//! ```
//!
//! Everything hangs off a [`Canvas`](canvas::Canvas): it owns the
//! [`FrameRegistry`](registry::FrameRegistry), the free images and the
//! [`RenderSurface`](surface::RenderSurface). The canvas is single-threaded
//! and its futures are driven on a current-thread tokio runtime; only pixel
//! decoding leaves the thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`canvas`] | Controller: frame creation, geometry sync, snapshots |
//! | [`ingest`] | Validate → decode → fit → commit, with per-frame ingestion tickets |
//! | [`input`] | File picker, drag-and-drop and clipboard adapters; target resolution |
//! | [`frame`] | Frames, placeholders, images and the registry record tying them together |
//! | [`registry`] | Id → record map with point lookup |
//! | [`surface`] | The rendering seam and an in-memory surface |
//! | [`imaging`] | Decoding and cover-fit geometry |
//! | [`fetch`] | Remote image fetching over HTTP |
//! | [`config`] | `canvas.toml` loading and validation |
//! | [`layout`] | Layout files for the `compose` command |
//! | [`render`] | HTML/SVG scene export using Maud |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Geometry primitives and ids |
//!
//! # Design Decisions
//!
//! ## Latest Ingestion Wins
//!
//! Two ingestions into the same frame may overlap: a slow URL fetch followed
//! by a quick drop, say. Each targeted ingestion takes a ticket from the
//! frame's version counter when it starts and commits only if no ingestion
//! started after it has committed yet. The loser resolves to
//! [`IngestError::Superseded`](ingest::IngestError::Superseded). A later
//! ingestion that fails never commits, so it cannot knock out an earlier one.
//!
//! ## Failures Stay Local
//!
//! A source that is not an image, does not decode or cannot be fetched never
//! touches the registry. The frame keeps what it showed before, other frames
//! are unaffected, and the plain `ingest_*` calls log the failure and return
//! `None`.
//!
//! ## Cover, Never Contain
//!
//! The only fit mode is cover: the image fills the frame on both axes and
//! the overflow is clipped. See [`imaging::calculate_cover_fit`].

pub mod canvas;
pub mod config;
pub mod fetch;
pub mod frame;
pub mod imaging;
pub mod ingest;
pub mod input;
pub mod layout;
pub mod output;
pub mod registry;
pub mod render;
pub mod surface;
pub mod types;

pub use canvas::{Canvas, CanvasError, SceneSnapshot};
pub use frame::{FrameOptions, ImageHandle};
pub use ingest::{FailureKind, ImageSource, IngestError};

#[cfg(test)]
pub(crate) mod test_helpers;
