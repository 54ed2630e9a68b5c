//! The image ingestion pipeline.
//!
//! Every input channel ends up here: validate → decode → fit → commit.
//!
//! ```text
//! ImageSource ─► media type check ─► ticket ─► decode (blocking pool)
//!                                                   │
//!           surface.add + render_all ◄─ commit ◄────┘
//! ```
//!
//! Decoding is the only step that suspends. While it is pending the target
//! frame keeps showing whatever it showed before. A targeted ingestion takes
//! a ticket from the frame's version counter when it starts and commits only
//! if no ingestion started after it has committed in the meantime. Of two
//! overlapping ingestions into one frame the one started last wins, whatever
//! order they finish in; if it fails, the earlier one still lands.
//!
//! Failures never escape as panics and never touch the registry. The
//! `try_*` methods return them; the plain methods log them and resolve to
//! `None`.

use crate::canvas::{Canvas, CanvasError};
use crate::frame::{Image, ImageHandle};
use crate::imaging::{
    DecodeError, DecodedImage, center_on_surface, encode_data_uri, fit_to_frame,
    media_type_for_extension, sniff_media_type,
};
use crate::surface::{RenderSurface, Visual};
use crate::types::FrameId;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// An encoded image handed over by an input channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    /// File name or other human-readable origin.
    pub name: String,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file, deriving the media type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(media_type_for_extension)
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        is_image_type(&self.media_type)
    }
}

pub(crate) fn is_image_type(media_type: &str) -> bool {
    media_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Coarse classification of an ingestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    DecodeFailure,
    FetchFailure,
    MissingFrame,
    Superseded,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("{name} is not an image (declared type {media_type:?})")]
    InvalidInput { name: String, media_type: String },
    #[error("could not decode {name}: {source}")]
    DecodeFailed {
        name: String,
        #[source]
        source: DecodeError,
    },
    #[error("could not fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },
    #[error("{0} is not registered")]
    MissingFrame(FrameId),
    #[error("a newer ingestion into {0} replaced this one")]
    Superseded(FrameId),
}

impl IngestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput { .. } => FailureKind::InvalidInput,
            Self::DecodeFailed { .. } => FailureKind::DecodeFailure,
            Self::FetchFailed { .. } => FailureKind::FetchFailure,
            Self::MissingFrame(_) => FailureKind::MissingFrame,
            Self::Superseded(_) => FailureKind::Superseded,
        }
    }
}

/// Target frame and the ticket issued when ingestion started.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    frame: FrameId,
    version: u64,
}

/// A decoded image waiting to be committed.
struct Pending {
    name: String,
    media_type: String,
    data_uri: String,
    decoded: DecodedImage,
}

impl<S: RenderSurface> Canvas<S> {
    /// Ingest an encoded image, logging and swallowing failures.
    pub async fn ingest_from_binary(
        &self,
        source: ImageSource,
        target: Option<FrameId>,
    ) -> Option<ImageHandle> {
        let name = source.name.clone();
        self.try_ingest_from_binary(source, target)
            .await
            .map_err(|e| warn!(source = %name, kind = ?e.kind(), error = %e, "image ingestion failed"))
            .ok()
    }

    /// Ingest an encoded image into `target`, or as a free image centered on
    /// the surface when `target` is `None`.
    pub async fn try_ingest_from_binary(
        &self,
        source: ImageSource,
        target: Option<FrameId>,
    ) -> Result<ImageHandle, IngestError> {
        if !source.is_image() {
            return Err(IngestError::InvalidInput {
                name: source.name,
                media_type: source.media_type,
            });
        }
        let ticket = self.begin_ingest(target)?;
        debug!(source = %source.name, ?target, "decoding image");

        let ImageSource {
            name,
            media_type,
            bytes,
        } = source;
        let (data_uri, decoded) = match self.decode(bytes, media_type.clone()).await {
            Ok(decoded) => decoded,
            Err(source) => return Err(IngestError::DecodeFailed { name, source }),
        };

        self.commit(
            Pending {
                name,
                media_type,
                data_uri,
                decoded,
            },
            ticket,
        )
    }

    /// Fetch an image by URL and ingest it, logging and swallowing failures.
    pub async fn ingest_from_url(&self, url: &str, target: Option<FrameId>) -> Option<ImageHandle> {
        self.try_ingest_from_url(url, target)
            .await
            .map_err(|e| warn!(%url, kind = ?e.kind(), error = %e, "image ingestion failed"))
            .ok()
    }

    /// Same contract as [`try_ingest_from_binary`](Self::try_ingest_from_binary)
    /// with a remote source. Network and decode problems are both
    /// [`IngestError::FetchFailed`].
    pub async fn try_ingest_from_url(
        &self,
        url: &str,
        target: Option<FrameId>,
    ) -> Result<ImageHandle, IngestError> {
        let fetch_failed = |reason: String| IngestError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let ticket = self.begin_ingest(target)?;
        let name = url_file_name(url);
        let fetched = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let media_type = sniff_media_type(&fetched.bytes)
            .map(str::to_string)
            .or(fetched.media_type.filter(|t| is_image_type(t)))
            .or_else(|| file_extension(&name).and_then(media_type_for_extension).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let (data_uri, decoded) = self
            .decode(fetched.bytes, media_type.clone())
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        self.commit(
            Pending {
                name,
                media_type,
                data_uri,
                decoded,
            },
            ticket,
        )
    }

    /// Detach a frame's image and show its placeholder again. Empty frames
    /// are left alone.
    pub fn remove_image(&self, frame: FrameId) -> Result<(), CanvasError> {
        let removed = self
            .registry
            .borrow_mut()
            .get_mut(frame)
            .ok_or(CanvasError::MissingFrame(frame))?
            .take_image();

        if let Some(image) = removed {
            let mut surface = self.surface.borrow_mut();
            surface.remove(Visual::Image(image.id()));
            surface.render_all();
            debug!(%frame, image = %image.id(), "image removed");
        }
        Ok(())
    }

    fn begin_ingest(&self, target: Option<FrameId>) -> Result<Option<Ticket>, IngestError> {
        let Some(frame) = target else {
            return Ok(None);
        };
        let mut registry = self.registry.borrow_mut();
        let record = registry
            .get_mut(frame)
            .ok_or(IngestError::MissingFrame(frame))?;
        Ok(Some(Ticket {
            frame,
            version: record.next_version(),
        }))
    }

    /// Build the data URI and decode pixels on the blocking pool.
    async fn decode(
        &self,
        bytes: Vec<u8>,
        media_type: String,
    ) -> Result<(String, DecodedImage), DecodeError> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || {
            let data_uri = encode_data_uri(&media_type, &bytes);
            decoder
                .decode(&bytes, &media_type)
                .map(|decoded| (data_uri, decoded))
        })
        .await
        .map_err(|e| DecodeError::Malformed(format!("decoder task failed: {e}")))?
    }

    fn commit(&self, pending: Pending, ticket: Option<Ticket>) -> Result<ImageHandle, IngestError> {
        let Pending {
            name,
            media_type,
            data_uri,
            decoded,
        } = pending;
        let natural = decoded.dimensions;

        match ticket {
            Some(ticket) => {
                let (handle, replaced) = {
                    let mut registry = self.registry.borrow_mut();
                    let record = registry
                        .get_mut(ticket.frame)
                        .ok_or(IngestError::MissingFrame(ticket.frame))?;
                    if !record.accepts(ticket.version) {
                        debug!(frame = %ticket.frame, ticket = ticket.version, "discarding stale ingestion");
                        return Err(IngestError::Superseded(ticket.frame));
                    }
                    let fit = fit_to_frame(natural, record.geometry());
                    let image = Image::new(
                        self.allocate_image_id(),
                        name,
                        media_type,
                        data_uri,
                        natural,
                        fit.placement(),
                    );
                    let handle = image.handle(Some(ticket.frame));
                    (handle, record.commit_image(ticket.version, image))
                };

                let mut surface = self.surface.borrow_mut();
                if let Some(old) = replaced {
                    surface.remove(Visual::Image(old.id()));
                }
                surface.add(Visual::Image(handle.id));
                surface.render_all();
                info!(frame = %ticket.frame, image = %handle.id, scale = handle.placement.scale, "image placed in frame");
                Ok(handle)
            }
            None => {
                let mut surface = self.surface.borrow_mut();
                let image = Image::new(
                    self.allocate_image_id(),
                    name,
                    media_type,
                    data_uri,
                    natural,
                    center_on_surface(surface.size()),
                );
                let handle = image.handle(None);
                self.free_images.borrow_mut().push(image);
                surface.add(Visual::Image(handle.id));
                surface.render_all();
                info!(image = %handle.id, "free image centered on surface");
                Ok(handle)
            }
        }
    }
}

/// Last non-empty path segment of `url`, percent-decoded. URLs that do not
/// parse or have no path keep their raw text.
fn url_file_name(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last());
    match segment {
        Some(segment) => urlencoding::decode(segment)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| segment.to_string()),
        None => url.to_string(),
    }
}

fn file_extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}
