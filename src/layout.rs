//! Layout files for the `compose` command.
//!
//! A layout lists frames and the images to ingest into them:
//!
//! ```toml
//! [[frame]]
//! left = 40.0
//! top = 40.0
//! width = 320.0
//! height = 240.0
//! label = "Hero"
//! image = "photos/cat.jpg"            # relative to the layout file
//!
//! [[frame]]                           # no image: keeps its placeholder
//!
//! [[free]]
//! source = "https://example.com/logo.png"
//! ```
//!
//! Frame keys left out fall back to `[frames]` in the canvas config.

use crate::canvas::Canvas;
use crate::frame::{FrameOptions, ImageHandle};
use crate::ingest::{ImageSource, IngestError};
use crate::surface::RenderSurface;
use crate::types::FrameId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("could not read layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Layout validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    #[serde(rename = "frame")]
    pub frames: Vec<FrameEntry>,
    #[serde(rename = "free")]
    pub free: Vec<FreeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameEntry {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub label: Option<String>,
    pub no_placeholder: bool,
    /// File path or http(s) URL.
    pub image: Option<String>,
}

impl FrameEntry {
    pub fn options(&self) -> FrameOptions {
        FrameOptions {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            label: self.label.clone(),
            no_placeholder: self.no_placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FreeEntry {
    pub source: String,
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Path(PathBuf),
    Url(String),
}

impl SourceRef {
    /// Classify a layout string. Relative paths are resolved against `base`.
    pub fn parse(raw: &str, base: &Path) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::Path(base.join(raw))
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

impl Layout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (i, entry) in self.frames.iter().enumerate() {
            let bad = |v: Option<f64>| v.is_some_and(|v| v <= 0.0);
            if bad(entry.width) || bad(entry.height) {
                return Err(LayoutError::Validation(format!(
                    "frame {}: width and height must be positive",
                    i + 1
                )));
            }
            if entry.image.as_deref().is_some_and(|s| s.trim().is_empty()) {
                return Err(LayoutError::Validation(format!(
                    "frame {}: image must not be empty",
                    i + 1
                )));
            }
        }
        if self.free.iter().any(|f| f.source.trim().is_empty()) {
            return Err(LayoutError::Validation(
                "free image source must not be empty".into(),
            ));
        }
        Ok(())
    }
}

pub fn parse_layout(content: &str) -> Result<Layout, LayoutError> {
    let layout: Layout = toml::from_str(content)?;
    layout.validate()?;
    Ok(layout)
}

pub fn load_layout(path: &Path) -> Result<Layout, LayoutError> {
    let content = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layout(&content)
}

/// What happened to one layout entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Frame without an image.
    Empty,
    Placed(ImageHandle),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeEntry {
    /// `None` for free images.
    pub frame: Option<FrameId>,
    pub source: Option<SourceRef>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeReport {
    /// Frames in layout order, then free images.
    pub entries: Vec<ComposeEntry>,
}

impl ComposeReport {
    pub fn placed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Placed(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed(_)))
            .count()
    }
}

/// Create every frame of `layout` on `canvas`, then ingest the listed
/// images. Failed sources are reported, not fatal.
pub async fn compose<S: RenderSurface>(
    canvas: &Canvas<S>,
    layout: &Layout,
    base: &Path,
) -> ComposeReport {
    let frames: Vec<(FrameId, Option<SourceRef>)> = layout
        .frames
        .iter()
        .map(|entry| {
            let id = canvas.create_frame(entry.options());
            (id, entry.image.as_deref().map(|s| SourceRef::parse(s, base)))
        })
        .collect();

    let mut report = ComposeReport::default();
    for (frame, source) in frames {
        let outcome = match &source {
            Some(source) => ingest_source(canvas, source, Some(frame)).await,
            None => Outcome::Empty,
        };
        report.entries.push(ComposeEntry {
            frame: Some(frame),
            source,
            outcome,
        });
    }

    for free in &layout.free {
        let source = SourceRef::parse(&free.source, base);
        let outcome = ingest_source(canvas, &source, None).await;
        report.entries.push(ComposeEntry {
            frame: None,
            source: Some(source),
            outcome,
        });
    }
    debug!(
        placed = report.placed(),
        failed = report.failed(),
        "layout composed"
    );
    report
}

async fn ingest_source<S: RenderSurface>(
    canvas: &Canvas<S>,
    source: &SourceRef,
    target: Option<FrameId>,
) -> Outcome {
    let result: Result<ImageHandle, IngestError> = match source {
        SourceRef::Url(url) => canvas.try_ingest_from_url(url, target).await,
        SourceRef::Path(path) => match ImageSource::from_path(path) {
            Ok(image) => canvas.try_ingest_from_binary(image, target).await,
            Err(e) => return Outcome::Failed(format!("{}: {e}", path.display())),
        },
    };
    match result {
        Ok(handle) => Outcome::Placed(handle),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{png_bytes, test_canvas};
    use crate::types::Rect;
    use tempfile::TempDir;

    #[test]
    fn parses_frames_and_free_images() {
        let layout = parse_layout(
            r#"
            [[frame]]
            left = 10.0
            label = "Hero"
            image = "a.png"

            [[frame]]

            [[free]]
            source = "https://img.test/b.png"
            "#,
        )
        .unwrap();

        assert_eq!(layout.frames.len(), 2);
        assert_eq!(layout.frames[0].left, Some(10.0));
        assert_eq!(layout.frames[0].top, None);
        assert_eq!(layout.frames[1], FrameEntry::default());
        assert_eq!(layout.free[0].source, "https://img.test/b.png");
    }

    #[test]
    fn empty_layout_is_valid() {
        assert_eq!(parse_layout("").unwrap(), Layout::default());
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = parse_layout("[[frame]]\ncolour = \"red\"\n").unwrap_err();
        assert!(matches!(err, LayoutError::Toml(_)));
    }

    #[test]
    fn non_positive_size_rejected() {
        let err = parse_layout("[[frame]]\nwidth = 0.0\n").unwrap_err();
        assert!(matches!(err, LayoutError::Validation(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_layout(Path::new("/nonexistent/layout.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/layout.toml"));
    }

    #[test]
    fn source_ref_classifies_urls_and_paths() {
        let base = Path::new("/work");
        assert_eq!(
            SourceRef::parse("HTTPS://img.test/a.png", base),
            SourceRef::Url("HTTPS://img.test/a.png".into())
        );
        assert_eq!(
            SourceRef::parse("photos/a.png", base),
            SourceRef::Path(PathBuf::from("/work/photos/a.png"))
        );
        assert_eq!(
            SourceRef::parse("/abs/a.png", base),
            SourceRef::Path(PathBuf::from("/abs/a.png"))
        );
    }

    #[tokio::test]
    async fn compose_creates_frames_and_reports_each_source() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("wide.png"), png_bytes(80, 40)).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"not an image").unwrap();
        let layout = parse_layout(
            r#"
            [[frame]]
            left = 0.0
            top = 0.0
            width = 100.0
            height = 100.0
            image = "wide.png"

            [[frame]]
            left = 200.0
            image = "notes.txt"

            [[frame]]
            left = 600.0

            [[free]]
            source = "missing.png"
            "#,
        )
        .unwrap();
        let canvas = test_canvas();

        let report = compose(&canvas, &layout, tmp.path()).await;

        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.placed(), 1);
        assert_eq!(report.failed(), 2);
        assert!(matches!(report.entries[2].outcome, Outcome::Empty));
        assert_eq!(report.entries[3].frame, None);

        let Outcome::Placed(handle) = &report.entries[0].outcome else {
            panic!("first frame should hold an image");
        };
        assert_eq!(handle.placement.scale, 2.5);
        assert_eq!(handle.placement.clip, Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(canvas.registry().len(), 3);
    }

    #[tokio::test]
    async fn compose_reports_unreachable_url() {
        let layout = parse_layout("[[free]]\nsource = \"https://img.test/none.png\"\n").unwrap();
        let canvas = test_canvas();

        let report = compose(&canvas, &layout, Path::new(".")).await;

        let Outcome::Failed(reason) = &report.entries[0].outcome else {
            panic!("expected a failure");
        };
        assert!(reason.contains("img.test/none.png"));
        assert!(canvas.free_images().is_empty());
    }
}
