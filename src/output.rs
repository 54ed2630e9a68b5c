//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity is shown by its semantic identity first (positional index and
//! label), with ids, sources and placement as indented context lines.
//!
//! # Output Format
//!
//! ## Compose
//!
//! ```text
//! Frames
//! 001 Hero (frame-1) 320x240 at 40, 40
//!     Source: photos/wide.jpg
//!     Image: image-1 800x400, scale 0.3 (cover)
//! 002 Click to add image (frame-2) 300x200 at 200, 200
//!     Empty
//! 003 Portrait (frame-3) 200x300 at 600, 40
//!     Source: notes.txt
//!     Failed: notes.txt is not an image (declared type "application/octet-stream")
//!
//! Free images
//! 001 image-2 640x480 centered at 600, 400
//!     Source: https://example.com/logo.png
//!
//! Composed 3 frames, 2 images placed, 1 failed
//! ```
//!
//! ## Fit
//!
//! ```text
//! Image: 800x400 (aspect 2)
//! Frame: 300x200 (aspect 1.5)
//! Scale: 0.5 (fills height)
//! Scaled: 400x200
//! Hidden: 100 horizontal, 0 vertical
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::canvas::SceneSnapshot;
use crate::imaging::CoverFit;
use crate::layout::{ComposeReport, Outcome};
use crate::types::{FrameId, Size};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Round to two decimals and drop trailing zeros.
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

fn dims(size: Size) -> String {
    format!("{}x{}", num(size.width), num(size.height))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Compose
// ============================================================================

/// Format the frame tree produced by `compose`.
///
/// Frames come in layout order; entries of the report are matched to the
/// snapshot by frame id.
pub fn format_compose_output(report: &ComposeReport, snapshot: &SceneSnapshot) -> Vec<String> {
    let mut lines = vec!["Frames".to_string()];
    let detail = indent(1);

    for (i, frame) in snapshot.frames.iter().enumerate() {
        let g = frame.geometry;
        lines.push(format!(
            "{} {} ({}) {} at {}, {}",
            format_index(i + 1),
            frame.label.as_deref().unwrap_or("(no placeholder)"),
            frame.id,
            dims(g.size()),
            num(g.left),
            num(g.top)
        ));

        let entry = report.entries.iter().find(|e| e.frame == Some(frame.id));
        if let Some(source) = entry.and_then(|e| e.source.as_ref()) {
            lines.push(format!("{detail}Source: {source}"));
        }
        match (&frame.image, entry.map(|e| &e.outcome)) {
            (_, Some(Outcome::Failed(reason))) => lines.push(format!("{detail}Failed: {reason}")),
            (Some(image), _) => lines.push(format!(
                "{detail}Image: {} {}, scale {} (cover)",
                image.id,
                dims(image.natural.size()),
                num(image.placement.scale)
            )),
            (None, _) => lines.push(format!("{detail}Empty")),
        }
    }

    let free_entries: Vec<_> = report.entries.iter().filter(|e| e.frame.is_none()).collect();
    if !free_entries.is_empty() {
        lines.push(String::new());
        lines.push("Free images".to_string());
        let mut placed = snapshot.free_images.iter();
        for (i, entry) in free_entries.iter().enumerate() {
            let header = match &entry.outcome {
                Outcome::Placed(handle) => {
                    let image = placed.find(|img| img.id == handle.id);
                    let natural = image.map(|img| img.natural).unwrap_or(handle.natural);
                    format!(
                        "{} {} {} centered at {}, {}",
                        format_index(i + 1),
                        handle.id,
                        dims(natural.size()),
                        num(handle.placement.center.x),
                        num(handle.placement.center.y)
                    )
                }
                _ => format!("{} (not placed)", format_index(i + 1)),
            };
            lines.push(header);
            if let Some(source) = &entry.source {
                lines.push(format!("{detail}Source: {source}"));
            }
            if let Outcome::Failed(reason) = &entry.outcome {
                lines.push(format!("{detail}Failed: {reason}"));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Composed {}, {} placed, {} failed",
        plural(snapshot.frames.len(), "frame", "frames"),
        plural(report.placed(), "image", "images"),
        report.failed()
    ));
    lines
}

pub fn print_compose_output(report: &ComposeReport, snapshot: &SceneSnapshot) {
    for line in format_compose_output(report, snapshot) {
        println!("{}", line);
    }
}

/// Frame ids whose source failed, for the CLI exit summary.
pub fn failed_frames(report: &ComposeReport) -> Vec<FrameId> {
    report
        .entries
        .iter()
        .filter(|e| matches!(e.outcome, Outcome::Failed(_)))
        .filter_map(|e| e.frame)
        .collect()
}

// ============================================================================
// Fit
// ============================================================================

/// Format a single cover-fit computation.
pub fn format_fit(image: Size, frame: Size, fit: &CoverFit) -> Vec<String> {
    let axis = if image.aspect() > frame.aspect() {
        "fills height"
    } else {
        "fills width"
    };
    let crop = fit.crop();
    vec![
        format!("Image: {} (aspect {})", dims(image), num(image.aspect())),
        format!("Frame: {} (aspect {})", dims(frame), num(frame.aspect())),
        format!("Scale: {} ({axis})", num(fit.scale)),
        format!("Scaled: {}", dims(fit.scaled)),
        format!(
            "Hidden: {} horizontal, {} vertical",
            num(crop.horizontal),
            num(crop.vertical)
        ),
    ]
}

pub fn print_fit(image: Size, frame: Size, fit: &CoverFit) {
    for line in format_fit(image, frame, fit) {
        println!("{}", line);
    }
}
