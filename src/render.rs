//! Scene export.
//!
//! Renders the current canvas as a standalone HTML page holding one inline
//! SVG. Frames are drawn as rounded cards, framed images are clipped to their
//! frame with a `clipPath`, and free images are drawn whole.
//!
//! ```text
//! <svg>
//!   <defs>  shadow filter, one clipPath per framed image
//!   <g.frame>  card, image (clipped) or placeholder text
//!   <image.free> ...
//! </svg>
//! ```
//!
//! Image payloads are embedded as `data:` URIs, so the page has no external
//! references.

use crate::canvas::Canvas;
use crate::config::CanvasConfig;
use crate::frame::{FrameRecord, Image};
use crate::surface::RenderSurface;
use crate::types::Rect;
use maud::{DOCTYPE, Markup, html};

const CSS: &str = "body{margin:0;display:flex;justify-content:center;padding:24px;background:#e4e4e7}svg{box-shadow:0 1px 3px rgba(0,0,0,.2)}";

/// Render the canvas as an HTML document.
pub fn render_scene<S: RenderSurface>(canvas: &Canvas<S>, title: &str) -> Markup {
    let config = canvas.config();
    let size = canvas.surface().size();
    let registry = canvas.registry();
    let free_images = canvas.free_images();

    let scene = html! {
        svg xmlns="http://www.w3.org/2000/svg"
            width=(size.width) height=(size.height)
            viewBox={ "0 0 " (size.width) " " (size.height) } {
            defs {
                (shadow_filter(config))
                @for record in registry.iter() {
                    @if let Some(clip) = image_clip(record) {
                        (clip_path(record, clip))
                    }
                }
            }
            rect.background width="100%" height="100%" fill=(config.surface.background) {}
            @for record in registry.iter() {
                (render_frame(record, config))
            }
            @for image in free_images.iter() {
                (render_image(image, None))
            }
        }
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
                style { (CSS) }
            }
            body {
                (scene)
            }
        }
    }
}

fn clip_id(record: &FrameRecord) -> String {
    format!("clip-{}", record.id())
}

fn shadow_filter(config: &CanvasConfig) -> Markup {
    let shadow = &config.frames.style.shadow;
    html! {
        filter id="frame-shadow" x="-20%" y="-20%" width="140%" height="140%" {
            feDropShadow dx=(shadow.offset_x) dy=(shadow.offset_y)
                stdDeviation=(shadow.blur / 2.0) flood-color=(shadow.color) {}
        }
    }
}

/// The clip stored with a framed image's placement. It tracks the frame as it
/// was at the last fit, so a moved but not refitted frame keeps its old clip.
fn image_clip(record: &FrameRecord) -> Option<Rect> {
    record.image().and_then(|image| image.placement().clip)
}

fn clip_path(record: &FrameRecord, g: Rect) -> Markup {
    let radius = record.frame().style().corner_radius;
    html! {
        clipPath id=(clip_id(record)) {
            rect x=(g.left) y=(g.top) width=(g.width) height=(g.height) rx=(radius) {}
        }
    }
}

fn render_frame(record: &FrameRecord, config: &CanvasConfig) -> Markup {
    let g = record.geometry();
    let style = record.frame().style();
    let text = &config.placeholder;
    html! {
        g.frame data-frame=(record.id()) {
            rect x=(g.left) y=(g.top) width=(g.width) height=(g.height)
                rx=(style.corner_radius) fill=(style.fill) stroke=(style.stroke)
                stroke-width=(style.stroke_width) filter="url(#frame-shadow)" {}
            @if let Some(image) = record.image() {
                (render_image(image, image_clip(record).map(|_| clip_id(record)).as_deref()))
            }
            @if let Some(placeholder) = record.placeholder().filter(|p| p.visible) {
                text.placeholder x=(placeholder.center.x) y=(placeholder.center.y)
                    text-anchor="middle" dominant-baseline="middle"
                    font-size=(text.font_size) font-family=(text.font_family) fill=(text.color) {
                    (placeholder.label)
                }
            }
        }
    }
}

fn render_image(image: &Image, clip: Option<&str>) -> Markup {
    let placement = image.placement();
    let natural = image.natural().size();
    let origin = placement.origin(natural);
    let scaled = natural.scaled(placement.scale);
    let clip_ref = clip.map(|id| format!("url(#{id})"));
    html! {
        image class=[clip.is_none().then_some("free")] data-image=(image.id())
            x=(origin.x) y=(origin.y) width=(scaled.width) height=(scaled.height)
            preserveAspectRatio="none" clip-path=[clip_ref] href=(image.data_uri()) {}
    }
}
