use clap::{Parser, Subcommand};
use framefill::canvas::Canvas;
use framefill::imaging::calculate_cover_fit;
use framefill::surface::SceneSurface;
use framefill::types::{Rect, Size};
use framefill::{config, layout, output, render};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let tagged = env!("FRAMEFILL_TAGGED");
    if tagged == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("FRAMEFILL_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "framefill")]
#[command(about = "Place images into frames with crop-to-cover fitting")]
#[command(long_about = "\
Place images into frames with crop-to-cover fitting

A layout file lists frames and the images that go into them. Every image is
scaled uniformly until it covers its frame, centered on it and clipped to it.
Images without a frame are centered on the surface at natural size.

Layout structure:

  [[frame]]
  left = 40.0                # Omitted keys fall back to [frames] in canvas.toml
  top = 40.0
  width = 320.0
  height = 240.0
  label = \"Hero\"             # Placeholder text while the frame is empty
  image = \"photos/cat.jpg\"   # Path relative to the layout, or http(s) URL

  [[free]]
  source = \"https://example.com/logo.png\"

Run 'framefill gen-config' to generate a documented canvas.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Log lifecycle events (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a canvas from a layout file and export it as HTML
    Compose {
        /// Layout file
        #[arg(long)]
        layout: PathBuf,
        /// Canvas config (stock defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the rendered scene to this HTML file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the scene snapshot as JSON instead of the frame tree
        #[arg(long)]
        json: bool,
    },
    /// Show the cover fit of an image into a frame
    Fit {
        /// Natural image size, e.g. 800x400
        #[arg(long, value_parser = parse_size)]
        image: Size,
        /// Frame size, e.g. 300x200
        #[arg(long, value_parser = parse_size)]
        frame: Size,
    },
    /// Print a stock canvas.toml with all options documented
    GenConfig,
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid dimension {v:?}: {e}"))
    };
    let size = Size::new(parse(w)?, parse(h)?);
    if !size.is_positive() {
        return Err(format!("dimensions must be positive, got {raw:?}"));
    }
    Ok(size)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "framefill=debug" } else { "framefill=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compose {
            layout,
            config,
            output: html_path,
            json,
        } => run_compose(&layout, config.as_deref(), html_path.as_deref(), json).await?,
        Command::Fit { image, frame } => {
            let fit = calculate_cover_fit(image, Rect::new(0.0, 0.0, frame.width, frame.height));
            output::print_fit(image, frame, &fit);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

async fn run_compose(
    layout_path: &Path,
    config_path: Option<&Path>,
    html_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let canvas_config = config::load_config(config_path)?;
    let layout_file = layout::load_layout(layout_path)?;
    let base = layout_path.parent().unwrap_or(Path::new("."));

    let surface = SceneSurface::new(canvas_config.surface.width, canvas_config.surface.height);
    let canvas = Canvas::new(surface, canvas_config)?;
    let report = layout::compose(&canvas, &layout_file, base).await;
    let snapshot = canvas.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        output::print_compose_output(&report, &snapshot);
    }

    let failed = output::failed_frames(&report);
    if !failed.is_empty() {
        warn!(frames = ?failed, "some frames kept their placeholder");
    }

    if let Some(path) = html_path {
        let title = layout_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "framefill".to_string());
        let html = render::render_scene(&canvas, &title).into_string();
        std::fs::write(path, html)?;
        info!(path = %path.display(), "scene written");
    }
    Ok(())
}
