//! Canvas configuration module.
//!
//! Handles loading and validating `canvas.toml`. Every key is optional: stock
//! defaults fill whatever the file leaves out.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [surface]
//! width = 1200.0            # Drawing surface size in pixels
//! height = 800.0
//! background = "#f4f4f5"
//!
//! [frames]
//! left = 200.0              # Geometry of a frame created without options
//! top = 200.0
//! width = 300.0
//! height = 200.0
//! label = "Click to add image"
//!
//! [frames.style]
//! fill = "#ffffff"
//! stroke = "#d4d4d8"
//! stroke_width = 1.0
//! corner_radius = 12.0
//! lock_rotation = true
//! lock_movement_x = false
//! lock_movement_y = false
//! resizable = true
//!
//! [frames.style.shadow]
//! color = "rgba(0, 0, 0, 0.15)"
//! blur = 12.0
//! offset_x = 0.0
//! offset_y = 4.0
//!
//! [placeholder]
//! font_size = 16.0
//! font_family = "sans-serif"
//! color = "#71717a"
//!
//! [input]
//! double_activation_ms = 400  # Max gap between two activations of a frame
//! drag_hover_opacity = 0.5    # Drop zone opacity while a drag hovers it
//! accept = "image/*"          # Filter handed to file pickers
//!
//! [fetch]
//! user_agent = "framefill/0.4.0"  # User-Agent for remote image fetches (crate version)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::frame::FrameStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Canvas configuration loaded from `canvas.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    /// Drawing surface size and background.
    pub surface: SurfaceConfig,
    /// Defaults for frames created without explicit options.
    pub frames: FrameDefaults,
    /// Placeholder text styling.
    pub placeholder: PlaceholderConfig,
    /// Input adapter tuning.
    pub input: InputConfig,
    /// Remote fetch settings.
    pub fetch: FetchConfig,
}

impl CanvasConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface.width <= 0.0 || self.surface.height <= 0.0 {
            return Err(ConfigError::Validation(
                "surface.width and surface.height must be positive".into(),
            ));
        }
        if self.frames.width <= 0.0 || self.frames.height <= 0.0 {
            return Err(ConfigError::Validation(
                "frames.width and frames.height must be positive".into(),
            ));
        }
        if self.placeholder.font_size <= 0.0 {
            return Err(ConfigError::Validation(
                "placeholder.font_size must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.input.drag_hover_opacity) {
            return Err(ConfigError::Validation(
                "input.drag_hover_opacity must be between 0 and 1".into(),
            ));
        }
        if self.input.double_activation_ms == 0 {
            return Err(ConfigError::Validation(
                "input.double_activation_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
    /// CSS color.
    pub background: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#f4f4f5".to_string(),
        }
    }
}

/// Geometry, label and style used when a frame option is left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameDefaults {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    pub style: FrameStyle,
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            left: 200.0,
            top: 200.0,
            width: 300.0,
            height: 200.0,
            label: "Click to add image".to_string(),
            style: FrameStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    pub font_size: f64,
    pub font_family: String,
    pub color: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_family: "sans-serif".to_string(),
            color: "#71717a".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Two activations of the same frame closer than this open the picker.
    pub double_activation_ms: u64,
    /// Opacity of the drop zone while a drag hovers it.
    pub drag_hover_opacity: f64,
    /// Filter handed to file pickers.
    pub accept: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            double_activation_ms: 400,
            drag_hover_opacity: 0.5,
            accept: "image/*".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("framefill/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<CanvasConfig, ConfigError> {
    let config: CanvasConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `canvas.toml` file.
///
/// Returns stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<CanvasConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(CanvasConfig::default()),
    }
}

/// Returns a fully-commented stock `canvas.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    concat!(
        r##"# framefill canvas configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Drawing surface
# ---------------------------------------------------------------------------
[surface]
# Size of the surface in pixels. Free images are centered on it.
width = 1200.0
height = 800.0
# Background color of the exported scene (CSS value).
background = "#f4f4f5"

# ---------------------------------------------------------------------------
# Frame defaults (used when a frame leaves a value unset)
# ---------------------------------------------------------------------------
[frames]
left = 200.0
top = 200.0
width = 300.0
height = 200.0
# Placeholder text shown while a frame is empty.
label = "Click to add image"

[frames.style]
fill = "#ffffff"
stroke = "#d4d4d8"
stroke_width = 1.0
corner_radius = 12.0
# Rotation keeps the frame's aspect ratio.
lock_rotation = true
lock_movement_x = false
lock_movement_y = false
resizable = true

[frames.style.shadow]
color = "rgba(0, 0, 0, 0.15)"
blur = 12.0
offset_x = 0.0
offset_y = 4.0

# ---------------------------------------------------------------------------
# Placeholder text
# ---------------------------------------------------------------------------
[placeholder]
font_size = 16.0
font_family = "sans-serif"
color = "#71717a"

# ---------------------------------------------------------------------------
# Input adapters
# ---------------------------------------------------------------------------
[input]
# Two activations of the same frame within this many milliseconds open the
# file picker for that frame.
double_activation_ms = 400
# Opacity of the drop zone while a drag hovers it (0.0 - 1.0).
drag_hover_opacity = 0.5
# Filter handed to file pickers.
accept = "image/*"

# ---------------------------------------------------------------------------
# Remote images
# ---------------------------------------------------------------------------
[fetch]
# User-Agent sent when fetching images by URL.
user_agent = "framefill/"##,
        env!("CARGO_PKG_VERSION"),
        "\"\n"
    )
}
