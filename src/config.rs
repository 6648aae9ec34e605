//! Catalog configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the source directory next to the inventory tables and is layered on top of
//! the stock defaults, so it only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! collection_order = "source_order"   # source_order | alphabetical | random
//! artwork_order = "source_order"      # source_order | alphabetical | random
//! # shuffle_seed = 42                 # fixed seed for `random` (omit = seeded per build)
//! on_duplicate_id = "keep_first"      # keep_first | reject
//!
//! [columns]
//! featured = "Featured"     # Marker column flagging featured artworks
//! featured_flag = "x"       # Exact value that marks an artwork as featured
//! sold_marker = "sold"      # Pricing value that marks an artwork as unavailable
//! image = "Image"           # Optional column holding an explicit image reference
//!
//! [images]
//! directory = "images"      # Image directory, relative to the source directory
//! pattern = "{id}.jpg"      # Image reference derived from the artwork id
//! placeholder_pattern = ""  # Low-resolution reference for progressive loading
//! crossfade_ms = 300        # Placeholder → full-resolution cross-fade
//!
//! [tags]
//! keywords = ["abstract", "landscape", ...]
//!
//! [layout]
//! standard_width = 250.0
//! min_row_height = 150.0
//! max_row_height = 400.0
//! fallback_row_height = 200.0
//! scroll_step = 250.0
//! swipe_threshold = 50.0
//!
//! [viewer]
//! min_zoom = 0.5
//! max_zoom = 5.0
//! zoom_step = 1.3
//! wheel_zoom_in = 1.1
//! wheel_zoom_out = 0.9
//! friction = 0.92
//! momentum_threshold = 0.5
//! rest_epsilon = 0.1
//! frame_interval_ms = 16.0
//! reset_frames = 12
//! ```
//!
//! Unknown keys are rejected to catch typos early.

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

/// Ordering applied to collections or to the artworks inside a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPolicy {
    /// Stable by original row index.
    #[default]
    SourceOrder,
    /// Case- and accent-insensitive name/title comparison.
    Alphabetical,
    /// Uniform shuffle, reproducible for a fixed `shuffle_seed`.
    Random,
}

/// What to do when two inventory rows resolve to the same artwork id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first row, drop later ones, and report a warning.
    #[default]
    KeepFirst,
    /// Fail the build.
    Reject,
}

/// Catalog configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Ordering of collections in the catalog.
    pub collection_order: OrderPolicy,
    /// Ordering of artworks within each collection.
    pub artwork_order: OrderPolicy,
    /// Seed for `random` ordering. `None` seeds from the build time.
    pub shuffle_seed: Option<u64>,
    /// Handling of duplicate artwork ids.
    pub on_duplicate_id: DuplicatePolicy,
    /// Inventory column names and marker values.
    pub columns: ColumnsConfig,
    /// Image reference derivation.
    pub images: ImagesConfig,
    /// Tag derivation vocabulary.
    pub tags: TagsConfig,
    /// Collection row layout.
    pub layout: LayoutConfig,
    /// Detail-view zoom/pan physics.
    pub viewer: ViewerConfig,
}

impl CatalogConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        let viewer = &self.viewer;
        let numbers = [
            ("layout.standard_width", layout.standard_width),
            ("layout.min_row_height", layout.min_row_height),
            ("layout.max_row_height", layout.max_row_height),
            ("layout.fallback_row_height", layout.fallback_row_height),
            ("layout.scroll_step", layout.scroll_step),
            ("layout.swipe_threshold", layout.swipe_threshold),
            ("viewer.min_zoom", viewer.min_zoom),
            ("viewer.max_zoom", viewer.max_zoom),
            ("viewer.zoom_step", viewer.zoom_step),
            ("viewer.wheel_zoom_in", viewer.wheel_zoom_in),
            ("viewer.wheel_zoom_out", viewer.wheel_zoom_out),
            ("viewer.friction", viewer.friction),
            ("viewer.momentum_threshold", viewer.momentum_threshold),
            ("viewer.rest_epsilon", viewer.rest_epsilon),
            ("viewer.frame_interval_ms", viewer.frame_interval_ms),
        ];
        if let Some((key, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Validation(format!("{key} must be a finite number")));
        }

        if layout.standard_width <= 0.0 {
            return Err(ConfigError::Validation(
                "layout.standard_width must be positive".into(),
            ));
        }
        if layout.min_row_height <= 0.0 || layout.min_row_height > layout.max_row_height {
            return Err(ConfigError::Validation(
                "layout.min_row_height must be positive and not exceed layout.max_row_height"
                    .into(),
            ));
        }
        if layout.fallback_row_height <= 0.0 {
            return Err(ConfigError::Validation(
                "layout.fallback_row_height must be positive".into(),
            ));
        }
        if layout.scroll_step <= 0.0 || layout.swipe_threshold < 0.0 {
            return Err(ConfigError::Validation(
                "layout.scroll_step must be positive and layout.swipe_threshold non-negative"
                    .into(),
            ));
        }

        if viewer.min_zoom <= 0.0 || viewer.min_zoom > 1.0 || viewer.max_zoom < 1.0 {
            return Err(ConfigError::Validation(
                "viewer zoom bounds must satisfy 0 < min_zoom <= 1 <= max_zoom".into(),
            ));
        }
        if viewer.zoom_step <= 1.0 || viewer.wheel_zoom_in <= 1.0 {
            return Err(ConfigError::Validation(
                "viewer.zoom_step and viewer.wheel_zoom_in must be greater than 1".into(),
            ));
        }
        if viewer.wheel_zoom_out <= 0.0 || viewer.wheel_zoom_out >= 1.0 {
            return Err(ConfigError::Validation(
                "viewer.wheel_zoom_out must be between 0 and 1".into(),
            ));
        }
        if viewer.friction <= 0.0 || viewer.friction >= 1.0 {
            return Err(ConfigError::Validation(
                "viewer.friction must be between 0 and 1".into(),
            ));
        }
        if viewer.momentum_threshold < 0.0 {
            return Err(ConfigError::Validation(
                "viewer.momentum_threshold must be non-negative".into(),
            ));
        }
        if viewer.rest_epsilon <= 0.0 || viewer.frame_interval_ms <= 0.0 {
            return Err(ConfigError::Validation(
                "viewer.rest_epsilon and viewer.frame_interval_ms must be positive".into(),
            ));
        }

        if !self.images.pattern.contains("{id}") {
            return Err(ConfigError::Validation(
                "images.pattern must contain {id}".into(),
            ));
        }
        Ok(())
    }
}

/// Inventory column names and marker values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnsConfig {
    /// Marker column flagging featured artworks.
    pub featured: String,
    /// Exact value of the marker column that means "featured".
    pub featured_flag: String,
    /// Pricing value meaning the artwork is sold.
    pub sold_marker: String,
    /// Optional column holding an explicit image reference.
    pub image: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            featured: "Featured".to_string(),
            featured_flag: "x".to_string(),
            sold_marker: "sold".to_string(),
            image: "Image".to_string(),
        }
    }
}

/// Image reference derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory holding the image files, relative to the source directory.
    pub directory: String,
    /// Reference pattern; `{id}` is replaced with the artwork id.
    pub pattern: String,
    /// Low-resolution placeholder pattern. Empty disables progressive loading.
    pub placeholder_pattern: String,
    /// Duration of the placeholder → full-resolution cross-fade.
    pub crossfade_ms: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            directory: "images".to_string(),
            pattern: "{id}.jpg".to_string(),
            placeholder_pattern: String::new(),
            crossfade_ms: 300,
        }
    }
}

/// Tag derivation vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagsConfig {
    /// Keywords matched (case-insensitively) as substrings of the description.
    pub keywords: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "abstract",
                "landscape",
                "portrait",
                "seascape",
                "still life",
                "figurative",
                "botanical",
                "floral",
                "urban",
                "nature",
                "ocean",
                "mountain",
                "oil",
                "acrylic",
                "watercolor",
                "charcoal",
                "ink",
                "mixed media",
                "canvas",
                "linen",
                "paper",
                "print",
                "photograph",
                "digital",
                "sculpture",
                "bronze",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

/// Collection row layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Width each artwork would get at its natural row height.
    pub standard_width: f64,
    /// Lower clamp for the shared row height.
    pub min_row_height: f64,
    /// Upper clamp for the shared row height.
    pub max_row_height: f64,
    /// Row height used when no probe in the collection succeeded.
    pub fallback_row_height: f64,
    /// Scroll distance of one explicit navigation step.
    pub scroll_step: f64,
    /// Net horizontal drag distance that counts as a swipe.
    pub swipe_threshold: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            standard_width: 250.0,
            min_row_height: 150.0,
            max_row_height: 400.0,
            fallback_row_height: 200.0,
            scroll_step: 250.0,
            swipe_threshold: 50.0,
        }
    }
}

/// Detail-view zoom, pan, and momentum parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied by discrete zoom-in / zoom-out actions.
    pub zoom_step: f64,
    /// Factor applied per wheel event when zooming in.
    pub wheel_zoom_in: f64,
    /// Factor applied per wheel event when zooming out.
    pub wheel_zoom_out: f64,
    /// Velocity multiplier applied on every momentum frame.
    pub friction: f64,
    /// Release speed (units/frame) above which a drag turns into momentum.
    pub momentum_threshold: f64,
    /// Speed (units/frame) below which momentum stops.
    pub rest_epsilon: f64,
    /// Frame interval used to normalize drag velocity.
    pub frame_interval_ms: f64,
    /// Frames of the eased reset transition.
    pub reset_frames: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 5.0,
            zoom_step: 1.3,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            friction: 0.92,
            momentum_threshold: 0.5,
            rest_epsilon: 0.1,
            frame_interval_ms: 16.0,
            reset_frames: 12,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CatalogConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CatalogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CatalogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<CatalogConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Ordering of collections, and of artworks inside each collection:
#   source_order  - order of rows in the tables
#   alphabetical  - by name / title, ignoring case and accents
#   random        - shuffled; reproducible when shuffle_seed is set
collection_order = "source_order"
artwork_order = "source_order"

# Fixed seed for random ordering. Omit to reshuffle on every build.
# shuffle_seed = 42

# Two rows with the same artwork id:
#   keep_first - keep the first row and report the others
#   reject     - fail the build
on_duplicate_id = "keep_first"

# ---------------------------------------------------------------------------
# Inventory columns
# ---------------------------------------------------------------------------
[columns]
# Marker column; an artwork is featured when it holds exactly featured_flag.
featured = "Featured"
featured_flag = "x"

# Pricing value meaning the artwork is no longer available.
sold_marker = "sold"

# Optional column with an explicit image reference (overrides images.pattern).
image = "Image"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Directory with the image files, relative to the source directory.
directory = "images"

# Image reference derived from the artwork id.
pattern = "{id}.jpg"

# Low-resolution placeholder shown while the full image loads.
# Leave empty to load the full image directly.
placeholder_pattern = ""

# Cross-fade duration when the full image replaces the placeholder.
crossfade_ms = 300

# ---------------------------------------------------------------------------
# Tags
# ---------------------------------------------------------------------------
[tags]
# Keywords looked up (case-insensitively) in each artwork description.
keywords = [
    "abstract", "landscape", "portrait", "seascape", "still life",
    "figurative", "botanical", "floral", "urban", "nature", "ocean",
    "mountain", "oil", "acrylic", "watercolor", "charcoal", "ink",
    "mixed media", "canvas", "linen", "paper", "print", "photograph",
    "digital", "sculpture", "bronze",
]

# ---------------------------------------------------------------------------
# Collection rows
# ---------------------------------------------------------------------------
[layout]
# Every artwork in a row shares one height, derived from the artwork that
# needs the most height to be standard_width wide, then clamped.
standard_width = 250.0
min_row_height = 150.0
max_row_height = 400.0

# Row height when no image in the collection could be measured.
fallback_row_height = 200.0

# Distance of one next/previous scroll step.
scroll_step = 250.0

# Horizontal drag distance that counts as a swipe.
swipe_threshold = 50.0

# ---------------------------------------------------------------------------
# Detail viewer
# ---------------------------------------------------------------------------
[viewer]
min_zoom = 0.5
max_zoom = 5.0

# Zoom factor of the zoom-in / zoom-out buttons.
zoom_step = 1.3

# Zoom factor per wheel event.
wheel_zoom_in = 1.1
wheel_zoom_out = 0.9

# Momentum after a drag: velocity is multiplied by friction each frame,
# starts only above momentum_threshold and stops below rest_epsilon
# (both in units per frame).
friction = 0.92
momentum_threshold = 0.5
rest_epsilon = 0.1
frame_interval_ms = 16.0

# Frames of the eased transition back to the default view.
reset_frames = 12
"##
}
