//! Pipeline configuration.
//!
//! Two layers:
//!
//! - [`IngestConfig`]: deployment settings, loaded once from
//!   `media-ingest.toml` on top of the stock defaults.
//! - [`UploadOptions`]: what a single request overrides (album, prior
//!   artifact, box size, ...). Resolved against an `IngestConfig` into an
//!   immutable [`UploadConfig`] that lives for exactly one upload.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! static_dir = "../static"         # or "prefix:dir" mappings, first one wins
//! min_size = 1                     # bytes
//! max_size = 10000000              # bytes
//! max_dimension = 1280             # longer edge of full-size artifacts
//! small_max_dimension = 720        # longer edge of _small artifacts
//! quality = 88                     # JPEG quality (1-100)
//! placeholder_dir = "/upload/default/"
//! frame_tool = "ffmpeg"
//!
//! [processing]
//! max_processes = 4                # Max parallel uploads in batch mode
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_STATIC_DIR: &str = "../static";
pub const DEFAULT_MIN_SIZE: u64 = 1;
pub const DEFAULT_MAX_SIZE: u64 = 10_000_000;
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;
pub const DEFAULT_SMALL_MAX_DIMENSION: u32 = 720;
pub const DEFAULT_QUALITY: u8 = 88;
pub const DEFAULT_PLACEHOLDER_DIR: &str = "/upload/default/";
pub const DEFAULT_FRAME_TOOL: &str = "ffmpeg";
pub const DEFAULT_UPLOAD_TYPE: i32 = 1;

/// Name of the config file looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "media-ingest.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Deployment-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Static root; artifacts go under `{static_dir}/upload/`.
    pub static_dir: String,
    /// Smallest accepted upload, in bytes.
    pub min_size: u64,
    /// Largest accepted upload, in bytes.
    pub max_size: u64,
    /// Longer-edge cap for full-size artifacts.
    pub max_dimension: u32,
    /// Longer-edge cap for `_small` artifacts.
    pub small_max_dimension: u32,
    /// JPEG encoding quality.
    pub quality: u8,
    /// Prior artifacts whose URL contains this are never deleted.
    pub placeholder_dir: String,
    /// Program used to pull a still out of video/audio uploads.
    pub frame_tool: String,
    pub processing: ProcessingConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            max_dimension: DEFAULT_MAX_DIMENSION,
            small_max_dimension: DEFAULT_SMALL_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            placeholder_dir: DEFAULT_PLACEHOLDER_DIR.to_string(),
            frame_tool: DEFAULT_FRAME_TOOL.to_string(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_size > self.max_size {
            return Err(ConfigError::Validation(
                "min_size must not exceed max_size".into(),
            ));
        }
        if self.max_dimension == 0 || self.small_max_dimension == 0 {
            return Err(ConfigError::Validation(
                "max_dimension and small_max_dimension must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.static_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "static_dir must not be empty".into(),
            ));
        }
        if self.placeholder_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "placeholder_dir must not be empty".into(),
            ));
        }
        if self.frame_tool.trim().is_empty() {
            return Err(ConfigError::Validation(
                "frame_tool must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings for batch ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of uploads processed at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Per-request overrides. `None` means "use the deployment setting".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub static_dir: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub max_dimension: Option<u32>,
    pub small_max_dimension: Option<u32>,
    /// Album the photo belongs to; enables box clipping of the small variant.
    pub album_id: Option<u64>,
    /// Public URL of the artifact this upload replaces.
    pub last_source: Option<String>,
    /// Upload type code (1-5).
    pub upload_type: Option<i32>,
    /// Explicit output box width (avatar size, album clip box).
    pub width: Option<u32>,
    /// Explicit output box height (avatar size, album clip box).
    pub height: Option<u32>,
}

/// Settings for one upload, after overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub static_dir: String,
    pub min_size: u64,
    pub max_size: u64,
    pub max_dimension: u32,
    pub small_max_dimension: u32,
    pub quality: u8,
    pub placeholder_dir: String,
    pub album_id: Option<u64>,
    pub last_source: Option<String>,
    pub upload_type: i32,
    /// Output box, present only when both width and height were given.
    pub output_box: Option<(u32, u32)>,
}

impl UploadConfig {
    /// Merge `options` over `base`, field by field.
    ///
    /// Zero and empty overrides are treated as absent.
    pub fn resolve(base: &IngestConfig, options: UploadOptions) -> Self {
        let width = options.width.filter(|&w| w > 0);
        let height = options.height.filter(|&h| h > 0);
        Self {
            static_dir: options
                .static_dir
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| base.static_dir.clone()),
            min_size: options.min_size.filter(|&n| n > 0).unwrap_or(base.min_size),
            max_size: options.max_size.filter(|&n| n > 0).unwrap_or(base.max_size),
            max_dimension: options
                .max_dimension
                .filter(|&n| n > 0)
                .unwrap_or(base.max_dimension),
            small_max_dimension: options
                .small_max_dimension
                .filter(|&n| n > 0)
                .unwrap_or(base.small_max_dimension),
            quality: base.quality,
            placeholder_dir: base.placeholder_dir.clone(),
            album_id: options.album_id.filter(|&id| id > 0),
            last_source: options.last_source.filter(|s| !s.is_empty()),
            upload_type: options
                .upload_type
                .filter(|&code| code != 0)
                .unwrap_or(DEFAULT_UPLOAD_TYPE),
            output_box: width.zip(height),
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
    toml::Value::try_from(IngestConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<IngestConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IngestConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file.
///
/// A missing file yields the stock defaults. A file that exists but does
/// not parse, or that sets invalid values, is an error.
pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# media-ingest configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Static root. Artifacts are written under {static_dir}/upload/ and served
# from the static root's parent, so ../static/upload/x.jpeg becomes
# /static/upload/x.jpeg. A "prefix:dir" mapping list is also accepted; the
# first mapping's dir is used.
static_dir = "../static"

# Accepted upload size range, in bytes (inclusive).
min_size = 1
max_size = 10000000

# Longer-edge cap for full-size artifacts, in pixels.
max_dimension = 1280

# Longer-edge cap for _small artifacts, in pixels.
small_max_dimension = 720

# JPEG encoding quality (1 = worst, 100 = best). PNG and GIF ignore it.
quality = 88

# Prior artifacts whose URL contains this path are never deleted.
placeholder_dir = "/upload/default/"

# Program used to extract a still from video/audio uploads.
frame_tool = "ffmpeg"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum uploads processed in parallel by `media-ingest ingest`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
