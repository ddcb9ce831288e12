//! Run configuration.
//!
//! A run is described by one immutable [`WatermarkConfig`]. It is resolved
//! once at startup from three layers, later layers overriding earlier ones:
//!
//! ```text
//! stock defaults  →  --config file.toml  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! watermark = "watermark.png"  # Watermark image (PNG with alpha recommended)
//! input = "./in"               # Directory of source photos
//! output = "./out"             # Root of written outputs
//! sizes = "source"             # Comma-separated sizes: source, 500, thumb=200
//! quality = 85                 # JPEG quality (1-100)
//! layout = "labeled"           # "labeled" → out/<label>/<file>, "flat" → out/<file>
//! on_decode_error = "abort"    # "abort" stops the run, "skip" moves on
//!
//! [placement]
//! offset_x = 0                 # Pixels from the left edge
//! offset_y = 0                 # Pixels from the bottom edge
//! height_percentage = 10       # Watermark height as % of image height
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CompositeParams, Placement, Quality};
use crate::sizes::{SizeListError, SizeRequests};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid size list: {0}")]
    Sizes(#[from] SizeListError),
}

/// Where each variant lands under the output root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// `{output}/{label}/{filename}`
    #[default]
    Labeled,
    /// `{output}/{filename}`, single size only.
    Flat,
}

/// What to do when a source image cannot be read or decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Stop the whole run on the first bad file.
    #[default]
    Abort,
    /// Log the file as skipped and continue with the next one.
    Skip,
}

/// Largest accepted `placement.height_percentage`.
pub const MAX_HEIGHT_PERCENTAGE: u32 = 1000;

/// Full run configuration.
///
/// All fields have defaults matching the stock `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Watermark image file.
    pub watermark: PathBuf,
    /// Directory of source photos (not recursed).
    pub input: PathBuf,
    /// Root directory for outputs.
    pub output: PathBuf,
    /// Size list, e.g. `"source,500,thumb=200"`.
    pub sizes: String,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    pub layout: OutputLayout,
    pub on_decode_error: DecodeErrorPolicy,
    /// Watermark size and position.
    pub placement: PlacementConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            watermark: PathBuf::from("watermark.png"),
            input: PathBuf::from("./in"),
            output: PathBuf::from("./out"),
            sizes: "source".to_string(),
            quality: 85,
            layout: OutputLayout::default(),
            on_decode_error: DecodeErrorPolicy::default(),
            placement: PlacementConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl WatermarkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.placement.height_percentage > MAX_HEIGHT_PERCENTAGE {
            return Err(ConfigError::Validation(format!(
                "placement.height_percentage must be at most {MAX_HEIGHT_PERCENTAGE}"
            )));
        }
        let sizes = self.size_requests()?;
        if self.layout == OutputLayout::Flat && sizes.len() != 1 {
            return Err(ConfigError::Validation(format!(
                "flat layout needs exactly one size, got {}",
                sizes.len()
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn size_requests(&self) -> Result<SizeRequests, SizeListError> {
        SizeRequests::parse(&self.sizes)
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    pub fn composite_params(&self) -> CompositeParams {
        CompositeParams {
            height_percentage: self.placement.height_percentage,
            placement: Placement {
                offset_x: self.placement.offset_x,
                offset_y: self.placement.offset_y,
            },
        }
    }
}

/// Watermark placement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Distance from the image's left edge to the watermark's left edge.
    pub offset_x: i64,
    /// Distance from the image's bottom edge to the watermark's bottom edge.
    pub offset_y: i64,
    /// Watermark height as a percentage of each image's height.
    pub height_percentage: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            height_percentage: 10,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
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

/// Values given explicitly on the command line.
///
/// Serialized sparsely (unset fields are omitted) so it can be merged as the
/// top layer with [`merge_toml`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<OutputLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_decode_error: Option<DecodeErrorPolicy>,
    #[serde(skip_serializing_if = "PlacementOverrides::is_empty")]
    pub placement: PlacementOverrides,
    #[serde(skip_serializing_if = "ProcessingOverrides::is_empty")]
    pub processing: ProcessingOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_percentage: Option<u32>,
}

impl PlacementOverrides {
    fn is_empty(&self) -> bool {
        self.offset_x.is_none() && self.offset_y.is_none() && self.height_percentage.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl ProcessingOverrides {
    fn is_empty(&self) -> bool {
        self.max_processes.is_none()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(WatermarkConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge optional layers onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<WatermarkConfig, ConfigError> {
    let merged = layers.into_iter().fold(base, merge_toml);
    let config: WatermarkConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the run config: stock defaults, then `file` (if given), then `overrides`.
pub fn load_config(
    file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<WatermarkConfig, ConfigError> {
    let mut layers = Vec::new();
    if let Some(path) = file {
        layers.push(load_raw_config(path)?);
    }
    layers.push(toml::Value::try_from(overrides)?);
    resolve_config(stock_defaults_value(), layers)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# batch-watermark configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# Watermark image. PNG with an alpha channel gives the cleanest result.
watermark = "watermark.png"

# Directory of source photos. Only regular files directly inside it are
# processed; subdirectories are ignored.
input = "./in"

# Root directory for outputs.
output = "./out"

# Comma-separated output sizes. Each entry is one of:
#   source       keep the composited width (no resize)
#   500          label "500", 500px wide, height keeps the aspect ratio
#   thumb=200    label "thumb", 200px wide
sizes = "source"

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# "labeled" writes out/<label>/<file>; "flat" writes out/<file> and
# requires exactly one size.
layout = "labeled"

# "abort" stops the run on the first unreadable image; "skip" logs it
# and moves on.
on_decode_error = "abort"

# ---------------------------------------------------------------------------
# Watermark placement
# ---------------------------------------------------------------------------
[placement]
# Pixels from the image's left edge to the watermark's left edge.
offset_x = 0

# Pixels from the image's bottom edge to the watermark's bottom edge.
offset_y = 0

# Watermark height as a percentage of each image's height. The watermark
# keeps its own aspect ratio. At most 1000.
height_percentage = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(tmp: &TempDir, content: &str) -> PathBuf {
        let path = tmp.path().join("watermark.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_config_values() {
        let config = WatermarkConfig::default();
        assert_eq!(config.watermark, PathBuf::from("watermark.png"));
        assert_eq!(config.input, PathBuf::from("./in"));
        assert_eq!(config.output, PathBuf::from("./out"));
        assert_eq!(config.sizes, "source");
        assert_eq!(config.quality, 85);
        assert_eq!(config.layout, OutputLayout::Labeled);
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Abort);
        assert_eq!(config.placement.height_percentage, 10);
        assert_eq!(config.placement.offset_x, 0);
        assert_eq!(config.placement.offset_y, 0);
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(WatermarkConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
sizes = "source,500"
[placement]
offset_x = -12
"#;
        let config: WatermarkConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sizes, "source,500");
        assert_eq!(config.placement.offset_x, -12);
        assert_eq!(config.placement.height_percentage, 10);
        assert_eq!(config.quality, 85);
    }

    #[test]
    fn parse_enums_lowercase() {
        let toml = r#"
layout = "flat"
on_decode_error = "skip"
"#;
        let config: WatermarkConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.layout, OutputLayout::Flat);
        assert_eq!(config.on_decode_error, DecodeErrorPolicy::Skip);
    }

    #[test]
    fn composite_params_from_placement() {
        let mut config = WatermarkConfig::default();
        config.placement = PlacementConfig {
            offset_x: 5,
            offset_y: -7,
            height_percentage: 25,
        };
        let params = config.composite_params();
        assert_eq!(params.height_percentage, 25);
        assert_eq!(params.placement, Placement { offset_x: 5, offset_y: -7 });
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_quality_boundary_ok() {
        for quality in [1, 100] {
            let config = WatermarkConfig {
                quality,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn validate_quality_out_of_range() {
        for quality in [0, 101] {
            let config = WatermarkConfig {
                quality,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn validate_empty_sizes() {
        let config = WatermarkConfig {
            sizes: " , ,".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Sizes(SizeListError::Empty))
        ));
    }

    #[test]
    fn validate_flat_layout_needs_single_size() {
        let config = WatermarkConfig {
            sizes: "source,500".into(),
            layout: OutputLayout::Flat,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = WatermarkConfig {
            layout: OutputLayout::Flat,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_height_percentage_upper_bound() {
        let mut config = WatermarkConfig::default();
        config.placement.height_percentage = MAX_HEIGHT_PERCENTAGE;
        assert!(config.validate().is_ok());

        config.placement.height_percentage = MAX_HEIGHT_PERCENTAGE + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_processes() {
        let config = WatermarkConfig {
            processing: ProcessingConfig {
                max_processes: Some(0),
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Threads
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // Merging and layering
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("quality = 85").unwrap();
        let overlay: toml::Value = toml::from_str("quality = 60").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["quality"].as_integer(), Some(60));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[placement]
offset_x = 1
offset_y = 2
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[placement]\noffset_y = 9").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["placement"]["offset_x"].as_integer(), Some(1));
        assert_eq!(merged["placement"]["offset_y"].as_integer(), Some(9));
    }

    #[test]
    fn overrides_serialize_sparsely() {
        let overrides = ConfigOverrides {
            quality: Some(70),
            placement: PlacementOverrides {
                offset_y: Some(-3),
                ..Default::default()
            },
            ..Default::default()
        };
        let value = toml::Value::try_from(&overrides).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["placement"].as_table().unwrap().len(), 1);
    }

    #[test]
    fn load_config_without_file_is_defaults() {
        let config = load_config(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.quality, 85);
        assert_eq!(config.sizes, "source");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
input = "photos"
sizes = "source,800"
[placement]
height_percentage = 20
"#,
        );
        let config = load_config(Some(&path), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.input, PathBuf::from("photos"));
        assert_eq!(config.sizes, "source,800");
        assert_eq!(config.placement.height_percentage, 20);
        assert_eq!(config.output, PathBuf::from("./out"));
    }

    #[test]
    fn load_config_flags_override_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
quality = 60
[placement]
offset_x = 10
offset_y = 10
"#,
        );
        let overrides = ConfigOverrides {
            quality: Some(95),
            placement: PlacementOverrides {
                offset_x: Some(-4),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = load_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.quality, 95);
        assert_eq!(config.placement.offset_x, -4);
        assert_eq!(config.placement.offset_y, 10);
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let result = load_config(
            Some(Path::new("/nonexistent/watermark.toml")),
            &ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not valid toml [[[");
        let result = load_config(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "qualty = 90");
        let result = load_config(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let toml = "[placement]\ncorner = \"top-right\"";
        let result: Result<WatermarkConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let overrides = ConfigOverrides {
            sizes: Some("".into()),
            ..Default::default()
        };
        let result = load_config(None, &overrides);
        assert!(matches!(result, Err(ConfigError::Sizes(_))));
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let config: WatermarkConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = WatermarkConfig::default();
        assert_eq!(config.watermark, defaults.watermark);
        assert_eq!(config.input, defaults.input);
        assert_eq!(config.output, defaults.output);
        assert_eq!(config.sizes, defaults.sizes);
        assert_eq!(config.quality, defaults.quality);
        assert_eq!(config.layout, defaults.layout);
        assert_eq!(config.on_decode_error, defaults.on_decode_error);
        assert_eq!(
            config.placement.height_percentage,
            defaults.placement.height_percentage
        );
        assert_eq!(config.processing.max_processes, None);
    }
}
