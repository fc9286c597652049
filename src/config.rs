//! Pipeline configuration module.
//!
//! Handles loading and validating `config.toml`. Every section and key is
//! optional: a user config file overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! max_dimension = 2560      # Longer-edge bound for decoded captures
//! filter = "triangle"       # triangle (bilinear) | catmull-rom | lanczos3
//!
//! [gate]
//! blur_threshold = 40.0     # Reject below this Laplacian variance
//! brightness_threshold = 20.0 # Reject below this mean brightness (0-255)
//!
//! [enhance]
//! enabled = true
//! contrast = 1.08
//! saturation = 1.05
//! brightness = 1.02
//! white_balance = true      # Gray-world correction after the tone pass
//!
//! [output]
//! format = "webp"           # webp | jpeg (webp falls back to jpeg on failure)
//! quality = 85              # Encode quality, standard capture path (1-100)
//! pro_quality = 98          # Encode quality, pro capture path (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    DecodeParams, EncodeParams, Enhancement, OutputFormat, Quality, QualityProfile,
    QualityThresholds, ResampleFilter,
};
use serde::Deserialize;
use std::fs;
use std::io;
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

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have defaults matching the driver app. User config files need
/// only specify the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Decode bounding box.
    pub resize: ResizeConfig,
    /// Accept/reject thresholds.
    pub gate: GateConfig,
    /// Post-processing for accepted captures.
    pub enhance: EnhanceConfig,
    /// Re-encoding format and quality.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "resize.max_dimension must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("gate.blur_threshold", self.gate.blur_threshold),
            ("gate.brightness_threshold", self.gate.brightness_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        for (name, value) in [
            ("enhance.contrast", self.enhance.contrast),
            ("enhance.saturation", self.enhance.saturation),
            ("enhance.brightness", self.enhance.brightness),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a positive number"
                )));
            }
        }
        for (name, value) in [
            ("output.quality", self.output.quality),
            ("output.pro_quality", self.output.pro_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        Ok(())
    }

    pub fn decode_params(&self) -> DecodeParams {
        DecodeParams {
            max_dimension: self.resize.max_dimension,
            filter: self.resize.filter,
        }
    }

    pub fn thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            blur: self.gate.blur_threshold,
            brightness: self.gate.brightness_threshold,
        }
    }

    /// Tone multipliers, or `None` when enhancement is switched off.
    pub fn enhancement(&self) -> Option<Enhancement> {
        self.enhance.enabled.then(|| Enhancement {
            contrast: self.enhance.contrast,
            saturation: self.enhance.saturation,
            brightness: self.enhance.brightness,
        })
    }

    pub fn encode_params(&self, profile: QualityProfile) -> EncodeParams {
        let quality = match profile {
            QualityProfile::Standard => self.output.quality,
            QualityProfile::Pro => self.output.pro_quality,
        };
        EncodeParams {
            format: self.output.format,
            quality: Quality::new(quality),
        }
    }
}

/// Decode bounding settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Longer-edge bound in pixels. Larger captures are scaled down.
    pub max_dimension: u32,
    /// Resampling kernel for the downscale.
    pub filter: ResampleFilter,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2560,
            filter: ResampleFilter::default(),
        }
    }
}

/// Quality gate thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Minimum variance of the Laplacian.
    pub blur_threshold: f64,
    /// Minimum mean brightness (0-255).
    pub brightness_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        let t = QualityThresholds::default();
        Self {
            blur_threshold: t.blur,
            brightness_threshold: t.brightness,
        }
    }
}

/// Post-processing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    /// Master switch for the whole post-processing pass.
    pub enabled: bool,
    pub contrast: f32,
    pub saturation: f32,
    pub brightness: f32,
    /// Gray-world white balance after the tone pass.
    pub white_balance: bool,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        let e = Enhancement::default();
        Self {
            enabled: true,
            contrast: e.contrast,
            saturation: e.saturation,
            brightness: e.brightness,
            white_balance: true,
        }
    }
}

/// Re-encoding settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Preferred output format.
    pub format: OutputFormat,
    /// Encode quality for the standard capture path.
    pub quality: u32,
    /// Encode quality for the pro capture path.
    pub pro_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: 85,
            pro_quality: 98,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
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

/// Load config from the given file.
///
/// Keys the file leaves out keep their stock defaults, unknown keys are
/// rejected, and the result is validated. A missing file yields the stock
/// defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(content) => toml::from_str::<PipelineConfig>(&content)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => PipelineConfig::default(),
        Err(e) => return Err(e.into()),
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Trailer Photo QC Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Decode
# ---------------------------------------------------------------------------
[resize]
# Captures whose width or height exceed this are scaled down, keeping aspect.
max_dimension = 2560

# Resampling kernel: "triangle" (bilinear), "catmull-rom", or "lanczos3".
filter = "triangle"

# ---------------------------------------------------------------------------
# Quality gate
# ---------------------------------------------------------------------------
[gate]
# Variance of the Laplacian (red channel). Lower scores are rejected as blurry.
blur_threshold = 40.0

# Mean of per-pixel (R+G+B)/3, 0-255. Lower scores are rejected as too dark.
brightness_threshold = 20.0

# ---------------------------------------------------------------------------
# Post-processing (accepted captures only)
# ---------------------------------------------------------------------------
[enhance]
enabled = true

# Tone multipliers, applied in this order. 1.0 = unchanged.
contrast = 1.08
saturation = 1.05
brightness = 1.02

# Gray-world white balance after the tone pass.
white_balance = true

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# "webp" (falls back to jpeg if it cannot be encoded) or "jpeg".
format = "webp"

# Lossy encode quality for the standard capture path (1-100).
quality = 85

# Lossy encode quality for the pro capture path (1-100).
pro_quality = 98

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
