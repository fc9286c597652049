//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`pipeline`](crate::pipeline) (which decides what to
//! produce) and the [`backend`](super::backend) (which does the codec work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`QualityProfile`]: Standard (85) vs. pro capture path (98).
//! - [`OutputFormat`]: WebP (preferred) or JPEG (fallback), with MIME type.
//! - [`ResampleFilter`]: Kernel used when bounding oversized captures.
//! - [`Enhancement`]: Contrast/saturation/brightness multipliers.
//! - [`DecodeParams`]: Bounding box and kernel for decode + resize.
//! - [`EncodeParams`]: Preferred format and quality for re-encoding.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Which capture path a batch came from.
///
/// The pro path keeps near-lossless output for close-up inspection shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityProfile {
    #[default]
    Standard,
    Pro,
}

/// Encoded output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Resampling kernel for the downscale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Bilinear.
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Multipliers for the cosmetic tone pass, applied in field order.
///
/// `1.0` for any field is the identity for that adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enhancement {
    pub contrast: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Enhancement {
    pub fn identity() -> Self {
        Self {
            contrast: 1.0,
            saturation: 1.0,
            brightness: 1.0,
        }
    }
}

impl Default for Enhancement {
    fn default() -> Self {
        Self {
            contrast: 1.08,
            saturation: 1.05,
            brightness: 1.02,
        }
    }
}

/// Parameters for a decode operation (decode + bound to `max_dimension`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub max_dimension: u32,
    pub filter: ResampleFilter,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            max_dimension: 2560,
            filter: ResampleFilter::default(),
        }
    }
}

/// Parameters for an encode operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    /// Format to try first; backends may fall back to JPEG.
    pub format: OutputFormat,
    pub quality: Quality,
}
