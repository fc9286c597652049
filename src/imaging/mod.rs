//! Image processing in pure Rust, with zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + bound** | `image::ImageReader` + `imageops::resize` |
//! | **Sharpness** | variance of the red-channel Laplacian |
//! | **Brightness** | mean of per-pixel `(R+G+B)/3` |
//! | **Tone + white balance** | CSS-filter tone pass, gray-world correction |
//! | **Encode** | lossy WebP, JPEG fallback |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] (the codec seam)
//! - **Metrics / Gate / Enhance**: Pure pixel math over a [`PixelBuffer`]

pub mod backend;
mod calculations;
pub mod enhance;
pub mod gate;
pub mod metrics;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, PixelBuffer, ProcessedImage, RawImageInput};
pub use calculations::calculate_bounded_dimensions;
pub use gate::{QualityThresholds, QualityVerdict, RejectReason};
pub use metrics::QualityMetrics;
pub use params::{
    DecodeParams, EncodeParams, Enhancement, OutputFormat, Quality, QualityProfile,
    ResampleFilter,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
