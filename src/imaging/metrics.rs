//! Scalar quality metrics over a [`PixelBuffer`].
//!
//! Both metrics are pure functions of the pixels and are computed over the
//! whole buffer, never a sample.
//!
//! ## Sharpness
//!
//! The classic variance-of-Laplacian focus measure. For each interior pixel
//! the 5-point Laplacian
//!
//! ```text
//!  0  1  0
//!  1 -4  1
//!  0  1  0
//! ```
//!
//! is taken over the **red channel only**, then the population variance of all
//! responses is the score. Red stands in for luma so that scores stay
//! comparable with the thresholds drivers' phones were calibrated against;
//! switching to weighted luma would require recalibrating `blur_threshold`.
//!
//! ## Brightness
//!
//! The mean over all pixels of `floor((R + G + B) / 3)`, in `[0, 255]`.

use super::backend::PixelBuffer;
use serde::Serialize;

/// Sharpness and brightness of one capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub sharpness: f64,
    pub brightness: f64,
}

impl QualityMetrics {
    /// Compute both metrics. Neither short-circuits the other.
    pub fn measure(pixels: &PixelBuffer) -> Self {
        Self {
            sharpness: blur_score(pixels),
            brightness: brightness(pixels),
        }
    }
}

/// Variance of the red-channel Laplacian over interior pixels.
///
/// Images narrower or shorter than 3px have no interior and score 0.
pub fn blur_score(pixels: &PixelBuffer) -> f64 {
    let (width, height) = (pixels.width() as usize, pixels.height() as usize);
    if width < 3 || height < 3 {
        return 0.0;
    }

    let data = pixels.as_raw();
    let stride = width * 4;
    let red = |x: usize, y: usize| data[y * stride + x * 4] as i64;

    // Integer accumulation keeps the result exact: |laplacian| <= 1020.
    let mut sum: i64 = 0;
    let mut sum_sq: i64 = 0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let lap =
                red(x, y - 1) + red(x, y + 1) + red(x - 1, y) + red(x + 1, y) - 4 * red(x, y);
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let n = ((width - 2) * (height - 2)) as i128;
    let (sum, sum_sq) = (sum as i128, sum_sq as i128);
    // n * Σx² − (Σx)² is the unnormalized population variance and never negative.
    (n * sum_sq - sum * sum) as f64 / (n * n) as f64
}

/// Mean of the per-pixel integer RGB average, in `[0, 255]`.
pub fn brightness(pixels: &PixelBuffer) -> f64 {
    let count = pixels.width() as u64 * pixels.height() as u64;
    if count == 0 {
        return 0.0;
    }

    let total: u64 = pixels
        .pixels()
        .map(|p| (p[0] as u64 + p[1] as u64 + p[2] as u64) / 3)
        .sum();
    total as f64 / count as f64
}
