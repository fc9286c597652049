//! Cosmetic normalization applied to accepted captures.
//!
//! Two passes, in order:
//!
//! 1. **Tone**: `contrast → saturate → brightness`, with the CSS Filter Effects
//!    definitions of each primitive. Every primitive clamps to `[0, 255]`
//!    before the next runs; rounding happens once at the end.
//! 2. **Gray-world white balance**: scale each channel so its mean matches the
//!    mean of all three. A channel whose mean is 0 keeps a scale of `1.0`.
//!
//! Alpha is never touched.

use super::backend::PixelBuffer;
use super::params::Enhancement;

/// Rec. 709 luminance weights used by the `saturate()` filter matrix.
const LUMA: [f32; 3] = [0.213, 0.715, 0.072];

fn saturation_matrix(s: f32) -> [[f32; 3]; 3] {
    let [lr, lg, lb] = LUMA;
    [
        [lr + (1.0 - lr) * s, lg - lg * s, lb - lb * s],
        [lr - lr * s, lg + (1.0 - lg) * s, lb - lb * s],
        [lr - lr * s, lg - lg * s, lb + (1.0 - lb) * s],
    ]
}

/// Apply contrast, saturation and brightness multipliers in place.
pub fn apply_tone_filter(pixels: &mut PixelBuffer, enhancement: &Enhancement) {
    let matrix = saturation_matrix(enhancement.saturation);
    let contrast = enhancement.contrast;
    let brightness = enhancement.brightness;

    for pixel in pixels.pixels_mut() {
        let c = [pixel[0], pixel[1], pixel[2]]
            .map(|v| ((v as f32 - 127.5) * contrast + 127.5).clamp(0.0, 255.0));

        let s = matrix.map(|row| (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 255.0));

        for (channel, v) in pixel.0.iter_mut().zip(s) {
            *channel = (v * brightness).clamp(0.0, 255.0).round() as u8;
        }
    }
}

/// Per-channel gray-world correction factors `[r, g, b]`.
///
/// Always finite: a zero-mean channel gets `1.0`.
pub fn gray_world_scales(pixels: &PixelBuffer) -> [f64; 3] {
    let count = pixels.width() as u64 * pixels.height() as u64;
    if count == 0 {
        return [1.0; 3];
    }

    let mut sums = [0u64; 3];
    for pixel in pixels.pixels() {
        for (sum, &v) in sums.iter_mut().zip(&pixel.0[..3]) {
            *sum += v as u64;
        }
    }

    let means = sums.map(|s| s as f64 / count as f64);
    let avg = (means[0] + means[1] + means[2]) / 3.0;
    means.map(|m| if m > 0.0 { avg / m } else { 1.0 })
}

/// Gray-world white balance in place.
pub fn apply_gray_world(pixels: &mut PixelBuffer) {
    let scales = gray_world_scales(pixels);
    if scales == [1.0; 3] {
        return;
    }

    for pixel in pixels.pixels_mut() {
        for (channel, scale) in pixel.0.iter_mut().zip(scales) {
            *channel = (*channel as f64 * scale).round().min(255.0) as u8;
        }
    }
}

/// Full post-processing pass for an accepted capture.
pub fn post_process(pixels: &mut PixelBuffer, enhancement: &Enhancement, white_balance: bool) {
    apply_tone_filter(pixels, enhancement);
    if white_balance {
        apply_gray_world(pixels);
    }
}
