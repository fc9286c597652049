//! Accept/reject decision for a capture.
//!
//! Both metrics are always computed. Sharpness is checked first, so a capture
//! that is both blurry and dark reports [`RejectReason::BlurTooLow`].

use super::backend::PixelBuffer;
use super::metrics::QualityMetrics;
use serde::Serialize;
use std::fmt;

/// Minimum scores a capture must reach. Both comparisons are strict `<` rejects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub blur: f64,
    pub brightness: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            blur: 40.0,
            brightness: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    BlurTooLow,
    TooDark,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BlurTooLow => f.write_str("Photo is too blurry. Hold steady and retake."),
            RejectReason::TooDark => f.write_str("Photo is too dark. Add light and retake."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityVerdict {
    Accepted,
    Rejected(RejectReason),
}

impl QualityVerdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, QualityVerdict::Accepted)
    }
}

/// Apply thresholds to already-computed metrics.
pub fn evaluate(metrics: &QualityMetrics, thresholds: &QualityThresholds) -> QualityVerdict {
    if metrics.sharpness < thresholds.blur {
        QualityVerdict::Rejected(RejectReason::BlurTooLow)
    } else if metrics.brightness < thresholds.brightness {
        QualityVerdict::Rejected(RejectReason::TooDark)
    } else {
        QualityVerdict::Accepted
    }
}

/// Measure a buffer and decide on it in one step.
pub fn check(
    pixels: &PixelBuffer,
    thresholds: &QualityThresholds,
) -> (QualityMetrics, QualityVerdict) {
    let metrics = QualityMetrics::measure(pixels);
    let verdict = evaluate(&metrics, thresholds);
    (metrics, verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn metrics(sharpness: f64, brightness: f64) -> QualityMetrics {
        QualityMetrics {
            sharpness,
            brightness,
        }
    }

    #[test]
    fn accepts_at_exact_thresholds() {
        let verdict = evaluate(&metrics(40.0, 20.0), &QualityThresholds::default());
        assert_eq!(verdict, QualityVerdict::Accepted);
    }

    #[test]
    fn rejects_just_below_blur_threshold() {
        let verdict = evaluate(&metrics(39.999, 200.0), &QualityThresholds::default());
        assert_eq!(verdict, QualityVerdict::Rejected(RejectReason::BlurTooLow));
    }

    #[test]
    fn rejects_just_below_brightness_threshold() {
        let verdict = evaluate(&metrics(500.0, 19.99), &QualityThresholds::default());
        assert_eq!(verdict, QualityVerdict::Rejected(RejectReason::TooDark));
    }

    #[test]
    fn blur_reason_wins_when_both_fail() {
        let verdict = evaluate(&metrics(0.0, 0.0), &QualityThresholds::default());
        assert_eq!(verdict, QualityVerdict::Rejected(RejectReason::BlurTooLow));
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let strict = QualityThresholds {
            blur: 1000.0,
            brightness: 20.0,
        };
        assert!(!evaluate(&metrics(500.0, 100.0), &strict).is_accepted());
        let lax = QualityThresholds {
            blur: 0.0,
            brightness: 0.0,
        };
        assert!(evaluate(&metrics(0.0, 0.0), &lax).is_accepted());
    }

    #[test]
    fn flat_image_is_always_blurry() {
        for v in [0u8, 128, 255] {
            let pixels = PixelBuffer::from_pixel(16, 16, Rgba([v, v, v, 255]));
            let (m, verdict) = check(&pixels, &QualityThresholds::default());
            assert_eq!(m.sharpness, 0.0);
            assert_eq!(verdict, QualityVerdict::Rejected(RejectReason::BlurTooLow));
        }
    }

    #[test]
    fn black_image_fails_both_tests() {
        let pixels = PixelBuffer::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        let thresholds = QualityThresholds::default();
        let (m, verdict) = check(&pixels, &thresholds);
        assert!(m.sharpness < thresholds.blur);
        assert!(m.brightness < thresholds.brightness);
        assert_eq!(verdict, QualityVerdict::Rejected(RejectReason::BlurTooLow));
    }

    #[test]
    fn reject_reason_messages_name_the_problem() {
        assert!(RejectReason::BlurTooLow.to_string().contains("blurry"));
        assert!(RejectReason::TooDark.to_string().contains("dark"));
    }
}
