//! CLI output formatting for pipeline results.
//!
//! Output is **capture-centric**: every line leads with the capture's label,
//! followed by the verdict and the numbers behind it, so a driver or an
//! auditor can see at a glance which photo needs a retake and why.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! ✓ IMG_0412.jpg → 2560x1920 image/webp (1.8 MB)
//!     Sharpness: 812.4  Brightness: 131.0
//! ✗ IMG_0413.jpg rejected: Photo is too blurry. Hold steady and retake.
//!     Sharpness: 12.7  Brightness: 140.2
//! ! IMG_0414.jpg failed at decode: Could not read image: ...
//!
//! Optimized & Verified 1 image (1 rejected, 1 failed)
//! ```
//!
//! ## Check
//!
//! ```text
//! ✓ IMG_0412.jpg 2560x1920
//!     Sharpness: 812.4  Brightness: 131.0
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and, where the CLI needs it, a `print_*` wrapper that
//! writes to stdout. Format functions are pure and do no I/O.

use crate::imaging::{QualityMetrics, QualityVerdict};
use crate::pipeline::{Assessment, BatchResult, ProcessEvent};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn metrics_line(metrics: &QualityMetrics) -> String {
    format!(
        "{}Sharpness: {:.1}  Brightness: {:.1}",
        indent(1),
        metrics.sharpness,
        metrics.brightness
    )
}

/// Human-readable byte count with one decimal for KB and up.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Format a single batch event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Accepted {
            label,
            width,
            height,
            bytes,
            mime_type,
            metrics,
        } => vec![
            format!(
                "✓ {} → {}x{} {} ({})",
                label,
                width,
                height,
                mime_type,
                format_bytes(*bytes)
            ),
            metrics_line(metrics),
        ],
        ProcessEvent::Rejected {
            label,
            reason,
            metrics,
        } => vec![
            format!("✗ {} rejected: {}", label, reason),
            metrics_line(metrics),
        ],
        ProcessEvent::Failed {
            label,
            stage,
            message,
        } => vec![format!("! {} failed at {}: {}", label, stage, message)],
    }
}

/// One-line batch summary, e.g. `Optimized & Verified 3 images (1 rejected)`.
pub fn format_batch_summary(result: &BatchResult) -> String {
    let mut summary = format!(
        "Optimized & Verified {}",
        plural(result.accepted(), "image")
    );

    let mut problems = Vec::new();
    if result.rejected() > 0 {
        problems.push(format!("{} rejected", result.rejected()));
    }
    if result.failed() > 0 {
        problems.push(format!("{} failed", result.failed()));
    }
    if !problems.is_empty() {
        summary.push_str(&format!(" ({})", problems.join(", ")));
    }
    summary
}

/// Format a gate-only assessment.
pub fn format_assessment(label: &str, assessment: &Assessment) -> Vec<String> {
    let header = match assessment.verdict {
        QualityVerdict::Accepted => format!(
            "✓ {} {}x{}",
            label, assessment.width, assessment.height
        ),
        QualityVerdict::Rejected(reason) => format!(
            "✗ {} {}x{}: {}",
            label, assessment.width, assessment.height, reason
        ),
    };
    vec![header, metrics_line(&assessment.metrics)]
}

pub fn print_assessment(label: &str, assessment: &Assessment) {
    for line in format_assessment(label, assessment) {
        println!("{}", line);
    }
}
