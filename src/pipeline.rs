//! Per-capture quality pipeline and batch orchestration.
//!
//! Each capture moves through a fixed sequence of stages:
//!
//! ```text
//! Decoding ──err──▶ Failed(Decoding)
//!    │
//! GateChecking ──reject──▶ Rejected(reason)
//!    │
//! PostProcessing
//!    │
//! Encoding ──err──▶ Failed(Encoding)
//!    │
//! Accepted(ProcessedImage)
//! ```
//!
//! Nothing is retried inside the pipeline: a rejected capture is final for
//! that buffer, and the caller starts a fresh invocation after a retake.
//!
//! ## Batches
//!
//! [`process_batch`] runs every capture independently on the rayon pool. Each
//! invocation owns its buffer, so one capture failing or being rejected never
//! affects another. Results come back in input order; progress events are
//! sent as each capture finishes.

use crate::config::PipelineConfig;
use crate::imaging::enhance::post_process;
use crate::imaging::gate;
use crate::imaging::{
    BackendError, ImageBackend, ProcessedImage, QualityMetrics, QualityProfile, QualityVerdict,
    RawImageInput, RejectReason,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Active stage of a single capture's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decoding,
    GateChecking,
    PostProcessing,
    Encoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Decoding => "decode",
            Stage::GateChecking => "quality gate",
            Stage::PostProcessing => "post-process",
            Stage::Encoding => "encode",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not read image: {0}")]
    Decode(#[source] BackendError),
    #[error("Could not encode image: {0}")]
    Encode(#[source] BackendError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Decode(_) => Stage::Decoding,
            PipelineError::Encode(_) => Stage::Encoding,
        }
    }
}

/// Terminal state of a capture that decoded successfully.
#[derive(Debug)]
pub enum ImageOutcome {
    Accepted {
        image: ProcessedImage,
        metrics: QualityMetrics,
    },
    Rejected {
        reason: RejectReason,
        metrics: QualityMetrics,
    },
}

impl ImageOutcome {
    pub fn metrics(&self) -> &QualityMetrics {
        match self {
            ImageOutcome::Accepted { metrics, .. } | ImageOutcome::Rejected { metrics, .. } => {
                metrics
            }
        }
    }
}

/// Gate-only result: what the driver would see before any upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub width: u32,
    pub height: u32,
    pub metrics: QualityMetrics,
    pub verdict: QualityVerdict,
}

/// Decode, bound, and run the quality gate without post-processing or encoding.
pub fn assess_image(
    backend: &impl ImageBackend,
    input: RawImageInput,
    config: &PipelineConfig,
) -> Result<Assessment, PipelineError> {
    let pixels = backend
        .decode(input, &config.decode_params())
        .map_err(PipelineError::Decode)?;
    let (metrics, verdict) = gate::check(&pixels, &config.thresholds());
    Ok(Assessment {
        width: pixels.width(),
        height: pixels.height(),
        metrics,
        verdict,
    })
}

/// Run one capture through every stage.
///
/// `Ok(Rejected)` is a normal outcome, not an error: only codec failures
/// produce `Err`.
pub fn process_image(
    backend: &impl ImageBackend,
    input: RawImageInput,
    config: &PipelineConfig,
    profile: QualityProfile,
) -> Result<ImageOutcome, PipelineError> {
    tracing::debug!(stage = %Stage::Decoding, ?input);
    let mut pixels = backend
        .decode(input, &config.decode_params())
        .map_err(PipelineError::Decode)?;

    tracing::debug!(
        stage = %Stage::GateChecking,
        width = pixels.width(),
        height = pixels.height()
    );
    let (metrics, verdict) = gate::check(&pixels, &config.thresholds());
    if let QualityVerdict::Rejected(reason) = verdict {
        tracing::debug!(?reason, sharpness = metrics.sharpness, brightness = metrics.brightness);
        return Ok(ImageOutcome::Rejected { reason, metrics });
    }

    if let Some(enhancement) = config.enhancement() {
        tracing::debug!(stage = %Stage::PostProcessing);
        post_process(&mut pixels, &enhancement, config.enhance.white_balance);
    }

    tracing::debug!(stage = %Stage::Encoding, ?profile);
    let image = backend
        .encode(&pixels, &config.encode_params(profile))
        .map_err(PipelineError::Encode)?;

    Ok(ImageOutcome::Accepted { image, metrics })
}

/// One capture in a batch, with a caller-chosen label (usually the filename).
#[derive(Debug)]
pub struct LabelledInput {
    pub label: String,
    pub input: RawImageInput,
}

impl LabelledInput {
    pub fn new(label: impl Into<String>, input: RawImageInput) -> Self {
        Self {
            label: label.into(),
            input,
        }
    }
}

/// Progress notification sent as each capture in a batch finishes.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Accepted {
        label: String,
        width: u32,
        height: u32,
        bytes: usize,
        mime_type: &'static str,
        metrics: QualityMetrics,
    },
    Rejected {
        label: String,
        reason: RejectReason,
        metrics: QualityMetrics,
    },
    Failed {
        label: String,
        stage: Stage,
        message: String,
    },
}

impl ProcessEvent {
    fn from_result(label: &str, result: &Result<ImageOutcome, PipelineError>) -> Self {
        let label = label.to_string();
        match result {
            Ok(ImageOutcome::Accepted { image, metrics }) => ProcessEvent::Accepted {
                label,
                width: image.width,
                height: image.height,
                bytes: image.bytes.len(),
                mime_type: image.mime_type(),
                metrics: *metrics,
            },
            Ok(ImageOutcome::Rejected { reason, metrics }) => ProcessEvent::Rejected {
                label,
                reason: *reason,
                metrics: *metrics,
            },
            Err(e) => ProcessEvent::Failed {
                label,
                stage: e.stage(),
                message: e.to_string(),
            },
        }
    }
}

/// The result for one capture in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub label: String,
    pub result: Result<ImageOutcome, PipelineError>,
}

impl BatchEntry {
    pub fn processed(&self) -> Option<&ProcessedImage> {
        match &self.result {
            Ok(ImageOutcome::Accepted { image, .. }) => Some(image),
            _ => None,
        }
    }
}

/// All entries of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn accepted(&self) -> usize {
        self.entries.iter().filter(|e| e.processed().is_some()).count()
    }

    pub fn rejected(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.result, Ok(ImageOutcome::Rejected { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_err()).count()
    }

    /// Serializable summary without image payloads.
    pub fn report(&self) -> BatchReport {
        BatchReport {
            accepted: self.accepted(),
            rejected: self.rejected(),
            failed: self.failed(),
            images: self.entries.iter().map(ImageReport::from).collect(),
        }
    }
}

/// JSON-friendly summary of a batch.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub images: Vec<ImageReport>,
}

#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub label: String,
    #[serde(flatten)]
    pub status: ReportStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportStatus {
    Accepted {
        mime_type: &'static str,
        width: u32,
        height: u32,
        bytes: usize,
        metrics: QualityMetrics,
    },
    Rejected {
        reason: RejectReason,
        message: String,
        metrics: QualityMetrics,
    },
    Failed {
        stage: Stage,
        message: String,
    },
}

impl From<&BatchEntry> for ImageReport {
    fn from(entry: &BatchEntry) -> Self {
        let status = match &entry.result {
            Ok(ImageOutcome::Accepted { image, metrics }) => ReportStatus::Accepted {
                mime_type: image.mime_type(),
                width: image.width,
                height: image.height,
                bytes: image.bytes.len(),
                metrics: *metrics,
            },
            Ok(ImageOutcome::Rejected { reason, metrics }) => ReportStatus::Rejected {
                reason: *reason,
                message: reason.to_string(),
                metrics: *metrics,
            },
            Err(e) => ReportStatus::Failed {
                stage: e.stage(),
                message: e.to_string(),
            },
        };
        ImageReport {
            label: entry.label.clone(),
            status,
        }
    }
}

/// Process every capture independently and collect per-capture results.
///
/// Runs on the current rayon pool; see [`crate::config::effective_threads`].
pub fn process_batch(
    backend: &impl ImageBackend,
    inputs: Vec<LabelledInput>,
    config: &PipelineConfig,
    profile: QualityProfile,
    events: Option<Sender<ProcessEvent>>,
) -> BatchResult {
    let entries = inputs
        .into_par_iter()
        .map(|LabelledInput { label, input }| {
            let result = process_image(backend, input, config, profile);
            match &result {
                Ok(ImageOutcome::Accepted { image, .. }) => {
                    tracing::debug!(
                        %label,
                        width = image.width,
                        height = image.height,
                        "accepted"
                    );
                }
                Ok(ImageOutcome::Rejected { reason, .. }) => {
                    tracing::debug!(%label, ?reason, "rejected");
                }
                Err(e) => tracing::debug!(%label, stage = %e.stage(), error = %e, "failed"),
            }
            if let Some(tx) = &events {
                tx.send(ProcessEvent::from_result(&label, &result)).ok();
            }
            BatchEntry { label, result }
        })
        .collect();

    BatchResult { entries }
}
