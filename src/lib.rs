//! # Trailer Photo QC
//!
//! Quality control and normalization for trailer-assembly audit photos.
//! Every capture is decoded and bounded, gated on sharpness and exposure,
//! tone-corrected, and re-encoded for upload. A capture that fails the gate
//! is rejected with a message the driver can act on ("hold steady", "add
//! light") instead of being uploaded.
//!
//! # Architecture: One Pipeline Per Capture
//!
//! ```text
//! raw bytes / file / frame
//!   → Decode + bound (≤ 2560 px)     imaging::RustBackend::decode
//!   → Quality gate                   imaging::gate::check
//!   → Tone + gray-world balance      imaging::enhance::post_process
//!   → Encode (WebP, JPEG fallback)   imaging::RustBackend::encode
//! ```
//!
//! Captures never share state. A batch is just many independent pipelines on
//! the rayon pool, and one bad photo never takes down its neighbours.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Codec seam, pixel metrics, quality gate, enhancement |
//! | [`pipeline`] | Per-capture stage sequence, batch orchestration, JSON report |
//! | [`config`] | `config.toml` loading, validation, and stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Metrics Before Upload
//!
//! The gate runs on the bounded buffer, after resize. Thresholds are tuned for
//! that resolution: a 4000 px original that is slightly soft often passes once
//! downscaled, which matches what a reviewer sees in the audit view.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, and both encoders come from the `image` crate. No
//! system libraries, so the same binary runs on the depot workstation and in
//! CI.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
