//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations that touch a codec:
//! decode (with the bounding resize) and encode. Everything between them is
//! pure pixel math over a [`PixelBuffer`] and lives outside the backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{DecodeParams, EncodeParams, OutputFormat};
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use thiserror::Error;

/// Row-major RGBA8 pixels. `len == width * height * 4` is upheld by `image`.
pub type PixelBuffer = RgbaImage;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A captured or uploaded photo, before decoding.
pub enum RawImageInput {
    /// A file on disk (gallery upload).
    Path(PathBuf),
    /// An in-memory blob.
    Bytes(Vec<u8>),
    /// An already-decoded camera frame.
    Frame(DynamicImage),
}

impl std::fmt::Debug for RawImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawImageInput::Path(p) => f.debug_tuple("Path").field(p).finish(),
            RawImageInput::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            RawImageInput::Frame(img) => write!(f, "Frame({}x{})", img.width(), img.height()),
        }
    }
}

/// Re-encoded output, ready to hand to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    /// Format actually produced (may differ from the preferred one).
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can serve a rayon batch.
pub trait ImageBackend: Sync {
    /// Decode a raw input and bound it to `params.max_dimension`.
    fn decode(&self, input: RawImageInput, params: &DecodeParams)
    -> Result<PixelBuffer, BackendError>;

    /// Encode pixels, preferring `params.format`.
    fn encode(
        &self,
        pixels: &PixelBuffer,
        params: &EncodeParams,
    ) -> Result<ProcessedImage, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that hands out queued buffers and records operations.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<PixelBuffer>>,
        pub fail_encode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode {
            max_dimension: u32,
        },
        Encode {
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Buffers are handed out last-first, like a stack.
        pub fn with_buffers(buffers: Vec<PixelBuffer>) -> Self {
            Self {
                decode_results: Mutex::new(buffers),
                ..Self::default()
            }
        }

        pub fn failing_encode(buffers: Vec<PixelBuffer>) -> Self {
            Self {
                decode_results: Mutex::new(buffers),
                fail_encode: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(
            &self,
            _input: RawImageInput,
            params: &DecodeParams,
        ) -> Result<PixelBuffer, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode {
                max_dimension: params.max_dimension,
            });

            self.decode_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock buffer".to_string()))
        }

        fn encode(
            &self,
            pixels: &PixelBuffer,
            params: &EncodeParams,
        ) -> Result<ProcessedImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: pixels.width(),
                height: pixels.height(),
                format: params.format,
                quality: params.quality.value(),
            });

            if self.fail_encode {
                return Err(BackendError::Encode("mock encoder refused".to_string()));
            }
            Ok(ProcessedImage {
                bytes: vec![0xAB; 16],
                format: params.format,
                width: pixels.width(),
                height: pixels.height(),
            })
        }
    }

    #[test]
    fn mock_hands_out_buffers_and_records_decode() {
        let backend = MockBackend::with_buffers(vec![PixelBuffer::new(8, 6)]);

        let pixels = backend
            .decode(RawImageInput::Bytes(vec![]), &DecodeParams::default())
            .unwrap();
        assert_eq!(pixels.dimensions(), (8, 6));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode { max_dimension: 2560 }]);
    }

    #[test]
    fn mock_decode_errors_when_empty() {
        let backend = MockBackend::new();
        let result = backend.decode(RawImageInput::Bytes(vec![]), &DecodeParams::default());
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::new();
        let processed = backend
            .encode(
                &PixelBuffer::new(4, 3),
                &EncodeParams {
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(98),
                },
            )
            .unwrap();

        assert_eq!(processed.mime_type(), "image/jpeg");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Encode {
                width: 4,
                height: 3,
                quality: 98,
                ..
            }
        ));
    }

    #[test]
    fn raw_input_debug_hides_payload() {
        let input = RawImageInput::Bytes(vec![1, 2, 3]);
        assert_eq!(format!("{input:?}"), "Bytes(3 bytes)");
    }
}
