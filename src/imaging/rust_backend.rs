//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `image::imageops::resize`, kernel from [`ResampleFilter`](super::ResampleFilter) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy) at the requested quality |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |

use super::backend::{BackendError, ImageBackend, PixelBuffer, ProcessedImage, RawImageInput};
use super::calculations::calculate_bounded_dimensions;
use super::params::{DecodeParams, EncodeParams, OutputFormat, Quality};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn any raw input into a decoded image, sniffing the format from content.
fn load_image(input: RawImageInput) -> Result<DynamicImage, BackendError> {
    match input {
        RawImageInput::Frame(img) => Ok(img),
        RawImageInput::Path(path) => ImageReader::open(&path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e))),
        RawImageInput::Bytes(bytes) => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string())),
    }
}

/// Lossy WebP at the requested quality, alpha preserved.
fn encode_webp(pixels: &PixelBuffer, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let encoder = webp::Encoder::from_rgba(pixels.as_raw(), pixels.width(), pixels.height());
    let encoded = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::Encode(format!("WebP encode failed: {:?}", e)))?;
    Ok(encoded.to_vec())
}

/// JPEG has no alpha channel; alpha is dropped, not composited.
fn encode_jpeg(pixels: &PixelBuffer, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn decode(
        &self,
        input: RawImageInput,
        params: &DecodeParams,
    ) -> Result<PixelBuffer, BackendError> {
        let img = load_image(input)?;
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(BackendError::Decode("image has no pixels".into()));
        }

        let rgba = img.into_rgba8();
        let (target_w, target_h) =
            calculate_bounded_dimensions((width, height), params.max_dimension);
        if (target_w, target_h) == (width, height) {
            return Ok(rgba);
        }

        tracing::debug!(width, height, target_w, target_h, "bounding oversized capture");
        Ok(image::imageops::resize(
            &rgba,
            target_w,
            target_h,
            params.filter.into(),
        ))
    }

    fn encode(
        &self,
        pixels: &PixelBuffer,
        params: &EncodeParams,
    ) -> Result<ProcessedImage, BackendError> {
        let (bytes, format) = match params.format {
            OutputFormat::WebP => match encode_webp(pixels, params.quality) {
                Ok(bytes) => (bytes, OutputFormat::WebP),
                Err(e) => {
                    tracing::warn!(error = %e, "WebP unavailable, falling back to JPEG");
                    (encode_jpeg(pixels, params.quality)?, OutputFormat::Jpeg)
                }
            },
            OutputFormat::Jpeg => (encode_jpeg(pixels, params.quality)?, OutputFormat::Jpeg),
        };

        Ok(ProcessedImage {
            bytes,
            format,
            width: pixels.width(),
            height: pixels.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ResampleFilter;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(gradient(width, height))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = gradient(width, height);
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn decode_bytes_passes_small_image_through() {
        let backend = RustBackend::new();
        let pixels = backend
            .decode(RawImageInput::Bytes(png_bytes(200, 150)), &DecodeParams::default())
            .unwrap();
        assert_eq!(pixels.dimensions(), (200, 150));
        assert_eq!(pixels.as_raw().len(), 200 * 150 * 4);
    }

    #[test]
    fn decode_bounds_oversized_input() {
        let backend = RustBackend::new();
        let params = DecodeParams {
            max_dimension: 100,
            filter: ResampleFilter::Triangle,
        };
        let pixels = backend
            .decode(RawImageInput::Bytes(png_bytes(400, 300)), &params)
            .unwrap();
        assert_eq!(pixels.dimensions(), (100, 75));
    }

    #[test]
    fn decode_file_sniffs_format_regardless_of_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("capture.bin");
        create_test_jpeg(&path, 64, 48);

        let backend = RustBackend::new();
        let pixels = backend
            .decode(RawImageInput::Path(path), &DecodeParams::default())
            .unwrap();
        assert_eq!(pixels.dimensions(), (64, 48));
    }

    #[test]
    fn decode_frame_converts_to_rgba() {
        let backend = RustBackend::new();
        let frame = DynamicImage::ImageRgb8(gradient(10, 10));
        let pixels = backend
            .decode(RawImageInput::Frame(frame), &DecodeParams::default())
            .unwrap();
        assert_eq!(pixels.get_pixel(3, 7).0, [3, 7, 128, 255]);
    }

    #[test]
    fn decode_corrupt_bytes_errors() {
        let backend = RustBackend::new();
        let result = backend.decode(
            RawImageInput::Bytes(b"definitely not an image".to_vec()),
            &DecodeParams::default(),
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.decode(
            RawImageInput::Path("/nonexistent/image.jpg".into()),
            &DecodeParams::default(),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn encode_webp_produces_riff_container() {
        let backend = RustBackend::new();
        let pixels = DynamicImage::ImageRgb8(gradient(32, 24)).into_rgba8();
        let processed = backend.encode(&pixels, &EncodeParams::default()).unwrap();

        assert_eq!(processed.format, OutputFormat::WebP);
        assert_eq!(processed.mime_type(), "image/webp");
        assert_eq!(&processed.bytes[..4], b"RIFF");
        assert_eq!((processed.width, processed.height), (32, 24));
    }

    #[test]
    fn webp_quality_changes_output_size() {
        let backend = RustBackend::new();
        let noisy = PixelBuffer::from_fn(160, 120, |x, y| {
            let v = ((x * 7919 + y * 104_729) % 251) as u8;
            image::Rgba([v, v.wrapping_mul(3), v.wrapping_add(90), 255])
        });
        let encode = |q| {
            backend
                .encode(
                    &noisy,
                    &EncodeParams {
                        format: OutputFormat::WebP,
                        quality: Quality::new(q),
                    },
                )
                .unwrap()
        };
        let standard = encode(85);
        let pro = encode(98);
        assert_eq!(standard.format, OutputFormat::WebP);
        assert_eq!(pro.format, OutputFormat::WebP);
        assert!(standard.bytes.len() < pro.bytes.len());
        // Lossy output is well below the raw RGBA size.
        assert!(standard.bytes.len() < noisy.as_raw().len());
    }

    #[test]
    fn encode_jpeg_roundtrips_dimensions() {
        let backend = RustBackend::new();
        let pixels = DynamicImage::ImageRgb8(gradient(40, 30)).into_rgba8();
        let processed = backend
            .encode(
                &pixels,
                &EncodeParams {
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(98),
                },
            )
            .unwrap();

        assert_eq!(processed.mime_type(), "image/jpeg");
        let dims = ImageReader::new(Cursor::new(&processed.bytes))
            .with_guessed_format()
            .unwrap()
            .into_dimensions()
            .unwrap();
        assert_eq!(dims, (40, 30));
    }

    #[test]
    fn lower_quality_jpeg_is_smaller() {
        let backend = RustBackend::new();
        let pixels = DynamicImage::ImageRgb8(gradient(128, 128)).into_rgba8();
        let encode = |q| {
            backend
                .encode(
                    &pixels,
                    &EncodeParams {
                        format: OutputFormat::Jpeg,
                        quality: Quality::new(q),
                    },
                )
                .unwrap()
                .bytes
                .len()
        };
        assert!(encode(20) < encode(98));
    }
}
