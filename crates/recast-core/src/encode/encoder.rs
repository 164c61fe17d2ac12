//! Raster encoding for every output format.
//!
//! JPEG and WebP honour the quality value. PNG, BMP and TIFF are lossless
//! containers, so for those it has no effect on the bytes.
//!
//! Lossy WebP goes through libwebp, which is only linked on native targets.
//! On wasm32 every WebP is written lossless by the pure-Rust encoder.

use std::io::Cursor;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::format::Format;

/// Whether WebP output below full quality is lossy on this target.
pub const LOSSY_WEBP: bool = cfg!(not(target_arch = "wasm32"));

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed { format: Format, message: String },
}

/// Encode RGBA pixel data to `format`.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `format` - Target container
/// * `quality` - Encoder quality (0.0 to 1.0); used by JPEG and lossy WebP
/// * `background` - Opaque color to composite onto before encoding
///
/// Formats without alpha given no background simply drop the alpha channel,
/// the way a canvas export does.
pub fn encode_image(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: Format,
    quality: f64,
    background: Option<[u8; 3]>,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    };

    let flattened;
    let (data, color) = match (background, format.supports_alpha()) {
        (Some(bg), _) => {
            flattened = flatten_onto(pixels, bg);
            (flattened.as_slice(), ExtendedColorType::Rgb8)
        }
        (None, false) => {
            flattened = strip_alpha(pixels);
            (flattened.as_slice(), ExtendedColorType::Rgb8)
        }
        (None, true) => (pixels, ExtendedColorType::Rgba8),
    };

    match format {
        Format::Jpeg => JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality))
            .write_image(data, width, height, color)
            .map_err(failed)?,
        Format::Png => PngEncoder::new(&mut buffer)
            .write_image(data, width, height, color)
            .map_err(failed)?,
        Format::Webp if LOSSY_WEBP && quality < 1.0 => {
            return encode_webp_lossy(data, width, height, color, quality);
        }
        Format::Webp => WebPEncoder::new_lossless(&mut buffer)
            .write_image(data, width, height, color)
            .map_err(failed)?,
        Format::Bmp => BmpEncoder::new(&mut buffer)
            .write_image(data, width, height, color)
            .map_err(failed)?,
        Format::Tiff => TiffEncoder::new(&mut buffer)
            .write_image(data, width, height, color)
            .map_err(failed)?,
    }

    Ok(buffer.into_inner())
}

#[cfg(not(target_arch = "wasm32"))]
fn encode_webp_lossy(
    data: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
    quality: f64,
) -> Result<Vec<u8>, EncodeError> {
    let failed = |message: String| EncodeError::EncodingFailed {
        format: Format::Webp,
        message,
    };

    let encoder = match color {
        ExtendedColorType::Rgba8 => webp::Encoder::from_rgba(data, width, height),
        _ => webp::Encoder::from_rgb(data, width, height),
    };

    let mut config =
        webp::WebPConfig::new().map_err(|_| failed("failed to create WebPConfig".to_string()))?;
    config.lossless = 0;
    config.quality = webp_quality(quality);
    config.method = 4;

    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| failed(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

#[cfg(target_arch = "wasm32")]
fn encode_webp_lossy(
    _data: &[u8],
    _width: u32,
    _height: u32,
    _color: ExtendedColorType,
    _quality: f64,
) -> Result<Vec<u8>, EncodeError> {
    Err(EncodeError::EncodingFailed {
        format: Format::Webp,
        message: "lossy WebP is not available on this target".to_string(),
    })
}

/// Map a 0.0-1.0 quality to libwebp's 0-100 scale.
pub fn webp_quality(quality: f64) -> f32 {
    (quality * 100.0).clamp(0.0, 100.0) as f32
}

/// Map a 0.0-1.0 quality to the JPEG encoder's 1-100 scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Composite RGBA pixels over an opaque background, producing RGB.
pub fn flatten_onto(pixels: &[u8], background: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len() / 4 * 3);
    for px in pixels.chunks_exact(4) {
        let alpha = px[3] as u32;
        for channel in 0..3 {
            let fg = px[channel] as u32 * alpha;
            let bg = background[channel] as u32 * (255 - alpha);
            out.push(((fg + bg + 127) / 255) as u8);
        }
    }
    out
}

fn strip_alpha(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}


// ============================================================================
// Property-Based Tests
// ============================================================================
