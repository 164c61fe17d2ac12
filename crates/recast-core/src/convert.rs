//! Single image conversion.
//!
//! Decode, ask the policy for parameters, rasterize. The batch pipeline runs
//! this once per item and the single-file entry point calls it directly, so
//! both share one set of format rules.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::format::Format;
use crate::policy::encoding_parameters;
use crate::preset::QualityPreset;
use crate::raster::Rasterizer;
use crate::SourceImage;

/// A conversion failure for one image.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to load image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode image: {0}")]
    Encode(#[from] EncodeError),
}

/// Convert one source image to `format` using `preset`.
pub fn convert_image<R: Rasterizer + ?Sized>(
    rasterizer: &mut R,
    source: &SourceImage,
    format: Format,
    preset: &QualityPreset,
) -> Result<Vec<u8>, ConvertError> {
    let decoded = rasterizer.decode(source)?;
    let params = encoding_parameters(format, preset, decoded.width, decoded.height);
    let encoded = rasterizer.rasterize(&decoded, format, &params)?;

    log::debug!(
        "converted {}: {} q={} {}x{} -> {}x{}, {} -> {} bytes ({:.1}% of original)",
        source.name(),
        format,
        preset.quality_value,
        decoded.width,
        decoded.height,
        params.output_width,
        params.output_height,
        source.byte_len(),
        encoded.len(),
        size_percent(encoded.len(), source.byte_len()),
    );

    Ok(encoded)
}

fn size_percent(encoded: usize, original: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    encoded as f64 / original as f64 * 100.0
}
