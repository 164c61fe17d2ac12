//! Encoding policy: quality preset to rasterization parameters.
//!
//! This is where a preset's single quality value is turned into everything
//! the rasterizer needs: output dimensions, whether an opaque background is
//! drawn first, how the pixels are smoothed, and the encoder quality.
//!
//! # Branches
//!
//! 1. Original (quality == 1.0): source dimensions, high smoothing.
//! 2. JPEG below 0.6: the raster is shrunk by `max(0.5, quality + 0.3)`
//!    before encoding. Dimension reduction and encoder quality compound.
//! 3. Everything else: source dimensions, smoothing derived from quality.
//!
//! PNG "Original" is not scaled. Every entry point goes through
//! [`encoding_parameters`], so single and batch conversion agree.

use serde::Serialize;

use crate::decode::FilterType;
use crate::format::Format;
use crate::preset::QualityPreset;

/// JPEG presets below this quality also shrink the raster.
const JPEG_REDUCTION_THRESHOLD: f64 = 0.6;

/// Smallest dimension factor applied by the JPEG reduction branch.
const MIN_DIMENSION_FACTOR: f64 = 0.5;

/// Added to the quality value to get the JPEG dimension factor.
const DIMENSION_FACTOR_OFFSET: f64 = 0.3;

/// Image smoothing quality used when drawing onto the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingTier {
    Low,
    Medium,
    High,
}

/// Concrete parameters for one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodingParameters {
    pub output_width: u32,
    pub output_height: u32,
    /// Draw over an opaque background before encoding
    pub requires_background_fill: bool,
    pub smoothing_enabled: bool,
    pub smoothing_tier: SmoothingTier,
    /// Quality handed to the encoder (0.0 to 1.0)
    pub encoder_quality: f64,
}

impl EncodingParameters {
    /// True when the output raster differs in size from the source.
    pub fn is_scaled(&self, source_width: u32, source_height: u32) -> bool {
        self.output_width != source_width || self.output_height != source_height
    }

    /// Resampling filter matching the smoothing settings.
    ///
    /// Disabled smoothing means nearest-neighbour sampling.
    pub fn filter(&self) -> FilterType {
        if !self.smoothing_enabled {
            return FilterType::Nearest;
        }
        match self.smoothing_tier {
            SmoothingTier::Low => FilterType::Bilinear,
            SmoothingTier::Medium => FilterType::CatmullRom,
            SmoothingTier::High => FilterType::Lanczos3,
        }
    }
}

/// Compute the parameters for converting a `source_width` x `source_height`
/// image to `format` with `preset`.
///
/// Pure: identical inputs always give identical parameters.
pub fn encoding_parameters(
    format: Format,
    preset: &QualityPreset,
    source_width: u32,
    source_height: u32,
) -> EncodingParameters {
    let quality = preset.quality_value;

    if preset.is_original() {
        return EncodingParameters {
            output_width: source_width,
            output_height: source_height,
            requires_background_fill: format.requires_background_fill(),
            smoothing_enabled: true,
            smoothing_tier: SmoothingTier::High,
            encoder_quality: quality,
        };
    }

    if reduces_dimensions(format, quality) {
        let factor = reduction_factor(quality);
        return EncodingParameters {
            output_width: scale_dimension(source_width, factor),
            output_height: scale_dimension(source_height, factor),
            requires_background_fill: true,
            // A small raster benefits most from smoothing
            smoothing_enabled: true,
            smoothing_tier: SmoothingTier::High,
            encoder_quality: quality,
        };
    }

    EncodingParameters {
        output_width: source_width,
        output_height: source_height,
        requires_background_fill: format.requires_background_fill(),
        smoothing_enabled: quality > 0.5,
        smoothing_tier: smoothing_tier_for(quality),
        encoder_quality: quality,
    }
}

/// Factor applied to both axes for this format and quality (1.0 = unscaled).
pub fn dimension_factor(format: Format, quality: f64) -> f64 {
    if quality == 1.0 || !reduces_dimensions(format, quality) {
        1.0
    } else {
        reduction_factor(quality)
    }
}

/// Rough output size in bytes, for display next to each preset.
///
/// Advisory only: never used to accept or reject an encoded result.
pub fn estimate_output_size(format: Format, quality: f64, original_len: usize) -> usize {
    (original_len as f64 * compression_ratio(format, quality)).round() as usize
}

fn reduces_dimensions(format: Format, quality: f64) -> bool {
    format == Format::Jpeg && quality < JPEG_REDUCTION_THRESHOLD
}

fn reduction_factor(quality: f64) -> f64 {
    (quality + DIMENSION_FACTOR_OFFSET).max(MIN_DIMENSION_FACTOR)
}

fn scale_dimension(value: u32, factor: f64) -> u32 {
    (value as f64 * factor).round() as u32
}

fn smoothing_tier_for(quality: f64) -> SmoothingTier {
    if quality > 0.8 {
        SmoothingTier::High
    } else if quality > 0.6 {
        SmoothingTier::Medium
    } else {
        SmoothingTier::Low
    }
}

fn compression_ratio(format: Format, quality: f64) -> f64 {
    match format {
        Format::Jpeg => ladder(quality, [0.7, 0.5, 0.35, 0.25, 0.15, 0.08]),
        Format::Webp => ladder(quality, [0.6, 0.4, 0.3, 0.2, 0.12, 0.06]),
        // No dimension reduction for PNG, so the ratio does not depend on quality
        Format::Png => 0.95,
        Format::Bmp | Format::Tiff => {
            if quality > 0.9 {
                0.95
            } else if quality > 0.8 {
                0.85
            } else if quality > 0.7 {
                0.75
            } else {
                0.7
            }
        }
    }
}

/// Ratio buckets: >0.9, >0.8, >0.7, >0.6, >0.4, rest.
fn ladder(quality: f64, ratios: [f64; 6]) -> f64 {
    const BOUNDS: [f64; 5] = [0.9, 0.8, 0.7, 0.6, 0.4];
    BOUNDS
        .iter()
        .position(|&bound| quality > bound)
        .map_or(ratios[5], |i| ratios[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{find_preset, presets_for};

    fn preset(quality: f64) -> QualityPreset {
        QualityPreset::new("test", "Test", quality, "", "", "")
    }

    #[test]
    fn test_original_keeps_dimensions_for_every_format() {
        for format in Format::ALL {
            let params = encoding_parameters(format, &preset(1.0), 4000, 3000);
            assert_eq!((params.output_width, params.output_height), (4000, 3000));
            assert!(params.smoothing_enabled);
            assert_eq!(params.smoothing_tier, SmoothingTier::High);
            assert_eq!(params.encoder_quality, 1.0);
        }
    }

    #[test]
    fn test_original_background_fill_only_without_alpha() {
        let fill = |format| encoding_parameters(format, &preset(1.0), 10, 10).requires_background_fill;
        assert!(fill(Format::Jpeg));
        assert!(fill(Format::Bmp));
        assert!(!fill(Format::Png));
        assert!(!fill(Format::Webp));
        assert!(!fill(Format::Tiff));
    }

    #[test]
    fn test_png_original_is_not_scaled() {
        let original = find_preset(Format::Png, "original").unwrap();
        let params = encoding_parameters(Format::Png, &original, 1000, 1000);
        assert!(!params.is_scaled(1000, 1000));
    }

    #[test]
    fn test_jpeg_ultra_compressed_reduces_dimensions() {
        let params = encoding_parameters(Format::Jpeg, &preset(0.4), 1000, 800);
        assert_eq!((params.output_width, params.output_height), (700, 560));
        assert!(params.requires_background_fill);
        assert!(params.smoothing_enabled);
        assert_eq!(params.smoothing_tier, SmoothingTier::High);
        assert_eq!(params.encoder_quality, 0.4);
    }

    #[test]
    fn test_jpeg_extreme_factor() {
        assert!((dimension_factor(Format::Jpeg, 0.25) - 0.55).abs() < 1e-9);
        let params = encoding_parameters(Format::Jpeg, &preset(0.25), 1000, 800);
        assert_eq!((params.output_width, params.output_height), (550, 440));
    }

    #[test]
    fn test_jpeg_factor_clamped_at_half() {
        assert_eq!(dimension_factor(Format::Jpeg, 0.1), 0.5);
        assert_eq!(dimension_factor(Format::Jpeg, 0.0), 0.5);
        let params = encoding_parameters(Format::Jpeg, &preset(0.05), 201, 99);
        // 100.5 and 49.5 round away from zero
        assert_eq!((params.output_width, params.output_height), (101, 50));
    }

    #[test]
    fn test_jpeg_boundary_at_point_six_is_standard_path() {
        let params = encoding_parameters(Format::Jpeg, &preset(0.6), 1000, 800);
        assert_eq!((params.output_width, params.output_height), (1000, 800));
        assert!(params.requires_background_fill);
        assert!(params.smoothing_enabled);
        assert_eq!(params.smoothing_tier, SmoothingTier::Low);
        assert_eq!(dimension_factor(Format::Jpeg, 0.6), 1.0);
    }

    #[test]
    fn test_webp_low_quality_not_reduced() {
        let params = encoding_parameters(Format::Webp, &preset(0.25), 1000, 800);
        assert_eq!((params.output_width, params.output_height), (1000, 800));
        assert!(!params.requires_background_fill);
        assert!(!params.smoothing_enabled);
        assert_eq!(params.smoothing_tier, SmoothingTier::Low);
        assert_eq!(params.encoder_quality, 0.25);
    }

    #[test]
    fn test_standard_smoothing_tiers() {
        let tier = |q| encoding_parameters(Format::Tiff, &preset(q), 10, 10).smoothing_tier;
        assert_eq!(tier(0.95), SmoothingTier::High);
        assert_eq!(tier(0.85), SmoothingTier::High);
        assert_eq!(tier(0.8), SmoothingTier::Medium);
        assert_eq!(tier(0.7), SmoothingTier::Medium);
        assert_eq!(tier(0.6), SmoothingTier::Low);
    }

    #[test]
    fn test_smoothing_enabled_threshold() {
        let enabled = |q| encoding_parameters(Format::Webp, &preset(q), 10, 10).smoothing_enabled;
        assert!(!enabled(0.5));
        assert!(enabled(0.51));
    }

    #[test]
    fn test_bmp_standard_path_fills_background() {
        let high = find_preset(Format::Bmp, "high").unwrap();
        let params = encoding_parameters(Format::Bmp, &high, 64, 32);
        assert!(params.requires_background_fill);
        assert!(!params.is_scaled(64, 32));
    }

    #[test]
    fn test_filter_mapping() {
        let mut params = encoding_parameters(Format::Png, &preset(1.0), 10, 10);
        assert_eq!(params.filter(), FilterType::Lanczos3);

        params.smoothing_tier = SmoothingTier::Medium;
        assert_eq!(params.filter(), FilterType::CatmullRom);

        params.smoothing_tier = SmoothingTier::Low;
        assert_eq!(params.filter(), FilterType::Bilinear);

        params.smoothing_enabled = false;
        assert_eq!(params.filter(), FilterType::Nearest);
    }

    #[test]
    fn test_catalog_presets_through_policy() {
        // Only the two lowest JPEG presets shrink the raster
        for format in Format::ALL {
            for preset in presets_for(format) {
                let params = encoding_parameters(format, preset, 1200, 900);
                let expect_scaled =
                    format == Format::Jpeg && matches!(preset.id, "ultra-compressed" | "extreme");
                assert_eq!(params.is_scaled(1200, 900), expect_scaled, "{format} {}", preset.id);
            }
        }
    }

    #[test]
    fn test_estimate_jpeg_buckets() {
        assert_eq!(estimate_output_size(Format::Jpeg, 1.0, 1000), 700);
        assert_eq!(estimate_output_size(Format::Jpeg, 0.6, 1000), 150);
        assert_eq!(estimate_output_size(Format::Jpeg, 0.4, 1000), 80);
        assert_eq!(estimate_output_size(Format::Jpeg, 0.25, 1000), 80);
    }

    #[test]
    fn test_estimate_webp_buckets() {
        assert_eq!(estimate_output_size(Format::Webp, 0.95, 1000), 600);
        assert_eq!(estimate_output_size(Format::Webp, 0.6, 1000), 120);
        assert_eq!(estimate_output_size(Format::Webp, 0.25, 1000), 60);
    }

    #[test]
    fn test_estimate_lossless_formats() {
        assert_eq!(estimate_output_size(Format::Png, 1.0, 1000), 950);
        assert_eq!(estimate_output_size(Format::Bmp, 0.95, 1000), 950);
        assert_eq!(estimate_output_size(Format::Tiff, 0.85, 1000), 850);
        assert_eq!(estimate_output_size(Format::Tiff, 0.75, 1000), 750);
        assert_eq!(estimate_output_size(Format::Bmp, 0.7, 1000), 700);
    }

    #[test]
    fn test_estimate_zero_length() {
        assert_eq!(estimate_output_size(Format::Jpeg, 0.4, 0), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
