//! Quality preset catalog.
//!
//! Each output format exposes its own ladder of presets. A preset is just a
//! named quality value in `[0, 1]` plus descriptive text; the encoding policy
//! decides what that value means for a given format.
//!
//! A quality value of exactly `1.0` is the "Original" sentinel: pure format
//! conversion with no scaling.

use serde::Serialize;
use thiserror::Error;

use crate::encode::LOSSY_WEBP;
use crate::format::Format;

/// Errors from format/preset lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    /// The format id is not one of png, jpeg, webp, bmp, tiff.
    #[error("Unsupported output format: {0}")]
    UnknownFormat(String),

    /// The preset id does not exist for this format.
    #[error("Unknown quality preset '{id}' for {format}")]
    UnknownPreset { format: Format, id: String },
}

/// A named, format-specific compression setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityPreset {
    /// Stable identifier (e.g. "ultra-compressed")
    pub id: &'static str,
    /// Name shown in the UI
    pub display_name: &'static str,
    /// Encoder quality (0.0 to 1.0, 1.0 = Original)
    pub quality_value: f64,
    pub description: &'static str,
    pub use_case: &'static str,
    /// Short expected-size label (e.g. "~25% of original")
    pub size_hint: &'static str,
}

impl QualityPreset {
    pub const fn new(
        id: &'static str,
        display_name: &'static str,
        quality_value: f64,
        description: &'static str,
        use_case: &'static str,
        size_hint: &'static str,
    ) -> Self {
        Self {
            id,
            display_name,
            quality_value,
            description,
            use_case,
            size_hint,
        }
    }

    /// True for the pure conversion sentinel (quality 1.0).
    #[inline]
    pub fn is_original(&self) -> bool {
        self.quality_value == 1.0
    }

    /// Quality as a whole percentage, as shown next to each preset.
    pub fn percent(&self) -> u32 {
        (self.quality_value * 100.0).round() as u32
    }
}

const ORIGINAL: QualityPreset = QualityPreset::new(
    "original",
    "Original",
    1.0,
    "Pure format conversion without compression",
    "Exact format conversion",
    "Convert",
);

/// Ladder for the lossy formats (JPEG, WebP).
const LOSSY_PRESETS: [QualityPreset; 4] = [
    ORIGINAL,
    QualityPreset::new(
        "low",
        "Low",
        0.6,
        "Smaller files, noticeable quality loss",
        "Email, quick sharing",
        "~25% of original",
    ),
    QualityPreset::new(
        "ultra-compressed",
        "Ultra Compressed",
        0.4,
        "Maximum compression, significant quality loss",
        "Thumbnails, previews, extreme size limits",
        "~10-15% of original",
    ),
    QualityPreset::new(
        "extreme",
        "Extreme",
        0.25,
        "Extreme compression for tiny files",
        "Very small previews, icons",
        "~5-8% of original",
    ),
];

/// Ladder for BMP and TIFF.
const LOSSLESS_PRESETS: [QualityPreset; 5] = [
    ORIGINAL,
    QualityPreset::new(
        "maximum",
        "Maximum",
        1.0,
        "No compression, largest file size",
        "Professional work, printing",
        "Largest",
    ),
    QualityPreset::new(
        "high",
        "High",
        0.95,
        "Minimal compression, excellent quality",
        "High-quality web, presentations",
        "Large",
    ),
    QualityPreset::new(
        "medium",
        "Medium",
        0.85,
        "Balanced compression and quality",
        "General web use, social media",
        "Medium",
    ),
    QualityPreset::new(
        "low",
        "Low",
        0.7,
        "Higher compression, smaller file",
        "Email attachments, storage",
        "Small",
    ),
];

/// Presets available for a format, in display order.
///
/// PNG only offers "Original". WebP offers the lossy ladder only where a
/// lossy WebP encoder is compiled in.
pub fn presets_for(format: Format) -> &'static [QualityPreset] {
    match format {
        Format::Png => std::slice::from_ref(&ORIGINAL),
        Format::Jpeg => &LOSSY_PRESETS,
        Format::Webp if LOSSY_WEBP => &LOSSY_PRESETS,
        Format::Webp => std::slice::from_ref(&ORIGINAL),
        Format::Bmp | Format::Tiff => &LOSSLESS_PRESETS,
    }
}

/// Look up a preset by id within a format's catalog.
pub fn find_preset(format: Format, id: &str) -> Result<QualityPreset, PresetError> {
    presets_for(format)
        .iter()
        .find(|preset| preset.id == id)
        .copied()
        .ok_or_else(|| PresetError::UnknownPreset {
            format,
            id: id.to_string(),
        })
}

/// The preset selected when the user switches to a format.
pub fn default_preset(format: Format) -> QualityPreset {
    presets_for(format)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(format: Format) -> Vec<&'static str> {
        presets_for(format).iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_png_only_original() {
        assert_eq!(ids(Format::Png), vec!["original"]);
    }

    #[test]
    fn test_lossy_catalog() {
        let expected = vec!["original", "low", "ultra-compressed", "extreme"];
        assert_eq!(ids(Format::Jpeg), expected);

        let values: Vec<f64> = presets_for(Format::Jpeg)
            .iter()
            .map(|p| p.quality_value)
            .collect();
        assert_eq!(values, vec![1.0, 0.6, 0.4, 0.25]);
    }

    #[test]
    fn test_webp_catalog_follows_encoder() {
        if LOSSY_WEBP {
            assert_eq!(ids(Format::Webp), ids(Format::Jpeg));
        } else {
            assert_eq!(ids(Format::Webp), vec!["original"]);
        }
    }

    #[test]
    fn test_lossless_catalog() {
        let expected = vec!["original", "maximum", "high", "medium", "low"];
        assert_eq!(ids(Format::Bmp), expected);
        assert_eq!(ids(Format::Tiff), expected);
    }

    #[test]
    fn test_every_format_starts_with_original() {
        for format in Format::ALL {
            let preset = default_preset(format);
            assert_eq!(preset.id, "original");
            assert!(preset.is_original());
        }
    }

    #[test]
    fn test_quality_values_in_range() {
        for format in Format::ALL {
            for preset in presets_for(format) {
                assert!((0.0..=1.0).contains(&preset.quality_value));
            }
        }
    }

    #[test]
    fn test_find_preset() {
        let preset = find_preset(Format::Jpeg, "extreme").unwrap();
        assert_eq!(preset.quality_value, 0.25);
        assert_eq!(preset.percent(), 25);

        // "low" means different things per format
        assert_eq!(find_preset(Format::Jpeg, "low").unwrap().quality_value, 0.6);
        assert_eq!(find_preset(Format::Tiff, "low").unwrap().quality_value, 0.7);
    }

    #[test]
    fn test_find_preset_unknown() {
        let err = find_preset(Format::Png, "low").unwrap_err();
        assert_eq!(
            err,
            PresetError::UnknownPreset {
                format: Format::Png,
                id: "low".to_string()
            }
        );
        assert_eq!(err.to_string(), "Unknown quality preset 'low' for png");
    }

    #[test]
    fn test_maximum_is_original_sentinel() {
        assert!(find_preset(Format::Bmp, "maximum").unwrap().is_original());
        assert!(!find_preset(Format::Bmp, "high").unwrap().is_original());
    }
}
