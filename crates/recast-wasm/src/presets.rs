//! Format and preset catalog bindings.
//!
//! Everything here is read-only: the UI uses it to fill the format and
//! quality pickers and to show expected output sizes before converting.
//!
//! # Example
//!
//! ```typescript
//! import { quality_presets, estimate_output_size } from '@recast/wasm';
//!
//! for (const preset of quality_presets('jpeg')) {
//!   const size = estimate_output_size('jpeg', preset.id, file.size);
//!   console.log(`${preset.display_name}: ~${size} bytes`);
//! }
//! ```

use recast_core::preset;
use recast_core::{policy, Format};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{lookup, to_js_error};

/// Output format description for JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub mime: &'static str,
    pub extension: &'static str,
    pub supports_alpha: bool,
    /// Preset selected when switching to this format
    pub default_preset: &'static str,
}

impl FormatInfo {
    fn of(format: Format) -> Self {
        Self {
            id: format.id(),
            label: format.label(),
            mime: format.mime(),
            extension: format.extension(),
            supports_alpha: format.supports_alpha(),
            default_preset: preset::default_preset(format).id,
        }
    }
}

fn format_infos() -> Vec<FormatInfo> {
    Format::ALL.iter().copied().map(FormatInfo::of).collect()
}

/// List the output formats as `FormatInfo` objects, in display order.
#[wasm_bindgen]
pub fn supported_formats() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&format_infos()).map_err(to_js_error)
}

/// List the quality presets of a format.
///
/// # Errors
///
/// Returns an error if `format` is not a supported output format.
#[wasm_bindgen]
pub fn quality_presets(format: &str) -> Result<JsValue, JsValue> {
    let format: Format = format.parse().map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(preset::presets_for(format)).map_err(to_js_error)
}

/// Encoding parameters the converter would use for an image of
/// `width` x `height`.
#[wasm_bindgen]
pub fn encoding_parameters(
    format: &str,
    preset_id: &str,
    width: u32,
    height: u32,
) -> Result<JsValue, JsValue> {
    let (format, preset) = lookup(format, preset_id).map_err(to_js_error)?;
    let params = policy::encoding_parameters(format, &preset, width, height);
    serde_wasm_bindgen::to_value(&params).map_err(to_js_error)
}

/// Rough output size in bytes for a file of `original_len` bytes.
///
/// Display-only: the real size is only known after encoding.
#[wasm_bindgen]
pub fn estimate_output_size(format: &str, preset_id: &str, original_len: f64) -> Result<f64, JsValue> {
    let (format, preset) = lookup(format, preset_id).map_err(to_js_error)?;
    let original_len = original_len.max(0.0) as usize;
    Ok(policy::estimate_output_size(format, preset.quality_value, original_len) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_infos() {
        let infos = format_infos();
        let ids: Vec<&str> = infos.iter().map(|info| info.id).collect();
        assert_eq!(ids, vec!["png", "jpeg", "webp", "bmp", "tiff"]);

        let jpeg = &infos[1];
        assert_eq!(jpeg.mime, "image/jpeg");
        assert!(!jpeg.supports_alpha);
        assert_eq!(jpeg.default_preset, "original");
        assert!(infos[0].supports_alpha);
    }
}
