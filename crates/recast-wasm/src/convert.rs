//! Single image conversion binding.
//!
//! # Example
//!
//! ```typescript
//! import { convert_image } from '@recast/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const webp = convert_image(file.name, bytes, 'webp', 'original');
//! const blob = new Blob([webp], { type: 'image/webp' });
//! ```

use recast_core::{convert, ImageRasterizer, SourceImage};
use wasm_bindgen::prelude::*;

use crate::{lookup, to_js_error};

/// Convert one uploaded file to `format` using the preset `preset_id`.
///
/// # Errors
///
/// Returns an error if the format or preset is unknown, or if the file
/// cannot be decoded or encoded.
#[wasm_bindgen]
pub fn convert_image(name: &str, bytes: &[u8], format: &str, preset_id: &str) -> Result<Vec<u8>, JsValue> {
    let (format, preset) = lookup(format, preset_id).map_err(to_js_error)?;
    let source = SourceImage::new(name, bytes.to_vec());
    convert::convert_image(&mut ImageRasterizer::new(), &source, format, &preset).map_err(to_js_error)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use recast_core::{encode, Format};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_convert_png_to_jpeg() {
        let pixels = [200u8, 10, 10, 255].repeat(16);
        let png = encode::encode_image(&pixels, 4, 4, Format::Png, 1.0, None).unwrap();

        let jpeg = convert_image("red.png", &png, "jpeg", "low").unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_convert_invalid_bytes() {
        let err = convert_image("notes.txt", b"hello", "png", "original").unwrap_err();
        assert_eq!(
            err.as_string().unwrap(),
            "Failed to load image: Invalid or unsupported image format"
        );
    }

    #[wasm_bindgen_test]
    fn test_convert_unknown_preset() {
        let err = convert_image("a.png", &[], "png", "extreme").unwrap_err();
        assert_eq!(
            err.as_string().unwrap(),
            "Unknown quality preset 'extreme' for png"
        );
    }
}
