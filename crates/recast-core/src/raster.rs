//! The rasterize-and-encode primitive.
//!
//! A [`Rasterizer`] owns the drawing surface: it decodes a source, draws it
//! at the size chosen by the encoding policy (optionally over an opaque
//! background) and serializes the result. Methods take `&mut self`, so a
//! single surface can never be used by two conversions at once.

use crate::decode::{self, DecodeError, DecodedImage};
use crate::encode::{self, EncodeError};
use crate::format::Format;
use crate::policy::EncodingParameters;
use crate::SourceImage;

/// Opaque white, the canvas fill used for formats without alpha.
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Decode and rasterize-and-encode capability used by the converter.
pub trait Rasterizer {
    /// Decode the uploaded bytes into pixels.
    fn decode(&mut self, source: &SourceImage) -> Result<DecodedImage, DecodeError>;

    /// Draw `image` with `params` and encode it as `format`.
    fn rasterize(
        &mut self,
        image: &DecodedImage,
        format: Format,
        params: &EncodingParameters,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Rasterizer backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageRasterizer {
    background: [u8; 3],
}

impl ImageRasterizer {
    pub fn new() -> Self {
        Self::with_background(DEFAULT_BACKGROUND)
    }

    /// Use `background` instead of white for formats that need a fill.
    pub fn with_background(background: [u8; 3]) -> Self {
        Self { background }
    }

    pub fn background(&self) -> [u8; 3] {
        self.background
    }
}

impl Default for ImageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for ImageRasterizer {
    fn decode(&mut self, source: &SourceImage) -> Result<DecodedImage, DecodeError> {
        decode::decode_image(source.bytes())
    }

    fn rasterize(
        &mut self,
        image: &DecodedImage,
        format: Format,
        params: &EncodingParameters,
    ) -> Result<Vec<u8>, EncodeError> {
        if params.output_width == 0 || params.output_height == 0 {
            return Err(EncodeError::InvalidDimensions {
                width: params.output_width,
                height: params.output_height,
            });
        }

        let drawn = decode::resize(
            image,
            params.output_width,
            params.output_height,
            params.filter(),
        )
        .map_err(|e| EncodeError::EncodingFailed {
            format,
            message: e.to_string(),
        })?;

        let background = params.requires_background_fill.then_some(self.background);

        encode::encode_image(
            &drawn.pixels,
            drawn.width,
            drawn.height,
            format,
            params.encoder_quality,
            background,
        )
    }
}
