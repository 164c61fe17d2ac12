//! Recast Core - Image conversion library
//!
//! This crate provides the core conversion functionality for Recast:
//! the quality preset catalog, the encoding policy that turns a preset into
//! concrete rasterization parameters, decoding, re-encoding, the sequential
//! batch pipeline, and export helpers (download plan and zip archive).

pub mod batch;
pub mod config;
pub mod convert;
pub mod decode;
pub mod encode;
pub mod export;
pub mod format;
pub mod policy;
pub mod preset;
pub mod raster;

pub use batch::{
    run_batch, BatchError, BatchEvent, BatchOutcome, BatchPipeline, ConversionResult,
    ConversionStatus,
};
pub use config::{ConfigError, ConverterConfig};
pub use convert::{convert_image, ConvertError};
pub use export::{build_archive, download_plan, output_file_name, DownloadItem, ExportError};
pub use format::Format;
pub use policy::{
    dimension_factor, encoding_parameters, estimate_output_size, EncodingParameters,
    SmoothingTier,
};
pub use preset::{find_preset, presets_for, PresetError, QualityPreset};
pub use raster::{ImageRasterizer, Rasterizer};

/// An uploaded image: a file name and its raw bytes.
///
/// Pixel dimensions are only known after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    bytes: Vec<u8>,
}

impl SourceImage {
    /// Create a new source image from a file name and its contents
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Original file name as uploaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw file contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the uploaded file in bytes
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
