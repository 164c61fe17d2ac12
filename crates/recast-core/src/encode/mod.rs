//! Image encoding pipeline for Recast.
//!
//! This module provides functionality for:
//! - Encoding RGBA rasters to PNG, JPEG, WebP, BMP and TIFF (JPEG and WebP
//!   at a chosen quality)
//! - Flattening transparent pixels onto an opaque background for
//!   formats without an alpha channel
//!
//! # Examples
//!
//! ```ignore
//! use recast_core::encode::encode_image;
//! use recast_core::Format;
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray, semi-transparent
//! let jpeg = encode_image(&pixels, 100, 100, Format::Jpeg, 0.9, Some([255, 255, 255])).unwrap();
//! println!("Encoded {} bytes", jpeg.len());
//! ```

mod encoder;

pub use encoder::{encode_image, flatten_onto, jpeg_quality, webp_quality, EncodeError, LOSSY_WEBP};
