//! Image decoding pipeline for Recast.
//!
//! This module provides functionality for:
//! - Decoding any supported container (JPEG, PNG, WebP, GIF, BMP, TIFF) to RGBA
//! - Applying EXIF orientation the way a browser `<img>` does
//! - Resizing decoded images with a selectable interpolation filter
//!
//! # Architecture
//!
//! The decoding pipeline is designed to be used from Web Workers via WASM bindings.
//! All operations are synchronous and single-threaded within WASM.
//!
//! # Examples
//!
//! ```ignore
//! use recast_core::decode::{decode_image, DecodedImage};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod reader;
mod resize;
mod types;

pub use reader::decode_image;
pub use resize::resize;
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
