//! Recast WASM - WebAssembly bindings for Recast
//!
//! This crate exposes the recast-core conversion pipeline to JavaScript.
//!
//! # Module Structure
//!
//! - `logger` - `log` backend writing to the browser console
//! - `presets` - Format list, preset catalog, encoding policy and size estimates
//! - `convert` - Single image conversion
//! - `batch` - Sequential batch conversion (stepped or in one call) and export
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsBatchRunner } from '@recast/wasm';
//!
//! await init();
//!
//! const files = await Promise.all(
//!   picked.map(async (f) => new Uint8Array(await f.arrayBuffer())),
//! );
//! const runner = new JsBatchRunner(picked.map((f) => f.name), files, 'jpeg', 'low');
//! while (runner.step((event) => console.log(event.type, event))) {
//!   // Let the page repaint between files
//!   await new Promise((resolve) => setTimeout(resolve));
//! }
//! const batch = runner.finish();
//! console.log(`${batch.completed_count} of ${batch.len} converted`);
//! ```

use std::fmt::Display;

use log::LevelFilter;
use recast_core::{find_preset, Format, PresetError, QualityPreset};
use wasm_bindgen::prelude::*;

mod batch;
mod convert;
mod logger;
mod presets;

pub use batch::{run_batch, JsBatch, JsBatchRunner};
pub use convert::convert_image;
pub use presets::{encoding_parameters, estimate_output_size, quality_presets, supported_formats};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(LevelFilter::Info);
}

/// Change the console log level ("off", "error", "warn", "info", "debug", "trace").
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logger::parse_level(level).map_err(to_js_error)?;
    log::set_max_level(filter);
    Ok(())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Resolve a format id and a preset id coming from JavaScript.
pub(crate) fn lookup(format: &str, preset_id: &str) -> Result<(Format, QualityPreset), PresetError> {
    let format: Format = format.parse()?;
    let preset = find_preset(format, preset_id)?;
    Ok((format, preset))
}

pub(crate) fn to_js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
