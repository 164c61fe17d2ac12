//! Batch conversion and export bindings.
//!
//! [`JsBatchRunner`] converts one file per `step()` call so the caller can
//! yield to the browser between files and let progress paint. [`run_batch`]
//! converts everything in a single call; it blocks the thread it runs on, so
//! use it from a Web Worker. Both end in a [`JsBatch`] handle that keeps the
//! results in WASM memory until the caller downloads or archives them.
//!
//! # Example
//!
//! ```typescript
//! const runner = new JsBatchRunner(names, files, 'webp', 'low');
//! const onEvent = (event) => {
//!   if (event.type === 'progress') progressBar.value = event.percent;
//! };
//! while (runner.step(onEvent)) {
//!   await new Promise((resolve) => setTimeout(resolve));
//! }
//! const batch = runner.finish();
//!
//! for (const item of batch.download_plan()) {
//!   setTimeout(() => save(item.file_name, batch.output(item.index)), item.delay_ms);
//! }
//! ```

use js_sys::{Array, Function, Uint8Array};
use recast_core::{
    build_archive, download_plan, output_file_name, BatchError, BatchEvent, BatchOutcome,
    BatchPipeline, ConversionStatus, ConverterConfig, Format, ImageRasterizer, QualityPreset,
    SourceImage,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::{lookup, to_js_error};

/// Status of one batch item, as shown in the results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatus {
    pub index: usize,
    pub name: String,
    pub status: ConversionStatus,
    pub error: Option<String>,
    pub original_size: usize,
    pub converted_size: Option<usize>,
    /// Converted size over original size
    pub size_ratio: Option<f64>,
}

fn item_statuses(outcome: &BatchOutcome) -> Vec<ItemStatus> {
    outcome
        .results()
        .iter()
        .enumerate()
        .map(|(index, result)| ItemStatus {
            index,
            name: result.source().name().to_string(),
            status: result.status(),
            error: result.error().map(str::to_string),
            original_size: result.source().byte_len(),
            converted_size: result.encoded().map(<[u8]>::len),
            size_ratio: result.size_ratio(),
        })
        .collect()
}

fn parse_config(config: JsValue) -> Result<ConverterConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(ConverterConfig::default());
    }
    let config: ConverterConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
    config.validate().map_err(to_js_error)?;
    Ok(config)
}

fn collect_sources(names: Vec<String>, files: &Array) -> Result<Vec<SourceImage>, JsValue> {
    if names.len() != files.length() as usize {
        return Err(JsValue::from_str(&format!(
            "Got {} names for {} files",
            names.len(),
            files.length()
        )));
    }

    names
        .into_iter()
        .zip(files.iter())
        .map(|(name, file)| {
            let bytes = file
                .dyn_into::<Uint8Array>()
                .map_err(|_| JsValue::from_str(&format!("File '{}' is not a Uint8Array", name)))?;
            Ok(SourceImage::new(name, bytes.to_vec()))
        })
        .collect()
}

/// Convert `files` (an array of `Uint8Array`) to `format` in order.
///
/// `on_event` is called with every progress event (`started`,
/// `item_started`, `item_finished`, `progress`, `finished`). `config` is an
/// optional, possibly partial, `ConverterConfig` object.
///
/// A failing file does not stop the batch; its error is reported through
/// `item_finished` and kept in [`JsBatch::statuses`].
///
/// Runs to completion without yielding. On the main thread prefer
/// [`JsBatchRunner`], otherwise the page cannot repaint until the end.
#[wasm_bindgen]
pub fn run_batch(
    names: Vec<String>,
    files: Array,
    format: &str,
    preset_id: &str,
    on_event: &Function,
    config: JsValue,
) -> Result<JsBatch, JsValue> {
    let (format, preset) = lookup(format, preset_id).map_err(to_js_error)?;
    let config = parse_config(config)?;
    let sources = collect_sources(names, &files)?;

    let mut rasterizer = ImageRasterizer::with_background(config.background);
    let outcome = recast_core::run_batch(sources, format, preset, &mut rasterizer, |event| {
        notify(on_event, event)
    })
    .map_err(to_js_error)?;

    Ok(JsBatch::new(outcome, config))
}

fn notify(on_event: &Function, event: &BatchEvent) {
    let value = match serde_wasm_bindgen::to_value(event) {
        Ok(value) => value,
        Err(e) => {
            log::error!("failed to serialize batch event: {}", e);
            return;
        }
    };
    if let Err(e) = on_event.call1(&JsValue::NULL, &value) {
        log::warn!("batch event callback threw: {:?}", e);
    }
}

/// Batch driven one file at a time from JavaScript.
///
/// Each `step()` converts the next file and returns whether files remain.
#[wasm_bindgen]
pub struct JsBatchRunner {
    // None for an empty input: nothing to step, finish() gives an empty batch
    pipeline: Option<BatchPipeline>,
    format: Format,
    rasterizer: ImageRasterizer,
    config: ConverterConfig,
}

impl JsBatchRunner {
    pub(crate) fn from_sources(
        sources: Vec<SourceImage>,
        format: Format,
        preset: QualityPreset,
        config: ConverterConfig,
    ) -> Self {
        let pipeline = match BatchPipeline::new(sources, format, preset) {
            Ok(pipeline) => Some(pipeline),
            Err(_) => {
                log::debug!("ignoring batch with no images");
                None
            }
        };
        Self {
            pipeline,
            format,
            rasterizer: ImageRasterizer::with_background(config.background),
            config,
        }
    }

    pub(crate) fn advance<F>(&mut self, mut on_event: F) -> Result<bool, BatchError>
    where
        F: FnMut(&BatchEvent),
    {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.step(&mut self.rasterizer, &mut on_event),
            None => Ok(false),
        }
    }

    pub(crate) fn into_batch(self) -> JsBatch {
        let outcome = match self.pipeline {
            Some(pipeline) => pipeline.into_outcome(),
            None => BatchOutcome::empty(self.format),
        };
        JsBatch::new(outcome, self.config)
    }
}

#[wasm_bindgen]
impl JsBatchRunner {
    /// Prepare a batch; every file starts pending. Arguments as for [`run_batch`].
    #[wasm_bindgen(constructor)]
    pub fn new(
        names: Vec<String>,
        files: Array,
        format: &str,
        preset_id: &str,
        config: JsValue,
    ) -> Result<JsBatchRunner, JsValue> {
        let (format, preset) = lookup(format, preset_id).map_err(to_js_error)?;
        let config = parse_config(config)?;
        let sources = collect_sources(names, &files)?;
        Ok(Self::from_sources(sources, format, preset, config))
    }

    /// Convert the next file, reporting its events to `on_event`.
    ///
    /// Returns `true` while files remain.
    pub fn step(&mut self, on_event: &Function) -> Result<bool, JsValue> {
        self.advance(|event| notify(on_event, event)).map_err(to_js_error)
    }

    /// Overall progress in percent (0 to 100).
    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> f64 {
        self.pipeline.as_ref().map_or(100.0, BatchPipeline::progress)
    }

    #[wasm_bindgen(getter)]
    pub fn processed(&self) -> usize {
        self.pipeline.as_ref().map_or(0, BatchPipeline::processed)
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.pipeline.as_ref().map_or(0, BatchPipeline::len)
    }

    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_none()
    }

    #[wasm_bindgen(getter)]
    pub fn is_finished(&self) -> bool {
        self.pipeline.as_ref().map_or(true, BatchPipeline::is_finished)
    }

    /// Stop stepping and take the results. Files not yet converted stay pending.
    pub fn finish(self) -> JsBatch {
        self.into_batch()
    }
}

/// Results of a finished batch.
#[wasm_bindgen]
pub struct JsBatch {
    outcome: BatchOutcome,
    config: ConverterConfig,
}

impl JsBatch {
    pub(crate) fn new(outcome: BatchOutcome, config: ConverterConfig) -> Self {
        Self { outcome, config }
    }
}

#[wasm_bindgen]
impl JsBatch {
    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.outcome.len()
    }

    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }

    #[wasm_bindgen(getter)]
    pub fn completed_count(&self) -> usize {
        self.outcome.completed_count()
    }

    #[wasm_bindgen(getter)]
    pub fn error_count(&self) -> usize {
        self.outcome.error_count()
    }

    #[wasm_bindgen(getter)]
    pub fn pending_count(&self) -> usize {
        self.outcome.pending_count()
    }

    /// One `ItemStatus` object per input file, in input order.
    pub fn statuses(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&item_statuses(&self.outcome)).map_err(to_js_error)
    }

    /// Converted bytes of item `index`, if it completed.
    ///
    /// Note: This copies the bytes into JavaScript memory.
    pub fn output(&self, index: usize) -> Option<Vec<u8>> {
        self.outcome
            .results()
            .get(index)
            .and_then(|result| result.encoded())
            .map(<[u8]>::to_vec)
    }

    /// Download name of item `index` (e.g. `photo.png` -> `photo.webp`).
    pub fn file_name(&self, index: usize) -> Option<String> {
        self.outcome
            .results()
            .get(index)
            .map(|result| output_file_name(result.source().name(), self.outcome.format()))
    }

    /// Staggered downloads for every completed item.
    pub fn download_plan(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&download_plan(&self.outcome, &self.config)).map_err(to_js_error)
    }

    /// Zip archive of every completed item.
    pub fn archive(&self) -> Result<Vec<u8>, JsValue> {
        build_archive(&self.outcome, &self.config).map_err(to_js_error)
    }

    pub fn archive_name(&self) -> String {
        self.config.archive_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::{encode, find_preset, Format};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let pixels = [10u8, 120, 200, 255].repeat((width * height) as usize);
        encode::encode_image(&pixels, width, height, Format::Png, 1.0, None).unwrap()
    }

    fn batch(format: Format, preset_id: &str, files: Vec<(&str, Vec<u8>)>) -> JsBatch {
        let sources = files
            .into_iter()
            .map(|(name, bytes)| SourceImage::new(name, bytes))
            .collect();
        let preset = find_preset(format, preset_id).unwrap();
        let outcome =
            recast_core::run_batch(sources, format, preset, &mut ImageRasterizer::new(), |_| {})
                .unwrap();
        JsBatch::new(outcome, ConverterConfig::default())
    }

    #[test]
    fn test_counts_and_outputs() {
        let batch = batch(
            Format::Webp,
            "original",
            vec![("a.png", png(4, 4)), ("broken.png", vec![1, 2, 3]), ("c.png", png(2, 2))],
        );

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.completed_count(), 2);
        assert_eq!(batch.error_count(), 1);
        assert_eq!(batch.pending_count(), 0);

        assert_eq!(&batch.output(0).unwrap()[0..4], b"RIFF");
        assert!(batch.output(1).is_none());
        assert!(batch.output(9).is_none());

        assert_eq!(batch.file_name(2).as_deref(), Some("c.webp"));
        assert!(batch.file_name(3).is_none());
        assert_eq!(batch.archive_name(), "converted-images.zip");
    }

    fn runner(files: Vec<(&str, Vec<u8>)>) -> JsBatchRunner {
        let sources = files
            .into_iter()
            .map(|(name, bytes)| SourceImage::new(name, bytes))
            .collect();
        let preset = find_preset(Format::Jpeg, "extreme").unwrap();
        JsBatchRunner::from_sources(sources, Format::Jpeg, preset, ConverterConfig::default())
    }

    #[test]
    fn test_runner_steps_one_file_at_a_time() {
        let mut runner = runner(vec![("a.png", png(8, 4)), ("b.png", Vec::new()), ("c.png", png(4, 4))]);
        let mut events = Vec::new();

        assert_eq!(runner.len(), 3);
        assert_eq!(runner.progress(), 0.0);

        assert!(runner.advance(|e| events.push(e.clone())).unwrap());
        assert_eq!(runner.processed(), 1);
        assert!((runner.progress() - 100.0 / 3.0).abs() < 1e-9);
        assert!(matches!(events.first(), Some(BatchEvent::Started { total: 3 })));

        assert!(runner.advance(|e| events.push(e.clone())).unwrap());
        assert!(!runner.advance(|e| events.push(e.clone())).unwrap());
        assert!(runner.is_finished());
        assert_eq!(runner.progress(), 100.0);
        assert!(matches!(
            events.last(),
            Some(BatchEvent::Finished {
                completed: 2,
                errors: 1
            })
        ));

        let batch = runner.into_batch();
        assert_eq!(batch.completed_count(), 2);
        assert_eq!(batch.error_count(), 1);
        assert_eq!(batch.file_name(0).as_deref(), Some("a.jpeg"));
    }

    #[test]
    fn test_runner_finish_early_leaves_pending() {
        let mut runner = runner(vec![("a.png", png(2, 2)), ("b.png", png(2, 2))]);
        runner.advance(|_| {}).unwrap();

        let batch = runner.into_batch();
        assert_eq!(batch.completed_count(), 1);
        assert_eq!(batch.pending_count(), 1);
    }

    #[test]
    fn test_runner_empty_input() {
        let mut runner = runner(Vec::new());
        let mut events = Vec::new();

        assert!(runner.is_empty());
        assert!(runner.is_finished());
        assert!(!runner.advance(|e| events.push(e.clone())).unwrap());
        assert!(events.is_empty());
        assert!(runner.into_batch().is_empty());
    }

    #[test]
    fn test_item_statuses() {
        let batch = batch(
            Format::Png,
            "original",
            vec![("ok.png", png(3, 3)), ("bad.png", Vec::new())],
        );
        let statuses = item_statuses(&batch.outcome);

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].status, ConversionStatus::Completed);
        assert!(statuses[0].converted_size.is_some());
        assert!(statuses[0].size_ratio.unwrap() > 0.0);
        assert!(statuses[0].error.is_none());

        assert_eq!(statuses[1].name, "bad.png");
        assert_eq!(statuses[1].status, ConversionStatus::Error);
        assert_eq!(statuses[1].original_size, 0);
        assert!(statuses[1].converted_size.is_none());
        assert!(statuses[1].size_ratio.is_none());
        assert!(statuses[1].error.as_deref().unwrap().starts_with("Failed to load image"));
    }
}
