//! Sequential batch conversion.
//!
//! A [`BatchPipeline`] owns one [`ConversionResult`] per source image, in
//! input order, and converts them one at a time. Observers follow along
//! through [`BatchEvent`]s passed to a callback; the pipeline state itself is
//! never shared.
//!
//! # Status machine
//!
//! Each item moves `Pending -> Processing -> Completed | Error` and nowhere
//! else. A failed item is recorded and the batch moves on; nothing aborts a
//! running batch and nothing is retried.

use serde::Serialize;
use thiserror::Error;

use crate::convert::convert_image;
use crate::format::Format;
use crate::preset::QualityPreset;
use crate::raster::Rasterizer;
use crate::SourceImage;

/// Errors raised by the batch driver itself (never by a single item).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// No images were supplied
    #[error("Cannot start a batch with no images")]
    EmptyBatch,

    /// An item was asked to move to a status it cannot reach
    #[error("Item {index} cannot move from {from:?} to {to:?}")]
    IllegalTransition {
        index: usize,
        from: ConversionStatus,
        to: ConversionStatus,
    },
}

/// Per-item conversion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ConversionStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ConversionStatus) -> bool {
        use ConversionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Completed) | (Processing, Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionStatus::Completed | ConversionStatus::Error)
    }
}

/// The outcome of converting one source image.
///
/// Only the pipeline changes a result; callers get read access.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    source: SourceImage,
    status: ConversionStatus,
    encoded: Option<Vec<u8>>,
    error: Option<String>,
}

impl ConversionResult {
    fn new(source: SourceImage) -> Self {
        Self {
            source,
            status: ConversionStatus::Pending,
            encoded: None,
            error: None,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn status(&self) -> ConversionStatus {
        self.status
    }

    /// Encoded bytes, present only once completed
    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    /// Failure message, present only on error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.status == ConversionStatus::Completed
    }

    /// Encoded size divided by original size.
    pub fn size_ratio(&self) -> Option<f64> {
        let encoded = self.encoded.as_ref()?;
        if self.source.byte_len() == 0 {
            return None;
        }
        Some(encoded.len() as f64 / self.source.byte_len() as f64)
    }

    fn transition(&mut self, index: usize, to: ConversionStatus) -> Result<(), BatchError> {
        if !self.status.can_transition_to(to) {
            return Err(BatchError::IllegalTransition {
                index,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    fn begin(&mut self, index: usize) -> Result<(), BatchError> {
        self.transition(index, ConversionStatus::Processing)
    }

    fn complete(&mut self, index: usize, encoded: Vec<u8>) -> Result<(), BatchError> {
        self.transition(index, ConversionStatus::Completed)?;
        self.encoded = Some(encoded);
        self.error = None;
        Ok(())
    }

    fn fail(&mut self, index: usize, message: String) -> Result<(), BatchError> {
        self.transition(index, ConversionStatus::Error)?;
        self.encoded = None;
        self.error = Some(message);
        Ok(())
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// The batch is about to process `total` items
    Started { total: usize },
    /// Item `index` moved to processing
    ItemStarted { index: usize },
    /// Item `index` reached a terminal status
    ItemFinished {
        index: usize,
        status: ConversionStatus,
        error: Option<String>,
    },
    /// Overall progress after an item finished
    Progress {
        processed: usize,
        total: usize,
        percent: f64,
    },
    /// Every item has been processed
    Finished { completed: usize, errors: usize },
}

/// Drives the conversion of an ordered list of images.
#[derive(Debug)]
pub struct BatchPipeline {
    format: Format,
    preset: QualityPreset,
    results: Vec<ConversionResult>,
    processed: usize,
}

impl BatchPipeline {
    /// Create a pipeline with every item pending.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::EmptyBatch` if `sources` is empty.
    pub fn new(
        sources: Vec<SourceImage>,
        format: Format,
        preset: QualityPreset,
    ) -> Result<Self, BatchError> {
        if sources.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        Ok(Self {
            format,
            preset,
            results: sources.into_iter().map(ConversionResult::new).collect(),
            processed: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of items that reached a terminal status.
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn is_finished(&self) -> bool {
        self.processed == self.results.len()
    }

    /// Overall progress in percent (0.0 to 100.0).
    pub fn progress(&self) -> f64 {
        self.processed as f64 / self.results.len() as f64 * 100.0
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    /// Convert the next pending item.
    ///
    /// Returns `Ok(false)` once every item has been processed.
    pub fn process_next<R, F>(&mut self, rasterizer: &mut R, on_event: &mut F) -> Result<bool, BatchError>
    where
        R: Rasterizer + ?Sized,
        F: FnMut(&BatchEvent),
    {
        let index = self.processed;
        let total = self.results.len();
        let Some(item) = self.results.get_mut(index) else {
            return Ok(false);
        };

        item.begin(index)?;
        on_event(&BatchEvent::ItemStarted { index });

        match convert_image(rasterizer, &item.source, self.format, &self.preset) {
            Ok(encoded) => item.complete(index, encoded)?,
            Err(e) => {
                log::warn!("failed to convert {}: {}", item.source.name(), e);
                item.fail(index, e.to_string())?;
            }
        }

        on_event(&BatchEvent::ItemFinished {
            index,
            status: item.status,
            error: item.error.clone(),
        });

        self.processed += 1;
        on_event(&BatchEvent::Progress {
            processed: self.processed,
            total,
            percent: self.progress(),
        });

        Ok(true)
    }

    /// Convert one item, wrapping the batch in `Started` / `Finished`.
    ///
    /// The first call emits `Started`; the call that converts the last item
    /// emits `Finished`. Returns whether items remain, so a host event loop
    /// can yield between calls. Once finished this is a no-op.
    pub fn step<R, F>(&mut self, rasterizer: &mut R, on_event: &mut F) -> Result<bool, BatchError>
    where
        R: Rasterizer + ?Sized,
        F: FnMut(&BatchEvent),
    {
        if self.is_finished() {
            return Ok(false);
        }

        if self.processed == 0 {
            log::info!(
                "converting {} images to {} ({})",
                self.results.len(),
                self.format,
                self.preset.id
            );
            on_event(&BatchEvent::Started {
                total: self.results.len(),
            });
        }

        self.process_next(rasterizer, on_event)?;

        if !self.is_finished() {
            return Ok(true);
        }

        let completed = self.count(ConversionStatus::Completed);
        let errors = self.count(ConversionStatus::Error);
        log::info!("batch finished: {} completed, {} errors", completed, errors);
        on_event(&BatchEvent::Finished { completed, errors });
        Ok(false)
    }

    /// Process every item in order and hand back the results.
    pub fn run<R, F>(mut self, rasterizer: &mut R, mut on_event: F) -> Result<BatchOutcome, BatchError>
    where
        R: Rasterizer + ?Sized,
        F: FnMut(&BatchEvent),
    {
        while self.step(rasterizer, &mut on_event)? {}
        Ok(self.into_outcome())
    }

    /// Stop driving and take the results as they are.
    pub fn into_outcome(self) -> BatchOutcome {
        BatchOutcome {
            format: self.format,
            results: self.results,
        }
    }

    fn count(&self, status: ConversionStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Convert `sources` in order, reporting progress to `on_event`.
///
/// An empty input is a no-op: the result list is empty, no events are
/// emitted and the rasterizer is never touched.
pub fn run_batch<R, F>(
    sources: Vec<SourceImage>,
    format: Format,
    preset: QualityPreset,
    rasterizer: &mut R,
    on_event: F,
) -> Result<BatchOutcome, BatchError>
where
    R: Rasterizer + ?Sized,
    F: FnMut(&BatchEvent),
{
    match BatchPipeline::new(sources, format, preset) {
        Ok(pipeline) => pipeline.run(rasterizer, on_event),
        Err(BatchError::EmptyBatch) => {
            log::debug!("ignoring batch with no images");
            Ok(BatchOutcome::empty(format))
        }
        Err(e) => Err(e),
    }
}

/// Final, ordered results of a batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    format: Format,
    results: Vec<ConversionResult>,
}

impl BatchOutcome {
    pub fn empty(format: Format) -> Self {
        Self {
            format,
            results: Vec::new(),
        }
    }

    /// Target format of the batch
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.count(|s| s == ConversionStatus::Completed)
    }

    pub fn error_count(&self) -> usize {
        self.count(|s| s == ConversionStatus::Error)
    }

    /// Items not yet terminal (zero once a batch has run).
    pub fn pending_count(&self) -> usize {
        self.count(|s| !s.is_terminal())
    }

    /// Completed results with their output, in input order.
    pub fn completed(&self) -> impl Iterator<Item = (&ConversionResult, &[u8])> {
        self.results
            .iter()
            .filter(|r| r.is_completed())
            .filter_map(|r| r.encoded().map(|bytes| (r, bytes)))
    }

    fn count(&self, predicate: impl Fn(ConversionStatus) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(r.status)).count()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
