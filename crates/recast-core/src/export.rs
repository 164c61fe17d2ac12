//! Export of converted images: file naming, bulk download plan, zip archive.
//!
//! Only completed results with output are exported. Errored and pending
//! items are skipped without complaint; they stay visible in the batch
//! status list.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use serde::Serialize;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::BatchOutcome;
use crate::config::ConverterConfig;
use crate::format::Format;

/// Stem used when a file name has nothing before its first dot.
const FALLBACK_STEM: &str = "image";

#[derive(Debug, Error)]
pub enum ExportError {
    /// No completed result to export
    #[error("No converted images to export")]
    NothingToExport,

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry of a staggered bulk download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadItem {
    /// Position of the result in the batch
    pub index: usize,
    pub file_name: String,
    /// Delay before triggering this download (ms)
    pub delay_ms: u32,
}

/// Name of the converted file: everything before the first `.` plus the
/// format id (`holiday.photo.png` -> `holiday.jpeg`).
pub fn output_file_name(source_name: &str, format: Format) -> String {
    let stem = source_name.split('.').next().unwrap_or_default().trim();
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    format!("{}.{}", stem, format.extension())
}

/// Downloads for every completed result, staggered by
/// `config.download_stagger_ms` so the browser does not drop any.
pub fn download_plan(outcome: &BatchOutcome, config: &ConverterConfig) -> Vec<DownloadItem> {
    let format = outcome.format();
    outcome
        .results()
        .iter()
        .enumerate()
        .filter(|(_, result)| result.is_completed() && result.encoded().is_some())
        .enumerate()
        .map(|(position, (index, result))| DownloadItem {
            index,
            file_name: output_file_name(result.source().name(), format),
            delay_ms: (position as u32).saturating_mul(config.download_stagger_ms),
        })
        .collect()
}

/// Zip every completed output into a single archive.
///
/// Files go under `config.archive_folder`. Colliding names get `-1`, `-2`,
/// ... appended to the stem.
pub fn build_archive(outcome: &BatchOutcome, config: &ConverterConfig) -> Result<Vec<u8>, ExportError> {
    if outcome.completed().next().is_none() {
        return Err(ExportError::NothingToExport);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let folder = config.archive_folder.trim_matches('/');
    let prefix = if folder.is_empty() {
        String::new()
    } else {
        writer.add_directory(folder, options)?;
        format!("{folder}/")
    };

    let mut used = HashSet::new();
    let mut count = 0;
    for (result, bytes) in outcome.completed() {
        let name = unique_name(
            &output_file_name(result.source().name(), outcome.format()),
            &mut used,
        );
        writer.start_file(format!("{prefix}{name}"), options)?;
        writer.write_all(bytes)?;
        count += 1;
    }

    let archive = writer.finish()?.into_inner();
    log::info!("archived {} files ({} bytes)", count, archive.len());
    Ok(archive)
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, extension) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut n = 1;
    loop {
        let candidate = if extension.is_empty() {
            format!("{stem}-{n}")
        } else {
            format!("{stem}-{n}.{extension}")
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
