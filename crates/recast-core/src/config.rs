//! Converter configuration.
//!
//! Every field has a default, so the JS side can pass a partial object
//! (or nothing at all).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::DEFAULT_BACKGROUND;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Archive name must not be empty")]
    EmptyArchiveName,
}

/// Options for export and rasterization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Delay between consecutive downloads in a bulk download (ms)
    pub download_stagger_ms: u32,
    /// File name of the zip archive
    pub archive_name: String,
    /// Folder inside the archive holding the converted files (empty = root)
    pub archive_folder: String,
    /// Fill color for formats without alpha
    pub background: [u8; 3],
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            download_stagger_ms: 100,
            archive_name: "converted-images.zip".to_string(),
            archive_folder: "converted-images".to_string(),
            background: DEFAULT_BACKGROUND,
        }
    }
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.archive_name.trim().is_empty() {
            return Err(ConfigError::EmptyArchiveName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::new();
        assert_eq!(config.download_stagger_ms, 100);
        assert_eq!(config.archive_name, "converted-images.zip");
        assert_eq!(config.archive_folder, "converted-images");
        assert_eq!(config.background, [255, 255, 255]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ConverterConfig =
            serde_json::from_str(r#"{ "archive_name": "photos.zip", "background": [0, 0, 0] }"#)
                .unwrap();

        assert_eq!(config.archive_name, "photos.zip");
        assert_eq!(config.background, [0, 0, 0]);
        assert_eq!(config.download_stagger_ms, 100);
        assert_eq!(config.archive_folder, "converted-images");
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: ConverterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let result = serde_json::from_str::<ConverterConfig>(r#"{ "download_stagger_ms": "soon" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_archive_name_rejected() {
        let mut config = ConverterConfig::default();
        config.archive_name = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyArchiveName));
    }
}
