//! Runtime settings stored beside the records.
//!
//! Every field has its own default, so a partial or older document still loads.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::photo::{ImageOptions, DEFAULT_JPEG_QUALITY};
use crate::storage::{KeyValueStore, LEGACY_STORAGE_KEY, STORAGE_KEY};

/// Where the config document lives, in the same backend as the records.
pub const CONFIG_STORAGE_KEY: &str = "jirolog:config";

fn default_storage_key() -> String {
    STORAGE_KEY.to_string()
}

fn default_legacy_storage_key() -> String {
    LEGACY_STORAGE_KEY.to_string()
}

fn default_max_image_dimension() -> u32 {
    1600
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_toast_duration_ms() -> u32 {
    1800
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_legacy_storage_key")]
    pub legacy_storage_key: String,
    /// Longest side of stored photos in pixels. 0 keeps picked photos as-is.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            legacy_storage_key: default_legacy_storage_key(),
            max_image_dimension: default_max_image_dimension(),
            jpeg_quality: default_jpeg_quality(),
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl AppConfig {
    /// Read the config document; missing or corrupt means defaults.
    pub fn load<S: KeyValueStore>(backend: &S) -> Self {
        let Some(raw) = backend.get_item(CONFIG_STORAGE_KEY) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config under {} is corrupt, using defaults: {}", CONFIG_STORAGE_KEY, e);
                Self::default()
            }
        }
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            max_dimension: (self.max_image_dimension > 0).then_some(self.max_image_dimension),
            quality: self.jpeg_quality.clamp(1, 100),
            ..ImageOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn missing_config_is_default() {
        let cfg = AppConfig::load(&MemoryStore::new());
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.storage_key, "jirolog:v2");
        assert_eq!(cfg.image_options().max_dimension, Some(1600));
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let mut backend = MemoryStore::new();
        backend
            .set_item(CONFIG_STORAGE_KEY, r#"{"maxImageDimension":0,"jpegQuality":0}"#)
            .unwrap();
        let cfg = AppConfig::load(&backend);
        assert_eq!(cfg.toast_duration_ms, 1800);

        let opts = cfg.image_options();
        assert_eq!(opts.max_dimension, None);
        assert_eq!(opts.quality, 1);
    }

    #[test]
    fn corrupt_config_is_default() {
        let mut backend = MemoryStore::new();
        backend.set_item(CONFIG_STORAGE_KEY, "{not json").unwrap();
        assert_eq!(AppConfig::load(&backend), AppConfig::default());
    }
}
