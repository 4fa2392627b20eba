use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::backend::theme::ThemeMode;

pub const CONFIG_FILE: &str = "storagex.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_theme: ThemeMode,
    /// Files are viewed at `<gateway_base>/<hash>`.
    pub gateway_base: String,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub notification_ttl_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Ipfs,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub api_url: String,
    pub project_id: Option<String>,
    pub project_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_bytes: u64,
    pub max_photo_bytes: u64,
    pub progress_step: u8,
    pub progress_ceiling: u8,
    pub tick_interval_ms: u64,
    pub completion_display_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_theme: ThemeMode::Dark,
            gateway_base: "https://ipfs.infura.io/ipfs".to_string(),
            storage: StorageConfig::default(),
            upload: UploadConfig::default(),
            notification_ttl_ms: 4000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Ipfs,
            api_url: "https://ipfs.infura.io:5001".to_string(),
            project_id: None,
            project_secret: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_photo_bytes: 5 * 1024 * 1024,
            progress_step: 10,
            progress_ceiling: 90,
            tick_interval_ms: 200,
            completion_display_ms: 1000,
        }
    }
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reads `storagex.json` from the working directory when present.
    /// The browser build has no filesystem and always uses defaults.
    pub fn load_or_default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => tracing::warn!(error = %e, "ignoring invalid config, using defaults"),
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_upload_rules() {
        let config = AppConfig::default();
        assert_eq!(config.default_theme, ThemeMode::Dark);
        assert_eq!(config.upload.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.upload.max_photo_bytes, 5 * 1024 * 1024);
        assert_eq!(config.upload.progress_step, 10);
        assert_eq!(config.upload.progress_ceiling, 90);
        assert_eq!(config.storage.backend, StorageBackend::Ipfs);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = AppConfig::from_json(
            r#"{ "default_theme": "light", "storage": { "backend": "memory" }, "upload": { "tick_interval_ms": 50 } }"#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.default_theme, ThemeMode::Light);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.api_url, "https://ipfs.infura.io:5001");
        assert_eq!(config.upload.tick_interval_ms, 50);
        assert_eq!(config.upload.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.gateway_base, "https://ipfs.infura.io/ipfs");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(CONFIG_FILE);
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(br#"{ "gateway_base": "http://127.0.0.1:8080/ipfs" }"#).unwrap();

        let config = AppConfig::load(&file_path).expect("Failed to load config");
        assert_eq!(config.gateway_base, "http://127.0.0.1:8080/ipfs");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(AppConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));

        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(AppConfig::load(&missing), Err(ConfigError::Io(_))));
    }
}
