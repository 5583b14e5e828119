//! App Configuration
//!
//! Which backend to use and how to tune autosave, stored as JSON next to
//! the app data. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

pub const CONFIG_FILE: &str = "skate_notes.config.json";
pub const DB_FILE: &str = "skate_notes.db";

/// Points the app at a REST backend, overriding the config file
pub const API_URL_ENV: &str = "SKATE_NOTES_API_URL";

const DEFAULT_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Whole collection in a local SQLite file
    Snapshot { db_path: PathBuf },
    /// Per-entity REST resources
    Resource {
        base_url: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    #[serde(default = "default_debounce_ms")]
    pub autosave_debounce_ms: u64,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Defaults rooted at `data_dir`: local database and a `logs` folder
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            backend: BackendConfig::Snapshot {
                db_path: data_dir.join(DB_FILE),
            },
            autosave_debounce_ms: DEFAULT_DEBOUNCE_MS,
            log_dir: Some(data_dir.join("logs")),
        }
    }

    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Read the config under `data_dir`, apply the environment override, validate
    pub fn load(data_dir: &Path) -> DomainResult<Self> {
        let path = Self::config_path(data_dir);
        let config = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| DomainError::Persistence(format!("Failed to read config: {}", e)))?;
            serde_json::from_str(&json)
                .map_err(|e| DomainError::Validation(format!("Invalid config file: {}", e)))?
        } else {
            Self::for_data_dir(data_dir)
        };

        let config = config.with_api_url(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, data_dir: &Path) -> DomainResult<()> {
        self.validate()?;
        std::fs::create_dir_all(data_dir)
            .map_err(|e| DomainError::Persistence(format!("Failed to create data dir: {}", e)))?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        std::fs::write(Self::config_path(data_dir), json)
            .map_err(|e| DomainError::Persistence(format!("Failed to write config: {}", e)))
    }

    /// Switch to the REST backend when an API url is given
    pub fn with_api_url(self, api_url: Option<String>) -> Self {
        match api_url.filter(|url| !url.trim().is_empty()) {
            Some(base_url) => {
                let timeout_ms = match self.backend {
                    BackendConfig::Resource { timeout_ms, .. } => timeout_ms,
                    BackendConfig::Snapshot { .. } => DEFAULT_TIMEOUT_MS,
                };
                Self {
                    backend: BackendConfig::Resource {
                        base_url: base_url.trim().to_string(),
                        timeout_ms,
                    },
                    ..self
                }
            }
            None => self,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.autosave_debounce_ms == 0 {
            return Err(DomainError::Validation(
                "autosave_debounce_ms must be positive".to_string(),
            ));
        }
        if let BackendConfig::Resource { base_url, timeout_ms } = &self.backend {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(DomainError::Validation(format!(
                    "base_url '{}' is not an http(s) url",
                    base_url
                )));
            }
            if *timeout_ms == 0 {
                return Err(DomainError::Validation("timeout_ms must be positive".to_string()));
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
