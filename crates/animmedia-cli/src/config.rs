//! Application configuration management.
//!
//! The configuration names the site origin, the cache version and the
//! resource manifest the worker installs. It is stored at
//! `~/.config/anim-media/config.json`; a missing file means defaults.
//! `ANIM_MEDIA_ORIGIN` overrides the origin.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use animmedia_core::cache::DEFAULT_CACHE_NAME;
use animmedia_core::worker::{WorkerSettings, APP_SHELL, CACHE_VERSION, FALLBACK_DOCUMENT};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "anim-media";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `origin`
pub const ORIGIN_ENV: &str = "ANIM_MEDIA_ORIGIN";

const DEFAULT_ORIGIN: &str = "http://localhost:8000";

const DEFAULT_PAGE: &str = "/index.html";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub origin: String,
    pub cache_version: String,
    pub cache_name: String,
    pub manifest: Vec<String>,
    pub fallback_document: String,
    /// No timeout when unset.
    pub request_timeout_secs: Option<u64>,
    /// Page reported to analytics.
    pub page_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_version: CACHE_VERSION.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            manifest: APP_SHELL.iter().map(|s| s.to_string()).collect(),
            fallback_document: FALLBACK_DOCUMENT.to_string(),
            request_timeout_secs: None,
            page_path: DEFAULT_PAGE.to_string(),
        }
    }
}

impl Config {
    /// Load from the user config directory, then apply the environment.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            config.origin = origin;
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root for local storage and cached responses.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            cache_version: self.cache_version.clone(),
            manifest: self.manifest.clone(),
            fallback_document: self.fallback_document.clone(),
        }
    }
}
