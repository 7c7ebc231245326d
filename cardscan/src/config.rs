//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Card catalog: a JSON array of card records (a Scryfall bulk file works).
    pub catalog_path: PathBuf,

    /// Folder holding the OCR models. Searched for when unset.
    pub ocr_dir: Option<PathBuf>,

    /// Pause (seconds) before each scan in watch mode.
    pub scan_delay_s: f32,

    /// Scan pipeline tuning.
    pub scan: ie::ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("cards.json"),
            ocr_dir: None,
            scan_delay_s: 2.0,
            scan: ie::ScanConfig::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("cardscan.json"))
    }

    /// Load configuration, falling back to defaults when it cannot be read.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::load_from(path),
            None => Self::try_load(),
        };
        match loaded {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from the default location.
    pub fn try_load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// A missing file is not an error; it yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg: Self = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        cfg.scan.validate().with_context(|| format!("check {:?}", path))?;
        Ok(cfg)
    }

    /// Write pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }
}
