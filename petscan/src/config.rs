//! Persistent runtime settings.
//!
//! Stored as JSON in a platform-appropriate config directory. None of these
//! touch the detection thresholds, which are compiled into `ie`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory; each capture gets its own subdirectory of artifacts.
    pub output_dir: PathBuf,

    /// Captures processed concurrently.
    pub batch_size: usize,

    /// Also write the source capture with the detected rectangle drawn on it.
    pub write_debug_overlay: bool,

    /// Write `report.json` next to each capture's artifacts.
    pub write_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            output_dir: base.join("petscan"),
            batch_size: 1,
            write_debug_overlay: false,
            write_report: true,
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "petscan.json";

    /// `petscan.json` in the user's config directory.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no user config directory on this platform")?;
        Ok(base.join(Self::FILE_NAME))
    }

    /// Saved settings, or defaults when the file is unreadable or invalid.
    /// Command-line flags are applied on top of the result by `main`.
    pub fn load_or_default() -> Self {
        match Self::path().and_then(|path| Self::load_from(&path)) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "ignoring saved settings");
                Self::default()
            }
        }
    }

    /// Read settings from `path`. A missing file means "never saved" and yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("parse {:?}", path))
    }

    /// Parse settings, raising a zero `batch_size` to one.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut cfg: Self = serde_json::from_str(json)?;
        cfg.batch_size = cfg.batch_size.max(1);
        Ok(cfg)
    }

    /// Persist these settings as the defaults for later runs (`--save-config`).
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        tracing::info!(?path, "settings saved");
        Ok(())
    }
}
