//! Per-capture outcome, shown as a status line and saved as `report.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Status shown for every no-result outcome, whatever the cause.
pub const NO_UI_DETECTED: &str = "No UI Detected";

pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ie::BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ie::VariantVerdict>,
    /// Why nothing was detected; for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Report {
    pub fn detected(input: &Path, output_dir: &Path, scan: &ie::Scan) -> Self {
        let verdict = scan.classification.verdict;
        Self {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            status: verdict.to_string(),
            bounds: Some(scan.bounds),
            variant: Some(verdict),
            reason: None,
        }
    }

    pub fn missed(input: &Path, output_dir: &Path, err: &ie::DetectError) -> Self {
        Self {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            status: NO_UI_DETECTED.to_string(),
            bounds: None,
            variant: None,
            reason: Some(err.to_string()),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.variant.is_some()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serialize report")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }
}
