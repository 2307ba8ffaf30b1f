//! End-to-end scan of one capture.
//!
//! Stages hand buffers to each other in memory. Writing intermediate images is
//! opt-in through [`Outputs`]; a failed write is logged and never fails the scan.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::card::{self, BoundingBox};
use crate::error::{DetectError, Result};
use crate::variant::{self, Classification};
use crate::{name, Image, OwnedImage};

pub const CARD_FILE: &str = "card.png";
pub const NAME_FILE: &str = "name.png";
pub const VARIANT_FILE: &str = "variant.png";
pub const OVERLAY_FILE: &str = "debug_result.png";

/// Where to write optional artifacts. `None` skips the artifact.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub card: Option<PathBuf>,
    pub name: Option<PathBuf>,
    pub variant: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
}

impl Outputs {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, overlay: bool) -> Self {
        let dir = dir.as_ref();
        Self {
            card: Some(dir.join(CARD_FILE)),
            name: Some(dir.join(NAME_FILE)),
            variant: Some(dir.join(VARIANT_FILE)),
            overlay: overlay.then(|| dir.join(OVERLAY_FILE)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scan {
    pub bounds: BoundingBox,
    /// Refined card crop both branches worked on.
    pub card: OwnedImage,
    /// Enhanced name crop for the text recognizer.
    pub name: image::GrayImage,
    pub classification: Classification,
}

/// Decode `path` and scan it.
pub fn scan_file(path: impl AsRef<Path>, outputs: &Outputs) -> Result<Scan> {
    let image = OwnedImage::load(path).map_err(DetectError::unreadable)?;
    scan(image.as_image(), outputs)
}

/// Detect the card, then extract the name and classify the variant concurrently.
pub fn scan(image: Image, outputs: &Outputs) -> Result<Scan> {
    let detection = card::detect_card(image)?;

    write_artifact(outputs.overlay.as_deref(), |p| {
        card::debug_overlay(image, detection.bounds).as_image().save_png(p)
    });
    write_artifact(outputs.card.as_deref(), |p| detection.card.as_image().save_png(p));

    let card = detection.card.as_image();
    let (name, classification) = std::thread::scope(|s| {
        let name = s.spawn(move || name::extract_name(card));
        let variant = s.spawn(move || variant::classify(card));
        (join(name), join(variant))
    });

    write_artifact(outputs.name.as_deref(), |p| {
        name.save_with_format(p, image::ImageFormat::Png)
            .with_context(|| format!("save png {:?}", p))
    });
    if let Some(audit) = &classification.audit {
        write_artifact(outputs.variant.as_deref(), |p| audit.as_image().save_png(p));
    }

    info!(bounds = ?detection.bounds, verdict = %classification.verdict, "scan complete");
    Ok(Scan {
        bounds: detection.bounds,
        card: detection.card,
        name,
        classification,
    })
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

fn write_artifact(path: Option<&Path>, write: impl FnOnce(&Path) -> anyhow::Result<()>) {
    let Some(path) = path else {
        return;
    };
    if let Err(err) = write(path) {
        warn!(error = %format!("{err:#}"), "failed to write artifact");
    }
}
