//! No-result outcomes of the detection pipeline.
//!
//! None of these are faults: "nothing detected" is the steady state whenever
//! the capture does not show a card. Callers usually collapse every variant
//! into a single "No UI Detected" status and only log the specific kind.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectError>;

/// Axis a density profile was taken along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Column,
    Row,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::Column => "column",
            Axis::Row => "row",
        })
    }
}

#[derive(Error, Debug)]
pub enum DetectError {
    /// Input path or buffer could not be decoded.
    #[error("source unreadable: {reason}")]
    SourceUnreadable { reason: String },

    /// A required palette had no matching pixel.
    #[error("no pixel matched the {palette} palette")]
    NoColorMatch { palette: &'static str },

    #[error("found {found} {axis} border group(s), need {needed}")]
    InsufficientBoundaryGroups {
        axis: Axis,
        found: usize,
        needed: usize,
    },

    /// Detected box failed the min/max size sanity check.
    #[error("detected bounds {width}x{height} outside the accepted range")]
    BoundsOutOfRange { width: u32, height: u32 },

    #[error("{region} would have zero area")]
    EmptyRegion { region: &'static str },
}

impl DetectError {
    pub fn unreadable(err: impl std::fmt::Display) -> Self {
        Self::SourceUnreadable {
            reason: format!("{err:#}"),
        }
    }
}
