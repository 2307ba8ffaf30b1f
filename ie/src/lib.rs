mod image;
pub use self::image::*;
mod mask;
pub use mask::*;

pub mod card;
pub mod density;
mod enhance;
pub mod error;
pub mod name;
pub mod pipeline;
pub mod refine;
pub mod variant;

pub use card::{BoundingBox, CardDetection};
pub use density::PixelGroup;
pub use error::DetectError;
pub use pipeline::{Outputs, Scan};
pub use variant::{Classification, VariantVerdict};

/// Scan a decoded capture without writing any artifacts.
pub fn scan(image: Image) -> error::Result<Scan> {
	pipeline::scan(image, &Outputs::default())
}

/// Scan a capture from disk, writing artifacts as requested.
pub fn scan_file(path: impl AsRef<std::path::Path>, outputs: &Outputs) -> error::Result<Scan> {
	pipeline::scan_file(path, outputs)
}
