//! Name region for the external text recognizer.
//!
//! Item names sit near the top of the card. When the card carries an
//! "exclusive" tag, the name is everything above it; otherwise a fixed band
//! at the top is used.

use tracing::debug;

use crate::{enhance, Color, ColorSpace, ColorTarget, Image, Mask};

/// Dark purple fill of the exclusive tag, as seen behind the name.
pub const NAME_ANCHOR_PALETTE: [ColorTarget; 3] = [
    ColorTarget::new(Color::hex(0x331f4c), 4),
    ColorTarget::new(Color::hex(0x392652), 4),
    ColorTarget::new(Color::hex(0x382550), 4),
];

const SEARCH_FRACTION: f64 = 0.25;
/// Rows left out above the tag so none of its pixels leak into the crop.
const ANCHOR_MARGIN: u32 = 2;

const CONTRAST: f32 = 3.0;
const SHARPNESS: f32 = 2.5;

/// Rows `[0, n)` of `card` that hold the name.
pub fn name_crop(card: Image) -> Image {
    let band = (card.height() as f64 * SEARCH_FRACTION) as u32;
    let search = card.trimmed_top(band);

    let bottom = match Mask::build(search, &NAME_ANCHOR_PALETTE, ColorSpace::Rgb).min_row() {
        Some(anchor) => {
            debug!(anchor, "name anchor found");
            anchor.saturating_sub(ANCHOR_MARGIN)
        }
        None => {
            debug!(band, "name anchor not found, using top band");
            band
        }
    };

    let crop = card.trimmed_top(bottom);
    if crop.is_empty() {
        debug!("name crop empty, using whole card");
        return card;
    }
    crop
}

/// Grayscale, contrast- and sharpness-boosted name crop.
pub fn extract_name(card: Image) -> image::GrayImage {
    let gray = name_crop(card).to_gray_image();
    enhance::sharpness(&enhance::contrast(&gray, CONTRAST), SHARPNESS)
}
