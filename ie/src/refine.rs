//! Vertical tightening of a coarse card crop.
//!
//! The density-based box carries extra margin above and below the card. The
//! card's interior panel is drawn in a handful of exact near-white shades, so
//! the first and last rows containing one of them bound the real content.

use tracing::debug;

use crate::{Color, ColorSpace, ColorTarget, Mask, OwnedImage};

pub const BACKGROUND_PALETTE: [ColorTarget; 6] = [
    ColorTarget::exact(Color::hex(0xf8f5ff)),
    ColorTarget::exact(Color::hex(0xf7f4fe)),
    ColorTarget::exact(Color::hex(0xf4f2fc)),
    ColorTarget::exact(Color::hex(0xf3f1fb)),
    ColorTarget::exact(Color::hex(0xf0eef8)),
    ColorTarget::exact(Color::hex(0xf6f4fe)),
];

/// Inclusive `(top, bottom)` rows holding interior panel pixels.
pub fn background_extent(card: &OwnedImage) -> Option<(u32, u32)> {
    let mask = Mask::build(card.as_image(), &BACKGROUND_PALETTE, ColorSpace::Rgb);
    Some((mask.min_row()?, mask.max_row()?))
}

/// Crop `card` to its interior panel rows, full width. Unchanged when the panel isn't found.
pub fn refine(card: OwnedImage) -> OwnedImage {
    let Some((top, bottom)) = background_extent(&card) else {
        debug!("no interior panel pixels, keeping coarse crop");
        return card;
    };
    if top == 0 && bottom + 1 == card.height() {
        return card;
    }

    debug!(top, bottom, "refined crop");
    card.as_image().rows(top, bottom + 1).to_owned_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: Color = Color::hex(0xf4f2fc);
    const FRAME: Color = Color::new(40, 30, 60);

    fn card_with_panel() -> OwnedImage {
        let mut img = OwnedImage::new(80, 100, FRAME);
        img.fill_rect(5, 12, 70, 60, PANEL);
        // Text on the panel must not matter.
        img.fill_rect(10, 20, 30, 4, Color::BLACK);
        img
    }

    #[test]
    fn crops_to_panel_rows() {
        let refined = refine(card_with_panel());
        assert_eq!(refined.width(), 80);
        assert_eq!(refined.height(), 60);
        assert_eq!(refined.get(5, 0), PANEL);
        assert_eq!(refined.get(5, 59), PANEL);
    }

    #[test]
    fn no_panel_is_a_no_op() {
        let img = OwnedImage::new(50, 40, FRAME);
        assert_eq!(refine(img.clone()), img);
    }

    #[test]
    fn near_miss_shades_do_not_count() {
        let mut img = OwnedImage::new(10, 10, FRAME);
        img.put(3, 3, Color::hex(0xf4f2fd));
        assert_eq!(background_extent(&img), None);
    }

    #[test]
    fn refining_twice_changes_nothing() {
        let once = refine(card_with_panel());
        let twice = refine(once.clone());
        assert_eq!(once, twice);
    }
}
