//! Card boundary detection.
//!
//! The card frame is a thin purple line. Its left/right edges show up as
//! columns with sustained high mask density, its top edge as the first dense
//! row between those columns, and its bottom as the lowest purple pixel.

use tracing::debug;

use crate::density::{column_density, dense_indices, group_indices, row_density};
use crate::error::{Axis, DetectError, Result};
use crate::{Color, ColorSpace, ColorTarget, Image, Mask, OwnedImage};

/// Purple frame colors, matched on hue.
pub const BORDER_PALETTE: [ColorTarget; 4] = [
    ColorTarget::new(Color::hex(0x784da9), 2),
    ColorTarget::new(Color::hex(0x6f439d), 2),
    ColorTarget::new(Color::hex(0x693a9f), 2),
    ColorTarget::new(Color::hex(0x987abb), 2),
];

/// Closing radius; 2 gives a 5×5 square element.
const CLOSE_RADIUS: u8 = 2;

// Absolute floor and peak-relative fraction for the column threshold. Both
// were tuned by hand against captures of one UI theme and have not been
// calibrated against a labeled corpus.
const MIN_COL_DENSITY_FLOOR: f32 = 0.02;
const MIN_COL_DENSITY_PEAK_FRACTION: f32 = 0.3;

/// The top border is a single thin line, hence the lower threshold.
const MIN_ROW_DENSITY: f32 = 0.15;

const COLUMN_GAP: u32 = 10;
const ROW_GAP: u32 = 5;

const MIN_SIDE: u32 = 50;
const MAX_SIDE_FRACTION: f64 = 0.95;

const OVERLAY_THICKNESS: u32 = 3;

/// Rectangle in source pixels; `right` and `bottom` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// View of the box (edges included) inside `image`.
    pub fn crop<'a>(&self, image: Image<'a>) -> Image<'a> {
        image.sub_image(self.left, self.top, self.width() + 1, self.height() + 1)
    }
}

#[derive(Debug, Clone)]
pub struct CardDetection {
    /// Coarse box in source coordinates.
    pub bounds: BoundingBox,
    /// Box contents after background refinement.
    pub card: OwnedImage,
}

/// Locate the card, crop it and tighten the crop against the interior panel.
pub fn detect_card(image: Image) -> Result<CardDetection> {
    let bounds = find_bounds(image)?;
    let card = crate::refine::refine(bounds.crop(image).to_owned_image());
    debug!(?bounds, width = card.width(), height = card.height(), "card detected");
    Ok(CardDetection { bounds, card })
}

/// Frame rectangle from purple density alone, without cropping.
pub fn find_bounds(image: Image) -> Result<BoundingBox> {
    let mask = Mask::build(image, &BORDER_PALETTE, ColorSpace::Hsv).close(CLOSE_RADIUS);
    if mask.is_empty() {
        return Err(DetectError::NoColorMatch { palette: "border" });
    }

    let col_density = column_density(&mask);
    let peak = col_density.iter().copied().fold(0.0f32, f32::max);
    let threshold = MIN_COL_DENSITY_FLOOR.max(peak * MIN_COL_DENSITY_PEAK_FRACTION);
    let col_groups = group_indices(&dense_indices(&col_density, threshold), COLUMN_GAP);
    debug!(peak, threshold, groups = col_groups.len(), "column density");

    let (Some(first), Some(last)) = (col_groups.first(), col_groups.last()) else {
        return Err(insufficient(Axis::Column, 0));
    };
    if col_groups.len() < 2 {
        return Err(insufficient(Axis::Column, col_groups.len()));
    }
    let left = first.mean();
    let right = last.mean();

    let row_groups = group_indices(&dense_indices(&row_density(&mask, left, right), MIN_ROW_DENSITY), ROW_GAP);
    let top = row_groups
        .first()
        .map(|g| g.mean())
        .ok_or_else(|| insufficient(Axis::Row, 0))?;

    // Bottom frames thin out to about a pixel, so the lowest hit beats any density rule.
    let bottom = mask.max_row().ok_or(DetectError::NoColorMatch { palette: "border" })?;

    let width = right - left;
    let height = bottom.saturating_sub(top);
    if width < MIN_SIDE
        || bottom < top + MIN_SIDE
        || width as f64 > image.width() as f64 * MAX_SIDE_FRACTION
        || height as f64 > image.height() as f64 * MAX_SIDE_FRACTION
    {
        debug!(left, top, right, bottom, "bounds rejected");
        return Err(DetectError::BoundsOutOfRange { width, height });
    }

    Ok(BoundingBox {
        left,
        top,
        right,
        bottom,
    })
}

fn insufficient(axis: Axis, found: usize) -> DetectError {
    DetectError::InsufficientBoundaryGroups {
        axis,
        found,
        needed: match axis {
            Axis::Column => 2,
            Axis::Row => 1,
        },
    }
}

/// Copy of `image` with `bounds` outlined in green, for tuning.
pub fn debug_overlay(image: Image, bounds: BoundingBox) -> OwnedImage {
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect;

    let mut rgb = image.to_rgb_image();
    let green = image::Rgb([Color::GREEN.r, Color::GREEN.g, Color::GREEN.b]);
    for i in 0..OVERLAY_THICKNESS {
        let x = bounds.left as i32 - 1 + i as i32;
        let y = bounds.top as i32 - 1 + i as i32;
        let w = (bounds.width() + 3).saturating_sub(2 * i);
        let h = (bounds.height() + 3).saturating_sub(2 * i);
        if w > 0 && h > 0 {
            draw_hollow_rect_mut(&mut rgb, Rect::at(x, y).of_size(w, h), green);
        }
    }
    OwnedImage::from_rgb_image(&rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: Color = Color::new(24, 24, 28);
    const INTERIOR: Color = Color::new(60, 60, 60);
    const BORDER: Color = Color::hex(0x784da9);

    /// Frame of the given thickness around `[x, x + w) × [y, y + h)`, solid interior.
    fn framed(img_w: u32, img_h: u32, x: u32, y: u32, w: u32, h: u32, t: u32) -> OwnedImage {
        let mut img = OwnedImage::new(img_w, img_h, BACKGROUND);
        img.fill_rect(x, y, w, h, BORDER);
        img.fill_rect(x + t, y + t, w - 2 * t, h - 2 * t, INTERIOR);
        img
    }

    fn assert_near(actual: u32, expected: u32) {
        assert!(actual.abs_diff(expected) <= 3, "{actual} vs {expected}");
    }

    #[test]
    fn finds_frames_across_sizes() {
        for &(size, t) in &[(60u32, 2u32), (150, 3), (480, 3), (1200, 4), (2000, 5)] {
            let margin = size / 10 + 20;
            let x = margin;
            let y = margin + 7;
            let img = framed(size + 2 * margin + 5, size + 2 * margin + 20, x, y, size, size, t);

            let b = find_bounds(img.as_image()).unwrap();
            assert_near(b.left, x);
            assert_near(b.top, y);
            assert_near(b.right, x + size - 1);
            assert_near(b.bottom, y + size - 1);
        }
    }

    #[test]
    fn interior_vertical_decoration_does_not_move_edges() {
        let mut img = framed(400, 400, 50, 50, 300, 300, 3);
        img.fill_rect(200, 120, 2, 100, BORDER);
        let b = find_bounds(img.as_image()).unwrap();
        assert_near(b.left, 50);
        assert_near(b.right, 349);
    }

    #[test]
    fn no_border_pixels_is_no_color_match() {
        let img = OwnedImage::new(300, 300, BACKGROUND);
        assert!(matches!(
            find_bounds(img.as_image()),
            Err(DetectError::NoColorMatch { .. })
        ));
    }

    #[test]
    fn single_vertical_line_is_insufficient() {
        let mut img = OwnedImage::new(300, 300, BACKGROUND);
        img.fill_rect(100, 20, 3, 250, BORDER);
        assert!(matches!(
            find_bounds(img.as_image()),
            Err(DetectError::InsufficientBoundaryGroups {
                axis: Axis::Column,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn two_columns_without_top_edge_have_no_row_group() {
        let mut img = OwnedImage::new(300, 300, BACKGROUND);
        img.fill_rect(100, 20, 3, 250, BORDER);
        img.fill_rect(200, 20, 3, 250, BORDER);
        assert!(matches!(
            find_bounds(img.as_image()),
            Err(DetectError::InsufficientBoundaryGroups {
                axis: Axis::Row,
                found: 0,
                needed: 1,
            })
        ));
    }

    #[test]
    fn tiny_frame_is_out_of_range() {
        let img = framed(300, 300, 100, 100, 40, 40, 2);
        assert!(matches!(
            find_bounds(img.as_image()),
            Err(DetectError::BoundsOutOfRange { .. })
        ));
    }

    #[test]
    fn frame_filling_the_capture_is_out_of_range() {
        let img = framed(200, 200, 1, 1, 198, 198, 2);
        assert!(matches!(
            find_bounds(img.as_image()),
            Err(DetectError::BoundsOutOfRange { .. })
        ));
    }

    #[test]
    fn detect_card_crops_to_bounds() {
        let img = framed(400, 300, 50, 50, 301, 201, 3);
        let det = detect_card(img.as_image()).unwrap();
        assert_eq!(det.card.width(), det.bounds.width() + 1);
        assert_eq!(det.card.height(), det.bounds.height() + 1);
        assert_eq!(det.card.get(0, 0), img.get(det.bounds.left, det.bounds.top));
    }

    #[test]
    fn overlay_outlines_bounds() {
        let img = framed(400, 300, 50, 50, 301, 201, 3);
        let bounds = find_bounds(img.as_image()).unwrap();
        let overlay = debug_overlay(img.as_image(), bounds);
        assert_eq!(overlay.get(bounds.left, bounds.top + 20), Color::GREEN);
        assert_eq!(overlay.get(bounds.left + 20, bounds.top + 20), INTERIOR);
        assert_eq!(overlay.width(), img.width());
    }
}
