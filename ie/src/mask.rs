//! Color masks.
//!
//! A [`Mask`] marks every pixel of an image that matches at least one
//! [`ColorTarget`]. Masks are stored as a packed row-major bitset and are
//! consumed right away by the density and anchor logic that built them.

use std::ops::RangeInclusive;

use crate::{Color, Image};

/// Lower saturation/value bound for HSV matching.
///
/// Much wider than the hue tolerance: the same in-game color renders with
/// varying brightness and saturation after capture compression.
pub const HSV_MIN_SATURATION: u8 = 50;
pub const HSV_MIN_VALUE: u8 = 50;

/// Upper bound of the 8-bit hue range.
const HUE_MAX: u8 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Per-channel `±tolerance` on R, G and B.
    Rgb,
    /// `±tolerance` on hue, fixed lower bound on saturation and value.
    Hsv,
}

/// Reference color plus tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTarget {
    pub color: Color,
    pub tolerance: u8,
}

impl ColorTarget {
    pub const fn new(color: Color, tolerance: u8) -> Self {
        Self { color, tolerance }
    }

    pub const fn exact(color: Color) -> Self {
        Self::new(color, 0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("count", &self.count())
            .finish()
    }
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![0u8; (width as usize * height as usize).div_ceil(8)],
        }
    }

    /// Mask of pixels matching any of `targets` in the given color space.
    pub fn build(image: Image, targets: &[ColorTarget], space: ColorSpace) -> Self {
        match space {
            ColorSpace::Rgb => Self::from_fn(image, |c| targets.iter().any(|t| c.within(t.color, t.tolerance))),
            ColorSpace::Hsv => {
                let hues = targets
                    .iter()
                    .map(|t| {
                        let h = t.color.to_hsv().h;
                        (h.saturating_sub(t.tolerance), h.saturating_add(t.tolerance).min(HUE_MAX))
                    })
                    .collect::<Vec<_>>();

                Self::from_fn(image, |c| {
                    let hsv = c.to_hsv();
                    hsv.s >= HSV_MIN_SATURATION
                        && hsv.v >= HSV_MIN_VALUE
                        && hues.iter().any(|&(lo, hi)| (lo..=hi).contains(&hsv.h))
                })
            }
        }
    }

    /// Mask of "colorful" pixels of any hue.
    pub fn saturated(image: Image, min_saturation: u8, min_value: u8) -> Self {
        Self::from_fn(image, |c| {
            let hsv = c.to_hsv();
            hsv.s >= min_saturation && hsv.v >= min_value
        })
    }

    fn from_fn(image: Image, f: impl Fn(Color) -> bool) -> Self {
        let mut mask = Self::new(image.width(), image.height());
        for (x, y, c) in image.pixels() {
            if f(c) {
                mask.set(x, y);
            }
        }
        mask
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        let i = (x + y * self.width) as usize;
        (self.bits[i / 8] >> (i % 8)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32) {
        let i = (x + y * self.width) as usize;
        self.bits[i / 8] |= 1 << (i % 8);
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    fn row_has_any(&self, y: u32) -> bool {
        (0..self.width).any(|x| self.get(x, y))
    }

    /// Topmost row with at least one set pixel.
    pub fn min_row(&self) -> Option<u32> {
        (0..self.height).find(|&y| self.row_has_any(y))
    }

    /// Bottommost row with at least one set pixel.
    pub fn max_row(&self) -> Option<u32> {
        (0..self.height).rev().find(|&y| self.row_has_any(y))
    }

    /// Set pixels per column.
    pub fn column_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.width as usize];
        for y in 0..self.height {
            for (x, count) in counts.iter_mut().enumerate() {
                if self.get(x as u32, y) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Set pixels per row, only counting the given (inclusive) column range.
    pub fn row_counts(&self, columns: RangeInclusive<u32>) -> Vec<u32> {
        let x1 = *columns.start();
        let x2 = (*columns.end()).min(self.width.saturating_sub(1));
        (0..self.height)
            .map(|y| (x1..=x2).filter(|&x| self.get(x, y)).count() as u32)
            .collect()
    }

    /// Binary closing (dilate, then erode) with a `(2 * radius + 1)` square element.
    pub fn close(&self, radius: u8) -> Self {
        use imageproc::distance_transform::Norm;

        let closed = imageproc::morphology::close(&self.to_gray_image(), Norm::LInf, radius);
        Self::from_gray_image(&closed)
    }

    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    /// Nonzero pixels become set.
    pub fn from_gray_image(gray: &image::GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let mut mask = Self::new(width, height);
        for (x, y, p) in gray.enumerate_pixels() {
            if p.0[0] > 0 {
                mask.set(x, y);
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedImage;

    const PURPLE: Color = Color::hex(0x784da9);

    #[test]
    fn rgb_tolerance_is_inclusive_per_channel() {
        let mut img = OwnedImage::new(4, 1, Color::BLACK);
        img.put(0, 0, Color::new(100, 100, 100));
        img.put(1, 0, Color::new(102, 98, 101));
        img.put(2, 0, Color::new(103, 100, 100));
        img.put(3, 0, Color::new(100, 100, 97));

        let mask = Mask::build(img.as_image(), &[ColorTarget::new(Color::new(100, 100, 100), 2)], ColorSpace::Rgb);
        assert!(mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(2, 0));
        assert!(!mask.get(3, 0));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn rgb_tolerance_clamps_at_channel_bounds() {
        let img = OwnedImage::new(1, 1, Color::new(255, 0, 254));
        let mask = Mask::build(img.as_image(), &[ColorTarget::new(Color::new(254, 1, 255), 2)], ColorSpace::Rgb);
        assert!(mask.get(0, 0));
    }

    #[test]
    fn exact_targets_reject_off_by_one() {
        let mut img = OwnedImage::new(2, 1, Color::hex(0xf8f5ff));
        img.put(1, 0, Color::hex(0xf8f5fe));
        let mask = Mask::build(img.as_image(), &[ColorTarget::exact(Color::hex(0xf8f5ff))], ColorSpace::Rgb);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn hsv_matches_darker_shade_of_same_hue() {
        let mut img = OwnedImage::new(3, 1, Color::BLACK);
        img.put(0, 0, PURPLE);
        // Same hue, lower brightness.
        img.put(1, 0, Color::new(60, 38, 84));
        // Desaturated gray-purple falls below the saturation floor.
        img.put(2, 0, Color::new(120, 115, 125));

        let mask = Mask::build(img.as_image(), &[ColorTarget::new(PURPLE, 2)], ColorSpace::Hsv);
        assert!(mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(2, 0));
    }

    #[test]
    fn hsv_rejects_hue_outside_tolerance() {
        // PURPLE sits at hue 134; these are 135, 137 and 131 at full saturation.
        let mut img = OwnedImage::new(3, 1, Color::BLACK);
        img.put(0, 0, Color::new(125, 50, 200));
        img.put(1, 0, Color::new(135, 50, 200));
        img.put(2, 0, Color::new(105, 50, 200));
        assert_eq!(img.get(0, 0).to_hsv().h, 135);
        assert_eq!(img.get(1, 0).to_hsv().h, 137);
        assert_eq!(img.get(2, 0).to_hsv().h, 131);

        let mask = Mask::build(img.as_image(), &[ColorTarget::new(PURPLE, 2)], ColorSpace::Hsv);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(!mask.get(2, 0));
    }

    #[test]
    fn targets_combine_with_or() {
        let mut img = OwnedImage::new(3, 1, Color::BLACK);
        img.put(0, 0, Color::new(10, 10, 10));
        img.put(2, 0, Color::new(200, 10, 10));
        let targets = [
            ColorTarget::exact(Color::new(10, 10, 10)),
            ColorTarget::exact(Color::new(200, 10, 10)),
        ];
        let mask = Mask::build(img.as_image(), &targets, ColorSpace::Rgb);
        assert_eq!(mask.count(), 2);
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn row_and_column_statistics() {
        let mut mask = Mask::new(5, 4);
        mask.set(1, 1);
        mask.set(1, 2);
        mask.set(3, 2);
        assert_eq!(mask.column_counts(), vec![0, 2, 0, 1, 0]);
        assert_eq!(mask.row_counts(0..=2), vec![0, 1, 1, 0]);
        assert_eq!(mask.min_row(), Some(1));
        assert_eq!(mask.max_row(), Some(2));
        assert_eq!(Mask::new(3, 3).min_row(), None);
    }

    #[test]
    fn closing_bridges_small_gaps() {
        let mut mask = Mask::new(20, 9);
        for x in 2..18 {
            if x != 9 && x != 10 {
                mask.set(x, 4);
            }
        }
        let closed = mask.close(2);
        assert!(closed.get(9, 4));
        assert!(closed.get(10, 4));
        assert!(!closed.get(9, 2));
        assert!(!closed.get(9, 6));
    }
}
