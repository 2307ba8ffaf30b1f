//! Image primitives and utilities.
//!
//! The pipeline uses a lightweight owned RGB image type (`OwnedImage`) that is
//! optimized for repeated cropping of screen captures.
//!
//! Most stages borrow a view (`Image<'a>`) instead of copying pixels and only
//! materialize an owned image when they hand a crop to the next stage.

use std::path::Path;

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Solid image of the given size.
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            data: vec![fill; area(width, height)],
        }
    }

    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        Self::from_packed(width, bytes, 4)
    }

    /// Build an `OwnedImage` from tightly packed RGB bytes.
    pub fn from_rgb(width: usize, bytes: &[u8]) -> Self {
        Self::from_packed(width, bytes, 3)
    }

    fn from_packed(width: usize, bytes: &[u8], stride: usize) -> Self {
        let height = if width == 0 { 0 } else { bytes.len() / width / stride };
        let data = bytes
            .chunks_exact(stride)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    pub fn from_dynamic(img: &image::DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb(width as usize, rgb.as_raw()).with_height(height)
    }

    // `from_rgb` infers the height, which is zero for zero-width buffers.
    fn with_height(mut self, height: u32) -> Self {
        if self.width == 0 {
            self.height = height;
        }
        self
    }

    /// Decode an image file (any format `image` understands).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("decode {:?}", path))?;
        Ok(Self::from_dynamic(&img))
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
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.data[x as usize + y as usize * self.width as usize]
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, color: Color) {
        self.data[x as usize + y as usize * self.width as usize] = color;
    }

    /// Fill the rectangle `[x, x + w) × [y, y + h)`, clipped to the image.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color) {
        let x2 = x.saturating_add(w).min(self.width);
        let y2 = y.saturating_add(h).min(self.height);
        for yy in y.min(y2)..y2 {
            for xx in x.min(x2)..x2 {
                self.put(xx, yy, color);
            }
        }
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image(&self) -> Image<'_> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        self.as_image().to_gray_image()
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        self.as_image().to_rgb_image()
    }

    /// Build an `OwnedImage` from an `RgbImage` (used after `imageproc` drawing).
    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgb(width as usize, img.as_raw()).with_height(height)
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Pixel at view-relative coordinates.
    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(self.x1 + x) as usize + (self.y1 + y) as usize * self.true_width as usize]
    }

    /// Iterate `(x, y, color)` in row-major order, view-relative.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Color)> + 'a {
        let view = *self;
        (0..view.height()).flat_map(move |y| (0..view.width()).map(move |x| (x, y, view.pixel(x, y))))
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity(area(self.width(), self.height()));
        for y in 0..self.height() {
            for x in 0..self.width() {
                data.push(self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let c = self.pixel(x, y);
            image::Rgb([c.r, c.g, c.b])
        })
    }

    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width(), self.height(), |x, y| {
            image::Luma([self.pixel(x, y).luma()])
        })
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_rgb_image()
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("save png {:?}", path))?;
        Ok(())
    }

    /// Gets a subimage with the same width and provided height aligned to the top with the bottom side trimmed.
    pub fn trimmed_top(&self, height: u32) -> Self {
        let size = height.min(self.height());

        Self {
            y2: self.y1 + size,
            ..*self
        }
    }

    /// Full-width band of rows `[top, bottom)`, clamped to the view.
    pub fn rows(&self, top: u32, bottom: u32) -> Self {
        let bottom = bottom.min(self.height());
        let top = top.min(bottom);
        self.sub_image(0, top, self.width(), bottom - top)
    }

    /// Create an arbitrary subimage (relative coordinates).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` literal, so palettes read like the hex codes they were sampled as.
    #[inline]
    pub const fn hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    /// True if every channel lies within `±tolerance` of `target`.
    #[inline]
    pub fn within(&self, target: Color, tolerance: u8) -> bool {
        self.r.abs_diff(target.r) <= tolerance
            && self.g.abs_diff(target.g) <= tolerance
            && self.b.abs_diff(target.b) <= tolerance
    }

    /// 8-bit HSV: hue in `0..180` (degrees / 2), saturation and value in `0..=255`.
    pub fn to_hsv(&self) -> Hsv {
        let r = self.r as f32;
        let g = self.g as f32;
        let b = self.b as f32;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

        let mut h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        Hsv {
            h: ((h / 2.0).round() as u32 % 180) as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Pixel count, widened before multiplying.
#[inline]
fn area(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
