//! Contrast and sharpness boosts for grayscale text crops.
//!
//! Both are linear blends between the image and a "degenerate" version of it:
//! a flat image at the mean luma for contrast, a smoothed copy for sharpness.
//! A factor of 1.0 returns the input, larger factors push away from the
//! degenerate image.

use image::{GrayImage, Luma};
use imageproc::{filter::filter, kernel::Kernel};

/// 3×3 smoothing kernel, normalized by its sum.
const SMOOTH_KERNEL: [u32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
const SMOOTH_SCALE: f32 = 13.0;

#[inline]
fn blend(degenerate: u8, value: u8, factor: f32) -> u8 {
    let v = degenerate as f32 + factor * (value as f32 - degenerate as f32);
    v.clamp(0.0, 255.0) as u8
}

pub fn contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let len = (img.width() as u64 * img.height() as u64).max(1) as f64;
    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f64 / len + 0.5) as u8;

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([blend(mean, img.get_pixel(x, y).0[0], factor)])
    })
}

pub fn sharpness(img: &GrayImage, factor: f32) -> GrayImage {
    let smoothed = smooth(img);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([blend(smoothed.get_pixel(x, y).0[0], img.get_pixel(x, y).0[0], factor)])
    })
}

/// Smoothed copy; the one-pixel border is copied unchanged.
fn smooth(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return img.clone();
    }

    let kernel = Kernel::new(&SMOOTH_KERNEL, 3, 3);
    let mut out: GrayImage = filter(img, kernel, |sum: u32| {
        (sum as f32 / SMOOTH_SCALE + 0.5).min(255.0) as u8
    });

    // The filter pads by clamping; restore the source border instead.
    for x in 0..w {
        out.put_pixel(x, 0, *img.get_pixel(x, 0));
        out.put_pixel(x, h - 1, *img.get_pixel(x, h - 1));
    }
    for y in 1..h - 1 {
        out.put_pixel(0, y, *img.get_pixel(0, y));
        out.put_pixel(w - 1, y, *img.get_pixel(w - 1, y));
    }
    out
}
