//! Pixel-level filter passes.
//!
//! Channel math works on `[0, 255]` floats and clamps on write. Alpha is
//! never touched. Rows are processed in parallel.

use image::{RgbaImage, imageops};
use rayon::prelude::*;

use crate::scene::Filter;

/// Clamp a channel value to the byte range.
#[inline]
pub fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Shift every channel by `amount * 255`.
#[inline]
pub fn brightness(value: f32, amount: f32) -> f32 {
    value + amount * 255.0
}

/// Contrast around mid-grey.
///
/// `amount` in `[-1, 1]`: -1 flattens to grey, 0 is identity, 1 is maximal.
#[inline]
pub fn contrast(value: f32, amount: f32) -> f32 {
    let c = amount.clamp(-1.0, 1.0) * 255.0;
    // Keep the denominator away from zero at c = 255.
    let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c).max(1.0));
    factor * (value - 128.0) + 128.0
}

/// Pull (negative `amount`) or push channels relative to the brightest one.
#[inline]
pub fn saturation(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let adjust = -amount;
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    rgb.map(|c| if c != max { c + (max - c) * adjust } else { c })
}

/// Saturation weighted towards muted colours.
#[inline]
pub fn vibrance(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let adjust = -amount;
    let max = rgb[0].max(rgb[1]).max(rgb[2]);
    let avg = (rgb[0] + rgb[1] + rgb[2]) / 3.0;
    let amt = ((max - avg).abs() * 2.0 / 255.0) * adjust;
    rgb.map(|c| if c != max { c + (max - c) * amt } else { c })
}

/// Rotate hue by `radians` around the grey axis.
#[inline]
pub fn hue_rotate(rgb: [f32; 3], radians: f32) -> [f32; 3] {
    let (sin, cos) = radians.sin_cos();
    let third: f32 = 1.0 / 3.0;
    let sq = third.sqrt();
    let a = cos + (1.0 - cos) * third;
    let b = third * (1.0 - cos) - sq * sin;
    let c = third * (1.0 - cos) + sq * sin;
    [
        rgb[0] * a + rgb[1] * b + rgb[2] * c,
        rgb[0] * c + rgb[1] * a + rgb[2] * b,
        rgb[0] * b + rgb[1] * c + rgb[2] * a,
    ]
}

/// Gaussian sigma for a normalized blur amount on an image of the given size.
pub fn blur_sigma(amount: f32, width: u32, height: u32) -> f32 {
    amount.clamp(0.0, 1.0) * 0.05 * width.max(height) as f32
}

fn map_pixels(img: &mut RgbaImage, f: impl Fn([f32; 3]) -> [f32; 3] + Sync) {
    let raw: &mut [u8] = &mut **img;
    raw.par_chunks_mut(4).for_each(|px| {
        let out = f([px[0] as f32, px[1] as f32, px[2] as f32]);
        px[0] = clamp_channel(out[0]);
        px[1] = clamp_channel(out[1]);
        px[2] = clamp_channel(out[2]);
    });
}

/// Apply one filter in place.
pub fn apply_filter(img: &mut RgbaImage, filter: &Filter) {
    match *filter {
        Filter::Brightness { brightness: amount } => {
            map_pixels(img, |rgb| rgb.map(|c| brightness(c, amount)))
        }
        Filter::Contrast { contrast: amount } => {
            map_pixels(img, |rgb| rgb.map(|c| contrast(c, amount)))
        }
        Filter::Saturation { saturation: amount } => map_pixels(img, |rgb| saturation(rgb, amount)),
        Filter::Vibrance { vibrance: amount } => map_pixels(img, |rgb| vibrance(rgb, amount)),
        Filter::HueRotation { rotation } => map_pixels(img, |rgb| hue_rotate(rgb, rotation)),
        Filter::Blur { blur } => {
            let sigma = blur_sigma(blur, img.width(), img.height());
            if sigma > 0.0 {
                *img = imageops::blur(&*img, sigma);
            }
        }
    }
}

/// Apply a filter list in order.
pub fn apply_filters(img: &mut RgbaImage, filters: &[Filter]) {
    for filter in filters {
        apply_filter(img, filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([rgb[0], rgb[1], rgb[2], 200]))
    }

    #[test]
    fn test_brightness_increase() {
        let mut img = solid([100, 100, 100]);
        apply_filter(&mut img, &Filter::Brightness { brightness: 0.5 });
        let px = img.get_pixel(1, 1).0;
        assert!(px[0] > 100, "expected brighter, got {}", px[0]);
        assert_eq!(px[3], 200, "alpha must be untouched");
    }

    #[test]
    fn test_contrast_moves_away_from_mid() {
        let mut img = solid([100, 100, 100]);
        apply_filter(&mut img, &Filter::Contrast { contrast: 0.5 });
        assert!(img.get_pixel(0, 0).0[0] < 100);
    }

    #[test]
    fn test_contrast_minimum_is_grey() {
        assert!((contrast(10.0, -1.0) - 128.0).abs() < 1e-3);
        assert!((contrast(250.0, -1.0) - 128.0).abs() < 1e-3);
    }

    #[test]
    fn test_full_desaturation_is_grey_max() {
        let out = saturation([200.0, 100.0, 50.0], -1.0);
        assert_eq!(out, [200.0, 200.0, 200.0]);
    }

    #[test]
    fn test_hue_rotation_identity() {
        let out = hue_rotate([200.0, 100.0, 50.0], 0.0);
        for (a, b) in out.iter().zip([200.0, 100.0, 50.0]) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_hue_preserves_grey() {
        let out = hue_rotate([90.0, 90.0, 90.0], 1.3);
        for c in out {
            assert!((c - 90.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_blur_is_noop() {
        let mut img = solid([1, 2, 3]);
        let before = img.clone();
        apply_filter(&mut img, &Filter::Blur { blur: 0.0 });
        assert_eq!(img, before);
    }
}
