//! Pixel-level enhancement applied before handing a buffer to an engine.
//!
//! Blurs run on `f32` planes through `imageproc`'s separable filter and are
//! rounded once at the end. Kernels are normalised so a flat region keeps
//! its value exactly.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, RgbImage};
use imageproc::filter::separable_filter_equal;

type PlaneF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// OpenCV's fixed taps for small kernels requested without a sigma.
const SMALL_GAUSSIAN_TAPS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Normalised 1-D Gaussian for `sigma`, sized the way OpenCV sizes a
/// `(0, 0)` kernel for 8-bit input: radius `round(3 * sigma)`, at least 1.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).round().max(1.0) as i32;
    gaussian_taps(radius, sigma)
}

/// Normalised 1-D Gaussian for an odd `size` with the sigma OpenCV derives
/// when none is given: `0.3 * ((size - 1) / 2 - 1) + 0.8`. Sizes up to 7 use
/// OpenCV's fixed binomial taps.
pub fn gaussian_kernel_for_size(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    if let Some(taps) = SMALL_GAUSSIAN_TAPS.get((size / 2) as usize) {
        return taps.to_vec();
    }
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    gaussian_taps((size / 2) as i32, sigma)
}

fn gaussian_taps(radius: i32, sigma: f32) -> Vec<f32> {
    let denom = 2.0 * sigma * sigma;
    let mut taps: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    for t in &mut taps {
        *t /= sum;
    }
    taps
}

/// Blur a grayscale buffer with the separable kernel `taps`, rounding to the
/// nearest level. Borders replicate the edge pixel.
pub fn blur_gray(img: &GrayImage, taps: &[f32]) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let blurred = blur_plane(img.as_raw(), 1, 0, img.width(), img.height(), taps);
    let data = blurred.iter().map(|v| v.round().clamp(0.0, 255.0) as u8).collect();
    GrayImage::from_raw(img.width(), img.height(), data).unwrap_or_else(|| img.clone())
}

/// Unsharp mask on a grayscale buffer:
/// `out = (1 + amount) * img - amount * gaussian(img, sigma)`, rounded and
/// saturated to `0..=255`.
pub fn unsharp_mask_gray(img: &GrayImage, sigma: f32, amount: f32) -> GrayImage {
    sharpen(img, sigma, amount)
}

/// Unsharp mask on any image. Grayscale stays grayscale; everything else is
/// sharpened per channel as RGB.
pub fn unsharp_mask(img: &DynamicImage, sigma: f32, amount: f32) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(sharpen(gray, sigma, amount)),
        other => {
            let rgb: RgbImage = other.to_rgb8();
            DynamicImage::ImageRgb8(sharpen(&rgb, sigma, amount))
        }
    }
}

fn sharpen<P>(img: &ImageBuffer<P, Vec<u8>>, sigma: f32, amount: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || sigma <= 0.0 {
        return img.clone();
    }
    let taps = gaussian_kernel(sigma);
    let channels = P::CHANNEL_COUNT as usize;
    let w_orig = 1.0 + amount;

    let mut out = img.clone();
    for channel in 0..channels {
        let blurred = blur_plane(img.as_raw(), channels, channel, width, height, &taps);
        for (dst, blur) in out.iter_mut().skip(channel).step_by(channels).zip(blurred) {
            let v = w_orig * f32::from(*dst) - amount * blur;
            *dst = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Blur one interleaved channel of `raw`, returning the unrounded plane.
fn blur_plane(raw: &[u8], channels: usize, channel: usize, width: u32, height: u32, taps: &[f32]) -> Vec<f32> {
    let values = raw.iter().skip(channel).step_by(channels).map(|&v| f32::from(v)).collect();
    match PlaneF32::from_raw(width, height, values) {
        Some(plane) => separable_filter_equal(&plane, taps).into_raw(),
        None => Vec::new(),
    }
}

/// Split pixels at `midpoint`: pixels `>= midpoint` are brightened by
/// `bright_offset`, the rest darkened by `dark_offset`. Both saturate.
pub fn split_contrast(img: &GrayImage, midpoint: u8, bright_offset: u8, dark_offset: u8) -> GrayImage {
    let mut out = img.clone();
    for p in out.iter_mut() {
        *p = if *p >= midpoint {
            p.saturating_add(bright_offset)
        } else {
            p.saturating_sub(dark_offset)
        };
    }
    out
}
