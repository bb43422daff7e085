//! Luma conversion for working images.
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, the weighting the detector's tuned
//! threshold was calibrated against. Uses OpenCV's 14-bit fixed point so
//! the weights sum to exactly one and white stays 255:
//! Y = (4899*R + 9617*G + 1868*B + 8192) >> 14
use image::{DynamicImage, GrayImage};
use rayon::prelude::*;

const SHIFT: u32 = 14;
const COEF_R: u32 = 4899;
const COEF_G: u32 = 9617;
const COEF_B: u32 = 1868;
const ROUND: u32 = 1 << (SHIFT - 1);

/// True when the image is already a single-channel 8-bit buffer.
pub fn is_gray8(image: &DynamicImage) -> bool {
    matches!(image, DynamicImage::ImageLuma8(_))
}

/// Convert any image to single-channel 8-bit grayscale.
///
/// 8-bit grayscale input is returned as a copy; everything else goes through
/// RGB. Rows are processed in parallel.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => return gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => return image.to_luma8(),
        _ => {}
    }

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let width = width as usize;
    let src = rgb.as_raw();
    let mut gray = vec![0u8; width * height as usize];

    if width > 0 {
        gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let row_start = y * width * 3;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * 3;
                let r = src[idx] as u32;
                let g = src[idx + 1] as u32;
                let b = src[idx + 2] as u32;
                let lum = (COEF_R * r + COEF_G * g + COEF_B * b + ROUND) >> SHIFT;
                *out = lum.min(255) as u8;
            }
        });
    }

    GrayImage::from_raw(width as u32, height, gray).unwrap_or_else(|| GrayImage::new(0, 0))
}
