//! Morphology with rectangular structuring elements.
//!
//! Binary masks closed with an odd square kernel go through
//! `imageproc::morphology` with the chessboard norm. Other shapes use a
//! separable pass: horizontal then vertical, each a van Herk/Gil-Werman
//! running extreme. The anchor sits at `(width / 2, height / 2)`, so
//! even-sized kernels reach one pixel further up/left than down/right.
//! Pixels outside the image never contribute.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use rayon::prelude::*;

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

impl Op {
    fn neutral(self) -> u8 {
        match self {
            Op::Dilate => u8::MIN,
            Op::Erode => u8::MAX,
        }
    }

    #[inline]
    fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            Op::Dilate => a.max(b),
            Op::Erode => a.min(b),
        }
    }
}

/// Dilate with a `kw x kh` rectangle.
pub fn dilate_rect(img: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    separable(img, kw, kh, Op::Dilate)
}

/// Erode with a `kw x kh` rectangle.
pub fn erode_rect(img: &GrayImage, kw: u32, kh: u32) -> GrayImage {
    separable(img, kw, kh, Op::Erode)
}

/// Morphological closing: `iterations` dilations followed by the same
/// number of erosions.
pub fn close_rect(img: &GrayImage, kw: u32, kh: u32, iterations: u32) -> GrayImage {
    let mut out = img.clone();
    for _ in 0..iterations {
        out = dilate_rect(&out, kw, kh);
    }
    for _ in 0..iterations {
        out = erode_rect(&out, kw, kh);
    }
    out
}

/// Closing of a binary mask (pixels 0 or 255).
///
/// `n` dilations by an odd `k x k` square equal one chessboard dilation of
/// radius `n * (k / 2)`, and the same holds for the erosions. Even or
/// non-square kernels have no chessboard equivalent with this anchor and
/// fall back to [`close_rect`].
pub fn close_mask(mask: &GrayImage, kw: u32, kh: u32, iterations: u32) -> GrayImage {
    let radius = u64::from(iterations) * u64::from(kw / 2);
    match u8::try_from(radius) {
        Ok(r) if kw == kh && kw % 2 == 1 && r < u8::MAX => {
            if r == 0 {
                return mask.clone();
            }
            erode(&dilate(mask, Norm::LInf, r), Norm::LInf, r)
        }
        _ => close_rect(mask, kw, kh, iterations),
    }
}

fn separable(img: &GrayImage, kw: u32, kh: u32, op: Op) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return img.clone();
    }

    let rows = filter_rows(img.as_raw(), w, kw as usize, op);
    let cols = filter_rows(&transpose(&rows, w, h), h, kh as usize, op);
    let out = transpose(&cols, h, w);

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| img.clone())
}

fn filter_rows(src: &[u8], width: usize, k: usize, op: Op) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    dst.par_chunks_mut(width)
        .zip(src.par_chunks(width))
        .for_each(|(out, row)| sliding_extreme(row, k, op, out));
    dst
}

fn sliding_extreme(row: &[u8], k: usize, op: Op, out: &mut [u8]) {
    let n = row.len();
    if k <= 1 {
        out.copy_from_slice(row);
        return;
    }
    let anchor = k / 2;
    let len = n + k - 1;

    let mut padded = vec![op.neutral(); len];
    padded[anchor..anchor + n].copy_from_slice(row);

    // prefix extreme within each block of k, and suffix extreme within it
    let mut prefix = vec![0u8; len];
    let mut suffix = vec![0u8; len];
    for i in 0..len {
        prefix[i] = if i % k == 0 {
            padded[i]
        } else {
            op.apply(prefix[i - 1], padded[i])
        };
    }
    for i in (0..len).rev() {
        suffix[i] = if i == len - 1 || (i + 1) % k == 0 {
            padded[i]
        } else {
            op.apply(suffix[i + 1], padded[i])
        };
    }

    for (x, dst) in out.iter_mut().enumerate() {
        *dst = op.apply(suffix[x], prefix[x + k - 1]);
    }
}

fn transpose(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            dst[x * height + y] = src[y * width + x];
        }
    }
    dst
}
