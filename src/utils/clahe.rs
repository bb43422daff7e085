//! Contrast-limited adaptive histogram equalization.
//!
//! The image is split into a `tiles x tiles` grid of equal tiles. When a
//! side does not divide evenly, the image is extended down and right by
//! mirroring (without repeating the edge pixel) until it does. A side that
//! already divides evenly is still extended by a full `tiles` pixels when
//! the other side needs padding, which is how OpenCV lays the grid out.
//! Each tile gets its own clipped-histogram equalization table and every
//! pixel is mapped by bilinear interpolation between the tables of the
//! four nearest tile centres.

use image::GrayImage;
use rayon::prelude::*;

type Lut = [u8; 256];

/// Apply CLAHE with the given clip limit and tile grid size.
///
/// `clip_limit` is relative to a flat histogram: a bin may hold at most
/// `clip_limit * tile_area / 256` pixels before the excess is redistributed.
/// A non-positive `clip_limit` disables clipping (plain tiled equalization).
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return gray.clone();
    }

    let (tile_w, tile_h) = tile_size(width, height, tiles);
    let n = tiles as usize;

    let luts: Vec<Lut> = (0..n * n)
        .into_par_iter()
        .map(|i| {
            let (tx, ty) = ((i % n) as u32, (i / n) as u32);
            tile_lut(gray, tx * tile_w, ty * tile_h, tile_w, tile_h, clip_limit)
        })
        .collect();

    let w = width as usize;
    let src = gray.as_raw();
    let mut out = vec![0u8; w * height as usize];
    let columns: Vec<(usize, usize, f32)> = (0..w).map(|x| neighbours(x, tile_w, n)).collect();

    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let (ty1, ty2, ya) = neighbours(y, tile_h, n);
        for (x, dst) in row.iter_mut().enumerate() {
            let (tx1, tx2, xa) = columns[x];
            let v = src[y * w + x] as usize;
            let top = (1.0 - xa) * luts[ty1 * n + tx1][v] as f32 + xa * luts[ty1 * n + tx2][v] as f32;
            let bottom = (1.0 - xa) * luts[ty2 * n + tx1][v] as f32 + xa * luts[ty2 * n + tx2][v] as f32;
            *dst = ((1.0 - ya) * top + ya * bottom).round_ties_even().clamp(0.0, 255.0) as u8;
        }
    });

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| gray.clone())
}

/// Tile dimensions after padding the image to a multiple of the grid.
fn tile_size(width: u32, height: u32, tiles: u32) -> (u32, u32) {
    if width % tiles == 0 && height % tiles == 0 {
        return (width / tiles, height / tiles);
    }
    let padded_w = width + tiles - width % tiles;
    let padded_h = height + tiles - height % tiles;
    (padded_w / tiles, padded_h / tiles)
}

/// Mirror `pos` into `0..len` without repeating the edge pixel.
fn reflect_101(pos: u32, len: u32) -> u32 {
    if len == 1 {
        return 0;
    }
    let (mut p, len) = (i64::from(pos), i64::from(len));
    while p < 0 || p >= len {
        p = if p < 0 { -p } else { 2 * (len - 1) - p };
    }
    p as u32
}

/// The two tile indices whose centres bracket `pos`, and the weight of the
/// second one.
fn neighbours(pos: usize, tile: u32, count: usize) -> (usize, usize, f32) {
    let f = pos as f32 / tile as f32 - 0.5;
    let lo = f.floor();
    let weight = f - lo;
    let last = count as i64 - 1;
    let i1 = (lo as i64).clamp(0, last) as usize;
    let i2 = (lo as i64 + 1).clamp(0, last) as usize;
    (i1, i2, weight)
}

fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, tile_w: u32, tile_h: u32, clip_limit: f32) -> Lut {
    let (width, height) = gray.dimensions();
    let mut hist = [0u32; 256];
    for y in y0..y0 + tile_h {
        let sy = reflect_101(y, height);
        for x in x0..x0 + tile_w {
            hist[gray.get_pixel(reflect_101(x, width), sy)[0] as usize] += 1;
        }
    }
    let area = tile_w * tile_h;

    if clip_limit > 0.0 {
        let clip = ((f64::from(clip_limit) * f64::from(area) / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }

        let per_bin = excess / 256;
        let residual = (excess - per_bin * 256) as usize;
        for bin in hist.iter_mut() {
            *bin += per_bin;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for bin in hist.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (value, count) in hist.iter().enumerate() {
        cdf += count;
        lut[value] = (cdf as f32 * scale).round_ties_even().min(255.0) as u8;
    }
    lut
}
