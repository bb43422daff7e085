//! End-to-end strategy behaviour on synthetic images.
//!
//! Barcodes are drawn as fields of 2px dark / 2px light bars. The engine is
//! a stand-in that counts dark runs along the middle row of whatever buffer
//! it is handed and looks the count up in a table, so a crop that contains
//! exactly one field decodes to that field's value.

use std::cell::Cell;

use gouda::{
    Barcode, Engine, EngineError, Pipeline, ResizeStrategy, RoiStrategy, Strategy,
};
use image::{DynamicImage, GrayImage, Luma};

struct BarCounter {
    table: Vec<(usize, &'static str)>,
    calls: Cell<usize>,
}

impl BarCounter {
    fn new(table: &[(usize, &'static str)]) -> Self {
        Self {
            table: table.to_vec(),
            calls: Cell::new(0),
        }
    }

    fn dark_runs(gray: &GrayImage) -> usize {
        let y = gray.height() / 2;
        let mut runs = 0;
        let mut in_run = false;
        for x in 0..gray.width() {
            let dark = gray.get_pixel(x, y)[0] < 128;
            if dark && !in_run {
                runs += 1;
            }
            in_run = dark;
        }
        runs
    }
}

impl Engine for BarCounter {
    fn name(&self) -> &str {
        "bar-counter"
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError> {
        self.calls.set(self.calls.get() + 1);
        let gray = image.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Ok(vec![]);
        }
        let runs = Self::dark_runs(&gray);
        Ok(self
            .table
            .iter()
            .filter(|(n, _)| *n == runs)
            .map(|(_, value)| Barcode::new("CODE-128", *value).expect("valid barcode"))
            .collect())
    }
}

fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Draw `n` bars starting at `(x0, y0)`, each `height` tall.
fn draw_bars(img: &mut GrayImage, x0: u32, y0: u32, n: u32, height: u32) {
    for i in 0..n {
        for y in y0..y0 + height {
            img.put_pixel(x0 + i * 4, y, Luma([0]));
            img.put_pixel(x0 + i * 4 + 1, y, Luma([0]));
        }
    }
}

#[test]
fn single_barcode_decoded_by_resize_at_full_size() {
    let mut img = blank(2048, 300);
    draw_bars(&mut img, 900, 50, 30, 200);
    let img = DynamicImage::ImageLuma8(img);
    let engine = BarCounter::new(&[(30, "Stegosaurus")]);

    let result = ResizeStrategy::default()
        .attempt(&img, &engine)
        .unwrap()
        .expect("barcode found");

    assert_eq!(result.strategy, "resize: scaling factor [1.0] sharpening [0]");
    assert_eq!(result.barcodes.len(), 1);
    assert_eq!(result.barcodes[0].data, b"Stegosaurus");
    assert_eq!(result.barcodes[0].rect, None);
    assert_eq!(engine.calls.get(), 1);
}

#[test]
fn no_barcode_anywhere() {
    let img = DynamicImage::ImageLuma8(blank(2048, 600));
    let engine = BarCounter::new(&[(30, "Stegosaurus")]);

    assert_eq!(ResizeStrategy::default().attempt(&img, &engine).unwrap(), None);
    assert_eq!(RoiStrategy::default().attempt(&img, &engine).unwrap(), None);
    assert_eq!(Pipeline::default().decode(&img, &engine).unwrap(), None);
}

#[test]
fn three_barcodes_decoded_by_roi() {
    let mut img = blank(2048, 800);
    draw_bars(&mut img, 200, 100, 20, 150);
    draw_bars(&mut img, 900, 100, 25, 150);
    draw_bars(&mut img, 1500, 450, 30, 150);
    // A second copy of the first value
    draw_bars(&mut img, 300, 500, 20, 150);
    let img = DynamicImage::ImageLuma8(img);

    let engine = BarCounter::new(&[
        (20, "BM001128286"),
        (25, "BM001128287"),
        (30, "BM001128288"),
    ]);
    let result = RoiStrategy::default()
        .attempt(&img, &engine)
        .unwrap()
        .expect("barcodes found");

    assert_eq!(result.strategy, "roi");
    let mut values: Vec<String> = result
        .barcodes
        .iter()
        .map(|b| b.value().into_owned())
        .collect();
    values.sort();
    assert_eq!(values, vec!["BM001128286", "BM001128287", "BM001128288"]);
    assert!(result.barcodes.iter().all(|b| b.rect.is_none()));
}

#[test]
fn tiny_image_with_small_minimum() {
    let mut img = blank(10, 10);
    draw_bars(&mut img, 1, 1, 2, 8);
    let img = DynamicImage::ImageLuma8(img);
    let engine = BarCounter::new(&[(30, "Stegosaurus")]);

    let strategy = ResizeStrategy::new(3).unwrap();
    assert_eq!(strategy.attempt(&img, &engine).unwrap(), None);
    assert_eq!(ResizeStrategy::default().attempt(&img, &engine).unwrap(), None);
}

#[test]
fn negative_minimum_pixels_rejected() {
    assert!(ResizeStrategy::new(-1).is_err());
}

#[test]
fn pipeline_prefers_resize() {
    let mut img = blank(2048, 300);
    draw_bars(&mut img, 900, 50, 30, 200);
    let img = DynamicImage::ImageLuma8(img);
    let engine = BarCounter::new(&[(30, "Stegosaurus")]);

    let result = Pipeline::default().decode(&img, &engine).unwrap().unwrap();
    assert!(result.strategy.starts_with("resize"));
}
