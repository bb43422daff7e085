//! Candidate barcode region detection
//!
//! Proposes axis-aligned rectangles where a barcode-like dense edge pattern
//! appears. The pipeline is fixed:
//! - Resize to a canonical working width
//! - Grayscale and CLAHE to normalise lighting
//! - Difference of horizontal and vertical gradient magnitudes, which is
//!   large where parallel bars produce edges along one axis only
//! - Small blur, then a high fixed threshold
//! - Rectangular closing to fuse the bars of one symbol into a blob
//! - Bounding rects of external contours

/// Bounding rects of external contours
pub mod contour;
/// Area-based candidate filtering
pub mod filter;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::threshold;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::{debug, instrument};

use crate::error::{GoudaError, Result};
use crate::models::Rect;
use crate::utils::clahe::clahe;
use crate::utils::grayscale::{is_gray8, to_gray};
use crate::utils::enhance::{blur_gray, gaussian_kernel_for_size};
use crate::utils::morphology::close_mask;
use contour::ContourDetector;
pub use filter::AreaFilter;

/// Rectangular structuring element used for the closing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuringElement {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl StructuringElement {
    /// Tuned for local blobs: one symbol at the working width.
    pub const SMALL: Self = Self {
        width: 11,
        height: 11,
    };
    /// Tuned for coarser regions.
    pub const LARGE: Self = Self {
        width: 50,
        height: 50,
    };
}

/// Detector tuning. The defaults were calibrated on consistently lit
/// specimen scans; they are not general-purpose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Width of the working image
    pub target_width: u32,
    /// CLAHE clip limit
    pub clip_limit: f32,
    /// CLAHE tiles per side
    pub tile_grid: u32,
    /// Odd size of the Gaussian applied to the gradient difference, with
    /// OpenCV's default sigma for that size. Zero skips the blur.
    pub blur_kernel: u32,
    /// Gradient values above this become foreground
    pub threshold: u8,
    /// Closing kernel
    pub structuring_element: StructuringElement,
    /// Dilations (then erosions) in the closing
    pub closing_iterations: u32,
    /// Keep intermediate images in [`Detection::stages`]
    pub capture_stages: bool,
}

impl DetectorConfig {
    /// Canonical working width
    pub const TARGET_WIDTH: u32 = 2048;

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 {
            return Err(GoudaError::Config("target_width must be positive".into()));
        }
        if self.tile_grid == 0 {
            return Err(GoudaError::Config("tile_grid must be positive".into()));
        }
        if self.structuring_element.width == 0 || self.structuring_element.height == 0 {
            return Err(GoudaError::Config(format!(
                "empty structuring element {}x{}",
                self.structuring_element.width, self.structuring_element.height
            )));
        }
        if self.blur_kernel != 0 && self.blur_kernel % 2 == 0 {
            return Err(GoudaError::Config(format!(
                "blur_kernel must be odd or zero, got {}",
                self.blur_kernel
            )));
        }
        Ok(())
    }

    /// Same configuration with a different closing kernel.
    pub fn with_structuring_element(self, structuring_element: StructuringElement) -> Self {
        Self {
            structuring_element,
            ..self
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_width: Self::TARGET_WIDTH,
            clip_limit: 2.0,
            tile_grid: 8,
            blur_kernel: 3,
            threshold: 0xd0,
            structuring_element: StructuringElement::SMALL,
            closing_iterations: 2,
            capture_stages: false,
        }
    }
}

/// Intermediate images, kept when [`DetectorConfig::capture_stages`] is set.
#[derive(Debug, Clone)]
pub struct DetectionStages {
    /// Working image in grey
    pub grey: GrayImage,
    /// After CLAHE
    pub equalized: GrayImage,
    /// Blurred gradient difference
    pub gradient: GrayImage,
    /// Binary mask after thresholding
    pub threshold: GrayImage,
    /// Mask after the closing
    pub closing: GrayImage,
}

/// Output of [`Detector::detect`].
#[derive(Debug, Clone)]
pub struct Detection {
    /// The resized image all candidates are expressed in
    pub working: DynamicImage,
    /// Candidate rects in discovery order
    pub candidates: Vec<Rect>,
    /// `working width / original width`
    pub scale: f64,
    /// Intermediate images, when requested
    pub stages: Option<DetectionStages>,
}

impl Detection {
    /// Map a rect in the working image back to the original image.
    pub fn to_source(&self, rect: &Rect) -> Result<Rect> {
        rect.rescale(self.scale)
    }
}

/// Proposes rectangles likely to contain a barcode.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    /// Detector with a validated configuration.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the detection pipeline on one image.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Detection {
        let cfg = &self.config;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            debug!("empty image, no candidates");
            return Detection {
                working: image.clone(),
                candidates: Vec::new(),
                scale: 1.0,
                stages: None,
            };
        }

        let (working, scale) = if width == cfg.target_width {
            (image.clone(), 1.0)
        } else {
            let factor = f64::from(cfg.target_width) / f64::from(width);
            let new_height = ((f64::from(height) * factor).round() as u32).max(1);
            debug!(target_width = cfg.target_width, factor, "resize");
            (
                image.resize_exact(cfg.target_width, new_height, FilterType::Triangle),
                factor,
            )
        };

        let grey = if is_gray8(&working) {
            working.to_luma8()
        } else {
            debug!("convert grey");
            to_gray(&working)
        };

        debug!("equalize");
        let equalized = clahe(&grey, cfg.clip_limit, cfg.tile_grid);

        debug!("high-pass filter");
        let gradient = gradient_difference(&equalized);

        debug!("low-pass filter");
        let smoothed = if cfg.blur_kernel > 0 {
            blur_gray(&gradient, &gaussian_kernel_for_size(cfg.blur_kernel))
        } else {
            gradient.clone()
        };

        debug!(threshold = cfg.threshold, "threshold");
        let thresh = threshold(&smoothed, cfg.threshold);

        let se = cfg.structuring_element;
        debug!(kernel_width = se.width, kernel_height = se.height, "morphology");
        let closing = close_mask(&thresh, se.width, se.height, cfg.closing_iterations);

        let candidates = ContourDetector::external_bounds(&closing);
        debug!(count = candidates.len(), "contours");

        let stages = cfg.capture_stages.then(|| DetectionStages {
            grey,
            equalized,
            gradient: smoothed,
            threshold: thresh,
            closing,
        });

        Detection {
            working,
            candidates,
            scale,
            stages,
        }
    }
}

/// `| |dI/dy| - |dI/dx| |` from 3x3 Sobel responses, saturated to `u8`.
fn gradient_difference(gray: &GrayImage) -> GrayImage {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let dx = i32::from(gx.get_pixel(x, y)[0]).abs();
        let dy = i32::from(gy.get_pixel(x, y)[0]).abs();
        Luma([(dy - dx).abs().min(255) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn bars(width: u32, height: u32, x0: u32, y0: u32, n_bars: u32, bar_h: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        for i in 0..n_bars {
            let x = x0 + i * 4;
            for y in y0..y0 + bar_h {
                img.put_pixel(x, y, Luma([0]));
                img.put_pixel(x + 1, y, Luma([0]));
            }
        }
        img
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = DetectorConfig {
            target_width: 0,
            ..DetectorConfig::default()
        };
        assert!(Detector::new(cfg).is_err());

        let cfg = DetectorConfig::default().with_structuring_element(StructuringElement {
            width: 0,
            height: 3,
        });
        assert!(Detector::new(cfg).is_err());

        let cfg = DetectorConfig {
            blur_kernel: 4,
            ..DetectorConfig::default()
        };
        assert!(Detector::new(cfg).is_err());
    }

    #[test]
    fn test_resizes_to_target_width() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(512, 300));
        let detection = Detector::default().detect(&img);
        assert_eq!(detection.working.width(), 2048);
        assert_eq!(detection.working.height(), 1200);
        assert_eq!(detection.scale, 4.0);
    }

    #[test]
    fn test_blank_image_has_no_candidates() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(2048, 200, Luma([255])));
        let detection = Detector::default().detect(&img);
        assert!(detection.candidates.is_empty());
        assert_eq!(detection.scale, 1.0);
        assert!(detection.stages.is_none());
    }

    #[test]
    fn test_finds_bar_pattern() {
        let img = DynamicImage::ImageLuma8(bars(2048, 400, 500, 100, 30, 150));
        let detection = Detector::default().detect(&img);

        let hit = detection
            .candidates
            .iter()
            .find(|r| r.x <= 520 && r.x + r.width >= 600 && r.y <= 120 && r.y + r.height >= 230);
        assert!(hit.is_some(), "candidates: {:?}", detection.candidates);
    }

    #[test]
    fn test_capture_stages() {
        let cfg = DetectorConfig {
            capture_stages: true,
            ..DetectorConfig::default()
        };
        let img = DynamicImage::ImageLuma8(bars(2048, 300, 100, 50, 20, 100));
        let detection = Detector::new(cfg).unwrap().detect(&img);
        let stages = detection.stages.expect("stages requested");
        assert_eq!(stages.closing.dimensions(), (2048, 300));
        assert!(stages.threshold.pixels().any(|p| p[0] == 255));
    }

    #[test]
    fn test_to_source_undoes_scale() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1024, 100));
        let detection = Detector::default().detect(&img);
        assert_eq!(detection.scale, 2.0);
        let r = detection.to_source(&Rect::new(100, 50, 400, 20)).unwrap();
        assert_eq!(r, Rect::new(50, 25, 200, 10));
    }

    #[test]
    fn test_gradient_difference_highlights_vertical_bars() {
        let img = bars(40, 40, 10, 5, 5, 30);
        let grad = gradient_difference(&img);
        // Inside the bar field the x-gradient dominates
        assert_eq!(grad.get_pixel(14, 20)[0], 255);
        // Flat background has no response
        assert_eq!(grad.get_pixel(2, 2)[0], 0);
    }
}
