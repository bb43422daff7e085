use std::borrow::Cow;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, instrument};

use super::{Strategy, StrategyResult};
use crate::engine::Engine;
use crate::error::{GoudaError, Result};
use crate::models::Barcode;
use crate::utils::enhance::unsharp_mask;

/// Cumulative sharpening passes, in the order they are tried
const SHARPENING_LEVELS: [u32; 3] = [0, 1, 2];

/// Scale factors in percent, largest first
fn scale_percentages() -> impl Iterator<Item = u32> {
    (5..=100).rev().step_by(5)
}

/// Run the engine on the whole image at shrinking scales, then again after
/// each of two further sharpening passes. Stops at the first scale that
/// decodes anything.
///
/// Every size is resized from the current sharpening level's image, never
/// from an earlier shrunk copy. Within a sharpening level, shrinking stops
/// as soon as either dimension would fall below `minimum_pixels`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeStrategy {
    minimum_pixels: u32,
    unsharp_sigma: f32,
    unsharp_amount: f32,
    track_coordinates: bool,
}

impl ResizeStrategy {
    /// Prefix of every label this strategy reports
    pub const NAME: &'static str = "resize";
    /// Smallest side tried by default
    pub const DEFAULT_MINIMUM_PIXELS: i64 = 16;

    /// Fails if `minimum_pixels` is negative. Zero is treated as one, so an
    /// attempt is never made on an empty image.
    pub fn new(minimum_pixels: i64) -> Result<Self> {
        if minimum_pixels < 0 {
            return Err(GoudaError::Config(format!(
                "minimum_pixels must be >= 0, got {minimum_pixels}"
            )));
        }
        Ok(Self {
            minimum_pixels: u32::try_from(minimum_pixels.max(1)).unwrap_or(u32::MAX),
            unsharp_sigma: 10.0,
            unsharp_amount: 2.0,
            track_coordinates: false,
        })
    }

    /// Keep engine-reported rects, mapped back to the unscaled image.
    /// Off by default: barcodes come back without rects.
    pub fn with_track_coordinates(self, track_coordinates: bool) -> Self {
        Self {
            track_coordinates,
            ..self
        }
    }

    /// Effective minimum side, at least one.
    pub fn minimum_pixels(&self) -> u32 {
        self.minimum_pixels
    }

    fn finish(&self, barcodes: Vec<Barcode>, factor: f64) -> Result<Vec<Barcode>> {
        barcodes
            .into_iter()
            .map(|barcode| match barcode.rect {
                Some(rect) if self.track_coordinates => Ok(barcode.with_rect(rect.rescale(factor)?)),
                _ => Ok(barcode.without_rect()),
            })
            .collect()
    }
}

impl Default for ResizeStrategy {
    fn default() -> Self {
        Self {
            minimum_pixels: Self::DEFAULT_MINIMUM_PIXELS as u32,
            unsharp_sigma: 10.0,
            unsharp_amount: 2.0,
            track_coordinates: false,
        }
    }
}

impl Strategy for ResizeStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(name = "resize", skip_all, fields(engine = engine.name()))]
    fn attempt(&self, image: &DynamicImage, engine: &dyn Engine) -> Result<Option<StrategyResult>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let mut base: Cow<'_, DynamicImage> = Cow::Borrowed(image);
        for sharpening in SHARPENING_LEVELS {
            if sharpening > 0 {
                base = Cow::Owned(unsharp_mask(&base, self.unsharp_sigma, self.unsharp_amount));
            }
            for percent in scale_percentages() {
                let factor = f64::from(percent) / 100.0;
                let label = format!("resize: scaling factor [{factor:?}] sharpening [{sharpening}]");

                let found = if percent == 100 {
                    debug!("{label}");
                    engine.decode(&base)?
                } else {
                    let w = (f64::from(width) * factor).round() as u32;
                    let h = (f64::from(height) * factor).round() as u32;
                    if w < self.minimum_pixels || h < self.minimum_pixels {
                        debug!(w, h, minimum = self.minimum_pixels, "below minimum size");
                        break;
                    }
                    debug!("{label}");
                    engine.decode(&base.resize_exact(w, h, FilterType::Triangle))?
                };

                if !found.is_empty() {
                    let barcodes = self.finish(found, factor)?;
                    return Ok(StrategyResult::found(label, barcodes));
                }
            }
        }
        Ok(None)
    }
}
