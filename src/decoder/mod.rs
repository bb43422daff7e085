//! Per-candidate decoding
//!
//! Each candidate rect is cropped from the working image, sharpened and
//! handed to the engine. A crop that yields nothing gets one more attempt
//! after a split contrast stretch. Results are deduplicated by payload
//! across all candidates.

/// Crop enhancement settings
pub mod config;

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, imageops};
use tracing::{debug, instrument};

use crate::engine::Engine;
use crate::error::Result;
use crate::models::{Barcode, Rect};
use crate::utils::enhance::{split_contrast, unsharp_mask_gray};
use crate::utils::grayscale::to_gray;
pub use config::DecoderConfig;

/// Decodes barcodes from candidate regions of a working image.
#[derive(Debug, Clone, Default)]
pub struct RoiDecoder {
    config: DecoderConfig,
}

impl RoiDecoder {
    /// Decoder with the given crop enhancement settings.
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode every candidate in order, returning unique barcodes in
    /// first-seen order. Returned barcodes carry no rect.
    ///
    /// Engine failures propagate immediately.
    #[instrument(skip_all, fields(candidates = candidates.len(), engine = engine.name()))]
    pub fn decode(&self, working: &DynamicImage, candidates: &[Rect], engine: &dyn Engine) -> Result<Vec<Barcode>> {
        let owned;
        let gray: &GrayImage = match working {
            DynamicImage::ImageLuma8(gray) => gray,
            other => {
                debug!("convert grey");
                owned = to_gray(other);
                &owned
            }
        };

        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut barcodes = Vec::new();
        for (index, rect) in candidates.iter().enumerate() {
            let found = self.decode_rect(gray, rect, engine)?;
            debug!(index, rect = %rect, found = found.len(), "decoded candidate");
            for barcode in found {
                if seen.insert(barcode.data.clone()) {
                    barcodes.push(barcode.without_rect());
                } else {
                    debug!(value = %barcode.value(), "dropping duplicate");
                }
            }
        }
        Ok(barcodes)
    }

    fn decode_rect(&self, gray: &GrayImage, rect: &Rect, engine: &dyn Engine) -> Result<Vec<Barcode>> {
        let crop = imageops::crop_imm(gray, rect.x, rect.y, rect.width, rect.height).to_image();
        if crop.width() == 0 || crop.height() == 0 {
            debug!(rect = %rect, "skipping empty crop");
            return Ok(Vec::new());
        }

        let cfg = &self.config;
        let sharpened = unsharp_mask_gray(&crop, cfg.unsharp_sigma, cfg.unsharp_amount);
        let found = engine.decode(&DynamicImage::ImageLuma8(sharpened.clone()))?;
        if !found.is_empty() {
            return Ok(found);
        }

        debug!(rect = %rect, "enhancing contrast");
        let stretched = split_contrast(
            &sharpened,
            cfg.contrast_midpoint,
            cfg.bright_offset,
            cfg.dark_offset,
        );
        Ok(engine.decode(&DynamicImage::ImageLuma8(stretched))?)
    }
}
