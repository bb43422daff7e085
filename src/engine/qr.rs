use image::DynamicImage;
use rqrr::PreparedImage;
use tracing::debug;

use super::Engine;
use crate::error::EngineError;
use crate::models::{Barcode, Rect};
use crate::utils::grayscale::to_gray;

/// QR codes, decoded in-process with `rqrr`.
///
/// Each decoded symbol carries the bounding box of its grid corners.
/// Grids that are located but fail to decode are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEngine;

impl QrEngine {
    /// Symbology of every barcode this engine returns
    pub const SYMBOLOGY: &'static str = "QRCODE";

    /// The engine has no state.
    pub fn new() -> Self {
        Self
    }
}

impl Engine for QrEngine {
    fn name(&self) -> &str {
        "qrcode"
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError> {
        let gray = to_gray(image);
        let (width, height) = (gray.width() as usize, gray.height() as usize);
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            gray.get_pixel(x as u32, y as u32)[0]
        });

        let mut barcodes = Vec::new();
        for grid in prepared.detect_grids() {
            let content = match grid.decode() {
                Ok((_, content)) => content,
                Err(err) => {
                    debug!(error = ?err, "qr grid located but not decoded");
                    continue;
                }
            };
            if content.is_empty() {
                continue;
            }

            let barcode = Barcode::new(Self::SYMBOLOGY, content.into_bytes()).map_err(|err| {
                EngineError::Failed {
                    engine: self.name().to_string(),
                    message: err.to_string(),
                }
            })?;
            let xs = grid.bounds.iter().map(|p| p.x.max(0) as u32);
            let ys = grid.bounds.iter().map(|p| p.y.max(0) as u32);
            let (x0, x1) = (xs.clone().min().unwrap_or(0), xs.max().unwrap_or(0));
            let (y0, y1) = (ys.clone().min().unwrap_or(0), ys.max().unwrap_or(0));
            barcodes.push(barcode.with_rect(Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)));
        }
        Ok(barcodes)
    }
}
