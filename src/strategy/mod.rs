//! Decoding strategies
//!
//! A strategy is a complete method for getting barcodes out of one image
//! with one engine. It either finds something, returning a label that says
//! how, or returns `None`. Engine failures are errors, never `None`.

/// Whole-image shrink and sharpen search
pub mod resize;
/// Candidate regions from the detector
pub mod roi;

use image::DynamicImage;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::Result;
use crate::models::Barcode;

pub use resize::ResizeStrategy;
pub use roi::RoiStrategy;

/// What a successful strategy found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyResult {
    /// How the barcodes were found, e.g. `roi`
    pub strategy: String,
    /// Never empty
    pub barcodes: Vec<Barcode>,
}

impl StrategyResult {
    /// `None` when `barcodes` is empty.
    pub fn found(strategy: impl Into<String>, barcodes: Vec<Barcode>) -> Option<Self> {
        if barcodes.is_empty() {
            None
        } else {
            Some(Self {
                strategy: strategy.into(),
                barcodes,
            })
        }
    }
}

/// One method of decoding an image.
pub trait Strategy {
    /// Short name, e.g. `resize`
    fn name(&self) -> &str;

    /// Try to decode `image`. `Ok(None)` means nothing was found.
    fn attempt(&self, image: &DynamicImage, engine: &dyn Engine) -> Result<Option<StrategyResult>>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn attempt(&self, image: &DynamicImage, engine: &dyn Engine) -> Result<Option<StrategyResult>> {
        (**self).attempt(image, engine)
    }
}
