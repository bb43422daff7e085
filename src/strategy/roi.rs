use std::collections::HashSet;

use image::DynamicImage;
use tracing::{debug, instrument};

use super::{Strategy, StrategyResult};
use crate::decoder::{DecoderConfig, RoiDecoder};
use crate::detector::{AreaFilter, Detector, DetectorConfig, StructuringElement};
use crate::engine::Engine;
use crate::error::Result;

/// Detect candidate regions, filter them by area and decode each one.
///
/// Normally runs a single detector with the small closing kernel. A second
/// detector with the large kernel can be added; its results are merged and
/// deduplicated with the first.
#[derive(Debug, Clone)]
pub struct RoiStrategy {
    detectors: Vec<Detector>,
    filter: AreaFilter,
    decoder: RoiDecoder,
}

impl RoiStrategy {
    /// Label of every result
    pub const NAME: &'static str = "roi";

    /// One detector, an area filter and a crop decoder. Fails on an
    /// invalid detector configuration.
    pub fn new(detector: DetectorConfig, filter: AreaFilter, decoder: DecoderConfig) -> Result<Self> {
        Ok(Self {
            detectors: vec![Detector::new(detector)?],
            filter,
            decoder: RoiDecoder::new(decoder),
        })
    }

    /// Also detect with the large structuring element.
    pub fn with_large_kernel(mut self) -> Result<Self> {
        let base = self
            .detectors
            .first()
            .map(|d| *d.config())
            .unwrap_or_default();
        let large = base.with_structuring_element(StructuringElement::LARGE);
        if !self.detectors.iter().any(|d| *d.config() == large) {
            self.detectors.push(Detector::new(large)?);
        }
        Ok(self)
    }

    /// Detectors in the order they run.
    pub fn detectors(&self) -> &[Detector] {
        &self.detectors
    }

    /// Candidate area bounds.
    pub fn filter(&self) -> &AreaFilter {
        &self.filter
    }
}

impl Default for RoiStrategy {
    fn default() -> Self {
        Self {
            detectors: vec![Detector::default()],
            filter: AreaFilter::default(),
            decoder: RoiDecoder::default(),
        }
    }
}

impl Strategy for RoiStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(name = "roi", skip_all, fields(engine = engine.name()))]
    fn attempt(&self, image: &DynamicImage, engine: &dyn Engine) -> Result<Option<StrategyResult>> {
        let mut seen = HashSet::new();
        let mut barcodes = Vec::new();
        for detector in &self.detectors {
            let detection = detector.detect(image);
            let candidates = self.filter.filter(&detection.candidates);
            for barcode in self.decoder.decode(&detection.working, &candidates, engine)? {
                if seen.insert(barcode.data.clone()) {
                    barcodes.push(barcode);
                }
            }
        }
        debug!(found = barcodes.len());
        Ok(StrategyResult::found(Self::NAME, barcodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::Barcode;
    use image::{GrayImage, Luma};
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
        value: Option<&'static str>,
    }

    impl Engine for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn decode(&self, _image: &DynamicImage) -> std::result::Result<Vec<Barcode>, EngineError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .value
                .map(|v| vec![Barcode::new("CODE-128", v).unwrap()])
                .unwrap_or_default())
        }
    }

    fn bars() -> DynamicImage {
        let mut img = GrayImage::from_pixel(2048, 400, Luma([255]));
        for i in 0..30 {
            for y in 100..250 {
                img.put_pixel(500 + i * 4, y, Luma([0]));
                img.put_pixel(501 + i * 4, y, Luma([0]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_blank_image_never_calls_engine() {
        let engine = Counting {
            calls: Cell::new(0),
            value: Some("x"),
        };
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(2048, 300, Luma([255])));
        assert_eq!(RoiStrategy::default().attempt(&img, &engine).unwrap(), None);
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn test_labelled_roi() {
        let engine = Counting {
            calls: Cell::new(0),
            value: Some("Stegosaurus"),
        };
        let result = RoiStrategy::default().attempt(&bars(), &engine).unwrap().unwrap();
        assert_eq!(result.strategy, "roi");
        assert_eq!(result.barcodes.len(), 1);
        assert_eq!(result.barcodes[0].rect, None);
    }

    #[test]
    fn test_nothing_decoded_is_none() {
        let engine = Counting {
            calls: Cell::new(0),
            value: None,
        };
        assert_eq!(RoiStrategy::default().attempt(&bars(), &engine).unwrap(), None);
        // one candidate, decoded then retried with more contrast
        assert!(engine.calls.get() >= 2);
    }

    #[test]
    fn test_large_kernel_merges_without_duplicates() {
        let strategy = RoiStrategy::default().with_large_kernel().unwrap();
        assert_eq!(strategy.detectors().len(), 2);
        let strategy = strategy.with_large_kernel().unwrap();
        assert_eq!(strategy.detectors().len(), 2);

        let engine = Counting {
            calls: Cell::new(0),
            value: Some("x"),
        };
        let result = strategy.attempt(&bars(), &engine).unwrap().unwrap();
        assert_eq!(result.barcodes.len(), 1);
    }
}
