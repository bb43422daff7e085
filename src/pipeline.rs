//! Strategy composition
//!
//! Strategies run in order against one image and engine. The first one to
//! find anything wins and its result is returned as is; results are never
//! merged across strategies.

use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::strategy::{ResizeStrategy, RoiStrategy, Strategy, StrategyResult};

/// An ordered list of strategies.
pub struct Pipeline {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Pipeline {
    /// Strategies are tried in the given order.
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Resize, then ROI.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut roi = RoiStrategy::new(config.detector, config.filter, config.decoder)?;
        if config.large_kernel {
            roi = roi.with_large_kernel()?;
        }
        Ok(Self::new(vec![
            Box::new(ResizeStrategy::new(config.minimum_pixels)?),
            Box::new(roi),
        ]))
    }

    /// Strategy names in the order they are tried.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Result of the first strategy that finds anything, or `None`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), engine = engine.name()))]
    pub fn decode(&self, image: &DynamicImage, engine: &dyn Engine) -> Result<Option<StrategyResult>> {
        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "trying");
            if let Some(result) = strategy.attempt(image, engine)? {
                info!(strategy = %result.strategy, found = result.barcodes.len(), "decoded");
                return Ok(Some(result));
            }
        }
        debug!("no barcode found");
        Ok(None)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ResizeStrategy::default()),
            Box::new(RoiStrategy::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, GoudaError};
    use crate::models::Barcode;
    use image::GrayImage;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Answers with a fixed value and logs its name into a shared journal.
    struct Fixed {
        name: &'static str,
        value: Option<&'static str>,
        journal: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn attempt(&self, _image: &DynamicImage, _engine: &dyn Engine) -> Result<Option<StrategyResult>> {
            self.journal.borrow_mut().push(self.name);
            match self.value {
                Some("error") => Err(GoudaError::Engine(EngineError::Unavailable("x".into()))),
                Some(v) => Ok(StrategyResult::found(
                    self.name,
                    vec![Barcode::new("QRCODE", v).unwrap()],
                )),
                None => Ok(None),
            }
        }
    }

    struct Silent;

    impl Engine for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn decode(&self, _image: &DynamicImage) -> std::result::Result<Vec<Barcode>, EngineError> {
            Ok(vec![])
        }
    }

    fn pipeline(values: &[(&'static str, Option<&'static str>)]) -> (Pipeline, Rc<RefCell<Vec<&'static str>>>) {
        let journal = Rc::new(RefCell::new(Vec::new()));
        let strategies = values
            .iter()
            .map(|&(name, value)| {
                Box::new(Fixed {
                    name,
                    value,
                    journal: Rc::clone(&journal),
                }) as Box<dyn Strategy>
            })
            .collect();
        (Pipeline::new(strategies), journal)
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::new(4, 4))
    }

    #[test]
    fn test_first_success_wins() {
        let (p, journal) = pipeline(&[("a", None), ("b", Some("B")), ("c", Some("C"))]);
        let result = p.decode(&image(), &Silent).unwrap().unwrap();
        assert_eq!(result.strategy, "b");
        assert_eq!(result.barcodes[0].data, b"B");
        assert_eq!(*journal.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_all_absent() {
        let (p, journal) = pipeline(&[("a", None), ("b", None)]);
        assert_eq!(p.decode(&image(), &Silent).unwrap(), None);
        assert_eq!(journal.borrow().len(), 2);
    }

    #[test]
    fn test_error_stops_composition() {
        let (p, journal) = pipeline(&[("a", Some("error")), ("b", Some("B"))]);
        assert!(p.decode(&image(), &Silent).is_err());
        assert_eq!(*journal.borrow(), vec!["a"]);
    }

    #[test]
    fn test_default_order() {
        assert_eq!(Pipeline::default().names(), vec!["resize", "roi"]);
        let p = Pipeline::from_config(&PipelineConfig::default()).unwrap();
        assert_eq!(p.names(), vec!["resize", "roi"]);
    }

    #[test]
    fn test_invalid_config() {
        let config = PipelineConfig {
            minimum_pixels: -1,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }
}
