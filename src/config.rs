//! Pipeline configuration with environment overrides.

use std::fmt::Display;
use std::str::FromStr;

use crate::decoder::DecoderConfig;
use crate::detector::{AreaFilter, DetectorConfig, StructuringElement};
use crate::error::{GoudaError, Result};
use crate::strategy::ResizeStrategy;

/// Working width for detection
pub const ENV_TARGET_WIDTH: &str = "GOUDA_TARGET_WIDTH";
/// Gradient threshold, `0..=255`
pub const ENV_THRESHOLD: &str = "GOUDA_THRESHOLD";
/// Smallest candidate area, 0 for no bound
pub const ENV_MIN_AREA: &str = "GOUDA_MIN_AREA";
/// Largest candidate area, 0 for no bound
pub const ENV_MAX_AREA: &str = "GOUDA_MAX_AREA";
/// Smallest side the resize search shrinks to
pub const ENV_MINIMUM_PIXELS: &str = "GOUDA_MINIMUM_PIXELS";
/// `small` or `large`
pub const ENV_KERNEL: &str = "GOUDA_KERNEL";

/// Everything needed to build the default strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Region detection
    pub detector: DetectorConfig,
    /// Candidate area bounds
    pub filter: AreaFilter,
    /// Crop enhancement
    pub decoder: DecoderConfig,
    /// Passed to [`ResizeStrategy::new`]
    pub minimum_pixels: i64,
    /// Run region detection a second time with the large kernel
    pub large_kernel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            filter: AreaFilter::default(),
            decoder: DecoderConfig::default(),
            minimum_pixels: ResizeStrategy::DEFAULT_MINIMUM_PIXELS,
            large_kernel: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with `GOUDA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unset names keep their
    /// default; values that fail to parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut detector = defaults.detector;
        detector.target_width = parse_var(&lookup, ENV_TARGET_WIDTH, detector.target_width)?;
        detector.threshold = parse_var(&lookup, ENV_THRESHOLD, detector.threshold)?;

        let large = match lookup(ENV_KERNEL).as_deref().map(str::trim) {
            None | Some("small") => false,
            Some("large") => true,
            Some(other) => {
                return Err(GoudaError::Config(format!(
                    "{ENV_KERNEL}: expected small or large, got [{other}]"
                )));
            }
        };
        if large {
            detector = detector.with_structuring_element(StructuringElement::LARGE);
        }
        detector.validate()?;

        let filter = AreaFilter::new(
            parse_var(&lookup, ENV_MIN_AREA, defaults.filter.min_area())?,
            parse_var(&lookup, ENV_MAX_AREA, defaults.filter.max_area())?,
        )?;

        Ok(Self {
            detector,
            filter,
            decoder: defaults.decoder,
            minimum_pixels: parse_var(&lookup, ENV_MINIMUM_PIXELS, defaults.minimum_pixels)?,
            large_kernel: defaults.large_kernel,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| GoudaError::Config(format!("{name}=[{value}]: {err}"))),
    }
}
