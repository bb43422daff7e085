//! gouda - find and decode barcodes anywhere in a photograph
//!
//! Decoding a barcode from a clean crop is left to an [`Engine`]. This crate
//! decides where to look and how to prepare the pixels:
//! - [`ResizeStrategy`] tries the whole image at shrinking scales and
//!   increasing sharpening.
//! - [`RoiStrategy`] detects dense, directional edge regions, filters them by
//!   area and decodes each crop, retrying once with more contrast.
//! - [`Pipeline`] runs strategies in order and keeps the first that finds
//!   anything.
//!
//! ```no_run
//! use gouda::{Pipeline, QrEngine, tools::read_image};
//!
//! let image = read_image("specimen.jpg", false)?;
//! if let Some(result) = Pipeline::default().decode(&image, &QrEngine::new())? {
//!     for barcode in &result.barcodes {
//!         println!("{} {}", barcode.symbology, barcode.value());
//!     }
//! }
//! # Ok::<(), gouda::GoudaError>(())
//! ```

#![warn(missing_docs)]

/// Pipeline configuration and environment overrides
pub mod config;
/// Candidate-region decoding
pub mod decoder;
/// Candidate-region detection
pub mod detector;
/// Decoding engines
pub mod engine;
/// Error types
pub mod error;
/// Core data structures (Rect, Barcode, Point)
pub mod models;
/// Strategy composition
pub mod pipeline;
/// Outcome reporters
pub mod report;
/// Decoding strategies
pub mod strategy;
/// Image loading and input traversal
pub mod tools;
/// Image processing kernels
pub mod utils;

pub use config::PipelineConfig;
pub use decoder::{DecoderConfig, RoiDecoder};
pub use detector::{AreaFilter, Detection, Detector, DetectorConfig, StructuringElement};
pub use engine::{CommandEngine, Engine, QrEngine, engine_by_name, engine_options};
pub use error::{EngineError, GoudaError, Result};
pub use models::{Barcode, Point, Rect, RectCoordinates};
pub use pipeline::Pipeline;
pub use strategy::{ResizeStrategy, RoiStrategy, Strategy, StrategyResult};
