//! Image processing kernels used by the detector and decoders
//!
//! - Grayscale conversion
//! - Contrast limited adaptive histogram equalization
//! - Unsharp masking and split contrast stretching
//! - Rectangular morphology

/// Contrast-limited adaptive histogram equalization
pub mod clahe;
/// Blur, unsharp masking and contrast splitting
pub mod enhance;
/// Luma conversion
pub mod grayscale;
/// Rectangular closing
pub mod morphology;
