//! Decoding engines
//!
//! An engine turns a pixel buffer that the pipeline has already cropped,
//! resized or enhanced into zero or more barcodes. The pipeline treats it as
//! an opaque black box: it must not depend on the frame the buffer came from,
//! and "nothing found" is `Ok(vec![])`, never an error.

/// External command-line decoders
pub mod command;
/// Built-in QR decoding via rqrr
pub mod qr;

use image::DynamicImage;

use crate::error::EngineError;
use crate::models::Barcode;

pub use command::CommandEngine;
pub use qr::QrEngine;

/// A barcode decoding capability.
///
/// Implementations may hold their own state (a licence key, a path to a
/// binary). One instance is used by one pipeline invocation at a time.
pub trait Engine {
    /// Short name used in reports
    fn name(&self) -> &str;

    /// Decode every barcode found in `image`. Reported rects, if any, are
    /// relative to `image`.
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError> {
        (**self).decode(image)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, EngineError> {
        (**self).decode(image)
    }
}

/// Constructor for a named engine.
pub type EngineFactory = fn() -> Result<Box<dyn Engine>, EngineError>;

fn qrcode_engine() -> Result<Box<dyn Engine>, EngineError> {
    Ok(Box::new(QrEngine::new()))
}

fn zbar_engine() -> Result<Box<dyn Engine>, EngineError> {
    Ok(Box::new(CommandEngine::zbar().ensure_available()?))
}

fn libdmtx_engine() -> Result<Box<dyn Engine>, EngineError> {
    Ok(Box::new(CommandEngine::dmtx().ensure_available()?))
}

/// Engines that can be constructed on this machine, by name.
pub fn engine_options() -> Vec<(&'static str, EngineFactory)> {
    let mut options: Vec<(&'static str, EngineFactory)> =
        vec![("qrcode", qrcode_engine as EngineFactory)];
    if CommandEngine::zbar().available() {
        options.push(("zbar", zbar_engine as EngineFactory));
    }
    if CommandEngine::dmtx().available() {
        options.push(("libdmtx", libdmtx_engine as EngineFactory));
    }
    options
}

/// Construct the engine registered as `name`.
pub fn engine_by_name(name: &str) -> Result<Box<dyn Engine>, EngineError> {
    engine_options()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, factory)| factory())
        .unwrap_or_else(|| Err(EngineError::Unavailable(name.to_string())))
}
