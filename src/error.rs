use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a decoding engine.
///
/// An engine returning zero barcodes is not an error; these variants are for
/// engines that could not run or reported a failure of their own.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The named engine is not installed
    #[error("{0} unavailable")]
    Unavailable(String),

    /// The engine ran and reported a failure
    #[error("{engine} error [{message}]")]
    Failed {
        /// Engine name
        engine: String,
        /// What the engine reported
        message: String,
    },

    /// Spawning the engine or exchanging files failed
    #[error("engine IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The image could not be prepared for the engine
    #[error("engine image error: {0}")]
    Image(#[from] image::ImageError),
}

/// The main error type for gouda operations.
#[derive(Debug, Error)]
pub enum GoudaError {
    /// Negative or overflowing rectangle geometry
    #[error("Bad rectangle: {0}")]
    InvalidRect(String),

    /// A setting outside its valid range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Empty symbology or payload
    #[error("Invalid barcode: {0}")]
    InvalidBarcode(String),

    /// An engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An input image could not be opened or decoded
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: image::ImageError,
    },

    /// A diagnostic image could not be written
    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        /// File that was written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: image::ImageError,
    },

    /// Filesystem or stream failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GoudaError>;
