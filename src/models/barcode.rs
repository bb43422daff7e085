use std::borrow::Cow;

use serde::Serialize;

use super::Rect;
use crate::error::{GoudaError, Result};

/// A decoded barcode.
///
/// Engines produce barcodes with `rect == None` unless they report
/// coordinates for the buffer they were handed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Barcode {
    /// Symbology as named by the engine (e.g. `CODE128`, `Data Matrix`)
    #[serde(rename = "type")]
    pub symbology: String,
    /// Decoded payload bytes
    pub data: Vec<u8>,
    /// Location, when the engine reports one
    pub rect: Option<Rect>,
}

impl Barcode {
    /// Create a barcode without coordinates. Both `symbology` and `data` must
    /// be non-empty.
    pub fn new(symbology: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<Self> {
        let symbology = symbology.into();
        let data = data.into();
        if symbology.is_empty() {
            return Err(GoudaError::InvalidBarcode("empty type".to_string()));
        }
        if data.is_empty() {
            return Err(GoudaError::InvalidBarcode(format!(
                "empty data for {symbology}"
            )));
        }
        Ok(Self {
            symbology,
            data,
            rect: None,
        })
    }

    /// Attach a location.
    pub fn with_rect(self, rect: Rect) -> Self {
        Self {
            rect: Some(rect),
            ..self
        }
    }

    /// Drop any location.
    pub fn without_rect(self) -> Self {
        Self { rect: None, ..self }
    }

    /// Payload as text, replacing invalid UTF-8 sequences.
    pub fn value(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
