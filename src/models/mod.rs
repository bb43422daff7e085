/// Decoded barcode
pub mod barcode;
/// Sub-pixel point
pub mod point;
/// Axis-aligned rectangle
pub mod rect;

pub use barcode::Barcode;
pub use point::Point;
pub use rect::{Rect, RectCoordinates};
