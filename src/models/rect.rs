use std::fmt;

use serde::Serialize;

use super::Point;
use crate::error::{GoudaError, Result};

/// Corner coordinates of a [`Rect`]: top-left `(x0, y0)` and the exclusive
/// bottom-right `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RectCoordinates {
    /// Left edge
    pub x0: u32,
    /// Top edge
    pub y0: u32,
    /// Right edge (`x + width`)
    pub x1: u32,
    /// Bottom edge (`y + height`)
    pub y1: u32,
}

/// Immutable axis-aligned rectangle in pixel units.
///
/// A rect is always relative to one specific image buffer. Rects produced by
/// the detector live in its resized working image, not in the caller's
/// original; see [`crate::detector::Detection::to_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a rect from unsigned fields.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect from signed fields, failing if any is negative or does
    /// not fit in a `u32`.
    pub fn from_signed(x: i64, y: i64, width: i64, height: i64) -> Result<Self> {
        let field = |name: &str, v: i64| {
            u32::try_from(v).map_err(|_| GoudaError::InvalidRect(format!("{name}={v}")))
        };
        Ok(Self {
            x: field("x", x)?,
            y: field("y", y)?,
            width: field("width", width)?,
            height: field("height", height)?,
        })
    }

    /// `width * height`
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `(x, y, x + width, y + height)`
    pub fn coordinates(&self) -> RectCoordinates {
        RectCoordinates {
            x0: self.x,
            y0: self.y,
            x1: self.x.saturating_add(self.width),
            y1: self.y.saturating_add(self.height),
        }
    }

    /// `(x + width / 2, y + height / 2)`
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Map a rect measured in an image scaled by `factor` back to the
    /// unscaled frame. Each field is divided by `factor` and truncated.
    pub fn rescale(&self, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(GoudaError::Config(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        let map = |v: u32| (f64::from(v) / factor) as i64;
        Self::from_signed(map(self.x), map(self.y), map(self.width), map(self.height))
    }
}

impl TryFrom<[i64; 4]> for Rect {
    type Error = GoudaError;

    fn try_from([x, y, width, height]: [i64; 4]) -> Result<Self> {
        Self::from_signed(x, y, width, height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {} (Area {})",
            self.x,
            self.y,
            self.width,
            self.height,
            self.area()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_and_coordinates() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.area(), 1200);
        assert_eq!(
            r.coordinates(),
            RectCoordinates {
                x0: 10,
                y0: 20,
                x1: 40,
                y1: 60
            }
        );
    }

    #[test]
    fn test_center() {
        let r = Rect::new(0, 0, 5, 4);
        assert_eq!(r.center(), Point::new(2.5, 2.0));
    }

    #[test]
    fn test_zero_sized_rect_is_valid() {
        let r = Rect::from_signed(0, 0, 0, 0).unwrap();
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_negative_fields_rejected() {
        assert!(Rect::from_signed(-1, 0, 1, 1).is_err());
        assert!(Rect::from_signed(0, -1, 1, 1).is_err());
        assert!(Rect::from_signed(0, 0, -1, 1).is_err());
        assert!(Rect::from_signed(0, 0, 1, -1).is_err());
        assert!(Rect::try_from([0, 0, 1, -5]).is_err());
        assert!(matches!(
            Rect::try_from([-3, 0, 1, 1]),
            Err(GoudaError::InvalidRect(_))
        ));
    }

    #[test]
    fn test_rescale_truncates() {
        let r = Rect::new(10, 21, 99, 7);
        let scaled = r.rescale(0.5).unwrap();
        assert_eq!(scaled, Rect::new(20, 42, 198, 14));

        let shrunk = Rect::new(10, 10, 10, 10).rescale(3.0).unwrap();
        assert_eq!(shrunk, Rect::new(3, 3, 3, 3));
        assert!(r.rescale(0.0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Rect::new(1, 2, 3, 4).to_string(), "1, 2, 3, 4 (Area 12)");
    }
}
