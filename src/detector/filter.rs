use tracing::debug;

use crate::error::{GoudaError, Result};
use crate::models::Rect;

/// Filters candidate rects by area, inclusive at both ends.
///
/// A bound of zero is disabled and constrains nothing on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaFilter {
    min_area: u64,
    max_area: u64,
}

impl AreaFilter {
    /// Smallest plausible barcode area at the detector's working width.
    pub const DEFAULT_MIN_AREA: u64 = 5_000;
    /// Largest plausible barcode area at the detector's working width.
    pub const DEFAULT_MAX_AREA: u64 = 500_000;

    /// Fails if both bounds are enabled and `min_area >= max_area`.
    pub fn new(min_area: u64, max_area: u64) -> Result<Self> {
        if min_area != 0 && max_area != 0 && min_area >= max_area {
            return Err(GoudaError::Config(format!(
                "Inside-out limits [{min_area}] [{max_area}]"
            )));
        }
        Ok(Self { min_area, max_area })
    }

    /// Filter that passes everything.
    pub fn unbounded() -> Self {
        Self {
            min_area: 0,
            max_area: 0,
        }
    }

    /// Lower bound, 0 when unbounded.
    pub fn min_area(&self) -> u64 {
        self.min_area
    }

    /// Upper bound, 0 when unbounded.
    pub fn max_area(&self) -> u64 {
        self.max_area
    }

    /// True if `rect` lies within the configured bounds.
    pub fn accepts(&self, rect: &Rect) -> bool {
        let area = rect.area();
        (self.min_area == 0 || area >= self.min_area) && (self.max_area == 0 || area <= self.max_area)
    }

    /// The order-preserving subsequence of `rects` that is within bounds.
    pub fn filter(&self, rects: &[Rect]) -> Vec<Rect> {
        debug!(count = rects.len(), "rectangles before filtering by area");
        for (index, r) in rects.iter().enumerate() {
            debug!(index, rect = %r);
        }

        let kept: Vec<Rect> = rects.iter().copied().filter(|r| self.accepts(r)).collect();

        debug!(count = kept.len(), "rectangles after filtering by area");
        for (index, r) in kept.iter().enumerate() {
            debug!(index, rect = %r);
        }
        kept
    }
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            min_area: Self::DEFAULT_MIN_AREA,
            max_area: Self::DEFAULT_MAX_AREA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects() -> Vec<Rect> {
        vec![
            Rect::new(0, 0, 10, 10),   // 100
            Rect::new(5, 5, 100, 50),  // 5000
            Rect::new(1, 1, 10, 1),    // 10
            Rect::new(9, 9, 100, 100), // 10000
            Rect::new(2, 2, 0, 40),    // 0
        ]
    }

    #[test]
    fn test_inside_out_limits_rejected() {
        assert!(AreaFilter::new(10, 10).is_err());
        assert!(AreaFilter::new(11, 10).is_err());
        assert!(AreaFilter::new(10, 11).is_ok());
    }

    #[test]
    fn test_disabled_bound_skips_ordering_check() {
        assert!(AreaFilter::new(100, 0).is_ok());
        assert!(AreaFilter::new(0, 100).is_ok());
        assert!(AreaFilter::new(0, 0).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive_and_order_preserved() {
        let filter = AreaFilter::new(100, 5000).unwrap();
        assert_eq!(
            filter.filter(&rects()),
            vec![Rect::new(0, 0, 10, 10), Rect::new(5, 5, 100, 50)]
        );
    }

    #[test]
    fn test_min_only() {
        let filter = AreaFilter::new(5000, 0).unwrap();
        assert_eq!(
            filter.filter(&rects()),
            vec![Rect::new(5, 5, 100, 50), Rect::new(9, 9, 100, 100)]
        );
    }

    #[test]
    fn test_max_only() {
        let filter = AreaFilter::new(0, 100).unwrap();
        assert_eq!(
            filter.filter(&rects()),
            vec![
                Rect::new(0, 0, 10, 10),
                Rect::new(1, 1, 10, 1),
                Rect::new(2, 2, 0, 40)
            ]
        );
    }

    #[test]
    fn test_unbounded_returns_input() {
        assert_eq!(AreaFilter::unbounded().filter(&rects()), rects());
        assert_eq!(AreaFilter::new(0, 0).unwrap().filter(&rects()), rects());
    }

    #[test]
    fn test_defaults() {
        let filter = AreaFilter::default();
        assert_eq!(filter.min_area(), 5_000);
        assert_eq!(filter.max_area(), 500_000);
    }
}
