use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};

use crate::models::Rect;

/// External contour extraction on binary masks.
pub struct ContourDetector;

impl ContourDetector {
    /// Bounding rectangles of the external contours of a binary mask.
    ///
    /// Any non-zero pixel is foreground. Only outermost borders are kept:
    /// holes, and blobs nested inside holes, are dropped. Rects come back
    /// in the order the border follower discovered them.
    pub fn external_bounds(mask: &GrayImage) -> Vec<Rect> {
        find_contours::<u32>(mask)
            .iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .filter_map(bounding_rect)
            .collect()
    }
}

/// Inclusive bounding box of a contour's points as a rect.
fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}
