// Region geometry: zoomed raster space <-> page space, complete boxes, protection bounds
//
// Raster space is the pixel grid of a page rendered at `zoom`; page space is
// the page's own unit grid (PDF points, top-left origin). Every conversion
// truncates to whole units.

use image::RgbaImage;
use serde::Serialize;

/// A QR region as reported by the detector, in zoomed raster pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Decoded text, empty when the region came from a non-decoding method.
    pub payload: String,
}

/// A QR region in page coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "data")]
    pub payload: String,
}

/// A QR region grown to also cover its text label, in page coordinates.
#[derive(Debug, Clone)]
pub struct CompleteBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub payload: String,
    /// Pixel image of the box, filled in once the box is cut out of a raster.
    pub fragment: Option<RgbaImage>,
}

/// Padded rectangle that must stay visible, as `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionBounds {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl ProtectionBounds {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x1..self.x2).contains(&x) && (self.y1..self.y2).contains(&y)
    }
}

/// Maps a raster-space region into page space by dividing by `zoom`.
pub fn to_page_space(region: &DetectedRegion, zoom: f64) -> PageRegion {
    let scale = |v: u32| (v as f64 / zoom) as u32;
    PageRegion {
        x: scale(region.x),
        y: scale(region.y),
        width: scale(region.width),
        height: scale(region.height),
        payload: region.payload.clone(),
    }
}

/// Inverse of [`to_page_space`] for a page-space rectangle.
///
/// Returns `(x, y, width, height)` in raster pixels.
pub fn to_raster_space(x: u32, y: u32, width: u32, height: u32, zoom: f64) -> (u32, u32, u32, u32) {
    let scale = |v: u32| (v as f64 * zoom) as u32;
    (scale(x), scale(y), scale(width), scale(height))
}

/// Grows a QR region upward by `text_height` (the label sits above the code),
/// sideways by `side_padding` and downward by `bottom_padding`, clamped to the page.
pub fn expand_to_complete_box(
    region: &PageRegion,
    page_width: u32,
    page_height: u32,
    text_height: u32,
    side_padding: u32,
    bottom_padding: u32,
) -> CompleteBox {
    let (page_w, page_h) = (page_width as i64, page_height as i64);

    let box_x = (region.x as i64 - side_padding as i64).clamp(0, page_w);
    let box_y = (region.y as i64 - text_height as i64).clamp(0, page_h);
    let box_width = (region.width as i64 + 2 * side_padding as i64)
        .min(page_w - box_x)
        .max(0);
    let box_height = (region.height as i64 + text_height as i64 + bottom_padding as i64)
        .min(page_h - box_y)
        .max(0);

    tracing::debug!(
        qr_x = region.x,
        qr_y = region.y,
        box_x,
        box_y,
        box_width,
        box_height,
        "expanded QR region to complete box"
    );

    CompleteBox {
        x: box_x as u32,
        y: box_y as u32,
        width: box_width as u32,
        height: box_height as u32,
        payload: region.payload.clone(),
        fragment: None,
    }
}

/// Pads a QR region by `padding` on all four sides, clamped to the page.
pub fn protection_bounds(
    region: &PageRegion,
    padding: u32,
    page_width: u32,
    page_height: u32,
) -> ProtectionBounds {
    let pad = padding as i64;
    let (page_w, page_h) = (page_width as i64, page_height as i64);

    let x1 = (region.x as i64 - pad).clamp(0, page_w);
    let y1 = (region.y as i64 - pad).clamp(0, page_h);
    let x2 = (region.x as i64 + region.width as i64 + pad).clamp(x1, page_w);
    let y2 = (region.y as i64 + region.height as i64 + pad).clamp(y1, page_h);

    ProtectionBounds {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(x: u32, y: u32, w: u32, h: u32) -> DetectedRegion {
        DetectedRegion {
            x,
            y,
            width: w,
            height: h,
            payload: "T-1".to_string(),
        }
    }

    fn page_region(x: u32, y: u32, w: u32, h: u32) -> PageRegion {
        PageRegion {
            x,
            y,
            width: w,
            height: h,
            payload: String::new(),
        }
    }

    #[test]
    fn test_to_page_space_divides_by_zoom() {
        let region = to_page_space(&detected(100, 100, 50, 50), 2.0);
        assert_eq!(region, PageRegion {
            x: 50,
            y: 50,
            width: 25,
            height: 25,
            payload: "T-1".to_string(),
        });
    }

    #[test]
    fn test_to_page_space_truncates() {
        let region = to_page_space(&detected(101, 99, 51, 3), 2.0);
        assert_eq!((region.x, region.y, region.width, region.height), (50, 49, 25, 1));
    }

    #[test]
    fn test_round_trip_within_truncation_tolerance() {
        for zoom in [0.5, 1.0, 1.5, 2.0, 3.0, 4.17] {
            for v in [0u32, 1, 7, 99, 100, 513, 2048] {
                let original = detected(v, v + 3, v + 10, v + 1);
                let page = to_page_space(&original, zoom);
                let (x, y, w, h) = to_raster_space(page.x, page.y, page.width, page.height, zoom);
                // one page unit is `zoom` raster pixels, plus one for the second truncation
                let tolerance = zoom.ceil() as u32 + 1;
                for (back, orig) in [(x, original.x), (y, original.y), (w, original.width), (h, original.height)] {
                    assert!(back <= orig, "zoom {zoom}: {back} > {orig}");
                    assert!(orig - back <= tolerance, "zoom {zoom}: {orig} - {back} > {tolerance}");
                }
            }
        }
    }

    #[test]
    fn test_expand_interior_region() {
        let b = expand_to_complete_box(&page_region(100, 200, 60, 60), 600, 800, 80, 20, 10);
        assert_eq!((b.x, b.y, b.width, b.height), (80, 120, 100, 150));
        assert!(b.fragment.is_none());
    }

    #[test]
    fn test_expand_clamps_at_top_left() {
        let b = expand_to_complete_box(&page_region(5, 30, 60, 60), 600, 800, 80, 20, 10);
        assert_eq!((b.x, b.y), (0, 0));
        assert_eq!(b.width, 100);
        assert_eq!(b.height, 150);
    }

    #[test]
    fn test_expand_clamps_at_bottom_right() {
        let b = expand_to_complete_box(&page_region(560, 760, 40, 40), 600, 800, 80, 20, 10);
        assert_eq!(b.x, 540);
        assert_eq!(b.y, 680);
        assert_eq!(b.x + b.width, 600);
        assert_eq!(b.y + b.height, 800);
    }

    #[test]
    fn test_expand_region_outside_page_is_empty() {
        let b = expand_to_complete_box(&page_region(900, 900, 40, 40), 600, 800, 80, 20, 10);
        assert!(b.x <= 600 && b.y <= 800);
        assert_eq!(b.width, 0);
        assert_eq!(b.height, 0);
    }

    #[test]
    fn test_boxes_stay_inside_page() {
        let (page_w, page_h) = (300u32, 200u32);
        for x in (0..400).step_by(37) {
            for y in (0..300).step_by(29) {
                for size in [0u32, 1, 25, 180, 500] {
                    let region = page_region(x, y, size, size);

                    let b = expand_to_complete_box(&region, page_w, page_h, 80, 20, 10);
                    assert!(b.x + b.width <= page_w);
                    assert!(b.y + b.height <= page_h);

                    let p = protection_bounds(&region, 15, page_w, page_h);
                    assert!(p.x1 <= p.x2 && p.x2 <= page_w);
                    assert!(p.y1 <= p.y2 && p.y2 <= page_h);
                }
            }
        }
    }

    #[test]
    fn test_protection_bounds_symmetric_padding() {
        let p = protection_bounds(&page_region(50, 50, 25, 25), 15, 600, 800);
        assert_eq!(p, ProtectionBounds { x1: 35, y1: 35, x2: 90, y2: 90 });
        assert_eq!((p.width(), p.height()), (55, 55));
        assert!(p.contains(35, 89));
        assert!(!p.contains(90, 50));
    }

    #[test]
    fn test_protection_bounds_clamped() {
        let p = protection_bounds(&page_region(5, 590, 20, 20), 15, 600, 600);
        assert_eq!(p, ProtectionBounds { x1: 0, y1: 575, x2: 40, y2: 600 });
    }
}
