// Per-page overlay: resized design + alpha mask with holes over protected regions

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::geometry::ProtectionBounds;

/// Everything needed to composite one page's overlay.
#[derive(Debug, Clone)]
pub struct OverlayPlan {
    /// The design at page size with `mask` already applied as its alpha.
    pub image: RgbaImage,
    pub mask: GrayImage,
    pub protected: Vec<ProtectionBounds>,
}

/// Scale an alpha sample by `opacity`, rounding half away from zero.
///
/// The product is snapped to six decimals first so that e.g. 255 * 0.7 lands
/// on 178.5 (and rounds to 179) instead of 178.49999999999997.
pub fn scale_alpha(value: u8, opacity: f64) -> u8 {
    let scaled = value as f64 * opacity;
    let snapped = (scaled * 1e6).round() / 1e6;
    snapped.round().clamp(0.0, 255.0) as u8
}

/// Build the overlay for a `page_width` x `page_height` page.
///
/// With protected regions the mask is `round(255 * opacity)` everywhere and 0
/// inside each rectangle; without any, the design's own alpha is scaled by
/// `opacity`. `opacity` is not clamped here.
pub fn build_overlay(
    design: &RgbaImage,
    page_width: u32,
    page_height: u32,
    protected: &[ProtectionBounds],
    opacity: f64,
) -> OverlayPlan {
    let mut image = imageops::resize(design, page_width, page_height, FilterType::Lanczos3);

    let mask = if protected.is_empty() {
        GrayImage::from_fn(page_width, page_height, |x, y| {
            Luma([scale_alpha(image.get_pixel(x, y).0[3], opacity)])
        })
    } else {
        let mut mask = GrayImage::from_pixel(page_width, page_height, Luma([scale_alpha(255, opacity)]));
        for bounds in protected.iter().filter(|b| !b.is_empty()) {
            let rect = Rect::at(bounds.x1 as i32, bounds.y1 as i32).of_size(bounds.width(), bounds.height());
            draw_filled_rect_mut(&mut mask, rect, Luma([0]));
        }
        mask
    };

    for (pixel, alpha) in image.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = alpha.0[0];
    }

    OverlayPlan {
        image,
        mask,
        protected: protected.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_design(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| Rgba([200, 40, 90, (x * 255 / (width - 1)) as u8]))
    }

    #[test]
    fn test_scale_alpha_rounds_half_up() {
        assert_eq!(scale_alpha(255, 0.7), 179);
        assert_eq!(scale_alpha(255, 1.0), 255);
        assert_eq!(scale_alpha(255, 0.0), 0);
        assert_eq!(scale_alpha(100, 0.5), 50);
        assert_eq!(scale_alpha(3, 0.5), 2);
    }

    #[test]
    fn test_mask_holes_over_protected_regions() {
        let design = RgbaImage::from_pixel(50, 50, Rgba([10, 20, 30, 255]));
        let bounds = ProtectionBounds { x1: 10, y1: 5, x2: 20, y2: 15 };
        let plan = build_overlay(&design, 100, 80, &[bounds], 0.7);

        assert_eq!(plan.image.dimensions(), (100, 80));
        for (x, y, px) in plan.mask.enumerate_pixels() {
            let expected = if bounds.contains(x, y) { 0 } else { 179 };
            assert_eq!(px.0[0], expected, "mask at ({x}, {y})");
            assert_eq!(plan.image.get_pixel(x, y).0[3], expected);
        }
        assert_eq!(plan.protected, vec![bounds]);
    }

    #[test]
    fn test_empty_bounds_are_ignored() {
        let design = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let empty = ProtectionBounds { x1: 5, y1: 5, x2: 5, y2: 9 };
        let plan = build_overlay(&design, 10, 10, &[empty], 0.5);
        assert!(plan.mask.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn test_no_regions_scales_design_alpha() {
        let design = gradient_design(64, 32);
        let plan = build_overlay(&design, 64, 32, &[], 0.4);
        // same size: Lanczos3 leaves samples untouched
        for (x, y, px) in plan.image.enumerate_pixels() {
            let original = design.get_pixel(x, y).0[3];
            assert_eq!(px.0[3], scale_alpha(original, 0.4), "alpha at ({x}, {y})");
        }
    }

    #[test]
    fn test_full_opacity_keeps_design_alpha() {
        let design = gradient_design(40, 20);
        let plan = build_overlay(&design, 40, 20, &[], 1.0);
        for (x, y, px) in plan.image.enumerate_pixels() {
            assert_eq!(px.0[3], design.get_pixel(x, y).0[3]);
        }
    }

    #[test]
    fn test_design_is_resized_to_page() {
        let design = RgbaImage::from_pixel(300, 200, Rgba([1, 2, 3, 255]));
        let plan = build_overlay(&design, 612, 792, &[], 0.7);
        assert_eq!(plan.image.dimensions(), (612, 792));
        assert_eq!(plan.mask.dimensions(), (612, 792));
    }
}
