// overlayモード: 各ページにデザインを重ね、QR領域だけ穴を空けて残す

use image::RgbaImage;
use lopdf::Document;

use crate::compose::build_overlay;
use crate::config::merged::MergedConfig;
use crate::geometry::{ProtectionBounds, protection_bounds};
use crate::pdf::writer::{ImageRect, Layer, add_rgba_image, insert_image};
use crate::pipeline::page_scan::ScannedPage;

/// Composite the overlay onto every scanned page of `doc` in place.
///
/// Returns the number of protected regions.
pub fn apply_overlays(
    doc: &mut Document,
    pages: &[ScannedPage],
    design: &RgbaImage,
    params: &MergedConfig,
) -> crate::error::Result<usize> {
    let page_ids = doc.get_pages();
    let mut protected_total = 0;

    for page in pages {
        let (page_w, page_h) = page.page_size();
        let protected: Vec<ProtectionBounds> = page
            .regions
            .iter()
            .map(|r| protection_bounds(r, params.padding, page_w, page_h))
            .collect();
        protected_total += protected.len();

        let plan = build_overlay(design, page_w, page_h, &protected, params.opacity);
        let Some(&page_id) = page_ids.get(&page.page_num) else {
            continue;
        };
        let image_id = add_rgba_image(doc, &plan.image)?;
        // 端数のあるMediaBoxでも画像はページ全体に引き伸ばす
        let rect = ImageRect::covering(&page.page_box);
        insert_image(doc, page_id, &page.page_box, rect, image_id, Layer::Foreground)?;

        tracing::info!(
            page = page.page_num,
            protected = plan.protected.len(),
            "overlay applied"
        );
    }

    Ok(protected_total)
}
