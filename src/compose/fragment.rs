// Ticket fragments: complete boxes cut out of the zoomed page raster

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::geometry::{CompleteBox, to_raster_space};

/// One extracted ticket, ready to be placed.
#[derive(Debug, Clone)]
pub struct TicketFragment {
    pub image: RgbaImage,
    /// Sequence number stamped into the label band, if numbering is on.
    pub number: Option<i64>,
    pub payload: String,
}

/// Crop `complete_box` (page space) out of a raster rendered at `zoom`.
///
/// The crop keeps raster resolution, so at zoom 2 the image is twice the
/// box size in pixels. Returns `None` when nothing of the box lies inside
/// the raster.
pub fn extract_fragment(raster: &RgbaImage, complete_box: &CompleteBox, zoom: f64) -> Option<RgbaImage> {
    let (x, y, w, h) = to_raster_space(
        complete_box.x,
        complete_box.y,
        complete_box.width,
        complete_box.height,
        zoom,
    );
    let (raster_w, raster_h) = raster.dimensions();
    if x >= raster_w || y >= raster_h {
        return None;
    }
    let w = w.min(raster_w - x);
    let h = h.min(raster_h - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(imageops::crop_imm(raster, x, y, w, h).to_image())
}

/// Resize by `qr_scale` with Lanczos3. Dimensions truncate, never below 1 px.
pub fn scale_fragment(image: &RgbaImage, qr_scale: f64) -> RgbaImage {
    if qr_scale == 1.0 {
        return image.clone();
    }
    let scale = |v: u32| ((v as f64 * qr_scale) as u32).max(1);
    imageops::resize(image, scale(image.width()), scale(image.height()), FilterType::Lanczos3)
}
