#[cfg(feature = "pdfium")]
pub mod pdfium;

use image::RgbaImage;

/// Renders PDF pages into pixel buffers.
///
/// Implementations need not be thread-safe; pages are rasterized one after
/// another.
pub trait PageRasterizer {
    /// Render page `page_index` (0-indexed) at `zoom` (1.0 = one pixel per point).
    fn rasterize(&self, page_index: u32, zoom: f64) -> crate::error::Result<RgbaImage>;
}
