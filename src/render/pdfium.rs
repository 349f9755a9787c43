// pdfium-render wrapper: page -> RgbaImage at a zoom factor (in-memory only)

use std::path::{Path, PathBuf};

use image::RgbaImage;
use pdfium_render::prelude::*;

use super::PageRasterizer;
use crate::error::TicketOverlayError;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(TicketOverlayError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(TicketOverlayError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path.to_str().ok_or_else(|| {
        TicketOverlayError::render("pdfium library path contains non-UTF-8 characters")
    })?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
    Ok(Pdfium::new(bindings))
}

/// Rasterizes pages of one PDF file with pdfium.
///
/// The library is bound once; the document is reopened per page so no
/// borrow of the binding outlives a call.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    pdf_path: PathBuf,
}

impl PdfiumRasterizer {
    pub fn open(pdf_path: impl AsRef<Path>) -> crate::error::Result<Self> {
        Ok(Self {
            pdfium: create_pdfium()?,
            pdf_path: pdf_path.as_ref().to_path_buf(),
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    /// Renders page `page_index` (0-indexed) at `zoom` (1.0 = 72 DPI).
    ///
    /// Each point maps to `zoom` pixels; target dimensions are rounded.
    fn rasterize(&self, page_index: u32, zoom: f64) -> crate::error::Result<RgbaImage> {
        let document = self.pdfium.load_pdf_from_file(&self.pdf_path, None)?;

        let page_index_u16 = u16::try_from(page_index)
            .map_err(|_| TicketOverlayError::render("page index exceeds u16 range"))?;
        let page = document.pages().get(page_index_u16)?;

        let width_px = (page.width().value as f64 * zoom).round() as i32;
        let height_px = (page.height().value as f64 * zoom).round() as i32;
        if width_px <= 0 || height_px <= 0 {
            return Err(TicketOverlayError::render(format!(
                "page {} renders to an empty bitmap at zoom {zoom}",
                page_index + 1
            )));
        }

        let config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px);

        let bitmap = page.render_with_config(&config)?;
        tracing::debug!(page = page_index + 1, width_px, height_px, "page rasterized");
        Ok(bitmap.as_image().to_rgba8())
    }
}
