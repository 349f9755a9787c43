// 統合テスト共通ヘルパー: lopdfで生成するPDF、qrcodeで生成するQR、偽ラスタライザ

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgba, RgbaImage};
use lopdf::{Document, Object, Stream, dictionary};
use ticket_overlay::render::PageRasterizer;

/// Write a PDF with one empty page per entry of `sizes` (points).
pub fn write_blank_pdf(path: &Path, sizes: &[(i64, i64)]) {
    let boxes: Vec<Vec<Object>> = sizes
        .iter()
        .map(|&(w, h)| vec![Object::Integer(0), Object::Integer(0), Object::Integer(w), Object::Integer(h)])
        .collect();
    write_pdf_with_media_boxes(path, boxes);
}

/// Write a PDF with one empty page per MediaBox array, e.g. real-valued A4.
pub fn write_pdf_with_media_boxes(path: &Path, media_boxes: Vec<Vec<Object>>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = media_boxes
        .into_iter()
        .map(|media_box| {
            let contents_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m\n".to_vec()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Resources" => dictionary! {},
                "Contents" => contents_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("failed to save test PDF");
}

/// QR symbol for `payload`, `module_px` pixels per module, no quiet zone.
pub fn qr_symbol(payload: &str, module_px: u32) -> GrayImage {
    let code = qrcode::QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    GrayImage::from_fn(modules * module_px, modules * module_px, |x, y| {
        let (mx, my) = ((x / module_px) as usize, (y / module_px) as usize);
        if code[(mx, my)] == qrcode::Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// White page raster with QR symbols pasted at the given top-left positions.
pub fn page_with_qrs(width: u32, height: u32, codes: &[(&str, u32, u32)], module_px: u32) -> RgbaImage {
    let mut page = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    for &(payload, x0, y0) in codes {
        let symbol = qr_symbol(payload, module_px);
        for (x, y, px) in symbol.enumerate_pixels() {
            let v = px.0[0];
            page.put_pixel(x0 + x, y0 + y, Rgba([v, v, v, 255]));
        }
    }
    page
}

/// Serves pre-rendered rasters instead of calling pdfium.
pub struct FakeRasterizer {
    pub pages: Vec<RgbaImage>,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, page_index: u32, _zoom: f64) -> ticket_overlay::error::Result<RgbaImage> {
        self.pages
            .get(page_index as usize)
            .cloned()
            .ok_or_else(|| ticket_overlay::error::TicketOverlayError::render("no such page"))
    }
}

/// Save an RGBA design image as PNG.
pub fn write_design(path: &Path, design: &RgbaImage) {
    design.save(path).expect("failed to save design PNG");
}

/// Decoded alpha samples of the first soft-masked image XObject on `page_num`.
pub fn page_overlay_alpha(doc: &Document, page_num: u32) -> Option<(u32, u32, Vec<u8>)> {
    let page_id = *doc.get_pages().get(&page_num)?;
    let page = doc.get_dictionary(page_id).ok()?;
    let resources = page.get(b"Resources").ok()?.as_dict().ok()?;
    let xobjects = resources.get(b"XObject").ok()?.as_dict().ok()?;

    for (_, value) in xobjects.iter() {
        let image_id = value.as_reference().ok()?;
        let image = doc.get_object(image_id).ok()?.as_stream().ok()?;
        let Ok(smask_ref) = image.dict.get(b"SMask") else {
            continue;
        };
        let smask = doc.get_object(smask_ref.as_reference().ok()?).ok()?.as_stream().ok()?;
        let width = smask.dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = smask.dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        let samples = smask.decompressed_content().ok()?;
        return Some((width, height, samples));
    }
    None
}

/// Operands of the last `cm` operator in the page content (the placed image).
pub fn last_placement_matrix(doc: &Document, page_num: u32) -> Option<Vec<f64>> {
    let page_id = *doc.get_pages().get(&page_num)?;
    let content = doc.get_page_content(page_id).ok()?;
    let text = String::from_utf8_lossy(&content);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let cm = tokens.iter().rposition(|&t| t == "cm")?;
    if cm < 6 {
        return None;
    }
    tokens[cm - 6..cm].iter().map(|t| t.parse().ok()).collect()
}

pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}
