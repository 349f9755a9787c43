use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::error::TicketOverlayError;

/// ページ境界（PDFポイント）。`origin_*` はMediaBoxの左下座標。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// Whole page units, truncated. This is the page space the geometry works in.
    pub fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }
}

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let doc = Document::load(path)?;
        Ok(Self { doc })
    }

    /// メモリ上のPDFバイト列から作成する。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// 編集用に内部のDocumentを取り出す。
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 指定ページ辞書からMediaBoxを取得する（Parent経由の継承も考慮）。
    fn get_media_box(&self, dict: &lopdf::Dictionary) -> crate::error::Result<lopdf::Object> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            return Ok(obj.clone());
        }

        if let Ok(lopdf::Object::Reference(parent_id)) = dict.get(b"Parent") {
            let parent_dict = self.doc.get_dictionary(*parent_id)?;
            return self.get_media_box(parent_dict);
        }

        Err(TicketOverlayError::pdf_read("MediaBox not found"))
    }

    /// 指定ページ(1-indexed)のMediaBoxを返す。
    pub fn page_box(&self, page_num: u32) -> crate::error::Result<PageBox> {
        let page_id = self.page_id(page_num)?;
        let page_dict = self.doc.get_dictionary(page_id)?;
        let media_box = self.get_media_box(page_dict)?;
        parse_media_box(&media_box)
    }

    /// 指定ページ(1-indexed)の寸法 (width, height) を整数ポイントで返す。
    pub fn page_size(&self, page_num: u32) -> crate::error::Result<(u32, u32)> {
        Ok(self.page_box(page_num)?.size())
    }

    /// 指定ページ(1-indexed)のテキストを抽出する。
    ///
    /// テキストを持たないスキャンページでは空文字列になる。
    pub fn page_text(&self, page_num: u32) -> crate::error::Result<String> {
        self.page_id(page_num)?;
        match self.doc.extract_text(&[page_num]) {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::debug!(page = page_num, error = %e, "text extraction failed");
                Ok(String::new())
            }
        }
    }

    /// ページ番号(1-indexed)からObjectIdを取得する。
    pub fn page_id(&self, page_num: u32) -> crate::error::Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or_else(|| TicketOverlayError::pdf_read(format!("page {} not found", page_num)))
    }
}

fn parse_media_box(media_box: &lopdf::Object) -> crate::error::Result<PageBox> {
    let media_box_array = media_box.as_array()?;
    if media_box_array.len() < 4 {
        return Err(TicketOverlayError::pdf_read("Invalid MediaBox"));
    }

    // MediaBoxの値は整数または実数の可能性がある
    let to_f64 = |obj: &lopdf::Object| -> crate::error::Result<f64> {
        match obj {
            lopdf::Object::Integer(i) => Ok(*i as f64),
            lopdf::Object::Real(f) => Ok(*f as f64),
            _ => Err(TicketOverlayError::pdf_read("Invalid MediaBox value")),
        }
    };

    let x0 = to_f64(&media_box_array[0])?;
    let y0 = to_f64(&media_box_array[1])?;
    let x1 = to_f64(&media_box_array[2])?;
    let y1 = to_f64(&media_box_array[3])?;

    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();

    if width <= 0.0 || height <= 0.0 {
        return Err(TicketOverlayError::pdf_read(
            "Invalid MediaBox: non-positive page dimensions",
        ));
    }

    // 14,400 pt ≈ 200 in
    const PDF_MAX_DIMENSION_PT: f64 = 14_400.0;
    if width > PDF_MAX_DIMENSION_PT || height > PDF_MAX_DIMENSION_PT {
        return Err(TicketOverlayError::pdf_read(
            "Invalid MediaBox: page dimensions exceed PDF limits",
        ));
    }

    Ok(PageBox {
        origin_x: x0.min(x1),
        origin_y: y0.min(y1),
        width,
        height,
    })
}
