// 画像XObject埋め込み、既存ページへの重ね描き、チケットページ生成、出力の確定

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::TicketOverlayError;
use crate::pdf::reader::PageBox;

/// Where a drawn image goes relative to the page's existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Drawn after the existing content, in an isolated graphics state.
    Foreground,
    /// Drawn before the existing content.
    Background,
}

/// Placement rectangle in page units, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageRect {
    pub fn covering(page_box: &PageBox) -> Self {
        ImageRect {
            x: 0.0,
            y: 0.0,
            width: page_box.width,
            height: page_box.height,
        }
    }
}

/// zlibで圧縮
fn flate_encode(data: &[u8]) -> crate::error::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| TicketOverlayError::pdf_write(format!("Flate encode error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| TicketOverlayError::pdf_write(format!("Flate encode error: {}", e)))
}

/// RGBA画像をFlateDecodeのRGB XObjectとして追加する。
///
/// 不透明でないピクセルがあればアルファをDeviceGrayのSMaskとして添付する。
/// 戻り値はXObjectのオブジェクトID。
pub fn add_rgba_image(doc: &mut Document, image: &RgbaImage) -> crate::error::Result<ObjectId> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TicketOverlayError::pdf_write("cannot embed an empty image"));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if alpha.iter().any(|&a| a < u8::MAX) {
        let smask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let smask_stream = Stream::new(smask, flate_encode(&alpha)?).with_compression(false);
        let smask_id = doc.add_object(Object::Stream(smask_stream));
        dict.set("SMask", Object::Reference(smask_id));
    }

    let stream = Stream::new(dict, flate_encode(&rgb)?).with_compression(false);
    Ok(doc.add_object(Object::Stream(stream)))
}

/// ページの有効なResources辞書を複製して返す（Parent経由の継承も考慮）。
fn effective_resources(doc: &Document, dict: &Dictionary) -> crate::error::Result<Dictionary> {
    match dict.get(b"Resources") {
        Ok(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
        Ok(Object::Dictionary(d)) => Ok(d.clone()),
        Ok(_) => Err(TicketOverlayError::pdf_write("invalid Resources entry")),
        Err(_) => match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => {
                effective_resources(doc, doc.get_dictionary(*parent_id)?)
            }
            _ => Ok(Dictionary::new()),
        },
    }
}

/// 既存のContentsを参照の配列として返す。
fn existing_contents(doc: &Document, dict: &Dictionary) -> Vec<Object> {
    match dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn unused_xobject_name(xobjects: &Dictionary) -> String {
    (0..)
        .map(|n| format!("TkImg{n}"))
        .find(|name| !xobjects.has(name.as_bytes()))
        .unwrap_or_else(|| "TkImg".to_string())
}

fn add_content_stream(doc: &mut Document, content: String) -> Object {
    let stream = Stream::new(dictionary! {}, content.into_bytes());
    Object::Reference(doc.add_object(Object::Stream(stream)))
}

/// 画像XObject `image_id` をページ `page_id` の `rect` に描画する。
///
/// `rect` はページ左上原点の座標で、MediaBoxの原点を考慮してPDF座標に変換する。
pub fn insert_image(
    doc: &mut Document,
    page_id: ObjectId,
    page_box: &PageBox,
    rect: ImageRect,
    image_id: ObjectId,
    layer: Layer,
) -> crate::error::Result<()> {
    let page_dict = doc.get_dictionary(page_id)?;
    let mut resources = effective_resources(doc, page_dict)?;
    let contents = existing_contents(doc, page_dict);

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id)?.clone(),
        Ok(Object::Dictionary(d)) => d.clone(),
        _ => Dictionary::new(),
    };
    let name = unused_xobject_name(&xobjects);
    xobjects.set(name.clone(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    // PDFは左下原点
    let tx = page_box.origin_x + rect.x;
    let ty = page_box.origin_y + page_box.height - rect.y - rect.height;
    let draw = format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        rect.width, rect.height, tx, ty, name
    );

    let new_contents = match layer {
        Layer::Foreground => {
            let save = add_content_stream(doc, "q\n".to_string());
            let restore = add_content_stream(doc, "Q\n".to_string());
            let draw = add_content_stream(doc, draw);
            let mut all = Vec::with_capacity(contents.len() + 3);
            all.push(save);
            all.extend(contents);
            all.push(restore);
            all.push(draw);
            all
        }
        Layer::Background => {
            let draw = add_content_stream(doc, draw);
            let mut all = Vec::with_capacity(contents.len() + 1);
            all.push(draw);
            all.extend(contents);
            all
        }
    };

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(new_contents));
    Ok(())
}

/// lopdfのDocumentをバイト列として出力する。
pub fn document_to_bytes(doc: &mut Document) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| TicketOverlayError::pdf_write(e.to_string()))?;
    Ok(buf)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    PathBuf::from(partial)
}

/// 隣接する一時ファイルに書き込んでからリネームする。
///
/// 失敗時は一時ファイルを削除し、`path` には何も残さない。
pub fn commit_output(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    commit_outputs(&[(path, bytes)])
}

/// Commit several files together: all are staged as `.partial` siblings
/// before the first rename, in the given order.
///
/// If anything fails, staged files are removed and targets already renamed
/// in this call are deleted again.
pub fn commit_outputs(files: &[(&Path, &[u8])]) -> crate::error::Result<()> {
    let fail = |path: &Path, e: &dyn std::fmt::Display| {
        TicketOverlayError::pdf_write(format!("failed to write {}: {e}", path.display()))
    };
    let cleanup = |staged: &[PathBuf]| {
        for partial in staged {
            let _ = std::fs::remove_file(partial);
        }
    };

    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for &(path, bytes) in files {
        if path.is_dir() {
            cleanup(&staged);
            return Err(fail(path, &"target is a directory"));
        }
        let partial = partial_path(path);
        if let Err(e) = std::fs::write(&partial, bytes) {
            let _ = std::fs::remove_file(&partial);
            cleanup(&staged);
            return Err(fail(path, &e));
        }
        staged.push(partial);
    }

    for (i, (&(path, _), partial)) in files.iter().zip(&staged).enumerate() {
        if let Err(e) = std::fs::rename(partial, path) {
            cleanup(&staged[i..]);
            for &(done, _) in &files[..i] {
                let _ = std::fs::remove_file(done);
            }
            return Err(fail(path, &e));
        }
    }
    Ok(())
}

/// チケットごとに新しいページを積み上げる出力ドキュメント。
pub struct TicketDocumentWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for TicketDocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketDocumentWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// 空のページを追加し、そのIDとページ境界を返す。
    pub fn new_page(&mut self, width: u32, height: u32) -> (ObjectId, PageBox) {
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width as i64),
                Object::Integer(height as i64),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => Vec::<Object>::new(),
        });
        self.kids.push(page_id.into());

        let page_box = PageBox {
            origin_x: 0.0,
            origin_y: 0.0,
            width: width as f64,
            height: height as f64,
        };
        (page_id, page_box)
    }

    /// Pagesノードを確定し、PDFをバイト列として出力する。
    pub fn save_to_bytes(mut self) -> crate::error::Result<Vec<u8>> {
        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => self.kids.len() as i64,
            "Kids" => self.kids,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        document_to_bytes(&mut self.doc)
    }
}
