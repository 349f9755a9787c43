use lopdf::{Document, Object, Stream, dictionary};
use ticket_overlay::pdf::reader::PdfReader;

/// ヘルパー: 指定されたMediaBoxを持つ最小限のPDFドキュメントを作成する
fn create_test_pdf_with_media_box(media_box: Vec<Object>) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let contents_id = doc.add_object(Stream::new(dictionary! {}, vec![]));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => contents_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// ヘルパー: MediaBoxを持たないページと、MediaBoxを持つ親Pagesノードを持つPDFを作成
fn create_test_pdf_with_inherited_media_box(media_box: Vec<Object>) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let contents_id = doc.add_object(Stream::new(dictionary! {}, vec![]));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => contents_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

fn reader_for(mut doc: Document) -> (tempfile::NamedTempFile, PdfReader) {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    doc.save(temp_file.path()).unwrap();
    let reader = PdfReader::open(temp_file.path()).unwrap();
    (temp_file, reader)
}

#[test]
fn test_page_box_real_values() {
    // A4サイズ（595.276 × 841.89 pt）
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(595.276),
        Object::Real(841.89),
    ]));
    let page_box = reader.page_box(1).unwrap();

    assert!((page_box.width - 595.276).abs() < 0.01);
    assert!((page_box.height - 841.89).abs() < 0.01);
    // 整数ページ空間は切り捨て
    assert_eq!(reader.page_size(1).unwrap(), (595, 841));
}

#[test]
fn test_page_box_non_zero_origin() {
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(10),
        Object::Integer(20),
        Object::Integer(605),
        Object::Integer(812),
    ]));
    let page_box = reader.page_box(1).unwrap();

    assert_eq!((page_box.origin_x, page_box.origin_y), (10.0, 20.0));
    assert_eq!((page_box.width, page_box.height), (595.0, 792.0));
}

#[test]
fn test_page_box_inherited_from_parent() {
    let (_f, reader) = reader_for(create_test_pdf_with_inherited_media_box(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ]));
    assert_eq!(reader.page_size(1).unwrap(), (612, 792));
}

#[test]
fn test_page_box_error_on_zero_dimensions() {
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(792),
    ]));
    let result = reader.page_box(1);

    assert!(result.is_err(), "should fail with zero width");
    assert!(result.unwrap_err().to_string().contains("non-positive"));
}

#[test]
fn test_page_box_inverted_coordinates() {
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(612),
        Object::Integer(792),
        Object::Integer(0),
        Object::Integer(0),
    ]));
    let page_box = reader.page_box(1).unwrap();
    assert_eq!((page_box.origin_x, page_box.origin_y), (0.0, 0.0));
    assert_eq!(page_box.width, 612.0);
}

#[test]
fn test_page_count_and_missing_page() {
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(100),
        Object::Integer(100),
    ]));
    assert_eq!(reader.page_count(), 1);
    assert!(reader.page_box(2).is_err());
    assert!(reader.page_text(2).is_err());
}

#[test]
fn test_page_text_of_empty_page() {
    let (_f, reader) = reader_for(create_test_pdf_with_media_box(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(100),
        Object::Integer(100),
    ]));
    let text = reader.page_text(1).unwrap();
    assert!(text.trim().is_empty());
}
