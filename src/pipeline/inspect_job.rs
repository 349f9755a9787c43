use crate::pdf::reader::PdfReader;
use crate::pipeline::page_scan::ScannedPage;
use crate::report::{DetectionReport, PageReport, QrRecord};
use crate::ticket_text::parse_ticket_text;

/// Build the detection record for scanned pages, adding each page's ticket text.
pub fn build_report(
    reader: &PdfReader,
    pages: &[ScannedPage],
    zoom: f64,
) -> crate::error::Result<DetectionReport> {
    let mut report = DetectionReport::default();
    for page in pages {
        let text = reader.page_text(page.page_num)?;
        report.push_page(PageReport {
            page_num: page.page_num - 1,
            width: page.page_box.width,
            height: page.page_box.height,
            qr_codes: page
                .detection
                .regions
                .iter()
                .map(|r| QrRecord::from_region(r, zoom))
                .collect(),
            tickets: parse_ticket_text(&text),
        });
    }
    Ok(report)
}
