// ticketsモード: 全ページからQRボックスを集め、チケット1枚につき1ページを生成する

use image::RgbaImage;

use crate::compose::TicketFragment;
use crate::compose::font::StampFace;
use crate::compose::fragment::{extract_fragment, scale_fragment};
use crate::compose::label::mask_label;
use crate::config::merged::MergedConfig;
use crate::error::TicketOverlayError;
use crate::geometry::{CompleteBox, expand_to_complete_box};
use crate::pdf::writer::{ImageRect, Layer, TicketDocumentWriter, add_rgba_image, insert_image};
use crate::pipeline::counter::TicketCounter;
use crate::pipeline::page_scan::ScannedPage;
use crate::placement::plan_placements;

/// Output of a tickets run.
pub struct TicketBatch {
    pub pdf_bytes: Vec<u8>,
    pub tickets: usize,
    /// First and last stamped number, when numbering was on.
    pub numbers: Option<(i64, i64)>,
}

/// Complete boxes of every page in page order, each with its fragment cut out.
pub fn collect_complete_boxes(pages: &[ScannedPage], params: &MergedConfig) -> Vec<CompleteBox> {
    let mut boxes = Vec::new();
    for page in pages {
        let (page_w, page_h) = page.page_size();
        let before = boxes.len();
        for region in &page.regions {
            let mut complete = expand_to_complete_box(
                region,
                page_w,
                page_h,
                params.text_height,
                params.side_padding,
                params.bottom_padding,
            );
            complete.fragment = extract_fragment(&page.raster, &complete, params.zoom);
            if complete.fragment.is_none() {
                tracing::debug!(page = page.page_num, "complete box outside raster, skipped");
                continue;
            }
            boxes.push(complete);
        }
        tracing::info!(
            page = page.page_num,
            boxes = boxes.len() - before,
            "complete QR boxes found"
        );
    }
    boxes
}

/// Turn boxes into placeable fragments, threading the counter in order.
pub fn prepare_fragments(
    boxes: &[CompleteBox],
    params: &MergedConfig,
    face: &StampFace,
) -> Vec<TicketFragment> {
    let mut counter = TicketCounter::new(params.start_number);
    let mut fragments = Vec::with_capacity(boxes.len());

    for complete in boxes {
        let Some(raw) = &complete.fragment else {
            continue;
        };
        let (number, next) = counter.advance();
        counter = next;

        let masked = if params.masks_label() {
            mask_label(raw, params.label_band, number, face, params.font_size)
        } else {
            raw.clone()
        };

        fragments.push(TicketFragment {
            image: scale_fragment(&masked, params.qr_scale),
            number,
            payload: complete.payload.clone(),
        });
    }
    fragments
}

/// One page per fragment: the design as background, the fragment on top at
/// each planned placement. Fragment pixels are used as page units.
pub fn render_ticket_pages(
    fragments: &[TicketFragment],
    design: &RgbaImage,
    params: &MergedConfig,
) -> crate::error::Result<TicketBatch> {
    if fragments.is_empty() {
        return Err(TicketOverlayError::input("no QR codes found, nothing to write"));
    }

    let (design_w, design_h) = design.dimensions();
    let mut writer = TicketDocumentWriter::new();
    let design_id = add_rgba_image(writer.document_mut(), design)?;

    for (idx, fragment) in fragments.iter().enumerate() {
        let (page_id, page_box) = writer.new_page(design_w, design_h);
        let doc = writer.document_mut();
        insert_image(
            doc,
            page_id,
            &page_box,
            ImageRect::covering(&page_box),
            design_id,
            Layer::Background,
        )?;

        let (frag_w, frag_h) = fragment.image.dimensions();
        let fragment_id = add_rgba_image(doc, &fragment.image)?;
        let placements = plan_placements(
            frag_w,
            frag_h,
            design_w,
            design_h,
            params.qr_margin,
            params.qr_position,
        );
        for placement in placements {
            let rect = ImageRect {
                x: placement.x as f64,
                y: placement.y as f64,
                width: frag_w as f64,
                height: frag_h as f64,
            };
            insert_image(doc, page_id, &page_box, rect, fragment_id, Layer::Foreground)?;
            tracing::debug!(
                ticket = idx + 1,
                x = placement.x,
                y = placement.y,
                width = frag_w,
                height = frag_h,
                "placed QR box"
            );
        }
        if let Some(number) = fragment.number {
            tracing::info!(ticket = idx + 1, number, payload = %fragment.payload, "ticket created");
        } else {
            tracing::info!(ticket = idx + 1, payload = %fragment.payload, "ticket created");
        }
    }

    let first = fragments.first().and_then(|f| f.number);
    let last = fragments.last().and_then(|f| f.number);
    let numbers = first.zip(last);
    let tickets = writer.page_count();
    Ok(TicketBatch {
        pdf_bytes: writer.save_to_bytes()?,
        tickets,
        numbers,
    })
}
