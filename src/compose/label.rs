// Label band masking and ticket number stamping on extracted fragments

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::font::StampFace;
use super::glyph::render_text;

const BAND_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE_COLOR: [u8; 3] = [128, 128, 128];
const TEXT_COLOR: [u8; 3] = [0, 0, 0];

/// 輪郭を描く1pxの斜めオフセット
const OUTLINE_OFFSETS: [(i64, i64); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Zero-padded to three digits; wider numbers are kept whole.
pub fn format_ticket_number(number: i64) -> String {
    format!("{number:03}")
}

/// Row range `[start, end)` of the label band for a fragment `height` rows tall.
pub fn band_rows(height: u32, band: [f64; 2]) -> (u32, u32) {
    let start = (height as f64 * band[0]).floor() as u32;
    let end = (height as f64 * band[1]).floor() as u32;
    (start.min(height), end.min(height))
}

/// Blank the label band and, when `number` is given, stamp it centered in the band.
///
/// Returns a new image; `fragment` is left as is.
pub fn mask_label(
    fragment: &RgbaImage,
    band: [f64; 2],
    number: Option<i64>,
    face: &StampFace,
    font_size: f32,
) -> RgbaImage {
    let mut out = fragment.clone();
    let (width, height) = out.dimensions();
    let (start, end) = band_rows(height, band);
    if width == 0 || end <= start {
        return out;
    }

    draw_filled_rect_mut(
        &mut out,
        Rect::at(0, start as i32).of_size(width, end - start),
        BAND_FILL,
    );

    let Some(number) = number else {
        return out;
    };

    let text = format_ticket_number(number);
    let coverage = render_text(face, &text, font_size);
    let x = (width as i64 - coverage.width as i64) / 2;
    let y = start as i64 + ((end - start) as i64 - coverage.height as i64) / 2;

    for (dx, dy) in OUTLINE_OFFSETS {
        coverage.blend_onto(&mut out, x + dx, y + dy, OUTLINE_COLOR);
    }
    coverage.blend_onto(&mut out, x, y, TEXT_COLOR);

    tracing::debug!(number = %text, font = face.describe(), "stamped ticket number");
    out
}
