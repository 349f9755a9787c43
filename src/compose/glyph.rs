// Text rasterization for stamping: ab_glyph outlines or built-in digits -> coverage map -> blended pixels

use ab_glyph::{Font, FontRef, GlyphId, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};

use super::font::StampFace;

/// Per-pixel ink coverage in `[0, 1]` for a tight text bounding box.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl Coverage {
    fn empty() -> Self {
        Coverage {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// No pixel carries any ink.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&c| c <= 0.0)
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Blend `color` onto `target` with this coverage's top-left at (`x`, `y`).
    pub fn blend_onto(&self, target: &mut RgbaImage, x: i64, y: i64, color: [u8; 3]) {
        let (tw, th) = (target.width() as i64, target.height() as i64);
        for cy in 0..self.height {
            let ty = y + cy as i64;
            if ty < 0 || ty >= th {
                continue;
            }
            for cx in 0..self.width {
                let tx = x + cx as i64;
                if tx < 0 || tx >= tw {
                    continue;
                }
                let c = self.get(cx, cy);
                if c <= 0.0 {
                    continue;
                }
                let dst = target.get_pixel_mut(tx as u32, ty as u32);
                let Rgba([r, g, b, a]) = *dst;
                let mix = |d: u8, s: u8| (d as f32 * (1.0 - c) + s as f32 * c).round() as u8;
                *dst = Rgba([
                    mix(r, color[0]),
                    mix(g, color[1]),
                    mix(b, color[2]),
                    a.max((c * 255.0).round() as u8),
                ]);
            }
        }
    }
}

/// Render `text` at `px` pixels per em.
///
/// An outline face that draws nothing for non-empty text falls back to the
/// built-in digits, so a number never silently disappears.
pub fn render_text(face: &StampFace, text: &str, px: f32) -> Coverage {
    let StampFace::Outline { data, index, source } = face else {
        return render_builtin_text(text, px);
    };
    let coverage = match FontRef::try_from_slice_and_index(data, *index) {
        Ok(font) => render_outline_text(&font, text, px),
        Err(e) => {
            tracing::warn!(font = %source, error = %e, "stamp font unreadable, using built-in digits");
            return render_builtin_text(text, px);
        }
    };
    if coverage.is_blank() && !text.is_empty() {
        tracing::warn!(font = %source, %text, "stamp font drew no ink, using built-in digits");
        return render_builtin_text(text, px);
    }
    coverage
}

/// Lay the glyphs out on one baseline and draw their coverage into a tight box.
fn render_outline_text(font: &FontRef<'_>, text: &str, px: f32) -> Coverage {
    // PxScale is relative to ascent - descent, not to the em square
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    let scaled = font.as_scaled(PxScale::from(px * font.height_unscaled() / units_per_em));

    let mut outlined = Vec::new();
    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), point(caret, scaled.ascent()));
        caret += scaled.h_advance(id);
        previous = Some(id);
        if let Some(glyph) = font.outline_glyph(glyph) {
            outlined.push(glyph);
        }
    }
    if outlined.is_empty() {
        return Coverage::empty();
    }

    let bounds: Vec<_> = outlined.iter().map(|g| g.px_bounds()).collect();
    let min_x = bounds.iter().map(|b| b.min.x).fold(f32::INFINITY, f32::min);
    let min_y = bounds.iter().map(|b| b.min.y).fold(f32::INFINITY, f32::min);
    let max_x = bounds.iter().map(|b| b.max.x).fold(f32::NEG_INFINITY, f32::max);
    let max_y = bounds.iter().map(|b| b.max.y).fold(f32::NEG_INFINITY, f32::max);

    let width = (max_x - min_x).ceil().max(0.0) as u32;
    let height = (max_y - min_y).ceil().max(0.0) as u32;
    if width == 0 || height == 0 {
        return Coverage::empty();
    }

    let mut data = vec![0.0f32; (width * height) as usize];
    for (glyph, b) in outlined.iter().zip(&bounds) {
        let ox = (b.min.x - min_x) as u32;
        let oy = (b.min.y - min_y) as u32;
        glyph.draw(|x, y, c| {
            let (cx, cy) = (ox + x, oy + y);
            if cx < width && cy < height {
                let cell = &mut data[(cy * width + cx) as usize];
                *cell = (*cell + c).min(1.0);
            }
        });
    }

    Coverage {
        width,
        height,
        data,
    }
}

/// 5x7 bitmap glyphs, one bit per column (MSB = leftmost of 5).
fn builtin_glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}

fn render_builtin_text(text: &str, px: f32) -> Coverage {
    let cell = ((px * 0.1).round() as u32).max(1);
    let glyphs: Vec<[u8; 7]> = text.chars().filter_map(builtin_glyph).collect();
    if glyphs.is_empty() {
        return Coverage::empty();
    }

    let advance = 6 * cell;
    let width = glyphs.len() as u32 * advance - cell;
    let height = 7 * cell;
    let mut data = vec![0.0f32; (width * height) as usize];

    for (i, rows) in glyphs.iter().enumerate() {
        let origin = i as u32 * advance;
        for (gy, bits) in rows.iter().enumerate() {
            for gx in 0..5u32 {
                if bits & (0x10 >> gx) == 0 {
                    continue;
                }
                for dy in 0..cell {
                    for dx in 0..cell {
                        let x = origin + gx * cell + dx;
                        let y = gy as u32 * cell + dy;
                        data[(y * width + x) as usize] = 1.0;
                    }
                }
            }
        }
    }

    Coverage {
        width,
        height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_dimensions() {
        let cov = render_text(&StampFace::Builtin, "007", 36.0);
        // cell = round(3.6) = 4
        assert_eq!(cov.width, 3 * 24 - 4);
        assert_eq!(cov.height, 28);
    }

    #[test]
    fn test_builtin_skips_unknown_chars() {
        let cov = render_text(&StampFace::Builtin, "x", 36.0);
        assert_eq!((cov.width, cov.height), (0, 0));
    }

    #[test]
    fn test_unreadable_outline_face_uses_builtin() {
        let face = StampFace::Outline {
            data: b"not a font".to_vec(),
            index: 0,
            source: "broken.ttf".to_string(),
        };
        let cov = render_text(&face, "042", 36.0);
        let builtin = render_text(&StampFace::Builtin, "042", 36.0);
        assert_eq!((cov.width, cov.height), (builtin.width, builtin.height));
        assert!(!cov.is_blank());
    }

    #[test]
    fn test_blank_coverage() {
        assert!(Coverage::empty().is_blank());
        assert!(!render_text(&StampFace::Builtin, "1", 20.0).is_blank());
    }

    #[test]
    fn test_blend_clips_to_target() {
        let cov = render_text(&StampFace::Builtin, "8", 10.0);
        let mut target = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        cov.blend_onto(&mut target, -2, -2, [0, 0, 0]);
        assert!(target.pixels().any(|p| p.0[0] == 0));
    }
}
