// Placement of ticket fragments on generated pages

use crate::config::job::QrPosition;

/// Top-left corner of a placed fragment, in page units (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
}

/// Bottom-corner positions for a `fragment_width` x `fragment_height` fragment.
///
/// A coordinate that would go negative (fragment larger than the page minus
/// margins) is re-clamped to `margin`. `Both` yields left, then right.
pub fn plan_placements(
    fragment_width: u32,
    fragment_height: u32,
    page_width: u32,
    page_height: u32,
    margin: u32,
    position: QrPosition,
) -> Vec<Placement> {
    let m = margin as i64;
    let clamp = |v: i64| if v < 0 { margin } else { v as u32 };

    let y = clamp(page_height as i64 - fragment_height as i64 - m);
    let left = Placement { x: margin, y };
    let right = Placement {
        x: clamp(page_width as i64 - fragment_width as i64 - m),
        y,
    };

    match position {
        QrPosition::Left => vec![left],
        QrPosition::Right => vec![right],
        QrPosition::Both => vec![left, right],
    }
}
