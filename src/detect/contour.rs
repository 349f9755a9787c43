// Contour heuristic: square-ish quadrilaterals with finder-like corners
//
// Last resort when no decoder succeeds. It trades false positives for
// coverage and never yields a payload.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

use crate::geometry::DetectedRegion;

/// Tunables for the contour heuristic.
#[derive(Debug, Clone)]
pub struct ContourParams {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Douglas-Peucker epsilon as a fraction of the contour perimeter.
    pub approx_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Candidates must be strictly larger than this on both sides.
    pub min_side: u32,
    pub binary_threshold: u8,
    /// A corner counts as finder-like above this many transitions.
    pub min_transitions: usize,
    /// Corners (of three) that must look finder-like.
    pub min_finder_corners: usize,
}

impl Default for ContourParams {
    fn default() -> Self {
        ContourParams {
            canny_low: 50.0,
            canny_high: 150.0,
            approx_fraction: 0.02,
            min_aspect: 0.8,
            max_aspect: 1.2,
            min_side: 50,
            binary_threshold: 127,
            min_transitions: 20,
            min_finder_corners: 2,
        }
    }
}

/// Axis-aligned rectangle in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Find QR-like squares in a grayscale raster.
pub fn detect_by_contours(gray: &GrayImage, params: &ContourParams) -> Vec<DetectedRegion> {
    let edges = canny(gray, params.canny_low, params.canny_high);
    let contours = find_contours::<i32>(&edges);

    let mut accepted: Vec<Rect> = Vec::new();
    for contour in &contours {
        if contour.points.len() < 4 {
            continue;
        }
        let epsilon = params.approx_fraction * arc_length(&contour.points, true);
        if epsilon <= 0.0 {
            continue;
        }
        let approx = distinct_vertices(
            &approximate_polygon_dp(&contour.points, epsilon, true),
            epsilon,
        );
        if approx.len() != 4 {
            continue;
        }

        let Some(rect) = bounding_rect(&approx) else {
            continue;
        };
        if !is_square_candidate(&rect, params) {
            continue;
        }
        if accepted.iter().any(|a| nearly_same(a, &rect)) {
            continue;
        }
        if is_likely_qr(gray, &rect, params) {
            accepted.push(rect);
        }
    }

    accepted
        .into_iter()
        .map(|r| DetectedRegion {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            payload: String::new(),
        })
        .collect()
}

/// Drop vertices within `min_dist` of the previously kept one, including the
/// closing vertex that repeats the start of a closed curve.
fn distinct_vertices(points: &[Point<i32>], min_dist: f64) -> Vec<Point<i32>> {
    let near = |a: &Point<i32>, b: &Point<i32>| {
        let (dx, dy) = ((a.x - b.x) as f64, (a.y - b.y) as f64);
        (dx * dx + dy * dy).sqrt() < min_dist
    };

    let mut kept: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for p in points {
        if kept.last().is_some_and(|last| near(last, p)) {
            continue;
        }
        kept.push(*p);
    }
    while kept.len() > 1 && near(&kept[kept.len() - 1], &kept[0]) {
        kept.pop();
    }
    kept
}

fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let min_x = points.iter().map(|p| p.x).min()?.max(0);
    let min_y = points.iter().map(|p| p.y).min()?.max(0);
    let max_x = points.iter().map(|p| p.x).max()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    if max_x < min_x || max_y < min_y {
        return None;
    }
    // inclusive pixel extents
    Some(Rect {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

fn is_square_candidate(rect: &Rect, params: &ContourParams) -> bool {
    let aspect = rect.width as f64 / rect.height as f64;
    aspect > params.min_aspect
        && aspect < params.max_aspect
        && rect.width > params.min_side
        && rect.height > params.min_side
}

/// Nested contours (outer and hole borders of one edge loop) yield almost
/// the same rectangle.
fn nearly_same(a: &Rect, b: &Rect) -> bool {
    const SLACK: i64 = 4;
    let close = |p: u32, q: u32| (p as i64 - q as i64).abs() <= SLACK;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

/// Finder-pattern check on three corners of the binarized ROI.
fn is_likely_qr(gray: &GrayImage, rect: &Rect, params: &ContourParams) -> bool {
    let (img_w, img_h) = gray.dimensions();
    let x_end = (rect.x + rect.width).min(img_w);
    let y_end = (rect.y + rect.height).min(img_h);
    if x_end <= rect.x || y_end <= rect.y {
        return false;
    }
    let (w, h) = (x_end - rect.x, y_end - rect.y);

    let corner = w.min(h) / 7;
    if corner == 0 {
        return false;
    }

    let corners = [
        (rect.x, rect.y),
        (rect.x + w - corner, rect.y),
        (rect.x, rect.y + h - corner),
    ];

    let finder_like = corners
        .iter()
        .filter(|&&(cx, cy)| {
            count_transitions(gray, cx, cy, corner, params.binary_threshold)
                > params.min_transitions
        })
        .count();

    finder_like >= params.min_finder_corners
}

/// Count black/white flips between consecutive samples of a `size` x `size`
/// window read in row-major order.
fn count_transitions(gray: &GrayImage, x0: u32, y0: u32, size: u32, threshold: u8) -> usize {
    let mut transitions = 0;
    let mut previous: Option<bool> = None;
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            let white = gray.get_pixel(x, y).0[0] > threshold;
            if previous.is_some_and(|p| p != white) {
                transitions += 1;
            }
            previous = Some(white);
        }
    }
    transitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// White canvas with a `side` x `side` checkerboard of `cell` px squares at (`x0`, `y0`).
    fn checker_square(canvas: u32, x0: u32, y0: u32, side: u32, cell: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(canvas, canvas, Luma([255]));
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                let dark = ((x - x0) / cell + (y - y0) / cell) % 2 == 0;
                if dark {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        }
        img
    }

    #[test]
    fn test_count_transitions_checker() {
        let img = checker_square(40, 0, 0, 40, 4);
        // 4 flips in each 20 px row
        assert!(count_transitions(&img, 0, 0, 20, 127) >= 80);
    }

    #[test]
    fn test_count_transitions_flat() {
        let img = GrayImage::from_pixel(30, 30, Luma([0]));
        assert_eq!(count_transitions(&img, 0, 0, 30, 127), 0);
    }

    #[test]
    fn test_distinct_vertices_drops_closing_point() {
        let pts = [
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
            Point::new(1, 1),
            Point::new(0, 0),
        ];
        let kept = distinct_vertices(&pts, 5.0);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0], Point::new(0, 0));
    }

    #[test]
    fn test_square_candidate_filter() {
        let params = ContourParams::default();
        let square = Rect { x: 0, y: 0, width: 100, height: 100 };
        let wide = Rect { x: 0, y: 0, width: 130, height: 100 };
        let small = Rect { x: 0, y: 0, width: 50, height: 50 };
        assert!(is_square_candidate(&square, &params));
        assert!(!is_square_candidate(&wide, &params));
        assert!(!is_square_candidate(&small, &params));
    }

    #[test]
    fn test_is_likely_qr_needs_two_busy_corners() {
        let params = ContourParams::default();
        let busy = checker_square(200, 20, 20, 140, 4);
        let rect = Rect { x: 20, y: 20, width: 140, height: 140 };
        assert!(is_likely_qr(&busy, &rect, &params));

        let mut flat = GrayImage::from_pixel(200, 200, Luma([255]));
        for y in 20..160 {
            for x in 20..160 {
                flat.put_pixel(x, y, Luma([0]));
            }
        }
        assert!(!is_likely_qr(&flat, &rect, &params));
    }

    #[test]
    fn test_detects_checker_square() {
        let img = checker_square(240, 50, 50, 140, 4);
        let regions = detect_by_contours(&img, &ContourParams::default());
        assert!(
            regions.iter().all(|r| r.payload.is_empty()),
            "contour regions carry no payload"
        );
        assert!(
            regions.iter().any(|r| {
                (44..=56).contains(&r.x)
                    && (44..=56).contains(&r.y)
                    && (128..=152).contains(&r.width)
                    && (128..=152).contains(&r.height)
            }),
            "checker square should be accepted, got {regions:?}"
        );
    }

    #[test]
    fn test_ignores_plain_page() {
        let img = GrayImage::from_pixel(200, 200, Luma([255]));
        assert!(detect_by_contours(&img, &ContourParams::default()).is_empty());
    }
}
