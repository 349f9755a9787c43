// rqrr decode passes: luminance as-is, and fixed binary threshold

use image::GrayImage;
use rqrr::PreparedImage;

use crate::geometry::DetectedRegion;

/// Decode every QR grid rqrr can find in the luminance image.
///
/// Grids that are located but fail to decode are dropped so that a later
/// strategy still gets a chance at them.
pub fn decode_luma(gray: &GrayImage) -> Vec<DetectedRegion> {
    let (width, height) = gray.dimensions();
    let mut prepared =
        PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared
        .detect_grids()
        .into_iter()
        .map(|grid| (grid.bounds, grid.decode().map(|(_, content)| content)));
    collect_decoded(grids, width, height)
}

/// Decode after a fixed binary threshold: samples `<= threshold` are dark.
pub fn decode_thresholded(gray: &GrayImage, threshold: u8) -> Vec<DetectedRegion> {
    let (width, height) = gray.dimensions();
    let mut prepared =
        PreparedImage::prepare_from_bitmap(width as usize, height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0] <= threshold
        });
    let grids = prepared
        .detect_grids()
        .into_iter()
        .map(|grid| (grid.bounds, grid.decode().map(|(_, content)| content)));
    collect_decoded(grids, width, height)
}

fn collect_decoded<I>(grids: I, width: u32, height: u32) -> Vec<DetectedRegion>
where
    I: Iterator<Item = ([rqrr::Point; 4], Result<String, rqrr::DeQRError>)>,
{
    let mut regions = Vec::new();
    for (bounds, decoded) in grids {
        let content = match decoded {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(error = ?e, "QR grid located but not decodable");
                continue;
            }
        };
        if let Some(region) = bounding_region(&bounds, width, height, content) {
            regions.push(region);
        }
    }
    regions
}

/// Axis-aligned bounding rectangle of the grid's four corners, clipped to the raster.
fn bounding_region(
    corners: &[rqrr::Point; 4],
    width: u32,
    height: u32,
    payload: String,
) -> Option<DetectedRegion> {
    let min_x = corners.iter().map(|p| p.x).min()?.clamp(0, width as i32);
    let max_x = corners.iter().map(|p| p.x).max()?.clamp(0, width as i32);
    let min_y = corners.iter().map(|p| p.y).min()?.clamp(0, height as i32);
    let max_y = corners.iter().map(|p| p.y).max()?.clamp(0, height as i32);

    if max_x <= min_x || max_y <= min_y {
        return None;
    }

    Some(DetectedRegion {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> rqrr::Point {
        rqrr::Point { x, y }
    }

    #[test]
    fn test_bounding_region_of_skewed_corners() {
        let corners = [pt(12, 10), pt(60, 14), pt(58, 70), pt(9, 66)];
        let region = bounding_region(&corners, 100, 100, "abc".into()).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (9, 10, 51, 60));
        assert_eq!(region.payload, "abc");
    }

    #[test]
    fn test_bounding_region_clipped_to_raster() {
        let corners = [pt(-5, -5), pt(40, -5), pt(40, 40), pt(-5, 40)];
        let region = bounding_region(&corners, 30, 30, String::new()).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 30, 30));
    }

    #[test]
    fn test_bounding_region_degenerate() {
        let corners = [pt(5, 5); 4];
        assert!(bounding_region(&corners, 30, 30, String::new()).is_none());
    }

    #[test]
    fn test_blank_image_decodes_nothing() {
        let gray = GrayImage::from_pixel(120, 120, image::Luma([255]));
        assert!(decode_luma(&gray).is_empty());
        assert!(decode_thresholded(&gray, 127).is_empty());
    }
}
