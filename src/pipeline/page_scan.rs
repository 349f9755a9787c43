// ページ走査: 逐次ラスタライズ -> QR検出（任意でrayon並列）-> ページ順に統合

use image::RgbaImage;
use rayon::prelude::*;

use crate::detect::contour::ContourParams;
use crate::detect::{Detection, DetectorParams, QrDetector};
use crate::error::TicketOverlayError;
use crate::geometry::{PageRegion, to_page_space};
use crate::pdf::reader::{PageBox, PdfReader};
use crate::render::PageRasterizer;

/// One page after rasterization and detection.
pub struct ScannedPage {
    /// 1-indexed.
    pub page_num: u32,
    pub page_box: PageBox,
    /// The page at the scan zoom.
    pub raster: RgbaImage,
    pub detection: Detection,
    /// Detected regions mapped into page space.
    pub regions: Vec<PageRegion>,
}

impl ScannedPage {
    pub fn page_size(&self) -> (u32, u32) {
        self.page_box.size()
    }
}

pub fn detector_for(threshold: u8) -> QrDetector {
    QrDetector::new(DetectorParams {
        threshold,
        contour: ContourParams {
            binary_threshold: threshold,
            ..ContourParams::default()
        },
    })
}

/// Rasterize every page in order, then detect on each raster.
///
/// `workers`: 1 detects sequentially, 0 uses the global rayon pool, and any
/// other value a dedicated pool of that size. Results keep page order.
pub fn scan_pages(
    reader: &PdfReader,
    rasterizer: &dyn PageRasterizer,
    detector: &QrDetector,
    zoom: f64,
    workers: usize,
) -> crate::error::Result<Vec<ScannedPage>> {
    let page_count = reader.page_count();

    let mut rendered: Vec<(u32, PageBox, RgbaImage)> = Vec::with_capacity(page_count as usize);
    for page_num in 1..=page_count {
        tracing::info!(page = page_num, total = page_count, "scanning page");
        let page_box = reader.page_box(page_num)?;
        let raster = rasterizer.rasterize(page_num - 1, zoom)?;
        rendered.push((page_num, page_box, raster));
    }

    let detections = detect_all(detector, &rendered, workers)?;

    Ok(rendered
        .into_iter()
        .zip(detections)
        .map(|((page_num, page_box, raster), detection)| {
            let regions: Vec<PageRegion> = detection
                .regions
                .iter()
                .map(|r| to_page_space(r, zoom))
                .collect();
            tracing::info!(
                page = page_num,
                regions = regions.len(),
                strategy = ?detection.strategy,
                "QR detection finished"
            );
            ScannedPage {
                page_num,
                page_box,
                raster,
                detection,
                regions,
            }
        })
        .collect())
}

fn detect_all(
    detector: &QrDetector,
    rendered: &[(u32, PageBox, RgbaImage)],
    workers: usize,
) -> crate::error::Result<Vec<Detection>> {
    let detect_one = |page: &(u32, PageBox, RgbaImage)| detector.detect_traced(&page.2);
    match workers {
        1 => Ok(rendered.iter().map(detect_one).collect()),
        0 => Ok(rendered.par_iter().map(detect_one).collect()),
        n => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| TicketOverlayError::detection(format!("thread pool: {e}")))?;
            Ok(pool.install(|| rendered.par_iter().map(detect_one).collect()))
        }
    }
}
