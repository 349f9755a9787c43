// QR detection cascade: direct decode -> thresholded decode -> contour heuristic

pub mod contour;
pub mod decode;

use std::panic::{AssertUnwindSafe, catch_unwind};

use image::{DynamicImage, GrayImage, RgbaImage};

use crate::geometry::DetectedRegion;
use contour::ContourParams;

/// One detection method of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// rqrr on the raster's luminance.
    Decoded,
    /// rqrr after a fixed binary threshold.
    Thresholded,
    /// Square contours with finder-like corners; no payload.
    ContourHeuristic,
}

impl Strategy {
    /// The cascade order.
    pub const CASCADE: [Strategy; 3] = [
        Strategy::Decoded,
        Strategy::Thresholded,
        Strategy::ContourHeuristic,
    ];

    /// Run this method. `None` means it found nothing or failed.
    fn run(self, gray: &GrayImage, params: &DetectorParams) -> Option<Vec<DetectedRegion>> {
        let attempt = catch_unwind(AssertUnwindSafe(|| match self {
            Strategy::Decoded => decode::decode_luma(gray),
            Strategy::Thresholded => decode::decode_thresholded(gray, params.threshold),
            Strategy::ContourHeuristic => contour::detect_by_contours(gray, &params.contour),
        }));

        match attempt {
            Ok(regions) if !regions.is_empty() => Some(regions),
            Ok(_) => None,
            Err(_) => {
                tracing::debug!(strategy = ?self, "detection method failed, treating as no detections");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorParams {
    /// Split point for the thresholded decode.
    pub threshold: u8,
    pub contour: ContourParams,
}

impl Default for DetectorParams {
    fn default() -> Self {
        DetectorParams {
            threshold: 127,
            contour: ContourParams::default(),
        }
    }
}

/// Outcome of one cascade run.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub regions: Vec<DetectedRegion>,
    /// The method that produced `regions`, if any did.
    pub strategy: Option<Strategy>,
    /// Methods that ran, in order.
    pub attempted: Vec<Strategy>,
}

/// Runs the detection cascade on rasterized pages.
///
/// Never fails: a method that errors counts as finding nothing, and a page
/// with no detections at all is a valid outcome.
#[derive(Debug, Clone)]
pub struct QrDetector {
    strategies: Vec<Strategy>,
    params: DetectorParams,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new(DetectorParams::default())
    }
}

impl QrDetector {
    pub fn new(params: DetectorParams) -> Self {
        QrDetector {
            strategies: Strategy::CASCADE.to_vec(),
            params,
        }
    }

    /// Restrict the cascade to a subset of methods, kept in the given order.
    pub fn with_strategies(mut self, strategies: &[Strategy]) -> Self {
        self.strategies = strategies.to_vec();
        self
    }

    /// Detect QR regions in a raster; coordinates are raster pixels.
    pub fn detect(&self, buffer: &RgbaImage) -> Vec<DetectedRegion> {
        self.detect_traced(buffer).regions
    }

    /// Like [`QrDetector::detect`], also reporting which methods ran.
    pub fn detect_traced(&self, buffer: &RgbaImage) -> Detection {
        // luminance copy; the caller's buffer stays untouched
        let gray = DynamicImage::ImageRgba8(buffer.clone()).to_luma8();

        let mut detection = Detection::default();
        for &strategy in &self.strategies {
            detection.attempted.push(strategy);
            if let Some(regions) = strategy.run(&gray, &self.params) {
                tracing::debug!(?strategy, count = regions.len(), "QR regions detected");
                detection.regions = regions;
                detection.strategy = Some(strategy);
                break;
            }
        }
        detection
    }
}
