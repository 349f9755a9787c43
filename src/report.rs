// JSON detection record: per-page QR regions in page space plus ticket text

use serde::Serialize;

use crate::geometry::DetectedRegion;
use crate::ticket_text::TicketInfo;

/// One QR code in page units. Division by zoom is not truncated here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrRecord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub data: String,
}

impl QrRecord {
    pub fn from_region(region: &DetectedRegion, zoom: f64) -> Self {
        QrRecord {
            x: region.x as f64 / zoom,
            y: region.y as f64 / zoom,
            width: region.width as f64 / zoom,
            height: region.height as f64 / zoom,
            data: region.payload.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// 0-indexed.
    pub page_num: u32,
    pub width: f64,
    pub height: f64,
    pub qr_codes: Vec<QrRecord>,
    pub tickets: Vec<TicketInfo>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionReport {
    pub pages: Vec<PageReport>,
    pub total_tickets: usize,
    pub total_qr_codes: usize,
}

impl DetectionReport {
    pub fn push_page(&mut self, page: PageReport) {
        self.total_tickets += page.tickets.len();
        self.total_qr_codes += page.qr_codes.len();
        self.pages.push(page);
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
