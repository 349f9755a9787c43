use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::job::QrPosition;

/// settings.yaml の内容。全フィールドにデフォルト値を持つ。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raster zoom used for QR detection (1.0 = 72 DPI).
    pub zoom: f64,
    /// Allowance above a QR code reserved for its text label, in page units.
    pub text_height: u32,
    pub side_padding: u32,
    pub bottom_padding: u32,
    /// Binary threshold for the second decode pass and the contour corner check.
    pub threshold: u8,
    pub opacity: f64,
    pub padding: u32,
    pub qr_scale: f64,
    pub qr_margin: u32,
    pub qr_position: QrPosition,
    pub mask_label: bool,
    /// Label band as fractions of the fragment height: `[start, end]`.
    pub label_band: [f64; 2],
    pub font_size: f32,
    /// Font files tried in order before falling back to system fonts.
    pub fonts: Vec<PathBuf>,
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            zoom: 2.0,
            text_height: 80,
            side_padding: 20,
            bottom_padding: 10,
            threshold: 127,
            opacity: 0.7,
            padding: 15,
            qr_scale: 1.0,
            qr_margin: 20,
            qr_position: QrPosition::Both,
            mask_label: true,
            label_band: [0.15, 0.30],
            font_size: 36.0,
            fonts: Vec::new(),
            parallel_workers: 1,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::TicketOverlayError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
