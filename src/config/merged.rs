use std::path::PathBuf;

use super::job::{Job, QrPosition};
use super::settings::Settings;
use crate::error::TicketOverlayError;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub zoom: f64,
    pub text_height: u32,
    pub side_padding: u32,
    pub bottom_padding: u32,
    pub threshold: u8,
    pub opacity: f64,
    pub padding: u32,
    pub qr_scale: f64,
    pub qr_margin: u32,
    pub qr_position: QrPosition,
    pub start_number: Option<i64>,
    pub mask_label: bool,
    pub label_band: [f64; 2],
    pub font_size: f32,
    pub fonts: Vec<PathBuf>,
    pub parallel_workers: usize,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            zoom: job.zoom.unwrap_or(settings.zoom),
            text_height: job.text_height.unwrap_or(settings.text_height),
            side_padding: settings.side_padding,
            bottom_padding: settings.bottom_padding,
            threshold: settings.threshold,
            opacity: job.opacity.unwrap_or(settings.opacity),
            padding: job.padding.unwrap_or(settings.padding),
            qr_scale: job.qr_scale.unwrap_or(settings.qr_scale),
            qr_margin: job.qr_margin.unwrap_or(settings.qr_margin),
            qr_position: job.qr_position.unwrap_or(settings.qr_position),
            start_number: job.start_number,
            mask_label: job.mask_label.unwrap_or(settings.mask_label),
            label_band: settings.label_band,
            font_size: settings.font_size,
            fonts: settings.fonts.clone(),
            parallel_workers: settings.parallel_workers,
        }
    }

    /// 数値パラメータの範囲を検証する。
    ///
    /// 処理開始前に呼ぶこと。compositor は opacity を clamp しない。
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(TicketOverlayError::input(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }
        if !self.qr_scale.is_finite() || self.qr_scale <= 0.0 {
            return Err(TicketOverlayError::input(format!(
                "qr_scale must be positive, got {}",
                self.qr_scale
            )));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(TicketOverlayError::input(format!(
                "zoom must be positive, got {}",
                self.zoom
            )));
        }
        let [start, end] = self.label_band;
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start >= end {
            return Err(TicketOverlayError::input(format!(
                "label_band must satisfy 0 <= start < end <= 1, got [{start}, {end}]"
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(TicketOverlayError::input(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }

    /// Whether fragments get the label band blanked (and possibly numbered).
    ///
    /// A start number implies masking, since the number is drawn into the band.
    pub fn masks_label(&self) -> bool {
        self.mask_label || self.start_number.is_some()
    }
}
