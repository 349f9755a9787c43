use serde::Deserialize;

/// 処理モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Composite the design over every page, keeping QR regions visible.
    #[default]
    Overlay,
    /// Cut each QR box out and place it on a fresh page per ticket.
    Tickets,
    /// Detect only and emit the JSON detection record.
    Inspect,
}

/// Where extracted QR boxes go on a generated ticket page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrPosition {
    Left,
    Right,
    Both,
}

impl QrPosition {
    /// Human readable placement, used in the run summary.
    pub fn describe(self) -> &'static str {
        match self {
            QrPosition::Left => "bottom-left",
            QrPosition::Right => "bottom-right",
            QrPosition::Both => "bottom-left and bottom-right",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub mode: JobMode,
    pub input: String,
    pub design: Option<String>,
    pub output: Option<String>,
    pub report: Option<String>,
    pub opacity: Option<f64>,
    pub padding: Option<u32>,
    pub qr_scale: Option<f64>,
    pub qr_margin: Option<u32>,
    pub qr_position: Option<QrPosition>,
    pub start_number: Option<i64>,
    pub mask_label: Option<bool>,
    pub zoom: Option<f64>,
    pub text_height: Option<u32>,
}

impl Job {
    /// モードごとの必須フィールドを検証する。
    ///
    /// `overlay` と `tickets` は `design` と `output` を必要とし、
    /// `inspect` は `input` のみで動作する。
    pub fn check_required_fields(&self) -> crate::error::Result<()> {
        if self.input.trim().is_empty() {
            return Err(crate::error::TicketOverlayError::config(
                "job input path cannot be empty",
            ));
        }
        if matches!(self.mode, JobMode::Overlay | JobMode::Tickets) {
            if self.design.is_none() {
                return Err(crate::error::TicketOverlayError::config(format!(
                    "job '{}' needs a design image for {:?} mode",
                    self.input, self.mode
                )));
            }
            if self.output.is_none() {
                return Err(crate::error::TicketOverlayError::config(format!(
                    "job '{}' needs an output path for {:?} mode",
                    self.input, self.mode
                )));
            }
        }
        Ok(())
    }
}
