use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketOverlayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Detection error: {0}")]
    DetectionError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`TicketOverlayError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl TicketOverlayError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an input validation error.
    input => InputError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a render error.
    render => RenderError,
    /// Create a detection error.
    detection => DetectionError,
    /// Create an image error.
    image => ImageError,
    /// Create a font error.
    font => FontError,
}

impl From<lopdf::Error> for TicketOverlayError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for TicketOverlayError {
    fn from(e: serde_json::Error) -> Self {
        Self::ReportError(e.to_string())
    }
}

impl From<serde_yml::Error> for TicketOverlayError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "pdfium")]
impl From<pdfium_render::prelude::PdfiumError> for TicketOverlayError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for TicketOverlayError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TicketOverlayError>;
