use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrPdfError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Dependency missing: {0}")]
    DependencyMissing(String),

    #[error("Input error: {0}")]
    InputResolutionError(String),

    #[error("Rasterization error: {0}")]
    RasterizationError(String),

    #[error("OCR engine error: {0}")]
    OcrEngineError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("Page processing error: {0}")]
    PageProcessingError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Scope an error is allowed to abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// Aborts the whole run before any document is touched.
    Startup,
    /// Aborts one document; the batch continues.
    Document,
    /// Absorbed by the page fallback chain.
    Page,
}

impl OcrPdfError {
    pub fn tier(&self) -> ErrorTier {
        match self {
            Self::ConfigError(_) | Self::DependencyMissing(_) | Self::InputResolutionError(_) => {
                ErrorTier::Startup
            }
            Self::PageProcessingError(_) => ErrorTier::Page,
            Self::RasterizationError(_)
            | Self::OcrEngineError(_)
            | Self::PdfReadError(_)
            | Self::PdfWriteError(_)
            | Self::WriteError(_)
            | Self::IoError(_) => ErrorTier::Document,
        }
    }
}

/// Generates factory methods for [`OcrPdfError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl OcrPdfError {
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
    /// Create a missing-dependency error.
    dependency => DependencyMissing,
    /// Create an input resolution error.
    input => InputResolutionError,
    /// Create a rasterization error.
    rasterize => RasterizationError,
    /// Create an OCR engine error.
    ocr => OcrEngineError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a page processing error.
    page => PageProcessingError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create an output write error.
    write => WriteError,
}

impl From<lopdf::Error> for OcrPdfError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for OcrPdfError {
    fn from(e: serde_json::Error) -> Self {
        Self::WriteError(e.to_string())
    }
}

impl From<serde_yml::Error> for OcrPdfError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for OcrPdfError {
    fn from(e: image::ImageError) -> Self {
        Self::OcrEngineError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OcrPdfError>;
