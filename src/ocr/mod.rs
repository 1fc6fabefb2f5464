pub mod tesseract;

use crate::render::PageImage;

/// Recognition settings shared by both OCR outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest<'a> {
    /// `eng`, `eng+fra`, ...
    pub language: &'a str,
    /// Engine-specific extra arguments, e.g. `--psm 1`.
    pub config: Option<&'a str>,
}

/// Split an engine config string into arguments with shell quoting rules.
///
/// `-c tessedit_char_whitelist="AB CD"` yields two arguments, the second
/// without quotes. Unbalanced quotes are a configuration error.
pub fn split_config(config: &str) -> crate::error::Result<Vec<String>> {
    shlex::split(config).ok_or_else(|| {
        crate::error::OcrPdfError::config(format!("unbalanced quoting in OCR config '{config}'"))
    })
}

/// Optical character recognition over a single page image.
///
/// Implementations should honor `page.dpi` so the synthetic page keeps the
/// physical size of the original.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Fails with `DependencyMissing` when the engine cannot be run.
    fn check_available(&self) -> crate::error::Result<()>;

    /// A single-page PDF holding the image and an invisible text layer.
    fn recognize_to_document(
        &self,
        page: &PageImage,
        request: &OcrRequest<'_>,
    ) -> crate::error::Result<Vec<u8>>;

    /// Plain recognized text.
    fn recognize_to_text(
        &self,
        page: &PageImage,
        request: &OcrRequest<'_>,
    ) -> crate::error::Result<String>;
}
