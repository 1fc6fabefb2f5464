use crate::config::settings::DEFAULT_TEXT_THRESHOLD;
use crate::pdf::reader::SourceDocument;

/// Whether the page already carries enough selectable text to skip OCR.
///
/// The page qualifies when its extracted text, trimmed, is longer than
/// `threshold` characters. Any extraction failure counts as "no text".
pub fn has_sufficient_text_with_threshold(
    document: &dyn SourceDocument,
    page_index: usize,
    threshold: usize,
) -> bool {
    if page_index >= document.page_count() {
        return false;
    }
    match document.page_text(page_index) {
        Ok(Some(text)) => text.trim().chars().count() > threshold,
        Ok(None) | Err(_) => false,
    }
}

/// [`has_sufficient_text_with_threshold`] with the default 20-character threshold.
pub fn has_sufficient_text(document: &dyn SourceDocument, page_index: usize) -> bool {
    has_sufficient_text_with_threshold(document, page_index, DEFAULT_TEXT_THRESHOLD)
}
