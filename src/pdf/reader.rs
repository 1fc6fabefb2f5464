use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::pdf::writer::SearchablePdfWriter;

/// Read-only view of an input document, as seen by the page assembler.
///
/// Page indices are 0-based.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Existing text of the page, `None` when the page carries none.
    fn page_text(&self, page_index: usize) -> crate::error::Result<Option<String>>;

    /// Append an unchanged copy of the page to `writer`.
    fn copy_page_into(
        &self,
        page_index: usize,
        writer: &mut SearchablePdfWriter,
    ) -> crate::error::Result<()>;
}

/// TJ adjustments below this (thousandths of text space) read as a word gap.
const WORD_GAP: f32 = -200.0;

pub struct PdfReader {
    doc: Document,
    /// Page object ids in page order, resolved once at load.
    page_ids: Vec<ObjectId>,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| {
            crate::error::OcrPdfError::pdf_read(format!("failed to open {}: {e}", path.display()))
        })?;
        Ok(Self::from_document(doc))
    }

    /// メモリ上のPDFバイト列からPdfReaderを作成する。
    pub fn from_bytes(data: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: Document) -> Self {
        // get_pages() walks the whole page tree; do it once.
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(pages = page_ids.len(), "PDF loaded");
        Self { doc, page_ids }
    }

    fn page_id(&self, page_index: usize) -> crate::error::Result<ObjectId> {
        self.page_ids.get(page_index).copied().ok_or_else(|| {
            crate::error::OcrPdfError::pdf_read(format!(
                "page index {page_index} out of range (document has {} pages)",
                self.page_ids.len()
            ))
        })
    }

    /// Text shown by the page's content stream, decoded with each font's encoding.
    fn extract_page_text(&self, page_id: ObjectId) -> crate::error::Result<String> {
        let fonts = self.doc.get_page_fonts(page_id)?;
        let content = self.doc.get_and_decode_page_content(page_id)?;

        let mut text = String::new();
        let mut current_font: Vec<u8> = Vec::new();
        let decode = |font: &[u8], bytes: &[u8], out: &mut String| {
            let decoded = fonts
                .get(font)
                .and_then(|f| f.get_font_encoding(&self.doc).ok())
                .and_then(|enc| Document::decode_text(&enc, bytes).ok());
            match decoded {
                Some(s) => out.push_str(&s),
                None => out.push_str(&String::from_utf8_lossy(bytes)),
            }
        };

        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    if let Some(Ok(name)) = op.operands.first().map(Object::as_name) {
                        current_font = name.to_vec();
                    }
                }
                "Tj" | "'" | "\"" => {
                    if op.operator != "Tj" {
                        text.push('\n');
                    }
                    if let Some(Object::String(bytes, _)) = op.operands.last() {
                        decode(&current_font, bytes, &mut text);
                    }
                }
                "TJ" => {
                    let Some(Object::Array(items)) = op.operands.first() else {
                        continue;
                    };
                    for item in items {
                        match item {
                            Object::String(bytes, _) => decode(&current_font, bytes, &mut text),
                            Object::Integer(n) if (*n as f32) < WORD_GAP => text.push(' '),
                            Object::Real(n) if *n < WORD_GAP => text.push(' '),
                            _ => {}
                        }
                    }
                }
                "T*" | "ET" => text.push('\n'),
                _ => {}
            }
        }
        Ok(text)
    }
}

impl SourceDocument for PdfReader {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_text(&self, page_index: usize) -> crate::error::Result<Option<String>> {
        let page_id = self.page_id(page_index)?;
        let text = self.extract_page_text(page_id)?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn copy_page_into(
        &self,
        page_index: usize,
        writer: &mut SearchablePdfWriter,
    ) -> crate::error::Result<()> {
        let page_id = self.page_id(page_index)?;
        writer.copy_page(&self.doc, page_id)?;
        Ok(())
    }
}
