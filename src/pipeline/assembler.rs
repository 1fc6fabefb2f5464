// ページ単位処理: 既存テキスト判定 → 元ページ複製 or OCR → 出力PDFへ追加

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::settings::{DEFAULT_BLANK_PAGE_SIZE, DEFAULT_LANG, DEFAULT_TEXT_THRESHOLD};
use crate::error::{ErrorTier, OcrPdfError};
use crate::ocr::{OcrEngine, OcrRequest};
use crate::pdf::reader::SourceDocument;
use crate::pdf::writer::SearchablePdfWriter;
use crate::pipeline::classifier::has_sufficient_text_with_threshold;
use crate::render::PageImage;

/// Inserted between non-empty page texts in the combined text output.
pub const PAGE_BREAK: &str = "\n\n=== PAGE BREAK ===\n\n";

/// Per-document assembly options.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Copy pages that already carry selectable text instead of OCRing them.
    pub skip_if_text: bool,
    /// Accumulate page text for a text output.
    pub wants_text: bool,
    pub language: String,
    pub ocr_config: Option<String>,
    pub text_threshold: usize,
    /// Size in points of the page substituted when every fallback failed.
    pub blank_page_size: (f64, f64),
    pub compress: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            skip_if_text: false,
            wants_text: false,
            language: DEFAULT_LANG.to_string(),
            ocr_config: None,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
            blank_page_size: (DEFAULT_BLANK_PAGE_SIZE[0], DEFAULT_BLANK_PAGE_SIZE[1]),
            compress: true,
        }
    }
}

/// Where an output page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDisposition {
    /// Existing text found; original page copied unchanged.
    Original,
    /// Replaced by the OCR engine's synthetic page.
    Ocr,
    /// Copying the text page failed, so it was OCRed instead.
    OcrAfterCopyFailure,
    /// OCR failed; original page copied as a fallback.
    OriginalFallback,
    /// Everything failed; a blank page keeps the page count.
    Blank,
}

impl PageDisposition {
    /// True when the page lost its OCR layer or content.
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::OriginalFallback | Self::Blank)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// 0-based input page index.
    pub index: usize,
    pub disposition: PageDisposition,
    /// Last failure seen while producing this page, if any.
    pub error: Option<String>,
}

/// Result of assembling one document.
pub struct Assembly {
    pub writer: SearchablePdfWriter,
    pub pages: Vec<PageReport>,
    page_texts: Vec<String>,
}

impl Assembly {
    pub fn page_count(&self) -> usize {
        self.writer.page_count()
    }

    /// Per-page texts in page order, as collected.
    pub fn page_texts(&self) -> &[String] {
        &self.page_texts
    }

    /// Non-empty page texts, trimmed and joined with [`PAGE_BREAK`].
    pub fn text(&self) -> String {
        self.page_texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_BREAK)
    }
}

/// [`assemble_with_progress`] without a page callback.
pub fn assemble(
    document: &dyn SourceDocument,
    page_images: &[PageImage],
    ocr: &dyn OcrEngine,
    options: &AssembleOptions,
) -> Assembly {
    assemble_with_progress(document, page_images, ocr, options, &mut |_: &PageReport| {})
}

/// Build the output document page by page, in input order.
///
/// Every processed page contributes exactly one output page: the original,
/// an OCR page, or a blank page when all else failed. Page failures are
/// logged and recorded in [`Assembly::pages`], never returned.
///
/// When the rasterizer and the reader disagree on the page count, only the
/// pages present in both are processed.
pub fn assemble_with_progress(
    document: &dyn SourceDocument,
    page_images: &[PageImage],
    ocr: &dyn OcrEngine,
    options: &AssembleOptions,
    on_page: &mut dyn FnMut(&PageReport),
) -> Assembly {
    let page_count = document.page_count();
    if page_images.len() != page_count {
        warn!(
            images = page_images.len(),
            pages = page_count,
            "rasterizer returned a different number of images than the PDF has pages"
        );
    }
    let processed = page_images.len().min(page_count);

    let mut ctx = PageContext {
        document,
        ocr,
        options,
        request: OcrRequest {
            language: &options.language,
            config: options.ocr_config.as_deref(),
        },
        writer: SearchablePdfWriter::new().with_compression(options.compress),
        page_texts: Vec::new(),
    };

    let mut pages = Vec::with_capacity(processed);
    for (index, image) in page_images.iter().take(processed).enumerate() {
        let report = ctx.process_page(index, image);
        on_page(&report);
        pages.push(report);
    }

    Assembly {
        writer: ctx.writer,
        pages,
        page_texts: ctx.page_texts,
    }
}

/// State private to one document's assembly.
struct PageContext<'a> {
    document: &'a dyn SourceDocument,
    ocr: &'a dyn OcrEngine,
    options: &'a AssembleOptions,
    request: OcrRequest<'a>,
    writer: SearchablePdfWriter,
    page_texts: Vec<String>,
}

impl PageContext<'_> {
    fn process_page(&mut self, index: usize, image: &PageImage) -> PageReport {
        let page_num = index + 1;
        let mut copy_error = None;

        if self.options.skip_if_text
            && has_sufficient_text_with_threshold(self.document, index, self.options.text_threshold)
        {
            match self.document.copy_page_into(index, &mut self.writer) {
                Ok(()) => {
                    debug!(page = page_num, "existing text found, copied original page");
                    if self.options.wants_text {
                        let text = self
                            .document
                            .page_text(index)
                            .ok()
                            .flatten()
                            .unwrap_or_default();
                        self.page_texts.push(text);
                    }
                    return PageReport {
                        index,
                        disposition: PageDisposition::Original,
                        error: None,
                    };
                }
                Err(e) => {
                    warn!(page = page_num, error = %e, "failed to copy original page, falling back to OCR");
                    copy_error = Some(e.to_string());
                }
            }
        }

        match self.ocr_page(index, image) {
            Ok(text) => {
                if let Some(text) = text {
                    self.page_texts.push(text);
                }
                let disposition = if copy_error.is_some() {
                    PageDisposition::OcrAfterCopyFailure
                } else {
                    PageDisposition::Ocr
                };
                PageReport {
                    index,
                    disposition,
                    error: copy_error,
                }
            }
            Err(e) => {
                error!(page = page_num, error = %e, "error processing page");
                self.fallback(index, e)
            }
        }
    }

    /// OCR the page and append the result. Nothing is appended unless every
    /// fallible step succeeded.
    fn ocr_page(&mut self, index: usize, image: &PageImage) -> crate::error::Result<Option<String>> {
        let page_num = index + 1;
        let pdf_bytes = self
            .ocr
            .recognize_to_document(image, &self.request)
            .map_err(|e| OcrPdfError::page(format!("page {page_num}: {e}")))?;
        let text = if self.options.wants_text {
            Some(
                self.ocr
                    .recognize_to_text(image, &self.request)
                    .map_err(|e| OcrPdfError::page(format!("page {page_num}: {e}")))?,
            )
        } else {
            None
        };
        self.writer
            .append_pdf_bytes(&pdf_bytes)
            .map_err(|e| OcrPdfError::page(format!("page {page_num}: {e}")))?;
        Ok(text)
    }

    /// Original page if it can be copied, otherwise a blank page.
    fn fallback(&mut self, index: usize, cause: OcrPdfError) -> PageReport {
        debug_assert_eq!(cause.tier(), ErrorTier::Page, "fallback only absorbs page errors");
        match self.document.copy_page_into(index, &mut self.writer) {
            Ok(()) => PageReport {
                index,
                disposition: PageDisposition::OriginalFallback,
                error: Some(cause.to_string()),
            },
            Err(copy_err) => {
                warn!(page = index + 1, error = %copy_err, "fallback copy failed, inserting blank page");
                let (width, height) = self.options.blank_page_size;
                self.writer.add_blank_page(width, height);
                PageReport {
                    index,
                    disposition: PageDisposition::Blank,
                    error: Some(cause.to_string()),
                }
            }
        }
    }
}
