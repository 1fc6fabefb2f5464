// Shared fixtures: lopdf-generated PDFs and in-process collaborator fakes.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};
use pdf_ocr::error::{OcrPdfError, Result};
use pdf_ocr::ocr::{OcrEngine, OcrRequest};
use pdf_ocr::pdf::reader::{PdfReader, SourceDocument};
use pdf_ocr::pdf::writer::SearchablePdfWriter;
use pdf_ocr::render::{PageImage, Rasterizer};

// ============================================================
// PDF builders
// ============================================================

/// Content stream drawing `text` with the page font, or an empty stream.
pub fn text_content(text: Option<&str>) -> Vec<u8> {
    match text {
        Some(t) => format!("BT /F1 12 Tf 72 720 Td ({t}) Tj ET").into_bytes(),
        None => Vec::new(),
    }
}

/// Multi-page Letter-size PDF; page i draws `pages[i]` (or nothing).
pub fn build_pdf(pages: &[Option<&str>]) -> Document {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, text_content(*text)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    // MediaBox and Resources are inherited from the page tree node.
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(pages.len() as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn build_pdf_bytes(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = build_pdf(pages);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save test PDF");
    buf
}

pub fn write_pdf(path: &Path, pages: &[Option<&str>]) {
    std::fs::write(path, build_pdf_bytes(pages)).expect("write test PDF");
}

/// The marker an OCR fake draws on the page it synthesizes for `page_index`.
pub fn ocr_marker(page_index: usize) -> String {
    format!("OCR page {page_index}")
}

/// Decoded content streams of every page, in page order.
pub fn page_contents(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = doc.get_page_content(id).expect("page content");
            String::from_utf8_lossy(&content).into_owned()
        })
        .collect()
}

/// The page's content stream exactly as stored, without decoding.
pub fn raw_page_stream(doc: &Document, page_num: u32) -> Stream {
    let page_id = *doc.get_pages().get(&page_num).expect("page");
    let contents = doc
        .get_dictionary(page_id)
        .expect("page dict")
        .get(b"Contents")
        .and_then(Object::as_reference)
        .expect("Contents reference");
    doc.get_object(contents)
        .and_then(Object::as_stream)
        .expect("content stream")
        .clone()
}

pub fn saved_document(writer: &SearchablePdfWriter) -> Document {
    let bytes = writer.save_to_bytes().expect("serialize output");
    Document::load_mem(&bytes).expect("reload output")
}

pub fn page_image(page_index: usize) -> PageImage {
    PageImage {
        page_index,
        dpi: 72,
        image: DynamicImage::ImageRgb8(RgbImage::new(8, 8)),
    }
}

pub fn page_images(count: usize) -> Vec<PageImage> {
    (0..count).map(page_image).collect()
}

// ============================================================
// Collaborator fakes
// ============================================================

/// Produces one blank image per PDF page; fails for inputs whose file name
/// contains `fail_marker`.
#[derive(Default)]
pub struct FakeRasterizer {
    pub fail_marker: Option<String>,
    pub unavailable: bool,
    pub calls: AtomicUsize,
}

impl FakeRasterizer {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for FakeRasterizer {
    fn name(&self) -> &str {
        "fake-rasterizer"
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(OcrPdfError::dependency("fake rasterizer unavailable"))
        } else {
            Ok(())
        }
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<PageImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(marker) = &self.fail_marker
            && name.contains(marker.as_str())
        {
            return Err(OcrPdfError::rasterize(format!("cannot rasterize {name}")));
        }
        let doc = Document::load(pdf_path)
            .map_err(|e| OcrPdfError::rasterize(e.to_string()))?;
        Ok((0..doc.get_pages().len())
            .map(|page_index| PageImage {
                dpi,
                ..page_image(page_index)
            })
            .collect())
    }
}

/// OCR fake: synthesizes a one-page PDF drawing [`ocr_marker`] and returns
/// the configured text for each page.
#[derive(Default)]
pub struct FakeOcr {
    /// Pages whose `recognize_to_document` fails.
    pub fail_document: HashSet<usize>,
    /// Pages whose `recognize_to_text` fails.
    pub fail_text: HashSet<usize>,
    /// Per-page text; missing pages yield `"text {index}"`.
    pub texts: Vec<(usize, String)>,
    pub unavailable: bool,
    /// Page indices sent to `recognize_to_document`, in call order.
    pub document_calls: Mutex<Vec<usize>>,
    /// Requests seen, as (language, config).
    pub requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeOcr {
    pub fn failing_document(pages: &[usize]) -> Self {
        Self {
            fail_document: pages.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn with_texts(texts: &[(usize, &str)]) -> Self {
        Self {
            texts: texts.iter().map(|(i, t)| (*i, t.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<usize> {
        self.document_calls.lock().expect("lock").clone()
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake-ocr"
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(OcrPdfError::dependency("fake OCR engine unavailable"))
        } else {
            Ok(())
        }
    }

    fn recognize_to_document(&self, page: &PageImage, request: &OcrRequest<'_>) -> Result<Vec<u8>> {
        self.document_calls
            .lock()
            .expect("lock")
            .push(page.page_index);
        self.requests.lock().expect("lock").push((
            request.language.to_string(),
            request.config.map(str::to_string),
        ));
        if self.fail_document.contains(&page.page_index) {
            return Err(OcrPdfError::ocr(format!(
                "recognition failed on page {}",
                page.page_index
            )));
        }
        Ok(build_pdf_bytes(&[Some(ocr_marker(page.page_index).as_str())]))
    }

    fn recognize_to_text(&self, page: &PageImage, _request: &OcrRequest<'_>) -> Result<String> {
        if self.fail_text.contains(&page.page_index) {
            return Err(OcrPdfError::ocr("text recognition failed"));
        }
        Ok(self
            .texts
            .iter()
            .find(|(i, _)| *i == page.page_index)
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| format!("text {}", page.page_index)))
    }
}

/// A real reader whose page copies fail for selected pages.
pub struct FlakyCopy {
    pub inner: PdfReader,
    pub fail_copy: HashSet<usize>,
}

impl FlakyCopy {
    pub fn new(pages: &[Option<&str>], fail_copy: &[usize]) -> Self {
        Self {
            inner: PdfReader::from_bytes(&build_pdf_bytes(pages)).expect("load test PDF"),
            fail_copy: fail_copy.iter().copied().collect(),
        }
    }
}

impl SourceDocument for FlakyCopy {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_text(&self, page_index: usize) -> Result<Option<String>> {
        self.inner.page_text(page_index)
    }

    fn copy_page_into(&self, page_index: usize, writer: &mut SearchablePdfWriter) -> Result<()> {
        if self.fail_copy.contains(&page_index) {
            return Err(OcrPdfError::pdf_read(format!(
                "cannot copy page {page_index}"
            )));
        }
        self.inner.copy_page_into(page_index, writer)
    }
}

/// Page texts served straight from memory; `None` entries fail extraction.
pub struct TextOnly(pub Vec<Option<String>>);

impl SourceDocument for TextOnly {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&self, page_index: usize) -> Result<Option<String>> {
        match self.0.get(page_index) {
            Some(Some(text)) => Ok(Some(text.clone())),
            _ => Err(OcrPdfError::pdf_read("no text layer")),
        }
    }

    fn copy_page_into(&self, _page_index: usize, _writer: &mut SearchablePdfWriter) -> Result<()> {
        Err(OcrPdfError::pdf_read("in-memory document has no pages"))
    }
}

pub fn temp_pdf(dir: &Path, name: &str, pages: &[Option<&str>]) -> PathBuf {
    let path = dir.join(name);
    write_pdf(&path, pages);
    path
}
