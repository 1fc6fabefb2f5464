use std::collections::HashMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, warn};

/// Page attributes a page may inherit from its `/Pages` ancestors.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Output document assembled one page at a time, in append order.
///
/// A page is linked into the page tree only after every object it needs has
/// been copied, so a failed append never leaves a partial page behind.
pub struct SearchablePdfWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    compress: bool,
}

impl Default for SearchablePdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchablePdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            compress: true,
        }
    }

    /// Toggle FlateDecode compression of unfiltered streams on save.
    ///
    /// Streams of pages copied from a source document are never recompressed.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// 現在までに追加されたページ数を返す。
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// `source` のページ(1-indexed)を参照先オブジェクトごと複製し、末尾に追加する。
    ///
    /// 戻り値は追加したページのオブジェクトID。
    pub fn copy_page_from(
        &mut self,
        source: &Document,
        page_num: u32,
    ) -> crate::error::Result<ObjectId> {
        let source_page_id = source.get_pages().get(&page_num).copied().ok_or_else(|| {
            crate::error::OcrPdfError::pdf_read(format!("page {page_num} not found"))
        })?;
        self.copy_page(source, source_page_id)
    }

    /// Append an unchanged copy of the page `source_page_id`.
    ///
    /// Copied streams keep their original bytes: they are never recompressed
    /// on save.
    pub fn copy_page(
        &mut self,
        source: &Document,
        source_page_id: ObjectId,
    ) -> crate::error::Result<ObjectId> {
        self.import_page(source, source_page_id, true)
    }

    fn import_page(
        &mut self,
        source: &Document,
        source_page_id: ObjectId,
        preserve_streams: bool,
    ) -> crate::error::Result<ObjectId> {
        let mut page_dict = source.get_dictionary(source_page_id)?.clone();

        for key in INHERITABLE_KEYS {
            if !page_dict.has(key)
                && let Some(value) = inherited_attribute(source, &page_dict, key)
            {
                page_dict.set(key.to_vec(), value);
            }
        }
        page_dict.remove(b"Parent");

        let new_page_id = self.doc.new_object_id();
        let mut copier = ObjectCopier {
            source,
            target: &mut self.doc,
            mapping: HashMap::from([(source_page_id, new_page_id)]),
            preserve_streams,
        };
        let mut copied = copier.copy_dictionary(&page_dict);
        copied.set("Parent", self.pages_id);
        self.doc.objects.insert(new_page_id, Object::Dictionary(copied));

        self.link_page(new_page_id);
        Ok(new_page_id)
    }

    /// Append the page of a single-page PDF (an OCR engine's output).
    ///
    /// Only the first page is taken; extra pages are reported and dropped so
    /// that one input page always yields one output page.
    pub fn append_pdf_bytes(&mut self, pdf_bytes: &[u8]) -> crate::error::Result<ObjectId> {
        let source = Document::load_mem(pdf_bytes)?;
        let pages = source.get_pages();
        let Some(&page_id) = pages.values().next() else {
            return Err(crate::error::OcrPdfError::pdf_read(
                "page document contains no pages",
            ));
        };
        if pages.len() > 1 {
            warn!(pages = pages.len(), "page document has extra pages, keeping the first");
        }
        // OCR output may be recompressed.
        self.import_page(&source, page_id, false)
    }

    /// 指定サイズ(pt)の白紙ページを末尾に追加する。
    pub fn add_blank_page(&mut self, width: f64, height: f64) -> ObjectId {
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, Vec::new())));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => dictionary! {},
            "Contents" => content_id,
        });
        self.link_page(page_id);
        page_id
    }

    fn link_page(&mut self, page_id: ObjectId) {
        self.kids.push(page_id);
        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );
    }

    /// PDFドキュメントをバイト列として出力する。
    pub fn save_to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        let mut doc = self.doc.clone();
        crate::pdf::optimizer::optimize(&mut doc, self.compress);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| crate::error::OcrPdfError::pdf_write(e.to_string()))?;
        debug!(pages = self.kids.len(), bytes = buf.len(), "PDF serialized");
        Ok(buf)
    }

    /// Serialize and write to `path` in one blocking call.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let bytes = self.save_to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            crate::error::OcrPdfError::write(format!("failed to write {}: {e}", path.display()))
        })
    }
}

/// 親ページツリーをたどって継承属性を探す。
fn inherited_attribute(source: &Document, page_dict: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent_ref = page_dict.get(b"Parent").and_then(Object::as_reference).ok();
    // Guard against malformed trees whose Parent chain loops.
    let mut depth = 0;
    while let Some(parent_id) = parent_ref {
        depth += 1;
        if depth > 64 {
            return None;
        }
        let parent = source.get_dictionary(parent_id).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_ref = parent.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Copies an object graph from one document into another, allocating each
/// source object exactly once.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    mapping: HashMap<ObjectId, ObjectId>,
    /// Mark copied streams so the optimizer leaves their bytes alone.
    preserve_streams: bool,
}

impl ObjectCopier<'_> {
    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            copied.set(key.clone(), self.copy_object(value));
        }
        copied
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict);
                let mut copied = Stream::new(dict, stream.content.clone());
                copied.allows_compression = stream.allows_compression && !self.preserve_streams;
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&mapped) = self.mapping.get(&id) {
            return Object::Reference(mapped);
        }

        let referenced = match self.source.get_object(id) {
            Ok(obj) => obj,
            Err(err) => {
                warn!(?id, %err, "cannot resolve reference, using Null");
                return Object::Null;
            }
        };

        // Other pages and page tree nodes (link targets, annotation owners)
        // would drag the whole source tree along.
        if let Object::Dictionary(dict) = referenced
            && let Ok(kind) = dict.get(b"Type").and_then(Object::as_name)
            && (kind == b"Page" || kind == b"Pages")
        {
            return Object::Null;
        }

        let new_id = self.target.new_object_id();
        self.mapping.insert(id, new_id);
        let copied = self.copy_object(referenced);
        self.target.objects.insert(new_id, copied);
        Object::Reference(new_id)
    }
}
