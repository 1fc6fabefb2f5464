// Page assembler: page-count, ordering, skip-if-text and fallback behavior

mod common;

use common::{
    FakeOcr, FlakyCopy, build_pdf_bytes, ocr_marker, page_contents, page_images, raw_page_stream,
    saved_document, text_content,
};
use pdf_ocr::pdf::reader::PdfReader;
use pdf_ocr::pipeline::assembler::{
    AssembleOptions, PAGE_BREAK, PageDisposition, PageReport, assemble, assemble_with_progress,
};

const LONG_A: &str = "This page already carries plenty of selectable text A";
const LONG_B: &str = "This page already carries plenty of selectable text B";

fn reader(pages: &[Option<&str>]) -> PdfReader {
    PdfReader::from_bytes(&build_pdf_bytes(pages)).expect("load test PDF")
}

fn skip_options() -> AssembleOptions {
    AssembleOptions {
        skip_if_text: true,
        ..AssembleOptions::default()
    }
}

fn dispositions(pages: &[PageReport]) -> Vec<PageDisposition> {
    pages.iter().map(|p| p.disposition).collect()
}

// ============================================================
// 1. Page count and ordering
// ============================================================

#[test]
fn test_all_pages_ocred_in_order() {
    let doc = reader(&[None, None, None]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(3), &ocr, &AssembleOptions::default());

    assert_eq!(assembly.page_count(), 3);
    assert_eq!(ocr.calls(), vec![0, 1, 2]);
    assert_eq!(
        dispositions(&assembly.pages),
        vec![PageDisposition::Ocr; 3]
    );

    let output = saved_document(&assembly.writer);
    let contents = page_contents(&output);
    for (i, content) in contents.iter().enumerate() {
        assert!(
            content.contains(&ocr_marker(i)),
            "output page {i} should come from input page {i}, got: {content}"
        );
    }
}

#[test]
fn test_page_count_holds_under_failures() {
    // page 1: OCR fails, original copied; page 3: OCR and copy fail, blank page
    let doc = FlakyCopy::new(&[None, None, None, None, None], &[3]);
    let ocr = FakeOcr::failing_document(&[1, 3]);

    let assembly = assemble(&doc, &page_images(5), &ocr, &AssembleOptions::default());

    assert_eq!(assembly.page_count(), 5);
    assert_eq!(
        dispositions(&assembly.pages),
        vec![
            PageDisposition::Ocr,
            PageDisposition::OriginalFallback,
            PageDisposition::Ocr,
            PageDisposition::Blank,
            PageDisposition::Ocr,
        ]
    );
    assert!(assembly.pages[1].error.is_some());
    assert!(assembly.pages[3].error.is_some());

    let output = saved_document(&assembly.writer);
    assert_eq!(output.get_pages().len(), 5);
    let contents = page_contents(&output);
    assert!(contents[0].contains(&ocr_marker(0)));
    assert!(contents[1].is_empty(), "fallback copies the (empty) original");
    assert!(contents[2].contains(&ocr_marker(2)));
    assert!(contents[3].is_empty(), "blank page has no content");
    assert!(contents[4].contains(&ocr_marker(4)));
}

#[test]
fn test_blank_page_uses_configured_size() {
    let doc = FlakyCopy::new(&[None], &[0]);
    let ocr = FakeOcr::failing_document(&[0]);
    let options = AssembleOptions {
        blank_page_size: (300.0, 400.0),
        ..AssembleOptions::default()
    };

    let assembly = assemble(&doc, &page_images(1), &ocr, &options);
    assert_eq!(dispositions(&assembly.pages), vec![PageDisposition::Blank]);

    let output = saved_document(&assembly.writer);
    let page_id = *output.get_pages().get(&1).expect("page 1");
    let media_box = output
        .get_dictionary(page_id)
        .expect("page dict")
        .get(b"MediaBox")
        .expect("MediaBox")
        .as_array()
        .expect("array")
        .clone();
    let width = media_box[2].as_float().expect("width");
    let height = media_box[3].as_float().expect("height");
    assert_eq!((width, height), (300.0, 400.0));
}

#[test]
fn test_text_failure_after_recognition_still_yields_one_page() {
    let doc = reader(&[None, None]);
    let ocr = FakeOcr {
        fail_text: [0].into_iter().collect(),
        ..FakeOcr::default()
    };
    let options = AssembleOptions {
        wants_text: true,
        ..AssembleOptions::default()
    };

    let assembly = assemble(&doc, &page_images(2), &ocr, &options);

    assert_eq!(assembly.page_count(), 2);
    assert_eq!(
        dispositions(&assembly.pages),
        vec![PageDisposition::OriginalFallback, PageDisposition::Ocr]
    );
    assert_eq!(assembly.text(), "text 1");
}

// ============================================================
// 2. Skip-if-text
// ============================================================

#[test]
fn test_text_page_copied_unchanged_without_ocr() {
    let doc = reader(&[Some(LONG_A), None]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(2), &ocr, &skip_options());

    assert_eq!(
        dispositions(&assembly.pages),
        vec![PageDisposition::Original, PageDisposition::Ocr]
    );
    assert_eq!(ocr.calls(), vec![1], "text page must not reach the OCR engine");

    // Default options compress on save; the copied page must keep its bytes.
    let output = saved_document(&assembly.writer);
    let original = raw_page_stream(&output, 1);
    assert!(!original.dict.has(b"Filter"), "copied stream must not be re-encoded");
    assert_eq!(original.content, text_content(Some(LONG_A)));

    let contents = page_contents(&output);
    assert!(contents[1].contains(&ocr_marker(1)));
}

#[test]
fn test_text_pages_ocred_when_skip_disabled() {
    let doc = reader(&[Some(LONG_A)]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(1), &ocr, &AssembleOptions::default());

    assert_eq!(dispositions(&assembly.pages), vec![PageDisposition::Ocr]);
    assert_eq!(ocr.calls(), vec![0]);
}

#[test]
fn test_short_text_page_is_ocred() {
    let doc = reader(&[Some("Page 7")]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(1), &ocr, &skip_options());

    assert_eq!(dispositions(&assembly.pages), vec![PageDisposition::Ocr]);
}

#[test]
fn test_failed_copy_reroutes_through_ocr() {
    let doc = FlakyCopy::new(&[Some(LONG_A), Some(LONG_B)], &[0]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(2), &ocr, &skip_options());

    assert_eq!(assembly.page_count(), 2);
    assert_eq!(
        dispositions(&assembly.pages),
        vec![PageDisposition::OcrAfterCopyFailure, PageDisposition::Original]
    );
    assert!(assembly.pages[0].error.is_some());
    assert_eq!(ocr.calls(), vec![0]);

    let contents = page_contents(&saved_document(&assembly.writer));
    assert!(contents[0].contains(&ocr_marker(0)));
    assert!(contents[1].contains(LONG_B));
}

// ============================================================
// 3. Text accumulation
// ============================================================

#[test]
fn test_text_accumulates_in_page_order() {
    let doc = reader(&[None, Some(LONG_B), None]);
    let ocr = FakeOcr::with_texts(&[(0, "A"), (2, "C")]);
    let options = AssembleOptions {
        skip_if_text: true,
        wants_text: true,
        ..AssembleOptions::default()
    };

    let assembly = assemble(&doc, &page_images(3), &ocr, &options);

    assert_eq!(
        dispositions(&assembly.pages),
        vec![
            PageDisposition::Ocr,
            PageDisposition::Original,
            PageDisposition::Ocr
        ]
    );
    let expected = format!("A{PAGE_BREAK}{LONG_B}{PAGE_BREAK}C");
    assert_eq!(assembly.text(), expected);
}

#[test]
fn test_empty_page_texts_get_no_separator() {
    let doc = reader(&[None, None, None]);
    let ocr = FakeOcr::with_texts(&[(0, "  first \n"), (1, " \n "), (2, "third")]);
    let options = AssembleOptions {
        wants_text: true,
        ..AssembleOptions::default()
    };

    let assembly = assemble(&doc, &page_images(3), &ocr, &options);

    assert_eq!(assembly.page_texts().len(), 3);
    assert_eq!(assembly.text(), format!("first{PAGE_BREAK}third"));
}

#[test]
fn test_no_text_collected_unless_requested() {
    let doc = reader(&[None]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(1), &ocr, &AssembleOptions::default());

    assert!(assembly.page_texts().is_empty());
    assert_eq!(assembly.text(), "");
}

// ============================================================
// 4. Length mismatch, options, progress
// ============================================================

#[test]
fn test_fewer_images_than_pages_processes_shorter() {
    let doc = reader(&[None, None, None]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(2), &ocr, &AssembleOptions::default());

    assert_eq!(assembly.page_count(), 2);
    assert_eq!(ocr.calls(), vec![0, 1]);
}

#[test]
fn test_more_images_than_pages_processes_shorter() {
    let doc = reader(&[None]);
    let ocr = FakeOcr::default();

    let assembly = assemble(&doc, &page_images(3), &ocr, &AssembleOptions::default());

    assert_eq!(assembly.page_count(), 1);
    assert_eq!(ocr.calls(), vec![0]);
}

#[test]
fn test_language_and_config_reach_engine() {
    let doc = reader(&[None]);
    let ocr = FakeOcr::default();
    let options = AssembleOptions {
        language: "eng+fra".to_string(),
        ocr_config: Some("--psm 1".to_string()),
        ..AssembleOptions::default()
    };

    assemble(&doc, &page_images(1), &ocr, &options);

    let requests = ocr.requests.lock().expect("lock").clone();
    assert_eq!(
        requests,
        vec![("eng+fra".to_string(), Some("--psm 1".to_string()))]
    );
}

#[test]
fn test_progress_reports_every_page_in_order() {
    let doc = FlakyCopy::new(&[None, None, None], &[]);
    let ocr = FakeOcr::failing_document(&[1]);
    let mut seen = Vec::new();

    assemble_with_progress(
        &doc,
        &page_images(3),
        &ocr,
        &AssembleOptions::default(),
        &mut |page: &PageReport| seen.push((page.index, page.disposition)),
    );

    assert_eq!(
        seen,
        vec![
            (0, PageDisposition::Ocr),
            (1, PageDisposition::OriginalFallback),
            (2, PageDisposition::Ocr),
        ]
    );
}
