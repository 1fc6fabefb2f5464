// ジョブ単位: PDF読込 -> ラスタライズ -> ページ組立 -> 出力書込

use std::path::PathBuf;

use tracing::instrument;

use crate::ocr::OcrEngine;
use crate::pdf::reader::{PdfReader, SourceDocument};
use crate::pipeline::assembler::{AssembleOptions, PageReport, assemble_with_progress};
use crate::pipeline::output::{self, OutputPaths};
use crate::pipeline::progress::ProgressSink;
use crate::render::Rasterizer;

/// Configuration for a single document.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub outputs: OutputPaths,
    pub dpi: u32,
    pub options: AssembleOptions,
}

/// Result of processing a single document.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub outputs: OutputPaths,
    /// Page count reported by the PDF reader.
    pub page_count: usize,
    pub pages: Vec<PageReport>,
}

/// Run one document: read -> rasterize -> assemble -> write.
///
/// Page failures are absorbed by the assembler. Any error returned here
/// (unreadable input, rasterizer or write failure) is fatal for this
/// document only.
#[instrument(skip_all, fields(document = %config.input_path.display()))]
pub fn run_job(
    config: &JobConfig,
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
    progress: &dyn ProgressSink,
) -> crate::error::Result<JobResult> {
    let reader = PdfReader::open(&config.input_path)?;
    let page_count = reader.page_count();
    progress.document_started(&config.input_path, page_count);

    let images = rasterizer.rasterize(&config.input_path, config.dpi)?;

    let assembly = assemble_with_progress(
        &reader,
        &images,
        ocr,
        &config.options,
        &mut |page: &PageReport| progress.page_finished(&config.input_path, page),
    );
    // Rasterized pages can be large; release them before serializing.
    drop(images);

    for dir in [&config.outputs.pdf, &config.outputs.text]
        .into_iter()
        .flatten()
        .filter_map(|p| p.parent())
        .filter(|d| !d.as_os_str().is_empty())
    {
        std::fs::create_dir_all(dir).map_err(|e| {
            crate::error::OcrPdfError::write(format!(
                "failed to create output directory {}: {e}",
                dir.display()
            ))
        })?;
    }

    if let Some(pdf_path) = &config.outputs.pdf {
        output::write_pdf(&assembly.writer, pdf_path)?;
    }
    if let Some(text_path) = &config.outputs.text {
        output::write_text(&assembly.text(), text_path)?;
    }

    Ok(JobResult {
        input_path: config.input_path.clone(),
        outputs: config.outputs.clone(),
        page_count,
        pages: assembly.pages,
    })
}
