// 全ドキュメント実行: 入力解決 → ドキュメント毎にジョブ実行 → 結果集約

use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, warn};

use crate::config::merged::MergedConfig;
use crate::error::{ErrorTier, OcrPdfError};
use crate::ocr::OcrEngine;
use crate::pipeline::assembler::AssembleOptions;
use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};
use crate::pipeline::output::output_paths;
use crate::pipeline::progress::ProgressSink;
use crate::render::Rasterizer;

/// Outcome of one input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub input: PathBuf,
    pub output_pdf: Option<PathBuf>,
    pub output_txt: Option<PathBuf>,
    pub pages: usize,
    /// 1-based numbers of pages that fell back to the original or a blank page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_pages: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn from_job(result: crate::error::Result<JobResult>, input: &Path) -> Self {
        match result {
            Ok(job) => RunResult {
                input: job.input_path,
                output_pdf: job.outputs.pdf,
                output_txt: job.outputs.text,
                pages: job.page_count,
                degraded_pages: job
                    .pages
                    .iter()
                    .filter(|p| p.disposition.is_degraded())
                    .map(|p| p.index + 1)
                    .collect(),
                error: None,
            },
            Err(e) => {
                match e.tier() {
                    ErrorTier::Document => {
                        error!(document = %input.display(), error = %e, "failed processing document");
                    }
                    tier => {
                        // Page errors belong to the fallback chain and startup
                        // errors to `run`; either one here is a misrouted failure.
                        error!(document = %input.display(), ?tier, error = %e, "error escaped its tier");
                    }
                }
                RunResult {
                    input: input.to_path_buf(),
                    output_pdf: None,
                    output_txt: None,
                    pages: 0,
                    degraded_pages: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "ERROR: {}: {error}", self.input.display());
        }
        write!(f, "OK: {} ({} pages)", self.input.display(), self.pages)?;
        if let Some(pdf) = &self.output_pdf {
            write!(f, " -> {}", pdf.display())?;
        }
        if let Some(txt) = &self.output_txt {
            write!(f, " -> {}", txt.display())?;
        }
        if !self.degraded_pages.is_empty() {
            write!(f, " [degraded pages: {:?}]", self.degraded_pages)?;
        }
        Ok(())
    }
}

/// File -> `[file]`; directory -> its `.pdf` files sorted by name (non-recursive).
pub fn list_input_files(input_path: &Path) -> crate::error::Result<Vec<PathBuf>> {
    if input_path.is_file() {
        return Ok(vec![input_path.to_path_buf()]);
    }
    if !input_path.is_dir() {
        return Err(OcrPdfError::input(format!(
            "Input path {} does not exist.",
            input_path.display()
        )));
    }

    let entries = std::fs::read_dir(input_path).map_err(|e| {
        OcrPdfError::input(format!(
            "failed to list {}: {e}",
            input_path.display()
        ))
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Build the job for one input from the merged configuration.
pub fn job_config(input: &Path, config: &MergedConfig) -> JobConfig {
    JobConfig {
        input_path: input.to_path_buf(),
        outputs: output_paths(
            input,
            config.out_dir.as_deref(),
            config.output_pdf,
            config.output_txt,
        ),
        dpi: config.dpi,
        options: AssembleOptions {
            skip_if_text: config.skip_text_pages,
            wants_text: config.output_txt,
            language: config.lang.clone(),
            ocr_config: config.tesseract_config.clone(),
            text_threshold: config.text_threshold,
            blank_page_size: config.blank_page_size,
            compress: config.compress,
        },
    }
}

/// Process every input, one [`RunResult`] per input, in input order.
///
/// A document failure never stops the batch. With `parallel_workers > 1`
/// documents run on a rayon pool; each keeps its own output state.
pub fn run_batch(
    inputs: &[PathBuf],
    config: &MergedConfig,
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
    progress: &dyn ProgressSink,
) -> Vec<RunResult> {
    let run_one = |input: &PathBuf| {
        let job = job_config(input, config);
        let result = RunResult::from_job(run_job(&job, rasterizer, ocr, progress), input);
        progress.document_finished(&result);
        result
    };

    if config.parallel_workers > 1 && inputs.len() > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_workers)
            .build()
        {
            Ok(pool) => return pool.install(|| inputs.par_iter().map(run_one).collect()),
            Err(e) => warn!(error = %e, "failed to start worker pool, running sequentially"),
        }
    }

    inputs.iter().map(run_one).collect()
}

/// Errors leaving `run` must abort the whole run; anything else is re-tagged
/// as an input resolution failure.
fn startup_error(e: OcrPdfError) -> OcrPdfError {
    match e.tier() {
        ErrorTier::Startup => e,
        tier => {
            warn!(?tier, error = %e, "non-startup error during startup");
            OcrPdfError::input(e.to_string())
        }
    }
}

/// Full run: dependency gate, input resolution, then the batch.
///
/// Only startup failures are returned as `Err`; document failures are
/// reported inside the result list.
pub fn run(
    input_path: &Path,
    config: &MergedConfig,
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
    progress: &dyn ProgressSink,
) -> crate::error::Result<Vec<RunResult>> {
    crate::deps::check_dependencies(rasterizer, ocr).map_err(startup_error)?;
    let inputs = list_input_files(input_path).map_err(startup_error)?;
    if inputs.is_empty() {
        warn!(input = %input_path.display(), "no PDF files found");
    }
    Ok(run_batch(&inputs, config, rasterizer, ocr, progress))
}
