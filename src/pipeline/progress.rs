use std::path::Path;

use tracing::info;

use crate::pipeline::assembler::PageReport;
use crate::pipeline::orchestrator::RunResult;

/// Receives progress events from a run. All methods default to no-ops.
///
/// Documents may be processed on several threads, so events from different
/// documents can interleave; events of one document arrive in order.
pub trait ProgressSink: Send + Sync {
    fn document_started(&self, _input: &Path, _pages: usize) {}

    fn page_finished(&self, _input: &Path, _page: &PageReport) {}

    fn document_finished(&self, _result: &RunResult) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn document_started(&self, input: &Path, pages: usize) {
        info!(document = %input.display(), pages, "processing document");
    }

    fn page_finished(&self, input: &Path, page: &PageReport) {
        info!(
            document = %input.display(),
            page = page.index + 1,
            disposition = ?page.disposition,
            "page done"
        );
    }

    fn document_finished(&self, result: &RunResult) {
        match &result.error {
            None => info!(document = %result.input.display(), pages = result.pages, "document done"),
            Some(error) => info!(document = %result.input.display(), %error, "document failed"),
        }
    }
}
