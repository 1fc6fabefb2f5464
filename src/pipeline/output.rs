use std::path::{Path, PathBuf};

use tracing::info;

use crate::pdf::writer::SearchablePdfWriter;

pub const PDF_SUFFIX: &str = "_searchable.pdf";
pub const TEXT_EXTENSION: &str = "txt";

/// Output artifact locations for one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub pdf: Option<PathBuf>,
    pub text: Option<PathBuf>,
}

/// `X.pdf` -> `<out_dir>/X_searchable.pdf` and `<out_dir>/X.txt`.
///
/// Without `out_dir` the outputs go next to the input.
pub fn output_paths(
    input: &Path,
    out_dir: Option<&Path>,
    want_pdf: bool,
    want_text: bool,
) -> OutputPaths {
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    OutputPaths {
        pdf: want_pdf.then(|| dir.join(format!("{stem}{PDF_SUFFIX}"))),
        text: want_text.then(|| dir.join(format!("{stem}.{TEXT_EXTENSION}"))),
    }
}

/// Serialize the assembled document to `destination`.
pub fn write_pdf(writer: &SearchablePdfWriter, destination: &Path) -> crate::error::Result<()> {
    writer.save(destination)?;
    info!(path = %destination.display(), pages = writer.page_count(), "wrote searchable PDF");
    Ok(())
}

/// Write the combined text as UTF-8.
pub fn write_text(text: &str, destination: &Path) -> crate::error::Result<()> {
    std::fs::write(destination, text.as_bytes()).map_err(|e| {
        crate::error::OcrPdfError::write(format!(
            "failed to write {}: {e}",
            destination.display()
        ))
    })?;
    info!(path = %destination.display(), "wrote text output");
    Ok(())
}
