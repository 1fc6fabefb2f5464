// poppler pdftoppm CLI wrapper: PDF -> page PNGs -> DynamicImage

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::render::{PageImage, Rasterizer};

const PROGRAM: &str = "pdftoppm";
const OUTPUT_PREFIX: &str = "page";

/// Rasterizes with poppler's `pdftoppm`.
///
/// `poppler_path` names the directory holding the poppler binaries; when
/// absent, `pdftoppm` is looked up on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Pdftoppm {
    poppler_path: Option<PathBuf>,
}

impl Pdftoppm {
    pub fn new(poppler_path: Option<PathBuf>) -> Self {
        Self { poppler_path }
    }

    pub fn program(&self) -> PathBuf {
        let exe = format!("{PROGRAM}{}", std::env::consts::EXE_SUFFIX);
        match &self.poppler_path {
            Some(dir) => dir.join(exe),
            None => PathBuf::from(exe),
        }
    }
}

impl Rasterizer for Pdftoppm {
    fn name(&self) -> &str {
        PROGRAM
    }

    fn check_available(&self) -> crate::error::Result<()> {
        // `pdftoppm -v` prints its version on stderr; being able to spawn it
        // is what matters.
        Command::new(self.program())
            .arg("-v")
            .output()
            .map(|_| ())
            .map_err(|e| {
                crate::error::OcrPdfError::dependency(format!(
                    "{} could not be executed ({e}). Install poppler (provides pdftoppm) or pass --poppler-path",
                    self.program().display()
                ))
            })
    }

    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> crate::error::Result<Vec<PageImage>> {
        let scratch = tempfile::tempdir()?;
        let prefix = scratch.path().join(OUTPUT_PREFIX);

        let output = Command::new(self.program())
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                crate::error::OcrPdfError::rasterize(format!(
                    "failed to execute {}: {e}",
                    self.program().display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::error::OcrPdfError::rasterize(format!(
                "pdftoppm failed (exit code {}): {}",
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                stderr.trim()
            )));
        }

        let files = collect_page_files(scratch.path())?;
        debug!(pages = files.len(), dpi, "pdftoppm finished");

        files
            .into_iter()
            .enumerate()
            .map(|(page_index, path)| {
                let image = image::open(&path).map_err(|e| {
                    crate::error::OcrPdfError::rasterize(format!(
                        "failed to decode {}: {e}",
                        path.display()
                    ))
                })?;
                Ok(PageImage {
                    page_index,
                    dpi,
                    image,
                })
            })
            .collect()
    }
}

/// `page-1.png`, `page-02.png`, ... sorted by page number.
///
/// pdftoppm zero-pads the number to the width of the page count, so the
/// numeric suffix is parsed instead of sorting by name.
fn collect_page_files(dir: &Path) -> crate::error::Result<Vec<PathBuf>> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(number) = page_number_from_name(name) {
            numbered.push((number, path));
        }
    }
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_number_from_name(name: &str) -> Option<u32> {
    name.strip_prefix(OUTPUT_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
