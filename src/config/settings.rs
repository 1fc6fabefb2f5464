use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_LANG: &str = "eng";
/// Trimmed text length a page must exceed to count as already searchable.
pub const DEFAULT_TEXT_THRESHOLD: usize = 20;
/// A4-ish fallback size in points.
pub const DEFAULT_BLANK_PAGE_SIZE: [f64; 2] = [595.0, 842.0];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dpi: u32,
    pub lang: String,
    pub output_pdf: bool,
    pub output_txt: bool,
    pub skip_text_pages: bool,
    pub tesseract_config: Option<String>,
    pub tesseract_cmd: Option<PathBuf>,
    pub poppler_path: Option<PathBuf>,
    pub text_threshold: usize,
    pub parallel_workers: usize,
    pub compress: bool,
    pub blank_page_size: [f64; 2],
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dpi: DEFAULT_DPI,
            lang: DEFAULT_LANG.to_string(),
            output_pdf: true,
            output_txt: false,
            skip_text_pages: false,
            tesseract_config: None,
            tesseract_cmd: None,
            poppler_path: None,
            text_threshold: DEFAULT_TEXT_THRESHOLD,
            parallel_workers: 1,
            compress: true,
            blank_page_size: DEFAULT_BLANK_PAGE_SIZE,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::OcrPdfError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::OcrPdfError::config(format!(
                "Failed to read settings file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }
}
