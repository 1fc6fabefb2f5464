use std::path::PathBuf;

use super::settings::Settings;

/// Values given on the command line. `None`/`false` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dpi: Option<u32>,
    pub lang: Option<String>,
    pub txt: bool,
    pub no_pdf: bool,
    pub skip_text_pages: bool,
    pub tesseract_config: Option<String>,
    pub tesseract_cmd: Option<PathBuf>,
    pub poppler_path: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub dpi: u32,
    pub lang: String,
    pub output_pdf: bool,
    pub output_txt: bool,
    pub skip_text_pages: bool,
    pub tesseract_config: Option<String>,
    pub tesseract_cmd: Option<PathBuf>,
    pub poppler_path: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub text_threshold: usize,
    pub parallel_workers: usize,
    pub compress: bool,
    pub blank_page_size: (f64, f64),
}

impl MergedConfig {
    /// OverridesのOption値がSomeならその値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, overrides: &Overrides) -> Self {
        MergedConfig {
            dpi: overrides.dpi.unwrap_or(settings.dpi),
            lang: overrides
                .lang
                .clone()
                .unwrap_or_else(|| settings.lang.clone()),
            output_pdf: settings.output_pdf && !overrides.no_pdf,
            output_txt: settings.output_txt || overrides.txt,
            skip_text_pages: settings.skip_text_pages || overrides.skip_text_pages,
            tesseract_config: overrides
                .tesseract_config
                .clone()
                .or_else(|| settings.tesseract_config.clone()),
            tesseract_cmd: overrides
                .tesseract_cmd
                .clone()
                .or_else(|| settings.tesseract_cmd.clone()),
            poppler_path: overrides
                .poppler_path
                .clone()
                .or_else(|| settings.poppler_path.clone()),
            out_dir: overrides.out_dir.clone(),
            text_threshold: settings.text_threshold,
            parallel_workers: settings.parallel_workers,
            compress: settings.compress,
            blank_page_size: (settings.blank_page_size[0], settings.blank_page_size[1]),
        }
    }

    /// Reject configurations no document could be processed with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dpi == 0 || self.dpi > 2400 {
            return Err(crate::error::OcrPdfError::config(format!(
                "dpi must be between 1 and 2400, got {}",
                self.dpi
            )));
        }

        validate_lang(&self.lang)?;

        if let Some(config) = &self.tesseract_config {
            crate::ocr::split_config(config)?;
        }

        if !self.output_pdf && !self.output_txt {
            return Err(crate::error::OcrPdfError::config(
                "nothing to produce: --no-pdf requires --txt",
            ));
        }

        let (width, height) = self.blank_page_size;
        if width <= 0.0 || height <= 0.0 {
            return Err(crate::error::OcrPdfError::config(
                "blank_page_size must be positive",
            ));
        }

        Ok(())
    }
}

/// `eng`, `eng+fra`, `chi_sim` ...
fn validate_lang(lang: &str) -> crate::error::Result<()> {
    if lang.trim().is_empty() {
        return Err(crate::error::OcrPdfError::config("language cannot be empty"));
    }
    for code in lang.split('+') {
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(crate::error::OcrPdfError::config(format!(
                "invalid language code '{code}' in '{lang}'"
            )));
        }
    }
    Ok(())
}
