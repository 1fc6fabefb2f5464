// Tesseract CLI wrapper: page image -> searchable single-page PDF / plain text

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::ocr::{OcrEngine, OcrRequest, split_config};
use crate::render::PageImage;

const PROGRAM: &str = "tesseract";
const INPUT_FILE: &str = "page.png";
const OUTPUT_BASE: &str = "page";

/// Runs the `tesseract` executable, by default from `PATH`.
#[derive(Debug, Clone)]
pub struct Tesseract {
    command: PathBuf,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Tesseract {
    pub fn new(command: Option<PathBuf>) -> Self {
        Self {
            command: command.unwrap_or_else(|| PathBuf::from(PROGRAM)),
        }
    }

    /// Write the page as a PNG into `dir` and return its path.
    fn write_input(&self, dir: &Path, page: &PageImage) -> crate::error::Result<PathBuf> {
        let path = dir.join(INPUT_FILE);
        flatten_to_rgb(&page.image).save(&path)?;
        Ok(path)
    }

    fn run(&self, args: &[OsString]) -> crate::error::Result<Output> {
        let output = Command::new(&self.command).args(args).output().map_err(|e| {
            crate::error::OcrPdfError::ocr(format!(
                "failed to execute {}: {e}",
                self.command.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::error::OcrPdfError::ocr(format!(
                "tesseract failed (exit code {}): {}",
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

impl OcrEngine for Tesseract {
    fn name(&self) -> &str {
        PROGRAM
    }

    fn check_available(&self) -> crate::error::Result<()> {
        let output = Command::new(&self.command).arg("--version").output();
        match output {
            Ok(result) if result.status.success() => {
                let version = String::from_utf8_lossy(&result.stdout);
                debug!(version = %version.lines().next().unwrap_or_default(), "tesseract found");
                Ok(())
            }
            Ok(result) => Err(crate::error::OcrPdfError::dependency(format!(
                "{} --version exited with {}",
                self.command.display(),
                result.status
            ))),
            Err(e) => Err(crate::error::OcrPdfError::dependency(format!(
                "Tesseract not found or not working ({e}). Install Tesseract OCR and ensure it's on PATH, or pass --tesseract-cmd"
            ))),
        }
    }

    fn recognize_to_document(
        &self,
        page: &PageImage,
        request: &OcrRequest<'_>,
    ) -> crate::error::Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let input = self.write_input(scratch.path(), page)?;
        let base = scratch.path().join(OUTPUT_BASE);

        let args = build_args(&input, base.as_os_str(), page.dpi, request, Some("pdf"))?;
        self.run(&args)?;

        let pdf_path = base.with_extension("pdf");
        std::fs::read(&pdf_path).map_err(|e| {
            crate::error::OcrPdfError::ocr(format!(
                "tesseract produced no PDF at {}: {e}",
                pdf_path.display()
            ))
        })
    }

    fn recognize_to_text(
        &self,
        page: &PageImage,
        request: &OcrRequest<'_>,
    ) -> crate::error::Result<String> {
        let scratch = tempfile::tempdir()?;
        let input = self.write_input(scratch.path(), page)?;

        let args = build_args(&input, "stdout".as_ref(), page.dpi, request, None)?;
        let output = self.run(&args)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `tesseract <input> <output> --dpi N -l LANG [config...] [renderer]`
fn build_args(
    input: &Path,
    output: &OsStr,
    dpi: u32,
    request: &OcrRequest<'_>,
    renderer: Option<&str>,
) -> crate::error::Result<Vec<OsString>> {
    let mut args: Vec<OsString> = vec![
        input.as_os_str().to_owned(),
        output.to_owned(),
        "--dpi".into(),
        dpi.to_string().into(),
        "-l".into(),
        request.language.into(),
    ];
    if let Some(config) = request.config {
        args.extend(split_config(config)?.into_iter().map(OsString::from));
    }
    if let Some(renderer) = renderer {
        args.push(renderer.into());
    }
    Ok(args)
}

/// Tesseract wants opaque RGB; transparent pixels are composited onto white.
fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}
