use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdf_ocr::config::merged::{MergedConfig, Overrides};
use pdf_ocr::config::settings::Settings;
use pdf_ocr::config::{self};
use pdf_ocr::ocr::tesseract::Tesseract;
use pdf_ocr::pipeline::orchestrator::{self, RunResult};
use pdf_ocr::pipeline::progress::LogProgress;
use pdf_ocr::render::pdftoppm::Pdftoppm;

/// Convert PDF(s) with images into searchable PDFs and/or text using Tesseract OCR.
#[derive(Parser, Debug)]
#[command(name = "pdf_ocr", version, about)]
struct Cli {
    /// PDF file or directory containing PDFs
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (default: same folder as input files)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// DPI for rasterizing PDF pages [default: 300]
    #[arg(long)]
    dpi: Option<u32>,

    /// Tesseract language(s), e.g. "eng" or "eng+fra" [default: eng]
    #[arg(long)]
    lang: Option<String>,

    /// Also output a .txt file with extracted text
    #[arg(long)]
    txt: bool,

    /// Do not output a searchable PDF (only useful with --txt)
    #[arg(long)]
    no_pdf: bool,

    /// Skip OCR on pages that already contain selectable text (copy original page)
    #[arg(long)]
    skip_text_pages: bool,

    /// Directory holding the poppler binaries (pdftoppm)
    #[arg(long, value_name = "DIR")]
    poppler_path: Option<PathBuf>,

    /// Full path to the tesseract executable (if not on PATH)
    #[arg(long, value_name = "FILE")]
    tesseract_cmd: Option<PathBuf>,

    /// Extra Tesseract config string (e.g. "--psm 1")
    #[arg(long, allow_hyphen_values = true)]
    config: Option<String>,

    /// Log to this file (default: stderr)
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Treat input as a directory and process all .pdf files in it
    #[arg(long)]
    batch: bool,

    /// Settings YAML (default: settings.yaml next to the input, if present)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            dpi: self.dpi,
            lang: self.lang.clone(),
            txt: self.txt,
            no_pdf: self.no_pdf,
            skip_text_pages: self.skip_text_pages,
            tesseract_config: self.config.clone(),
            tesseract_cmd: self.tesseract_cmd.clone(),
            poppler_path: self.poppler_path.clone(),
            out_dir: self.out_dir.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log.as_deref()) {
        eprintln!("ERROR: Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let merged = MergedConfig::new(&settings, &cli.overrides());
    if let Err(e) = merged.validate() {
        eprintln!("ERROR: {e}");
        return ExitCode::FAILURE;
    }

    if cli.batch && !cli.input.is_dir() {
        eprintln!("ERROR: --batch requires input to be a directory");
        return ExitCode::FAILURE;
    }

    let rasterizer = Pdftoppm::new(merged.poppler_path.clone());
    let ocr = Tesseract::new(merged.tesseract_cmd.clone());

    let results = match orchestrator::run(&cli.input, &merged, &rasterizer, &ocr, &LogProgress) {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = print_summary(&results, cli.json) {
        eprintln!("ERROR: Failed to print summary: {e}");
    }

    // Per-document failures are part of the summary, not the exit status.
    ExitCode::SUCCESS
}

fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> pdf_ocr::error::Result<Settings> {
    match &cli.settings {
        Some(path) => Settings::from_file(path),
        None => config::load_settings_for_input(&cli.input),
    }
}

fn print_summary(results: &[RunResult], json: bool) -> pdf_ocr::error::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!("\nProcessing summary:");
    for result in results {
        println!("{result}");
    }
    let failed = results.iter().filter(|r| !r.is_success()).count();
    println!("{} document(s), {failed} failed", results.len());
    Ok(())
}
