pub mod pdftoppm;

use std::path::Path;

use image::DynamicImage;

/// One rasterized page. Produced once per page per run.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position in the rasterizer's output.
    pub page_index: usize,
    pub dpi: u32,
    pub image: DynamicImage,
}

/// Turns a document into an ordered sequence of page bitmaps.
pub trait Rasterizer: Send + Sync {
    /// Human-readable tool name for diagnostics.
    fn name(&self) -> &str;

    /// Fails with `DependencyMissing` when the tool cannot be run.
    fn check_available(&self) -> crate::error::Result<()>;

    /// Fails with `RasterizationError` when the source is unreadable or the
    /// tool fails.
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> crate::error::Result<Vec<PageImage>>;
}
