// 外部ツール（OCRエンジン・ラスタライザ）の存在確認

use tracing::info;

use crate::ocr::OcrEngine;
use crate::render::Rasterizer;

/// Verify both collaborators can be run. The OCR engine is probed first.
///
/// Returns the first `DependencyMissing` error; nothing else is touched.
pub fn check_dependencies(
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
) -> crate::error::Result<()> {
    ocr.check_available()?;
    rasterizer.check_available()?;
    info!(ocr = ocr.name(), rasterizer = rasterizer.name(), "dependencies found");
    Ok(())
}
