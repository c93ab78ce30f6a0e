//! Page rasterization through poppler's `pdftoppm`.

use crate::error::{ConvertError, Result};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Renders one page of a paginated document to pixels.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render zero-based `page_index` at `dpi`, using `scratch` for temporary files.
    async fn render_page(&self, document: &Path, page_index: usize, dpi: u32, scratch: &Path) -> Result<RgbaImage>;
}

pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render_page(&self, document: &Path, page_index: usize, dpi: u32, scratch: &Path) -> Result<RgbaImage> {
        let page_number = (page_index + 1).to_string();
        let prefix = scratch.join(format!("page_{:04}", page_index));

        let output = tokio::process::Command::new(&self.program)
            .args(["-f", &page_number, "-l", &page_number, "-singlefile", "-png", "-r"])
            .arg(dpi.to_string())
            .arg(document)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| ConvertError::Document(format!("failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            return Err(ConvertError::Document(format!(
                "pdftoppm failed on page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png = prefix.with_extension("png");
        let image = image::open(&png)?.to_rgba8();
        let _ = tokio::fs::remove_file(&png).await;
        Ok(image)
    }
}

/// Resolution that makes a page of `page_height_pt` about `target_px` tall.
pub fn dpi_for_height(page_height_pt: f32, target_px: u32) -> u32 {
    let inches = (page_height_pt / 72.0).max(0.1);
    ((target_px as f32 / inches).ceil() as u32).clamp(36, 300)
}
