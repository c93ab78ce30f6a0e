//! Frame rendering for the video path.
//!
//! Units that know where they sit on a page get that page with their region
//! highlighted; all other units, and any page that fails to rasterize, get a
//! text card.

mod bitmap_font;
pub mod card;
pub mod font;
pub mod page;
pub mod rasterizer;

pub use font::TextPainter;
pub use rasterizer::{PageRasterizer, PdftoppmRasterizer};

use crate::config::VideoSettings;
use crate::document::{Document, DocumentKind};
use crate::error::Result;
use crate::text::TextUnit;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One rendered still, saved as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub unit_index: usize,
    pub image_path: PathBuf,
}

/// Renders one frame per unit for a single document.
///
/// Rasterized pages are cached for the lifetime of the renderer, so create
/// one per job.
pub struct FrameRenderer {
    painter: Arc<TextPainter>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
    width: u32,
    height: u32,
    caption: String,
    /// `None` marks a page that failed to rasterize
    pages: HashMap<usize, Option<RgbaImage>>,
}

impl FrameRenderer {
    pub fn new(
        settings: &VideoSettings,
        painter: Arc<TextPainter>,
        rasterizer: Option<Arc<dyn PageRasterizer>>,
    ) -> Self {
        Self {
            painter,
            rasterizer,
            width: settings.width,
            height: settings.height,
            caption: settings.caption.clone(),
            pages: HashMap::new(),
        }
    }

    /// Render and save the frame for `units[unit_index]` into `out_dir`.
    pub async fn render(
        &mut self,
        document: &Document,
        unit: &TextUnit,
        unit_index: usize,
        total_units: usize,
        out_dir: &Path,
    ) -> Result<Frame> {
        let image = match self.page_frame(document, unit, out_dir).await {
            Some(image) => image,
            None => card::render_card(
                &self.painter,
                self.width,
                self.height,
                &unit.content,
                unit_index,
                total_units,
                &self.caption,
            ),
        };

        let image_path = out_dir.join(format!("frame_{:04}.png", unit_index));
        image.save(&image_path)?;

        Ok(Frame {
            unit_index,
            image_path,
        })
    }

    async fn page_frame(&mut self, document: &Document, unit: &TextUnit, scratch: &Path) -> Option<RgbaImage> {
        if document.kind != DocumentKind::Pdf {
            return None;
        }
        let location = unit.source?;
        let page_size = document.page_size(location.page_index).unwrap_or_default();

        if !self.pages.contains_key(&location.page_index) {
            let rendered = self
                .rasterize(&document.path, location.page_index, page_size.height, scratch)
                .await;
            self.pages.insert(location.page_index, rendered);
        }

        let page = self.pages.get(&location.page_index)?.as_ref()?;
        Some(page::compose_page(
            page,
            page_size,
            Some(location.region),
            self.width,
            self.height,
        ))
    }

    async fn rasterize(&self, path: &Path, page_index: usize, page_height: f32, scratch: &Path) -> Option<RgbaImage> {
        let rasterizer = self.rasterizer.as_ref()?;
        let dpi = rasterizer::dpi_for_height(page_height, self.height);

        match rasterizer.render_page(path, page_index, dpi, scratch).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!(
                    "Cannot render page {} of {}, using text frames: {}",
                    page_index + 1,
                    path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Rasterizer that draws blank pages of a fixed size and counts calls.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ConvertError;
    use async_trait::async_trait;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct BlankPages {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl BlankPages {
        pub fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl PageRasterizer for BlankPages {
        async fn render_page(&self, _document: &Path, _page_index: usize, _dpi: u32, _scratch: &Path) -> Result<RgbaImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ConvertError::Document("no renderer".to_string()));
            }
            Ok(RgbaImage::from_pixel(61, 79, Rgba([255, 255, 255, 255])))
        }
    }
}
