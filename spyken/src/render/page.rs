//! Page frames: a rasterized page fitted to the canvas with the unit's region highlighted.

use super::card::fill_rect;
use crate::document::{PageSize, Region};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([32, 32, 36, 255]);
const REGION_FILL: Rgba<u8> = Rgba([255, 214, 0, 72]);
const REGION_BORDER: Rgba<u8> = Rgba([255, 170, 0, 255]);
const BORDER_PX: u32 = 3;

/// Where a scaled page sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fit `src_w` x `src_h` inside the canvas preserving aspect ratio, centred.
pub fn fit(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> Placement {
    let scale = f64::min(
        canvas_w as f64 / src_w.max(1) as f64,
        canvas_h as f64 / src_h.max(1) as f64,
    );
    let width = ((src_w as f64 * scale).round() as u32).clamp(1, canvas_w);
    let height = ((src_h as f64 * scale).round() as u32).clamp(1, canvas_h);

    Placement {
        offset_x: (canvas_w - width) / 2,
        offset_y: (canvas_h - height) / 2,
        width,
        height,
    }
}

/// Compose the frame for one unit.
///
/// `region` is in page points with a top-left origin; `page_size` maps those
/// points onto the raster.
pub fn compose_page(
    page: &RgbaImage,
    page_size: PageSize,
    region: Option<Region>,
    canvas_w: u32,
    canvas_h: u32,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, BACKGROUND);
    let placement = fit(page.width(), page.height(), canvas_w, canvas_h);

    let scaled = imageops::resize(page, placement.width, placement.height, FilterType::Triangle);
    imageops::overlay(&mut canvas, &scaled, placement.offset_x as i64, placement.offset_y as i64);

    if let Some(region) = region {
        highlight(&mut canvas, &placement, page_size, region);
    }
    canvas
}

fn highlight(canvas: &mut RgbaImage, placement: &Placement, page_size: PageSize, region: Region) {
    let sx = placement.width as f32 / page_size.width.max(1.0);
    let sy = placement.height as f32 / page_size.height.max(1.0);

    let x0 = placement.offset_x as f32 + region.x0 * sx;
    let y0 = placement.offset_y as f32 + region.y0 * sy;
    let x1 = x0 + region.width() * sx;
    let y1 = y0 + region.height() * sy;

    // pad so the border does not sit on the glyphs
    let pad = BORDER_PX as f32 + 1.0;
    let x = (x0 - pad).max(0.0) as u32;
    let y = (y0 - pad).max(0.0) as u32;
    let w = ((x1 + pad).max(0.0) as u32).saturating_sub(x);
    let h = ((y1 + pad).max(0.0) as u32).saturating_sub(y);

    fill_rect(canvas, x, y, w, h, REGION_FILL);

    let t = BORDER_PX.min(w).min(h);
    fill_rect(canvas, x, y, w, t, REGION_BORDER);
    fill_rect(canvas, x, (y + h).saturating_sub(t), w, t, REGION_BORDER);
    fill_rect(canvas, x, y, t, h, REGION_BORDER);
    fill_rect(canvas, (x + w).saturating_sub(t), y, t, h, REGION_BORDER);
}
