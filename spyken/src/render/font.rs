//! Text painting onto frames with an outline font or the built-in bitmap font.

use super::bitmap_font::{self, CELL_HEIGHT, CELL_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Fonts tried when none is configured, first match wins.
const CANDIDATE_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub enum TextPainter {
    Outline(FontVec),
    Bitmap,
}

impl TextPainter {
    /// Load the configured font, else a common platform font, else the bitmap font.
    pub fn load(configured: Option<&Path>) -> Self {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(CANDIDATE_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match std::fs::read(&path).map(FontVec::try_from_vec) {
                Ok(Ok(font)) => {
                    log::debug!("Using font {}", path.display());
                    return Self::Outline(font);
                }
                Ok(Err(e)) => log::warn!("Cannot parse font {}: {}", path.display(), e),
                Err(e) => log::warn!("Cannot read font {}: {}", path.display(), e),
            }
        }

        log::warn!("No usable font found, falling back to the built-in bitmap font");
        Self::Bitmap
    }

    /// Average horizontal advance at `px`, used to size word-wrapped lines.
    pub fn avg_char_width(&self, px: f32) -> f32 {
        match self {
            Self::Outline(_) => {
                let sample = "abcdefghijklmnopqrstuvwxyz ABCDEFGHIJ";
                self.text_width(px, sample) / sample.chars().count() as f32
            }
            Self::Bitmap => (bitmap_scale(px) * CELL_WIDTH) as f32,
        }
    }

    /// Vertical distance between baselines at `px`.
    pub fn line_height(&self, px: f32) -> f32 {
        match self {
            Self::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(px));
                scaled.height() + scaled.line_gap()
            }
            Self::Bitmap => (bitmap_scale(px) * CELL_HEIGHT) as f32,
        }
    }

    pub fn text_width(&self, px: f32, text: &str) -> f32 {
        match self {
            Self::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(px));
                text.chars().map(|c| scaled.h_advance(font.glyph_id(c))).sum()
            }
            Self::Bitmap => (text.chars().count() as u32 * bitmap_scale(px) * CELL_WIDTH) as f32,
        }
    }

    /// Draw one line of text with its top-left corner at (x, y).
    pub fn draw(&self, img: &mut RgbaImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str) {
        match self {
            Self::Outline(font) => draw_outline(font, img, x, y, px, color, text),
            Self::Bitmap => draw_bitmap(img, x, y, px, color, text),
        }
    }
}

/// Integer magnification that makes bitmap glyphs roughly `px` tall.
fn bitmap_scale(px: f32) -> u32 {
    ((px / CELL_HEIGHT as f32).round() as u32).max(1)
}

fn draw_outline(font: &FontVec, img: &mut RgbaImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str) {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);
    let baseline = y as f32 + scaled.ascent();
    let mut caret = x as f32;

    for c in text.chars() {
        let id = font.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        caret += scaled.h_advance(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px_x = bounds.min.x as i32 + gx as i32;
                let px_y = bounds.min.y as i32 + gy as i32;
                blend_pixel(img, px_x, px_y, color, coverage);
            });
        }
    }
}

fn draw_bitmap(img: &mut RgbaImage, x: i32, y: i32, px: f32, color: Rgba<u8>, text: &str) {
    let scale = bitmap_scale(px);
    let mut caret = x;

    for c in text.chars() {
        let rows = bitmap_font::glyph(c);
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if !bitmap_font::is_set(&rows, col, row) {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px_x = caret + (col * scale + dx) as i32;
                        let px_y = y + (row * scale + dy) as i32;
                        blend_pixel(img, px_x, px_y, color, 1.0);
                    }
                }
            }
        }
        caret += (CELL_WIDTH * scale) as i32;
    }
}

/// Alpha-blend `color` at `coverage` over the pixel, ignoring out-of-bounds writes.
pub fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0) * color[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }

    let dst = img.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let blended = color[i] as f32 * alpha + dst[i] as f32 * (1.0 - alpha);
        dst[i] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}

/// Split text into lines of at most `max_chars` characters at spaces.
///
/// Words longer than a line are broken.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
