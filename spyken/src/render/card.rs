//! Text card frames for documents without page geometry.

use super::font::{TextPainter, blend_pixel, wrap};
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([24, 26, 32, 255]);
const BAR: Rgba<u8> = Rgba([40, 44, 56, 255]);
const BAR_TEXT: Rgba<u8> = Rgba([230, 230, 235, 255]);
const HIGHLIGHT: Rgba<u8> = Rgba([255, 214, 102, 255]);
const BODY_TEXT: Rgba<u8> = Rgba([20, 20, 24, 255]);

/// Draw a full frame: header "Paragraph i / total", the unit text in a
/// highlighted box, and a caption footer.
pub fn render_card(
    painter: &TextPainter,
    width: u32,
    height: u32,
    text: &str,
    unit_index: usize,
    total_units: usize,
    caption: &str,
) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);

    let header_h = (height / 10).max(12);
    let footer_h = (height / 12).max(10);
    let bar_px = header_h as f32 * 0.5;

    fill_rect(&mut img, 0, 0, width, header_h, BAR);
    fill_rect(&mut img, 0, height.saturating_sub(footer_h), width, footer_h, BAR);

    let header = format!("Paragraph {} / {}", unit_index + 1, total_units);
    let header_y = (header_h as f32 - painter.line_height(bar_px)) / 2.0;
    painter.draw(&mut img, (width / 40) as i32, header_y.max(0.0) as i32, bar_px, BAR_TEXT, &header);

    let caption_px = footer_h as f32 * 0.5;
    let caption_w = painter.text_width(caption_px, caption);
    let caption_x = ((width as f32 - caption_w) / 2.0).max(0.0);
    let caption_y = height.saturating_sub(footer_h) as f32
        + (footer_h as f32 - painter.line_height(caption_px)) / 2.0;
    painter.draw(&mut img, caption_x as i32, caption_y.max(0.0) as i32, caption_px, BAR_TEXT, caption);

    draw_body(&mut img, painter, header_h, height.saturating_sub(footer_h), text);
    img
}

/// Word-wrap the text into a highlighted box centred between the bars.
fn draw_body(img: &mut RgbaImage, painter: &TextPainter, top: u32, bottom: u32, text: &str) {
    let width = img.width();
    let area_h = bottom.saturating_sub(top) as f32;
    let margin = (width / 16) as f32;
    let padding = (width / 64).max(4) as f32;
    let px = (img.height() as f32 / 24.0).max(8.0);

    let box_inner_w = (width as f32 - 2.0 * margin - 2.0 * padding).max(1.0);
    let chars_per_line = (box_inner_w / painter.avg_char_width(px).max(1.0)).floor().max(8.0) as usize;
    let line_h = painter.line_height(px).max(1.0);
    let max_lines = ((area_h - 2.0 * padding) / line_h).floor().max(1.0) as usize;

    let mut lines = wrap(text, chars_per_line);
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let keep = chars_per_line.saturating_sub(3);
            *last = last.chars().take(keep).collect::<String>() + "...";
        }
    }

    let box_h = lines.len() as f32 * line_h + 2.0 * padding;
    let box_y = top as f32 + ((area_h - box_h) / 2.0).max(0.0);
    fill_rect(
        img,
        margin as u32,
        box_y as u32,
        (width as f32 - 2.0 * margin) as u32,
        box_h as u32,
        HIGHLIGHT,
    );

    for (i, line) in lines.iter().enumerate() {
        let y = box_y + padding + i as f32 * line_h;
        painter.draw(img, (margin + padding) as i32, y as i32, px, BODY_TEXT, line);
    }
}

/// Fill a rectangle, clipped to the image.
pub fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x1 = x.saturating_add(w).min(img.width());
    let y1 = y.saturating_add(h).min(img.height());
    for py in y.min(y1)..y1 {
        for px in x.min(x1)..x1 {
            if color[3] == 255 {
                img.put_pixel(px, py, color);
            } else {
                blend_pixel(img, px as i32, py as i32, color, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_layout() {
        let img = render_card(&TextPainter::Bitmap, 320, 180, "Hello world", 0, 3, "spyken");
        assert_eq!(img.dimensions(), (320, 180));
        // header and footer bars
        assert_eq!(*img.get_pixel(319, 1), BAR);
        assert_eq!(*img.get_pixel(319, 178), BAR);
        // highlight box somewhere in the middle band
        assert!((18..165).any(|y| *img.get_pixel(30, y) == HIGHLIGHT));
    }

    #[test]
    fn test_long_text_stays_inside_frame() {
        let text = "word ".repeat(2000);
        let img = render_card(&TextPainter::Bitmap, 320, 180, &text, 4, 5, "caption");
        assert_eq!(img.dimensions(), (320, 180));
        assert_eq!(*img.get_pixel(319, 178), BAR);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut img = RgbaImage::from_pixel(4, 4, BACKGROUND);
        fill_rect(&mut img, 2, 2, 10, 10, HIGHLIGHT);
        assert_eq!(*img.get_pixel(3, 3), HIGHLIGHT);
        assert_eq!(*img.get_pixel(1, 1), BACKGROUND);
    }
}
