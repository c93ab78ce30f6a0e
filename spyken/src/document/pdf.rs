// PDF text block extraction with page geometry
//
// Walks each page's content stream and follows the text state operators to
// place every shown string on the page. Consecutive lines are grouped into a
// block until the vertical gap looks like a paragraph break. The current
// transformation matrix (`cm`) is not tracked, so positions are exact only
// for pages that draw text in default user space, which is the common case.
//
// Shown strings are decoded through the encoding of the font selected by `Tf`
// (WinAnsi, ToUnicode CMaps for Identity-H fonts and so on). Fonts lopdf
// cannot map fall back to Latin-1.

use super::{PageSize, Region, SourceLocation, TextBlock};
use crate::error::Result;
use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Baseline gap, in multiples of the font size, that starts a new block
const PARAGRAPH_GAP: f32 = 1.6;

/// TJ adjustment (thousandths of an em) treated as a word space
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Rough glyph width relative to the font size, for block extents
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// A run of text sharing one baseline position
#[derive(Debug, Clone)]
struct TextLine {
    x: f32,
    y: f32,
    size: f32,
    text: String,
}

impl TextLine {
    fn right(&self) -> f32 {
        self.x + self.text.chars().count() as f32 * self.size * AVG_GLYPH_WIDTH
    }
}

/// Page box in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy)]
struct PageBox {
    llx: f32,
    lly: f32,
    urx: f32,
    ury: f32,
}

impl PageBox {
    fn size(&self) -> PageSize {
        PageSize {
            width: (self.urx - self.llx).abs(),
            height: (self.ury - self.lly).abs(),
        }
    }
}

impl Default for PageBox {
    fn default() -> Self {
        let size = PageSize::default();
        Self {
            llx: 0.0,
            lly: 0.0,
            urx: size.width,
            ury: size.height,
        }
    }
}

/// Extract positioned text blocks from every page, in page order
pub fn extract_blocks(path: &Path) -> Result<(Vec<TextBlock>, Vec<PageSize>)> {
    let doc = Document::load(path)?;

    let mut blocks = Vec::new();
    let mut pages = Vec::new();

    for (page_index, (page_number, page_id)) in doc.get_pages().into_iter().enumerate() {
        let page_box = page_box(&doc, page_id);
        pages.push(page_box.size());

        let content = match doc.get_and_decode_page_content(page_id) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping unreadable page {}: {}", page_number, e);
                continue;
            }
        };

        let fonts = PageFonts::load(&doc, page_id);
        let lines = collect_lines(&content.operations, &fonts);
        for group in group_lines(lines) {
            blocks.push(block_from_lines(&group, page_index, &page_box));
        }
    }

    Ok((blocks, pages))
}

/// Read the page's MediaBox, looking one level up the page tree if needed
fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return PageBox::default();
    };

    let media_box = page.get(b"MediaBox").ok().or_else(|| {
        let parent_id = page.get(b"Parent").and_then(Object::as_reference).ok()?;
        doc.get_dictionary(parent_id).ok()?.get(b"MediaBox").ok()
    });

    media_box
        .and_then(|obj| obj.as_array().ok())
        .and_then(|values| {
            let nums: Vec<f32> = values.iter().filter_map(number).collect();
            (nums.len() == 4).then(|| PageBox {
                llx: nums[0],
                lly: nums[1],
                urx: nums[2],
                ury: nums[3],
            })
        })
        .unwrap_or_default()
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Text encodings of the fonts a page's resources name
#[derive(Default)]
struct PageFonts<'a> {
    encodings: BTreeMap<Vec<u8>, Encoding<'a>>,
}

impl<'a> PageFonts<'a> {
    fn load(doc: &'a Document, page_id: ObjectId) -> Self {
        let fonts = match doc.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                log::debug!("No font resources for page {:?}: {}", page_id, e);
                return Self::default();
            }
        };

        let mut encodings = BTreeMap::new();
        for (name, font) in fonts {
            // lopdf guesses StandardEncoding for fonts that declare nothing;
            // Latin-1 is the closer match for those
            if !font.has(b"Encoding") && !font.has(b"ToUnicode") {
                continue;
            }
            match font.get_font_encoding(doc) {
                Ok(encoding) => {
                    encodings.insert(name, encoding);
                }
                Err(e) => log::debug!(
                    "Font /{} has no usable encoding: {}",
                    String::from_utf8_lossy(&name),
                    e
                ),
            }
        }
        Self { encodings }
    }

    /// Decode a string operand shown with `font`
    fn decode(&self, font: Option<&[u8]>, obj: &Object) -> Option<String> {
        let Object::String(bytes, _) = obj else {
            return None;
        };
        let decoded = font
            .and_then(|name| self.encodings.get(name))
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok());
        decoded.or_else(|| decode_string(obj))
    }
}

/// Text state tracked while walking a content stream
struct TextState {
    /// Horizontal and vertical scale of the text matrix
    scale_x: f32,
    scale_y: f32,
    /// Start of the current line in user space
    line_x: f32,
    line_y: f32,
    font: Option<Vec<u8>>,
    font_size: f32,
    leading: f32,
    current: Option<TextLine>,
    lines: Vec<TextLine>,
}

impl TextState {
    fn new() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            line_x: 0.0,
            line_y: 0.0,
            font: None,
            font_size: 12.0,
            leading: 0.0,
            current: None,
            lines: Vec::new(),
        }
    }

    fn begin_text(&mut self) {
        self.flush();
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        self.line_x = 0.0;
        self.line_y = 0.0;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.flush();
        self.line_x += tx * self.scale_x;
        self.line_y += ty * self.scale_y;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn set_matrix(&mut self, m: &[f32]) {
        self.flush();
        self.scale_x = if m[0] != 0.0 { m[0] } else { 1.0 };
        self.scale_y = if m[3] != 0.0 { m[3] } else { 1.0 };
        self.line_x = m[4];
        self.line_y = m[5];
    }

    fn show(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let size = (self.font_size * self.scale_y.abs()).max(1.0);
        let (x, y) = (self.line_x, self.line_y);
        let line = self.current.get_or_insert_with(|| TextLine {
            x,
            y,
            size,
            text: String::new(),
        });
        line.text.push_str(text);
    }

    fn flush(&mut self) {
        if let Some(line) = self.current.take() {
            if !line.text.trim().is_empty() {
                self.lines.push(line);
            }
        }
    }
}

/// Follow the text operators of one content stream and collect shown lines
fn collect_lines(operations: &[Operation], fonts: &PageFonts) -> Vec<TextLine> {
    let mut state = TextState::new();

    for op in operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        let decode = |obj: &Object| fonts.decode(state.font.as_deref(), obj);
        match op.operator.as_str() {
            "BT" => state.begin_text(),
            "ET" => state.flush(),
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    state.font = Some(name.clone());
                }
                if let Some(size) = nums.first() {
                    state.font_size = size.abs();
                }
            }
            "TL" => {
                if let Some(leading) = nums.first() {
                    state.leading = *leading;
                }
            }
            "Td" if nums.len() == 2 => state.move_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                state.leading = -nums[1];
                state.move_line(nums[0], nums[1]);
            }
            "Tm" if nums.len() == 6 => state.set_matrix(&nums),
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(decode) {
                    state.show(&text);
                }
            }
            "'" | "\"" => {
                let text = op.operands.last().and_then(decode);
                state.next_line();
                if let Some(text) = text {
                    state.show(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let text = decode_tj_array(items, decode);
                    state.show(&text);
                }
            }
            _ => {}
        }
    }

    state.flush();
    state.lines
}

/// Join a TJ array, turning large negative kerning into word spaces
fn decode_tj_array(items: &[Object], decode: impl Fn(&Object) -> Option<String>) -> String {
    let mut text = String::new();
    for item in items {
        if let Some(s) = decode(item) {
            text.push_str(&s);
        } else if let Some(adjust) = number(item) {
            if adjust < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                text.push(' ');
            }
        }
    }
    text
}

/// Fallback decoding: UTF-16BE with BOM, otherwise one byte per char
fn decode_string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Group lines into paragraph blocks by vertical proximity
fn group_lines(lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
    let mut groups: Vec<Vec<TextLine>> = Vec::new();

    for line in lines {
        let starts_new = match groups.last().and_then(|g| g.last()) {
            None => true,
            Some(prev) => {
                let gap = prev.y - line.y;
                let size = prev.size.max(line.size);
                gap > PARAGRAPH_GAP * size || gap < -0.5 * size
            }
        };

        if starts_new {
            groups.push(vec![line]);
        } else if let Some(group) = groups.last_mut() {
            group.push(line);
        }
    }

    groups
}

/// Build one block: lines joined by newlines, bounds in top-left coordinates
fn block_from_lines(lines: &[TextLine], page_index: usize, page: &PageBox) -> TextBlock {
    let text = lines
        .iter()
        .map(|l| l.text.trim())
        .collect::<Vec<_>>()
        .join("\n");

    let x0 = lines.iter().map(|l| l.x).fold(f32::MAX, f32::min);
    let x1 = lines.iter().map(TextLine::right).fold(f32::MIN, f32::max);
    let top = lines.iter().map(|l| l.y + l.size * 0.8).fold(f32::MIN, f32::max);
    let bottom = lines.iter().map(|l| l.y - l.size * 0.2).fold(f32::MAX, f32::min);

    let size = page.size();
    let clamp_x = |x: f32| (x - page.llx).clamp(0.0, size.width);
    let clamp_y = |y: f32| (page.ury - y).clamp(0.0, size.height);

    let region = Region::new(clamp_x(x0), clamp_y(top), clamp_x(x1), clamp_y(bottom));

    TextBlock::new(
        text,
        Some(SourceLocation {
            page_index,
            region,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::{write_pdf, write_pdf_with_font};
    use crate::text::LanguageFamily;
    use lopdf::{Stream, StringFormat, dictionary};
    use tempfile::TempDir;

    fn line(x: f32, y: f32, size: f32, text: &str) -> TextLine {
        TextLine {
            x,
            y,
            size,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_group_lines_by_gap() {
        let lines = vec![
            line(72.0, 700.0, 12.0, "first line"),
            line(72.0, 686.0, 12.0, "continues here"),
            line(72.0, 600.0, 12.0, "new paragraph"),
        ];
        let groups = group_lines(lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1][0].text, "new paragraph");
    }

    #[test]
    fn test_upward_jump_starts_new_block() {
        let lines = vec![
            line(72.0, 100.0, 12.0, "bottom of column one"),
            line(320.0, 700.0, 12.0, "top of column two"),
        ];
        assert_eq!(group_lines(lines).len(), 2);
    }

    #[test]
    fn test_decode_utf16_string() {
        let obj = Object::String(vec![0xFE, 0xFF, 0x03, 0xB1, 0x03, 0xB2], StringFormat::Hexadecimal);
        assert_eq!(decode_string(&obj).unwrap(), "αβ");
    }

    #[test]
    fn test_tj_array_spacing() {
        let items = vec![
            Object::string_literal("Hel"),
            Object::Integer(-20),
            Object::string_literal("lo"),
            Object::Integer(-300),
            Object::string_literal("world"),
        ];
        assert_eq!(decode_tj_array(&items, decode_string), "Hello world");
    }

    #[test]
    fn test_collect_lines_follows_td_and_tstar() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 10.into()]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("Td", vec![50.into(), 500.into()]),
            Operation::new("Tj", vec![Object::string_literal("one")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![Object::string_literal("two")]),
            Operation::new("ET", vec![]),
        ];
        let lines = collect_lines(&ops, &PageFonts::default());
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].x, lines[0].y), (50.0, 500.0));
        assert_eq!((lines[1].x, lines[1].y), (50.0, 488.0));
        assert_eq!(lines[1].size, 10.0);
    }

    #[test]
    fn test_extract_blocks_geometry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.pdf");
        write_pdf(&path, &[vec![(72.0, 700.0, 12.0, "Hello from a PDF page")]]);

        let (blocks, pages) = extract_blocks(&path).unwrap();
        assert_eq!(pages, vec![PageSize::default()]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Hello from a PDF page");

        let region = blocks[0].location.unwrap().region;
        // baseline 700 on a 792pt page sits 92pt from the top
        assert!(region.y0 < 92.0 && region.y1 > 92.0);
        assert_eq!(region.x0, 72.0);
        assert!(region.x1 > 72.0);
    }

    const GREEK_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
5 beginbfchar
<0001> <039A>
<0002> <03B1>
<0003> <03BB>
<0004> <03B7>
<0005> <0020>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_identity_h_font_decodes_through_to_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greek.pdf");
        write_pdf_with_font(
            &path,
            |doc| {
                let cmap_id = doc.add_object(Stream::new(dictionary! {}, GREEK_CMAP.to_vec()));
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type0",
                    "BaseFont" => "Arial",
                    "Encoding" => "Identity-H",
                    "ToUnicode" => cmap_id,
                })
            },
            b"BT /F1 12 Tf 72 700 Td <0001000200030004> Tj [<0005> -20 <00010002>] TJ ET",
        );

        let (blocks, _) = extract_blocks(&path).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Καλη Κα");

        let units = crate::text::units_from_blocks(blocks);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].language_family(), LanguageFamily::Greek);
    }

    #[test]
    fn test_win_ansi_font_maps_typographic_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.pdf");
        write_pdf_with_font(
            &path,
            |doc| {
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "TrueType",
                    "BaseFont" => "Calibri",
                    "Encoding" => "WinAnsiEncoding",
                })
            },
            b"BT /F1 12 Tf 72 700 Td <446F6E92742096207374> Tj ET",
        );

        let (blocks, _) = extract_blocks(&path).unwrap();
        assert_eq!(blocks[0].text, "Don\u{2019}t \u{2013} st");
    }

    #[test]
    fn test_unknown_font_falls_back_to_latin1() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F9".to_vec()), 10.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(b"caf\xe9".to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];
        let lines = collect_lines(&ops, &PageFonts::default());
        assert_eq!(lines[0].text, "caf\u{e9}");
    }

    #[test]
    fn test_one_page_two_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("two.pdf");
        write_pdf(
            &path,
            &[vec![
                (72.0, 700.0, 12.0, "A real paragraph of text."),
                (300.0, 40.0, 12.0, "7"),
            ]],
        );

        let (blocks, _) = extract_blocks(&path).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "7");
    }
}
