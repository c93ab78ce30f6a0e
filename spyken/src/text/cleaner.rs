//! Text cleaning for extracted document blocks.

/// Characters that trip up speech backends, and their replacements.
const PROBLEMATIC_CHARS: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201c}', "\""),  // Left double quote
    ('\u{201d}', "\""),  // Right double quote
    ('\u{00ab}', "\""),  // Left-pointing double angle quote
    ('\u{00bb}', "\""),  // Right-pointing double angle quote
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "-"),   // Em dash
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00a0}', " "),   // Non-breaking space
    ('\u{00ad}', ""),    // Soft hyphen (common in PDF text)
    ('\u{200b}', ""),    // Zero-width space
    ('\u{200c}', ""),    // Zero-width non-joiner
    ('\u{200d}', ""),    // Zero-width joiner
    ('\u{feff}', ""),    // BOM
];

/// Clean one extracted block into a single speakable line.
///
/// Replaces typographic characters, drops control characters and joins the
/// block's internal line breaks with single spaces.
pub fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        let replacement = PROBLEMATIC_CHARS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, r)| *r);

        if let Some(r) = replacement {
            result.push_str(r);
        } else if c.is_whitespace() {
            result.push(' ');
        } else if !c.is_control() {
            result.push(c);
        }
    }

    collapse_spaces(&result)
}

/// Collapse runs of spaces into one and trim the ends.
fn collapse_spaces(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;

    for c in text.trim().chars() {
        if c == ' ' {
            if !prev_was_space {
                result.push(' ');
            }
            prev_was_space = true;
        } else {
            prev_was_space = false;
            result.push(c);
        }
    }

    result
}
