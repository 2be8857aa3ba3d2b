use std::ops::Range;

use eframe::egui;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::states::Selection;

// ─── Char / byte / line mapping ──────────────────────────────────────────────
//
// egui cursors count chars, the compiler and the codec count bytes and
// 1-indexed line/column pairs.

/// Byte offset of char index `char_idx`, clamped to the end of `text`.
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Char index of byte offset `byte` (rounded down to a char boundary).
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    text[..floor_char_boundary(text, byte)].chars().count()
}

/// Byte offset rounded down to the nearest char boundary of `text`.
pub fn floor_char_boundary(text: &str, byte: usize) -> usize {
    let mut byte = byte.min(text.len());
    while !text.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// Splits the byte span `from..to` into one range per line of `text`.
/// Offsets may come from an older version of the text, so both ends are
/// clamped to char boundaries first.
pub fn line_segments(text: &str, from: usize, to: usize) -> Vec<Range<usize>> {
    let from = floor_char_boundary(text, from);
    let to = floor_char_boundary(text, to).max(from);
    let mut segments = Vec::new();
    let mut seg_start = from;
    loop {
        let line_end = text[seg_start..]
            .find('\n')
            .map_or(text.len(), |i| seg_start + i);
        segments.push(seg_start..to.min(line_end));
        if to <= line_end {
            return segments;
        }
        seg_start = line_end + 1;
    }
}

/// 1-indexed (line, column) of a char index; columns count chars.
pub fn line_col_of_char(text: &str, char_idx: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for ch in text.chars().take(char_idx) {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Char index of a 1-indexed (line, column), clamped to the line's end and
/// to the end of the text.
pub fn char_of_line_col(text: &str, line: usize, column: usize) -> usize {
    let mut idx = 0;
    let mut current = 1;
    let mut chars = text.chars().peekable();
    while current < line {
        match chars.next() {
            Some('\n') => {
                current += 1;
                idx += 1;
            }
            Some(_) => idx += 1,
            None => return idx,
        }
    }
    for _ in 1..column {
        match chars.next() {
            Some('\n') | None => break,
            Some(_) => idx += 1,
        }
    }
    idx
}

/// Selection for an editor char range; `None` when it is a bare cursor.
pub fn selection_from_chars(text: &str, range: Range<usize>) -> Option<Selection> {
    let (start, end) = if range.start <= range.end {
        (range.start, range.end)
    } else {
        (range.end, range.start)
    };
    let (from_line, from_column) = line_col_of_char(text, start);
    let (to_line, to_column) = line_col_of_char(text, end);
    Selection::new(from_line, from_column, to_line, to_column)
}

pub fn chars_of_selection(text: &str, selection: &Selection) -> Range<usize> {
    let from = char_of_line_col(text, selection.from_line, selection.from_column);
    let to = char_of_line_col(text, selection.to_line, selection.to_column);
    from.min(to)..from.max(to)
}

// ─── Colors ──────────────────────────────────────────────────────────────────

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3,4})\b").expect("hex color regex")
});

static RGB_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\brgba?\(\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*(?:[,/]\s*(\d*\.?\d+)\s*)?\)",
    )
    .expect("rgb function regex")
});

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` into RGBA bytes.
pub fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&digits[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match digits.len() {
        3 => Some([nibble(0)?, nibble(1)?, nibble(2)?, 255]),
        4 => Some([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMatch {
    /// Byte range of the literal in the source.
    pub range: Range<usize>,
    pub rgba: [u8; 4],
}

/// Color literals in declaration values: hex colors and `rgb()`/`rgba()`
/// with plain numeric channels. Hex in selectors (`#id`) is skipped by only
/// looking after a `:` on the same line.
pub fn find_colors(code: &str) -> Vec<ColorMatch> {
    let mut colors = Vec::new();
    let mut line_start = 0;
    for line in code.split_inclusive('\n') {
        if let Some(colon) = line.find(':') {
            let value = &line[colon..];
            let base = line_start + colon;
            for m in HEX_COLOR.find_iter(value) {
                if let Some(rgba) = parse_hex(m.as_str()) {
                    colors.push(ColorMatch {
                        range: base + m.start()..base + m.end(),
                        rgba,
                    });
                }
            }
            for caps in RGB_FUNCTION.captures_iter(value) {
                let channel = |i: usize| caps[i].parse::<u16>().ok().filter(|v| *v <= 255);
                let (Some(r), Some(g), Some(b)) = (channel(1), channel(2), channel(3)) else {
                    continue;
                };
                let alpha = caps
                    .get(4)
                    .and_then(|a| a.as_str().parse::<f32>().ok())
                    .map_or(255, |a| (a.clamp(0.0, 1.0) * 255.0).round() as u8);
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                colors.push(ColorMatch {
                    range: base + whole.start..base + whole.end,
                    rgba: [r as u8, g as u8, b as u8, alpha],
                });
            }
        }
        line_start += line.len();
    }
    colors.sort_by_key(|c| c.range.start);
    colors
}

/// Paints a small swatch right after every color literal in the editor.
pub fn paint_color_swatches(
    ui: &egui::Ui,
    code: &str,
    output: &egui::text_edit::TextEditOutput,
    font_size: f32,
) {
    let galley = &output.galley;
    let painter = ui.painter();
    let size = (font_size * 0.7).max(6.0);
    for color in find_colors(code) {
        let end = galley.from_ccursor(egui::text::CCursor::new(byte_to_char(code, color.range.end)));
        let glyph = galley.pos_from_cursor(&end);
        let center = output.galley_pos + glyph.right_center().to_vec2() + egui::vec2(size * 0.5 + 3.0, 0.0);
        let rect = egui::Rect::from_center_size(center, egui::vec2(size, size));
        if !ui.clip_rect().intersects(rect) {
            continue;
        }
        let [r, g, b, a] = color.rgba;
        painter.rect_filled(rect, 2.0, egui::Color32::from_rgba_unmultiplied(r, g, b, a));
        painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, egui::Color32::from_gray(120)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_segments_split_on_newlines() {
        let code = "a {\n  b: $x;\n}";
        assert_eq!(line_segments(code, 2, 8), vec![2..3, 4..8]);
        assert_eq!(line_segments(code, 6, 6), vec![6..6]);
        assert_eq!(line_segments(code, 40, 50), vec![code.len()..code.len()]);
    }

    #[test]
    fn stale_offsets_inside_multibyte_chars_are_clamped() {
        // offsets from an earlier compile now land inside an "é"
        let code = "a{b:ééé$x}";
        assert!(!code.is_char_boundary(7));
        let segments = line_segments(code, 7, 9);
        assert_eq!(segments, vec![6..8]);
        for seg in &segments {
            assert!(code.get(seg.clone()).is_some());
        }
        assert_eq!(byte_to_char(code, 7), 5);
    }

    #[test]
    fn parses_all_hex_lengths() {
        assert_eq!(parse_hex("#78c8ff"), Some([0x78, 0xc8, 0xff, 255]));
        assert_eq!(parse_hex("#11223344"), Some([0x11, 0x22, 0x33, 0x44]));
        assert_eq!(parse_hex("#f0a"), Some([0xff, 0x00, 0xaa, 255]));
        assert_eq!(parse_hex("#f0a8"), Some([0xff, 0x00, 0xaa, 0x88]));
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("123456"), None);
    }

    #[test]
    fn finds_colors_in_values_only() {
        let code = "#main {\n  color: #f00;\n  background: rgba(0, 128, 255, 0.5);\n}\n";
        let colors = find_colors(code);
        assert_eq!(colors.len(), 2);
        assert_eq!(&code[colors[0].range.clone()], "#f00");
        assert_eq!(colors[0].rgba, [255, 0, 0, 255]);
        assert_eq!(&code[colors[1].range.clone()], "rgba(0, 128, 255, 0.5)");
        assert_eq!(colors[1].rgba, [0, 128, 255, 128]);
    }

    #[test]
    fn out_of_range_channels_are_skipped() {
        assert!(find_colors("a: rgb(300, 0, 0)").is_empty());
        assert!(find_colors("a: #{$x}").is_empty());
    }

    #[test]
    fn char_byte_mapping_handles_multibyte() {
        let text = "é\nab";
        assert_eq!(char_to_byte(text, 1), 2);
        assert_eq!(char_to_byte(text, 99), text.len());
        assert_eq!(byte_to_char(text, 1), 0);
        assert_eq!(byte_to_char(text, 3), 2);
    }

    #[test]
    fn selection_roundtrips_through_char_ranges() {
        let text = "a {\n  color: red;\n}";
        let selection = selection_from_chars(text, 6..11).expect("non-empty");
        assert_eq!(selection, Selection::new(2, 3, 2, 8).expect("sel"));
        assert_eq!(selection.to_string(), "L2C3-L2C8");
        assert_eq!(chars_of_selection(text, &selection), 6..11);

        // reversed (selected backwards)
        assert_eq!(selection_from_chars(text, 11..6), Some(selection));
        assert_eq!(selection_from_chars(text, 4..4), None);
    }

    #[test]
    fn selection_past_the_end_is_clamped() {
        let text = "ab\ncd";
        let selection = Selection::new(2, 1, 9, 9).expect("sel");
        assert_eq!(chars_of_selection(text, &selection), 3..5);
        let long_column = Selection::new(1, 1, 1, 50).expect("sel");
        assert_eq!(chars_of_selection(text, &long_column), 0..2);
    }
}
