use std::ops::Range;

use eframe::egui;

use super::utils::parse_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Comment,
    String,
    Variable,
    AtRule,
    Number,
    HexColor,
    Property,
    Function,
    Placeholder,
    Interpolation,
    Bracket { depth: usize },
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub range: Range<usize>,
    pub kind: TokenKind,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Splits Sass source (either syntax) into highlight tokens. Every byte of
/// `code` belongs to exactly one token.
pub fn tokenize(code: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut push = |range: Range<usize>, kind: TokenKind| {
        if range.is_empty() {
            return;
        }
        match tokens.last_mut() {
            Some(last) if last.kind == kind && kind == TokenKind::Plain && last.range.end == range.start => {
                last.range.end = range.end;
            }
            _ => tokens.push(Token { range, kind }),
        }
    };

    let mut chars = code.char_indices().peekable();
    let mut depth: usize = 0;

    // Consumes while `pred` holds; returns the end byte offset.
    fn eat_while(
        chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
        mut end: usize,
        pred: impl Fn(char) -> bool,
    ) -> usize {
        while let Some(&(i, c)) = chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        end
    }

    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        let after = idx + c.len_utf8();

        match c {
            // 1. Comments
            '/' if next == Some('/') => {
                let end = eat_while(&mut chars, after, |c| c != '\n');
                push(idx..end, TokenKind::Comment);
            }
            '/' if next == Some('*') => {
                chars.next();
                let mut end = after + 1;
                let mut prev = '\0';
                for (i, ch) in chars.by_ref() {
                    end = i + ch.len_utf8();
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
                push(idx..end, TokenKind::Comment);
            }

            // 2. Strings
            '"' | '\'' => {
                let quote = c;
                let mut end = after;
                let mut escaped = false;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch == '\n' {
                        break;
                    }
                    chars.next();
                    end = i + ch.len_utf8();
                    if ch == quote && !escaped {
                        break;
                    }
                    escaped = ch == '\\' && !escaped;
                }
                push(idx..end, TokenKind::String);
            }

            // 3. Interpolation opener / hex colors
            '#' if next == Some('{') => {
                chars.next();
                depth += 1;
                push(idx..after + 1, TokenKind::Interpolation);
            }
            '#' => {
                let end = eat_while(&mut chars, after, is_ident_char);
                let kind = if parse_hex(&code[idx..end]).is_some() {
                    TokenKind::HexColor
                } else {
                    TokenKind::Plain
                };
                push(idx..end, kind);
            }

            // 4. Sigils
            '$' => {
                let end = eat_while(&mut chars, after, is_ident_char);
                push(idx..end, TokenKind::Variable);
            }
            '@' => {
                let end = eat_while(&mut chars, after, is_ident_char);
                push(idx..end, TokenKind::AtRule);
            }
            '%' if next.is_some_and(|n| n.is_alphabetic()) => {
                let end = eat_while(&mut chars, after, is_ident_char);
                push(idx..end, TokenKind::Placeholder);
            }

            // 5. Brackets (rainbow)
            '(' | '[' | '{' => {
                push(idx..after, TokenKind::Bracket { depth });
                depth += 1;
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                push(idx..after, TokenKind::Bracket { depth });
            }

            // 6. Numbers with units
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let end = eat_while(&mut chars, after, |c| c.is_ascii_digit() || c == '.');
                let end = eat_while(&mut chars, end, |c| c.is_alphabetic() || c == '%');
                push(idx..end, TokenKind::Number);
            }

            // 7. Identifiers: properties, functions, plain words
            c if c.is_alphabetic() || c == '_' || (c == '-' && next.is_some_and(|n| n.is_alphabetic() || n == '-')) => {
                let end = eat_while(&mut chars, after, is_ident_char);
                let kind = match chars.peek() {
                    Some(&(_, '(')) => TokenKind::Function,
                    Some(&(_, ':')) if is_property_position(code, idx) => TokenKind::Property,
                    _ => TokenKind::Plain,
                };
                push(idx..end, kind);
            }

            ':' | ';' | ',' | '+' | '*' | '/' | '=' | '>' | '<' | '!' | '&' | '~' => {
                push(idx..after, TokenKind::Operator);
            }

            _ => push(idx..after, TokenKind::Plain),
        }
    }
    tokens
}

/// A `word:` is a property when it starts the line's content and the colon is
/// followed by whitespace (so `a:hover` selectors stay plain).
fn is_property_position(code: &str, start: usize) -> bool {
    let line_start = code[..start].rfind('\n').map_or(0, |i| i + 1);
    let leading = &code[line_start..start];
    if !leading.chars().all(char::is_whitespace) {
        return false;
    }
    let rest = &code[start..];
    rest.find(':')
        .map(|colon| rest[colon + 1..].chars().next().map_or(true, char::is_whitespace))
        .unwrap_or(false)
}

// Rainbow bracket colors (pastel for dark theme)
const RAINBOW: [egui::Color32; 6] = [
    egui::Color32::from_rgb(255, 215, 0),
    egui::Color32::from_rgb(218, 112, 214),
    egui::Color32::from_rgb(23, 159, 255),
    egui::Color32::from_rgb(120, 220, 120),
    egui::Color32::from_rgb(255, 140, 100),
    egui::Color32::from_rgb(120, 200, 230),
];

fn token_color(kind: TokenKind, text: &str) -> egui::Color32 {
    match kind {
        TokenKind::Plain => egui::Color32::from_rgb(215, 186, 125),
        TokenKind::Comment => egui::Color32::from_rgb(106, 153, 85),
        TokenKind::String => egui::Color32::from_rgb(206, 145, 120),
        TokenKind::Variable => egui::Color32::from_rgb(156, 220, 254),
        TokenKind::AtRule => egui::Color32::from_rgb(197, 134, 192),
        TokenKind::Number => egui::Color32::from_rgb(181, 206, 168),
        TokenKind::HexColor => match parse_hex(text) {
            Some([r, g, b, _]) => egui::Color32::from_rgb(r, g, b),
            None => egui::Color32::LIGHT_GRAY,
        },
        TokenKind::Property => egui::Color32::from_rgb(156, 220, 254).gamma_multiply(0.85),
        TokenKind::Function => egui::Color32::from_rgb(220, 220, 170),
        TokenKind::Placeholder => egui::Color32::from_rgb(78, 201, 176),
        TokenKind::Interpolation => egui::Color32::from_rgb(86, 156, 214),
        TokenKind::Bracket { depth } => RAINBOW[depth % RAINBOW.len()],
        TokenKind::Operator => egui::Color32::from_rgb(212, 212, 212),
    }
}

pub(crate) fn highlight_code(job: &mut egui::text::LayoutJob, code: &str, font_size: f32) {
    let font_id = egui::FontId::monospace(font_size);
    for token in tokenize(code) {
        let text = &code[token.range];
        append_text(job, text, &font_id, token_color(token.kind, text));
    }
}

fn append_text(
    job: &mut egui::text::LayoutJob,
    text: &str,
    font_id: &egui::FontId,
    color: egui::Color32,
) {
    if text.is_empty() {
        return;
    }
    job.append(
        text,
        0.0,
        egui::text::TextFormat {
            font_id: font_id.clone(),
            color,
            ..Default::default()
        },
    );
}
