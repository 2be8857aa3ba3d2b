use std::ops::Range;

/// A position in the input buffer. `line` and `column` are 0-indexed, the
/// column counts characters; `offset` is a byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn offsets(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }
}

/// Line-start table for converting between line/column and byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of `line` without its trailing newline. Lines past the end
    /// collapse to the end of the text.
    pub fn line_range(&self, line: usize) -> Range<usize> {
        let Some(&start) = self.line_starts.get(line) else {
            return self.len..self.len;
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        start..end
    }

    /// Byte offset of a 0-indexed line and character column, clamped to the
    /// end of that line.
    pub fn offset(&self, text: &str, line: usize, column: usize) -> usize {
        let range = self.line_range(line);
        let line_text = &text[range.clone()];
        let within = line_text
            .char_indices()
            .nth(column)
            .map(|(i, _)| i)
            .unwrap_or(line_text.len());
        range.start + within
    }

    pub fn location(&self, text: &str, line: usize, column: usize) -> SourceLocation {
        SourceLocation {
            line,
            column,
            offset: self.offset(text, line, column),
        }
    }

    /// 0-indexed line containing byte `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }
}
