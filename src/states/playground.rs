use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compiler::ConsoleLog;

/// Source syntax the input buffer is interpreted as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFormat {
    #[default]
    Scss,
    Indented,
}

impl InputFormat {
    pub const ALL: [InputFormat; 2] = [InputFormat::Scss, InputFormat::Indented];

    pub fn label(self) -> &'static str {
        match self {
            InputFormat::Scss => "SCSS",
            InputFormat::Indented => "Indented",
        }
    }

    /// Single-digit flag used in share links: `1` = scss, `0` = indented.
    pub fn flag(self) -> char {
        match self {
            InputFormat::Scss => '1',
            InputFormat::Indented => '0',
        }
    }

    pub fn from_flag(flag: char) -> Self {
        if flag == '1' {
            InputFormat::Scss
        } else {
            InputFormat::Indented
        }
    }
}

/// Formatting style of the compiled CSS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Expanded,
    Compressed,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Expanded, OutputFormat::Compressed];

    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Expanded => "Expanded",
            OutputFormat::Compressed => "Compressed",
        }
    }

    /// Single-digit flag used in share links: `1` = expanded, `0` = compressed.
    pub fn flag(self) -> char {
        match self {
            OutputFormat::Expanded => '1',
            OutputFormat::Compressed => '0',
        }
    }

    pub fn from_flag(flag: char) -> Self {
        if flag == '1' {
            OutputFormat::Expanded
        } else {
            OutputFormat::Compressed
        }
    }
}

/// A non-empty editor selection. All four coordinates are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub from_line: usize,
    pub from_column: usize,
    pub to_line: usize,
    pub to_column: usize,
}

impl Selection {
    /// Returns `None` for a collapsed range; a bare cursor is not a selection.
    pub fn new(from_line: usize, from_column: usize, to_line: usize, to_column: usize) -> Option<Self> {
        if from_line == to_line && from_column == to_column {
            return None;
        }
        Some(Self {
            from_line,
            from_column,
            to_line,
            to_column,
        })
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L{}C{}-L{}C{}",
            self.from_line, self.from_column, self.to_line, self.to_column
        )
    }
}

/// The single mutable record behind a playground session.
///
/// Only [`crate::states::store::StateStore`] hands out mutable access; every
/// other consumer reads it through `&PlaygroundState`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaygroundState {
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub input_value: String,
    /// Last successfully compiled CSS.
    pub output_value: String,
    pub compiler_has_error: bool,
    /// Logs of the most recent compile, replaced wholesale on each run.
    pub debug_output: Vec<ConsoleLog>,
    pub selection: Option<Selection>,
}
