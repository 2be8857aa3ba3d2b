use std::fmt;

use super::error::CompileError;
use super::span::SourceSpan;

/// Extra data attached to a `@warn` callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarnOptions {
    pub span: Option<SourceSpan>,
    /// Deprecation identifier, when the warning is a deprecation notice.
    pub deprecation: Option<String>,
    /// Stack trace text, e.g. `"- 3:4  root stylesheet"`.
    pub stack: Option<String>,
}

/// One entry of the debug output of a compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLog {
    Error(CompileError),
    Warn { message: String, options: WarnOptions },
    Debug { message: String, span: SourceSpan },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Error,
    Warn,
    Debug,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Error => "error",
            LogKind::Warn => "warn",
            LogKind::Debug => "debug",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConsoleLog {
    pub fn kind(&self) -> LogKind {
        match self {
            ConsoleLog::Error(_) => LogKind::Error,
            ConsoleLog::Warn { .. } => LogKind::Warn,
            ConsoleLog::Debug { .. } => LogKind::Debug,
        }
    }
}
