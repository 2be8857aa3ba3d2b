//! Compiler logs → editor diagnostics.
//!
//! Every compile replaces the editor's whole diagnostic set with the output of
//! [`logs_to_diagnostics`]; nothing is merged with the previous run.
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::CompileError;
use super::log::{ConsoleLog, WarnOptions};
use super::span::{LineIndex, SourceSpan};

// ─── Diagnostic ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// An annotation on the input buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offsets into the input.
    pub from: usize,
    pub to: usize,
    /// 0-based line of `from`.
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn at_span(span: &SourceSpan, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            from: span.start.offset,
            to: span.end.offset,
            line: span.start.line,
            severity,
            message: message.into(),
        }
    }
}

// ─── Stack traces ─────────────────────────────────────────────────────────────

static STACK_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- (\d+):(\d+) ").expect("stack location regex"));

/// Recovers a 0-based line from a stack trace such as `"- 3:4  root
/// stylesheet"`. Stack lines are 1-based, everything else here is 0-based.
pub fn line_from_stack(stack: &str) -> Option<usize> {
    let caps = STACK_LOCATION.captures(stack)?;
    caps[1].parse::<usize>().ok()?.checked_sub(1)
}

// ─── Conversion ───────────────────────────────────────────────────────────────

pub fn error_to_diagnostic(error: &CompileError) -> Diagnostic {
    match error {
        CompileError::Exception { span, .. } => {
            Diagnostic::at_span(span, Severity::Error, error.to_string())
        }
        CompileError::Unknown(_) => Diagnostic {
            from: 0,
            to: 0,
            line: 0,
            severity: Severity::Error,
            message: error.to_string(),
        },
    }
}

/// `None` when neither a span nor a usable stack trace locates the warning.
pub fn warn_to_diagnostic(
    message: &str,
    options: &WarnOptions,
    index: &LineIndex,
) -> Option<Diagnostic> {
    if let Some(span) = &options.span {
        return Some(Diagnostic::at_span(span, Severity::Warning, message));
    }
    let line = options.stack.as_deref().and_then(line_from_stack)?;
    if line >= index.line_count() {
        return None;
    }
    let range = index.line_range(line);
    Some(Diagnostic {
        from: range.start,
        to: range.end,
        line,
        severity: Severity::Warning,
        message: message.to_string(),
    })
}

pub fn debug_to_diagnostic(message: &str, span: &SourceSpan) -> Diagnostic {
    Diagnostic::at_span(span, Severity::Info, message)
}

/// Maps a compile's logs onto `source`, in log order.
pub fn logs_to_diagnostics(logs: &[ConsoleLog], source: &str) -> Vec<Diagnostic> {
    let index = LineIndex::new(source);
    logs.iter()
        .filter_map(|log| match log {
            ConsoleLog::Error(error) => Some(error_to_diagnostic(error)),
            ConsoleLog::Warn { message, options } => {
                warn_to_diagnostic(message, options, &index)
            }
            ConsoleLog::Debug { message, span } => Some(debug_to_diagnostic(message, span)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::error::UNKNOWN_ERROR_MESSAGE;
    use crate::compiler::span::SourceLocation;

    fn span(line: usize, from_col: usize, to_col: usize, base: usize) -> SourceSpan {
        SourceSpan {
            start: SourceLocation { line, column: from_col, offset: base + from_col },
            end: SourceLocation { line, column: to_col, offset: base + to_col },
        }
    }

    const SOURCE: &str = "a {\n  b: c;\n  d: e;\n}";

    #[test]
    fn warn_with_span_uses_span_offsets() {
        let logs = vec![ConsoleLog::Warn {
            message: "careful".into(),
            options: WarnOptions { span: Some(span(2, 0, 5, 12)), ..Default::default() },
        }];
        let diags = logs_to_diagnostics(&logs, SOURCE);
        assert_eq!(diags.len(), 1);
        assert_eq!((diags[0].from, diags[0].to), (12, 17));
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].line, 2);
    }

    #[test]
    fn warn_with_stack_only_is_shifted_to_zero_based_line() {
        let logs = vec![ConsoleLog::Warn {
            message: "from stack".into(),
            options: WarnOptions {
                stack: Some("- 3:4  root stylesheet".into()),
                ..Default::default()
            },
        }];
        let diags = logs_to_diagnostics(&logs, SOURCE);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 2);
        assert_eq!(&SOURCE[diags[0].from..diags[0].to], "  d: e;");
    }

    #[test]
    fn unlocatable_warning_is_dropped() {
        let logs = vec![
            ConsoleLog::Warn { message: "nowhere".into(), options: WarnOptions::default() },
            ConsoleLog::Warn {
                message: "bad stack".into(),
                options: WarnOptions { stack: Some("at line 3".into()), ..Default::default() },
            },
            ConsoleLog::Warn {
                message: "past the end".into(),
                options: WarnOptions { stack: Some("- 40:1 x".into()), ..Default::default() },
            },
        ];
        assert!(logs_to_diagnostics(&logs, SOURCE).is_empty());
    }

    #[test]
    fn errors_map_to_span_or_origin() {
        let logs = vec![
            ConsoleLog::Error(CompileError::Exception {
                message: "expected \"}\".".into(),
                span: span(1, 2, 3, 4),
            }),
            ConsoleLog::Error(CompileError::Unknown(None)),
            ConsoleLog::Debug { message: "dbg".into(), span: span(0, 0, 1, 0) },
        ];
        let diags = logs_to_diagnostics(&logs, SOURCE);
        assert_eq!(diags.len(), 3);
        assert_eq!((diags[0].from, diags[0].to, diags[0].severity), (6, 7, Severity::Error));
        assert_eq!((diags[1].from, diags[1].to), (0, 0));
        assert_eq!(diags[1].message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(diags[2].severity, Severity::Info);
    }

    #[test]
    fn stack_line_zero_is_rejected() {
        assert_eq!(line_from_stack("- 0:1 root"), None);
        assert_eq!(line_from_stack("- 12:1 root"), Some(11));
    }
}
