use super::diagnostics::line_from_stack;
use super::log::{ConsoleLog, LogKind};

/// A row of the console panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleLine {
    pub kind: LogKind,
    /// 1-based line shown to the user, if the entry could be located.
    pub line_number: Option<usize>,
    pub message: String,
}

impl ConsoleLine {
    pub fn from_log(log: &ConsoleLog) -> Self {
        let (line, message) = match log {
            ConsoleLog::Error(error) => (error.span().map(|s| s.start.line), error.to_string()),
            ConsoleLog::Warn { message, options } => {
                let line = options
                    .span
                    .map(|s| s.start.line)
                    .or_else(|| options.stack.as_deref().and_then(line_from_stack));
                (line, message.clone())
            }
            ConsoleLog::Debug { message, span } => (Some(span.start.line), message.clone()),
        };
        Self {
            kind: log.kind(),
            line_number: line.map(|l| l + 1),
            message,
        }
    }

    /// `@warn:3`, or `@error:` when the entry has no location.
    pub fn location_label(&self) -> String {
        match self.line_number {
            Some(line) => format!("@{}:{}", self.kind, line),
            None => format!("@{}:", self.kind),
        }
    }
}

pub fn console_lines(logs: &[ConsoleLog]) -> Vec<ConsoleLine> {
    logs.iter().map(ConsoleLine::from_log).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::error::CompileError;
    use crate::compiler::log::WarnOptions;
    use crate::compiler::span::{SourceLocation, SourceSpan};

    #[test]
    fn lines_are_presented_one_based() {
        let span = SourceSpan {
            start: SourceLocation { line: 4, column: 0, offset: 30 },
            end: SourceLocation { line: 4, column: 3, offset: 33 },
        };
        let line = ConsoleLine::from_log(&ConsoleLog::Debug { message: "x".into(), span });
        assert_eq!(line.location_label(), "@debug:5");
    }

    #[test]
    fn warn_falls_back_to_stack_and_unknown_error_has_no_line() {
        let warn = ConsoleLog::Warn {
            message: "w".into(),
            options: WarnOptions { stack: Some("- 3:1 root".into()), ..Default::default() },
        };
        assert_eq!(ConsoleLine::from_log(&warn).line_number, Some(3));

        let err = ConsoleLine::from_log(&ConsoleLog::Error(CompileError::Unknown(Some("boom".into()))));
        assert_eq!(err.location_label(), "@error:");
        assert_eq!(err.message, "boom");
    }
}
