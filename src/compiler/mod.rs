/// Compiler seam: the pipeline only talks to [`Compiler`], the grass backend
/// is one implementation of it.
pub mod console;
pub mod diagnostics;
pub mod error;
pub mod grass_backend;
pub mod loader;
pub mod log;
pub mod span;

use std::cell::RefCell;

use crate::states::{InputFormat, OutputFormat};

// --- Re-exports ---
pub use console::{console_lines, ConsoleLine};
pub use diagnostics::{logs_to_diagnostics, Diagnostic, Severity};
pub use error::CompileError;
pub use grass_backend::GrassCompiler;
pub use log::{ConsoleLog, LogKind, WarnOptions};
pub use span::{LineIndex, SourceLocation, SourceSpan};

/// Input of a single compile call.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a str,
    pub syntax: InputFormat,
    pub style: OutputFormat,
}

/// Receives `@warn` / `@debug` output while a compile is running.
pub trait CompileLogger {
    fn warn(&self, message: &str, options: WarnOptions);
    fn debug(&self, message: &str, span: SourceSpan);
}

/// A synchronous Sass compiler.
pub trait Compiler {
    fn compile(
        &self,
        request: &CompileRequest<'_>,
        logger: &dyn CompileLogger,
    ) -> Result<String, CompileError>;

    /// Human-readable name and version, shown in the tab bar.
    fn version(&self) -> String;
}

/// Collects logger callbacks of one compile so the view is repainted once,
/// after the compile returns.
#[derive(Debug, Default)]
pub struct DebugOutputCollector {
    entries: RefCell<Vec<ConsoleLog>>,
}

impl DebugOutputCollector {
    pub fn push(&self, log: ConsoleLog) {
        self.entries.borrow_mut().push(log);
    }

    pub fn into_entries(self) -> Vec<ConsoleLog> {
        self.entries.into_inner()
    }
}

impl CompileLogger for DebugOutputCollector {
    fn warn(&self, message: &str, options: WarnOptions) {
        self.push(ConsoleLog::Warn {
            message: message.to_string(),
            options,
        });
    }

    fn debug(&self, message: &str, span: SourceSpan) {
        self.push(ConsoleLog::Debug {
            message: message.to_string(),
            span,
        });
    }
}
