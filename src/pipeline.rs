//! Compile-and-render: one compile of the current state, folded back into the
//! store and turned into what the views show.

use crate::compiler::{
    console_lines, logs_to_diagnostics, CompileError, CompileRequest, Compiler, ConsoleLine,
    ConsoleLog, DebugOutputCollector, Diagnostic,
};
use crate::states::StateStore;

/// Raw result of a compile, stamped with the generation it was started in.
#[derive(Debug)]
pub struct CompileOutcome {
    pub generation: u64,
    /// Source the compile ran on; diagnostics are mapped against it.
    pub source: String,
    pub result: Result<String, CompileError>,
    pub logs: Vec<ConsoleLog>,
}

/// What the views need after a compile was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileReport {
    pub generation: u64,
    /// New output-pane text, `None` when the compile failed.
    pub css: Option<String>,
    /// Full replacement set for the editor overlay.
    pub diagnostics: Vec<Diagnostic>,
    pub console: Vec<ConsoleLine>,
}

#[derive(Debug, Default)]
pub struct CompilePipeline {
    started: u64,
    applied: u64,
}

impl CompilePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the last outcome that reached the store.
    pub fn applied_generation(&self) -> u64 {
        self.applied
    }

    /// Compiles the store's current input and applies the result.
    pub fn run(&mut self, store: &mut StateStore, compiler: &dyn Compiler) -> Option<CompileReport> {
        let outcome = self.compile(store, compiler);
        self.apply(store, outcome)
    }

    /// Runs the compiler without touching the store.
    pub fn compile(&mut self, store: &StateStore, compiler: &dyn Compiler) -> CompileOutcome {
        self.started += 1;
        let generation = self.started;
        let state = store.state();
        let request = CompileRequest {
            source: &state.input_value,
            syntax: state.input_format,
            style: state.output_format,
        };

        let _span = tracing::debug_span!("compile", generation, syntax = ?request.syntax, style = ?request.style).entered();
        let collector = DebugOutputCollector::default();
        let result = compiler.compile(&request, &collector);
        match &result {
            Ok(css) => tracing::debug!(bytes = css.len(), "compile succeeded"),
            Err(err) => tracing::debug!(%err, "compile failed"),
        }

        CompileOutcome {
            generation,
            source: state.input_value.clone(),
            result,
            logs: collector.into_entries(),
        }
    }

    /// Folds an outcome into the store. Outcomes older than the last applied
    /// one are dropped so a slow compile never overwrites a newer result.
    pub fn apply(&mut self, store: &mut StateStore, outcome: CompileOutcome) -> Option<CompileReport> {
        if outcome.generation <= self.applied {
            tracing::debug!(
                generation = outcome.generation,
                applied = self.applied,
                "dropping stale compile result"
            );
            return None;
        }
        self.applied = outcome.generation;

        let mut logs = outcome.logs;
        let css = match outcome.result {
            Ok(css) => {
                store.set_output_value(css.clone());
                store.set_compiler_has_error(false);
                Some(css)
            }
            Err(err) => {
                store.set_compiler_has_error(true);
                logs.push(ConsoleLog::Error(err));
                None
            }
        };

        let diagnostics = logs_to_diagnostics(&logs, &outcome.source);
        let console = console_lines(&logs);
        store.replace_debug_output(logs);

        Some(CompileReport {
            generation: outcome.generation,
            css,
            diagnostics,
            console,
        })
    }
}
