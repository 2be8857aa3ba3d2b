//! Owner of [`PlaygroundState`] and the side-effect table that runs on every
//! write.
//!
//! Every setter applies the value first, then runs the effects listed for its
//! [`Field`]. There is no dirty check: writing the current value again re-runs
//! the effects, which is how re-selecting the active output style still forces
//! a recompile.

use std::time::Duration;

use super::debounce::Debouncer;
use super::playground::{InputFormat, OutputFormat, PlaygroundState, Selection};
use crate::compiler::ConsoleLog;

/// A writable field of [`PlaygroundState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    InputFormat,
    OutputFormat,
    InputValue,
    OutputValue,
    CompilerHasError,
    DebugOutput,
    Selection,
}

/// Work triggered synchronously by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Format buttons must reflect the active input/output format.
    RefreshControls,
    /// Arm (or re-arm) the compile debouncer.
    ScheduleCompile,
    /// The error tint of the editor must follow `compiler_has_error`.
    RefreshErrorIndicator,
    /// Arm (or re-arm) the share-link debouncer.
    ScheduleShareLink,
}

impl Field {
    pub fn effects(self) -> &'static [Effect] {
        match self {
            Field::InputFormat | Field::OutputFormat => &[
                Effect::RefreshControls,
                Effect::ScheduleCompile,
                Effect::ScheduleShareLink,
            ],
            Field::InputValue => &[Effect::ScheduleCompile, Effect::ScheduleShareLink],
            Field::CompilerHasError => &[Effect::RefreshErrorIndicator],
            Field::Selection => &[Effect::ScheduleShareLink],
            Field::OutputValue | Field::DebugOutput => &[],
        }
    }
}

/// View refreshes requested since the UI last drained them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewInvalidation {
    pub controls: bool,
    pub error_indicator: bool,
}

#[derive(Debug)]
pub struct StateStore {
    state: PlaygroundState,
    compile: Debouncer,
    share_link: Debouncer,
    invalidation: ViewInvalidation,
    /// Latest clock value observed through a timed write or poll.
    clock: f64,
}

impl StateStore {
    pub fn new(state: PlaygroundState, compile_delay: Duration, share_link_delay: Duration) -> Self {
        Self {
            state,
            compile: Debouncer::new(compile_delay),
            share_link: Debouncer::new(share_link_delay),
            invalidation: ViewInvalidation::default(),
            clock: 0.0,
        }
    }

    pub fn state(&self) -> &PlaygroundState {
        &self.state
    }

    pub fn set_delays(&mut self, compile_delay: Duration, share_link_delay: Duration) {
        self.compile.set_delay(compile_delay);
        self.share_link.set_delay(share_link_delay);
    }

    // ─── Setters ─────────────────────────────────────────────────────────────

    pub fn set_input_format(&mut self, value: InputFormat, now: f64) {
        self.state.input_format = value;
        self.dispatch(Field::InputFormat, now);
    }

    pub fn set_output_format(&mut self, value: OutputFormat, now: f64) {
        self.state.output_format = value;
        self.dispatch(Field::OutputFormat, now);
    }

    pub fn set_input_value(&mut self, value: impl Into<String>, now: f64) {
        self.state.input_value = value.into();
        self.dispatch(Field::InputValue, now);
    }

    pub fn set_selection(&mut self, value: Option<Selection>, now: f64) {
        self.state.selection = value;
        self.dispatch(Field::Selection, now);
    }

    pub fn set_compiler_has_error(&mut self, value: bool) {
        self.state.compiler_has_error = value;
        self.dispatch(Field::CompilerHasError, self.clock);
    }

    pub fn set_output_value(&mut self, value: impl Into<String>) {
        self.state.output_value = value.into();
        self.dispatch(Field::OutputValue, self.clock);
    }

    /// Clears and repopulates `debug_output` in one write.
    pub fn replace_debug_output(&mut self, logs: Vec<ConsoleLog>) {
        self.state.debug_output = logs;
        self.dispatch(Field::DebugOutput, self.clock);
    }

    fn dispatch(&mut self, field: Field, now: f64) {
        self.clock = self.clock.max(now);
        tracing::trace!(?field, now, "state field written");
        for effect in field.effects() {
            match effect {
                Effect::RefreshControls => self.invalidation.controls = true,
                Effect::RefreshErrorIndicator => self.invalidation.error_indicator = true,
                Effect::ScheduleCompile => self.compile.schedule(now),
                Effect::ScheduleShareLink => self.share_link.schedule(now),
            }
        }
    }

    // ─── Timers & view sync ──────────────────────────────────────────────────

    /// Arms the compile timer without touching state (initial paint).
    pub fn schedule_compile(&mut self, now: f64) {
        self.clock = self.clock.max(now);
        self.compile.schedule(now);
    }

    pub fn poll_compile(&mut self, now: f64) -> bool {
        self.clock = self.clock.max(now);
        self.compile.poll(now)
    }

    pub fn poll_share_link(&mut self, now: f64) -> bool {
        self.clock = self.clock.max(now);
        self.share_link.poll(now)
    }

    pub fn compile_pending(&self) -> bool {
        self.compile.is_pending()
    }

    pub fn share_link_pending(&self) -> bool {
        self.share_link.is_pending()
    }

    /// Shortest wait until one of the timers is due.
    pub fn next_deadline(&self, now: f64) -> Option<Duration> {
        match (self.compile.time_until_due(now), self.share_link.time_until_due(now)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns and clears the pending view refreshes.
    pub fn take_invalidation(&mut self) -> ViewInvalidation {
        std::mem::take(&mut self.invalidation)
    }
}
