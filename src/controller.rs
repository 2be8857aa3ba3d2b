//! Per-window session: owns the store, its timers, the compiler and the share
//! link, and is the only thing the UI talks to.

use url::Url;

use crate::codec::{deserialize_state, serialize_state};
use crate::compiler::{Compiler, ConsoleLine, Diagnostic};
use crate::pipeline::{CompilePipeline, CompileReport};
use crate::settings::Settings;
use crate::share::{fragment_of, ShareLocation};
use crate::states::{InputFormat, OutputFormat, PlaygroundState, Selection, StateStore, ViewInvalidation};

/// What a [`PlaygroundSession::tick`] did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub compiled: Option<CompileReport>,
    pub share_link_updated: bool,
}

impl TickOutcome {
    pub fn is_idle(&self) -> bool {
        self.compiled.is_none() && !self.share_link_updated
    }
}

pub struct PlaygroundSession {
    store: StateStore,
    compiler: Box<dyn Compiler>,
    pipeline: CompilePipeline,
    location: ShareLocation,

    // Artefacts of the last applied compile
    diagnostics: Vec<Diagnostic>,
    console: Vec<ConsoleLine>,
    output_text: String,

    copied_at: Option<f64>,
    copied_alert_secs: f64,
}

impl PlaygroundSession {
    pub fn new(compiler: Box<dyn Compiler>, settings: &Settings, base: Url) -> Self {
        Self::with_state(PlaygroundState::default(), compiler, settings, base)
    }

    /// Starts from a shared link (full URL, `#fragment`, or bare fragment).
    /// Undecodable parts fall back to defaults.
    /// A decodable link stays the share link until the next edit.
    pub fn from_link(link: &str, compiler: Box<dyn Compiler>, settings: &Settings, base: Url) -> Self {
        let fragment = fragment_of(link);
        let persisted = deserialize_state(fragment);
        let decoded = !persisted.is_empty();
        if !decoded {
            tracing::info!("no playground state in link, starting from defaults");
        }
        let mut session = Self::with_state(persisted.into_state(), compiler, settings, base);
        if decoded {
            session.location.replace_fragment(fragment.to_owned());
        }
        session
    }

    fn with_state(
        state: PlaygroundState,
        compiler: Box<dyn Compiler>,
        settings: &Settings,
        base: Url,
    ) -> Self {
        let store = StateStore::new(state, settings.compile_delay(), settings.share_link_delay());
        let mut session = Self {
            store,
            compiler,
            pipeline: CompilePipeline::new(),
            location: ShareLocation::new(base),
            diagnostics: Vec::new(),
            console: Vec::new(),
            output_text: String::new(),
            copied_at: None,
            copied_alert_secs: f64::from(settings.copied_alert_secs),
        };
        session.compile_now();
        session
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> &PlaygroundState {
        self.store.state()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn console(&self) -> &[ConsoleLine] {
        &self.console
    }

    /// Text of the output pane; keeps the last good CSS while the input fails.
    pub fn output_text(&self) -> &str {
        &self.output_text
    }

    pub fn compiler_version(&self) -> String {
        self.compiler.version()
    }

    pub fn share_link(&self) -> String {
        self.location.href()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.location.fragment()
    }

    pub fn take_invalidation(&mut self) -> ViewInvalidation {
        self.store.take_invalidation()
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    pub fn set_input_format(&mut self, format: InputFormat, now: f64) {
        self.store.set_input_format(format, now);
    }

    pub fn set_output_format(&mut self, format: OutputFormat, now: f64) {
        self.store.set_output_format(format, now);
    }

    pub fn set_input_value(&mut self, value: impl Into<String>, now: f64) {
        self.store.set_input_value(value, now);
    }

    pub fn set_selection(&mut self, selection: Option<Selection>, now: f64) {
        if self.store.state().selection != selection {
            self.store.set_selection(selection, now);
        }
    }

    /// Picks up changed delays, alert duration and base URL. The current
    /// fragment is kept.
    pub fn apply_settings(&mut self, settings: &Settings, base: Url) {
        self.store
            .set_delays(settings.compile_delay(), settings.share_link_delay());
        self.copied_alert_secs = f64::from(settings.copied_alert_secs);
        if self.location.base() != &base {
            let fragment = self.location.fragment().map(str::to_owned);
            self.location = ShareLocation::new(base);
            if let Some(fragment) = fragment {
                self.location.replace_fragment(fragment);
            }
        }
    }

    /// Replaces the session state with the one encoded in `link`. Returns
    /// `false` when nothing could be decoded and defaults were loaded.
    pub fn load_link(&mut self, link: &str, now: f64) -> bool {
        let fragment = fragment_of(link);
        let persisted = deserialize_state(fragment);
        let decoded = !persisted.is_empty();
        let state = persisted.into_state();
        tracing::info!(
            input_format = ?state.input_format,
            output_format = ?state.output_format,
            bytes = state.input_value.len(),
            "loading shared playground"
        );
        self.store.set_input_format(state.input_format, now);
        self.store.set_output_format(state.output_format, now);
        self.store.set_input_value(state.input_value, now);
        self.store.set_selection(state.selection, now);
        if decoded {
            self.location.replace_fragment(fragment.to_owned());
        }
        decoded
    }

    // ─── Timers ──────────────────────────────────────────────────────────────

    /// Runs whatever debounced work is due at `now`.
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.store.poll_compile(now) {
            outcome.compiled = self.compile_now();
        }
        if self.store.poll_share_link(now) {
            self.update_share_link();
            outcome.share_link_updated = true;
        }
        outcome
    }

    pub fn next_deadline(&self, now: f64) -> Option<std::time::Duration> {
        self.store.next_deadline(now)
    }

    /// Compiles immediately, bypassing the debouncer.
    pub fn compile_now(&mut self) -> Option<CompileReport> {
        let report = self.pipeline.run(&mut self.store, self.compiler.as_ref())?;
        if let Some(css) = &report.css {
            self.output_text = css.clone();
        }
        self.diagnostics = report.diagnostics.clone();
        self.console = report.console.clone();
        Some(report)
    }

    fn update_share_link(&mut self) {
        match serialize_state(self.store.state()) {
            Ok(fragment) => {
                tracing::debug!(bytes = fragment.len(), "share link updated");
                self.location.replace_fragment(fragment);
            }
            Err(err) => tracing::warn!(%err, "could not encode playground state"),
        }
    }

    // ─── Copy link ───────────────────────────────────────────────────────────

    /// Returns the link to put on the clipboard and starts the "copied" alert.
    pub fn copy_link(&mut self, now: f64) -> String {
        self.copied_at = Some(now);
        self.share_link()
    }

    pub fn copied_alert_visible(&self, now: f64) -> bool {
        self.copied_at
            .is_some_and(|at| now >= at && now - at < self.copied_alert_secs)
    }

    /// Seconds until the alert should disappear, for repaint scheduling.
    pub fn copied_alert_remaining(&self, now: f64) -> Option<f64> {
        let at = self.copied_at?;
        let remaining = at + self.copied_alert_secs - now;
        (remaining > 0.0).then_some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileError, CompileLogger, CompileRequest, GrassCompiler};
    use crate::share::DEFAULT_BASE_URL;
    use std::cell::Cell;
    use std::rc::Rc;

    fn base() -> Url {
        Url::parse(DEFAULT_BASE_URL).expect("url")
    }

    #[derive(Clone, Default)]
    struct CountingCompiler {
        calls: Rc<Cell<usize>>,
    }

    impl Compiler for CountingCompiler {
        fn compile(
            &self,
            request: &CompileRequest<'_>,
            _logger: &dyn CompileLogger,
        ) -> Result<String, CompileError> {
            self.calls.set(self.calls.get() + 1);
            Ok(format!("/* {} */", request.source))
        }

        fn version(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn startup_compiles_once_and_leaves_link_untouched() {
        let compiler = CountingCompiler::default();
        let calls = compiler.calls.clone();
        let session = PlaygroundSession::new(Box::new(compiler), &Settings::default(), base());
        assert_eq!(calls.get(), 1);
        assert_eq!(session.output_text(), "/*  */");
        assert_eq!(session.share_link(), DEFAULT_BASE_URL);
    }

    #[test]
    fn rapid_typing_compiles_once_after_quiet_period() {
        let compiler = CountingCompiler::default();
        let calls = compiler.calls.clone();
        let mut session = PlaygroundSession::new(Box::new(compiler), &Settings::default(), base());

        for (i, text) in ["a", "a {", "a {}"].into_iter().enumerate() {
            session.set_input_value(text, 1.0 + i as f64 * 0.1);
            assert!(session.tick(1.0 + i as f64 * 0.1 + 0.05).is_idle());
        }
        let outcome = session.tick(1.45);
        assert!(outcome.compiled.is_some());
        assert!(outcome.share_link_updated);
        assert_eq!(calls.get(), 2);
        assert_eq!(session.output_text(), "/* a {} */");
        assert!(session.tick(2.0).is_idle());
    }

    #[test]
    fn format_reselect_still_recompiles() {
        let compiler = CountingCompiler::default();
        let calls = compiler.calls.clone();
        let mut session = PlaygroundSession::new(Box::new(compiler), &Settings::default(), base());
        session.set_output_format(OutputFormat::Expanded, 0.0);
        assert!(session.take_invalidation().controls);
        session.tick(0.3);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn selection_change_only_touches_share_link() {
        let compiler = CountingCompiler::default();
        let calls = compiler.calls.clone();
        let mut session = PlaygroundSession::new(Box::new(compiler), &Settings::default(), base());
        session.set_selection(Selection::new(1, 1, 1, 2), 0.0);
        let outcome = session.tick(0.3);
        assert!(outcome.compiled.is_none());
        assert!(outcome.share_link_updated);
        assert!(session.share_link().ends_with("?s=L1C1-L1C2"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn share_link_reopens_the_same_session() {
        let settings = Settings::default();
        let mut first = PlaygroundSession::new(Box::new(GrassCompiler::new()), &settings, base());
        first.set_input_format(InputFormat::Indented, 0.0);
        first.set_output_format(OutputFormat::Compressed, 0.0);
        first.set_input_value("a\n  color: red\n", 0.0);
        first.tick(1.0);
        assert_eq!(first.output_text(), "a{color:red}");

        let link = first.share_link();
        let second = PlaygroundSession::from_link(&link, Box::new(GrassCompiler::new()), &settings, base());
        assert_eq!(second.state().input_format, InputFormat::Indented);
        assert_eq!(second.state().output_format, OutputFormat::Compressed);
        assert_eq!(second.state().input_value, "a\n  color: red\n");
        assert_eq!(second.output_text(), "a{color:red}");
    }

    #[test]
    fn opened_link_is_copied_back_unchanged() {
        let settings = Settings::default();
        let shared = PlaygroundState {
            input_value: "a { b: c }".into(),
            selection: Selection::new(1, 3, 1, 4),
            ..PlaygroundState::default()
        };
        let fragment = serialize_state(&shared).expect("serialize");
        let link = format!("{DEFAULT_BASE_URL}#{fragment}");

        let mut session = PlaygroundSession::from_link(&link, Box::new(CountingCompiler::default()), &settings, base());
        assert_eq!(session.fragment(), Some(fragment.as_str()));
        assert_eq!(session.copy_link(1.0), link);

        let mut restored = PlaygroundSession::from_link(
            &format!("#{fragment}"),
            Box::new(CountingCompiler::default()),
            &settings,
            base(),
        );
        assert_eq!(restored.copy_link(1.0), link);
    }

    #[test]
    fn loaded_link_is_current_before_the_debounce_fires() {
        let mut session = PlaygroundSession::new(
            Box::new(CountingCompiler::default()),
            &Settings::default(),
            base(),
        );
        let shared = PlaygroundState {
            input_value: "x { y: z }".into(),
            ..PlaygroundState::default()
        };
        let fragment = serialize_state(&shared).expect("serialize");
        session.load_link(&format!("#{fragment}"), 1.0);
        assert_eq!(session.share_link(), format!("{DEFAULT_BASE_URL}#{fragment}"));
    }

    #[test]
    fn garbage_link_starts_from_defaults() {
        let session = PlaygroundSession::from_link(
            "https://sass-lang.com/playground#%%%",
            Box::new(CountingCompiler::default()),
            &Settings::default(),
            base(),
        );
        assert_eq!(session.state(), &PlaygroundState {
            output_value: "/*  */".into(),
            ..PlaygroundState::default()
        });
        assert_eq!(session.share_link(), DEFAULT_BASE_URL);
    }

    #[test]
    fn load_link_replaces_state_and_schedules_work() {
        let mut session = PlaygroundSession::new(
            Box::new(GrassCompiler::new()),
            &Settings::default(),
            base(),
        );
        let mut other = session.state().clone();
        other.input_value = "b {c: d}".into();
        other.selection = Selection::new(1, 1, 1, 3);
        let link = format!("#{}", serialize_state(&other).expect("serialize"));

        assert!(session.load_link(&link, 5.0));
        assert_eq!(session.state().input_value, "b {c: d}");
        assert_eq!(session.state().selection, Selection::new(1, 1, 1, 3));
        let outcome = session.tick(5.5);
        assert_eq!(outcome.compiled.and_then(|r| r.css).as_deref(), Some("b {\n  c: d;\n}"));
        assert!(outcome.share_link_updated);
    }

    #[test]
    fn undecodable_link_resets_to_defaults() {
        let mut session = PlaygroundSession::new(
            Box::new(CountingCompiler::default()),
            &Settings::default(),
            base(),
        );
        session.set_input_value("keep?", 0.0);
        assert!(!session.load_link("not a playground link", 1.0));
        assert_eq!(session.state().input_value, "");
        assert_eq!(session.state().input_format, InputFormat::Scss);
    }

    #[test]
    fn failed_compile_keeps_output_and_reports_diagnostics() {
        let mut session = PlaygroundSession::new(
            Box::new(GrassCompiler::new()),
            &Settings::default(),
            base(),
        );
        session.set_input_value("a {color: red}", 0.0);
        session.tick(1.0);
        session.set_input_value("a {color: $nope}", 2.0);
        session.tick(3.0);
        assert!(session.state().compiler_has_error);
        assert_eq!(session.output_text(), "a {\n  color: red;\n}");
        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.console().len(), 1);
        assert!(session.take_invalidation().error_indicator);
    }

    #[test]
    fn copied_alert_lasts_configured_time() {
        let mut session = PlaygroundSession::new(
            Box::new(CountingCompiler::default()),
            &Settings::default(),
            base(),
        );
        assert!(!session.copied_alert_visible(0.0));
        let link = session.copy_link(10.0);
        assert_eq!(link, DEFAULT_BASE_URL);
        assert!(session.copied_alert_visible(12.9));
        assert!(!session.copied_alert_visible(13.0));
        assert_eq!(session.copied_alert_remaining(14.0), None);
    }

    #[test]
    fn base_url_change_keeps_fragment() {
        let mut session = PlaygroundSession::new(
            Box::new(CountingCompiler::default()),
            &Settings::default(),
            base(),
        );
        session.set_input_value("x", 0.0);
        session.tick(1.0);
        let fragment = session.fragment().expect("fragment").to_owned();
        let local = Url::parse("http://localhost:4000/play").expect("url");
        session.apply_settings(&Settings::default(), local);
        assert_eq!(session.share_link(), format!("http://localhost:4000/play#{fragment}"));
    }
}
