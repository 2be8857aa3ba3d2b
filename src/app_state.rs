use crate::autocomplete::CompletionState;
use crate::controller::{PlaygroundSession, TickOutcome};
use crate::settings::{Settings, SettingsError};
use crate::states::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastType,
    pub deadline: f64,
}

const TOAST_SECS: f64 = 3.0;

/// Everything the window keeps between frames. Playground state itself lives
/// in the session; this adds the view-only bits around it.
pub struct AppState {
    pub session: PlaygroundSession,
    pub settings: Settings,

    /// TextEdit buffer; mirrors `input_value` and is pushed to the session on
    /// every edit.
    pub editor_text: String,
    pub completion: CompletionState,
    /// Selection to put on the editor next frame (deep link, console jump).
    pub pending_selection: Option<Selection>,

    pub show_open_link: bool,
    pub link_input: String,

    pub show_settings: bool,
    pub settings_open_time: Option<f64>,
    pub settings_is_closing: bool,
    pub settings_draft: Settings,
    pub settings_error: Option<String>,

    pub toast: Option<Toast>,
}

impl AppState {
    pub fn new(session: PlaygroundSession, settings: Settings) -> Self {
        let editor_text = session.state().input_value.clone();
        let pending_selection = session.state().selection;
        Self {
            session,
            settings_draft: settings.clone(),
            settings,
            editor_text,
            completion: CompletionState::default(),
            pending_selection,
            show_open_link: false,
            link_input: String::new(),
            show_settings: false,
            settings_open_time: None,
            settings_is_closing: false,
            settings_error: None,
            toast: None,
        }
    }

    pub fn tick(&mut self, now: f64) -> TickOutcome {
        let outcome = self.session.tick(now);
        if let Some(report) = &outcome.compiled {
            tracing::trace!(
                generation = report.generation,
                diagnostics = report.diagnostics.len(),
                "compile applied"
            );
        }
        outcome
    }

    /// Loads a pasted link and points the editor at its text and selection.
    pub fn open_link(&mut self, link: &str, now: f64) {
        let decoded = self.session.load_link(link, now);
        let state = self.session.state();
        self.editor_text = state.input_value.clone();
        self.pending_selection = state.selection;
        self.completion.close();
        if decoded {
            self.show_toast("Playground loaded from link", ToastType::Success, now);
        } else {
            self.show_toast("Nothing to load in that link, starting fresh", ToastType::Info, now);
        }
    }

    /// Validates and adopts new settings; the current ones stay on error.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        let base = settings.base_url()?;
        self.session.apply_settings(&settings, base);
        tracing::info!(?settings, "settings applied");
        self.settings = settings;
        Ok(())
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastType, now: f64) {
        self.toast = Some(Toast {
            message: message.into(),
            kind,
            deadline: now + TOAST_SECS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serialize_state;
    use crate::compiler::GrassCompiler;
    use crate::states::{InputFormat, PlaygroundState};

    fn app() -> AppState {
        let settings = Settings::default();
        let base = settings.base_url().expect("default url");
        let session = PlaygroundSession::new(Box::new(GrassCompiler::new()), &settings, base);
        AppState::new(session, settings)
    }

    #[test]
    fn open_link_syncs_editor_and_selection() {
        let mut app = app();
        let shared = PlaygroundState {
            input_format: InputFormat::Indented,
            input_value: "a\n  b: c\n".into(),
            selection: Selection::new(2, 3, 2, 4),
            ..PlaygroundState::default()
        };
        let fragment = serialize_state(&shared).expect("serialize");
        app.open_link(&format!("https://sass-lang.com/playground#{fragment}"), 1.0);

        assert_eq!(app.editor_text, "a\n  b: c\n");
        assert_eq!(app.pending_selection, Selection::new(2, 3, 2, 4));
        assert_eq!(app.toast.as_ref().map(|t| t.kind), Some(ToastType::Success));

        let outcome = app.tick(2.0);
        assert_eq!(outcome.compiled.and_then(|r| r.css).as_deref(), Some("a {\n  b: c;\n}"));
    }

    #[test]
    fn invalid_settings_are_refused() {
        let mut app = app();
        let bad = Settings {
            font_size: 2.0,
            ..Settings::default()
        };
        assert!(app.apply_settings(bad).is_err());
        assert_eq!(app.settings, Settings::default());

        let good = Settings {
            compile_debounce_ms: 50,
            ..Settings::default()
        };
        app.apply_settings(good.clone()).expect("valid");
        assert_eq!(app.settings, good);
    }
}
