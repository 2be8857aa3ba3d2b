//! User-tunable settings.
//!
//! Resolution order, highest first: command-line flags, `--config` JSON file,
//! values persisted by eframe from the previous run, built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::share::DEFAULT_BASE_URL;

pub const MAX_DEBOUNCE_MS: u64 = 5_000;
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<f32> = 8.0..=40.0;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quiet period before a recompile, in milliseconds.
    pub compile_debounce_ms: u64,
    /// Quiet period before the share link is rewritten, in milliseconds.
    pub share_link_debounce_ms: u64,
    /// Page the share link points at.
    pub base_url: String,
    pub font_size: f32,
    /// How long "Copied!" stays visible after copying the link.
    pub copied_alert_secs: f32,
    pub show_console: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compile_debounce_ms: 200,
            share_link_debounce_ms: 200,
            base_url: DEFAULT_BASE_URL.to_string(),
            font_size: 14.0,
            copied_alert_secs: 3.0,
            show_console: true,
        }
    }
}

/// Values given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub compile_debounce_ms: Option<u64>,
    pub share_link_debounce_ms: Option<u64>,
    pub base_url: Option<String>,
}

/// Layers the sources: `file` replaces `stored` wholesale, then the command
/// line overrides single fields. Stored settings that no longer validate are
/// ignored.
pub fn resolve(
    file: Option<Settings>,
    stored: Option<Settings>,
    overrides: &SettingsOverrides,
) -> Result<Settings, SettingsError> {
    let stored = stored.filter(|settings| match settings.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%err, "ignoring stored settings");
            false
        }
    });
    let mut settings = file.or(stored).unwrap_or_default();
    settings.apply_overrides(overrides);
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn load_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        tracing::info!(path = %path.display(), "loaded settings file");
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(ms) = overrides.compile_debounce_ms {
            self.compile_debounce_ms = ms;
        }
        if let Some(ms) = overrides.share_link_debounce_ms {
            self.share_link_debounce_ms = ms;
        }
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, ms) in [
            ("compile_debounce_ms", self.compile_debounce_ms),
            ("share_link_debounce_ms", self.share_link_debounce_ms),
        ] {
            if ms > MAX_DEBOUNCE_MS {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{ms} exceeds {MAX_DEBOUNCE_MS} ms"),
                });
            }
        }
        if !FONT_SIZE_RANGE.contains(&self.font_size) {
            return Err(SettingsError::Invalid {
                field: "font_size",
                reason: format!("{} is outside {:?}", self.font_size, FONT_SIZE_RANGE),
            });
        }
        if !(self.copied_alert_secs.is_finite() && self.copied_alert_secs >= 0.0) {
            return Err(SettingsError::Invalid {
                field: "copied_alert_secs",
                reason: format!("{} is not a non-negative duration", self.copied_alert_secs),
            });
        }
        self.base_url()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let url = Url::parse(&self.base_url).map_err(|err| SettingsError::Invalid {
            field: "base_url",
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::Invalid {
                field: "base_url",
                reason: "must be an absolute http(s) URL".into(),
            });
        }
        Ok(url)
    }

    pub fn compile_delay(&self) -> Duration {
        Duration::from_millis(self.compile_debounce_ms)
    }

    pub fn share_link_delay(&self) -> Duration {
        Duration::from_millis(self.share_link_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{ "compile_debounce_ms": 50 }}"#).expect("write");
        let settings = Settings::load_file(file.path()).expect("load");
        assert_eq!(settings.compile_debounce_ms, 50);
        assert_eq!(settings.share_link_debounce_ms, 200);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{ "base_url": "mailto:someone" }}"#).expect("write");
        let err = Settings::load_file(file.path()).expect_err("invalid");
        assert!(matches!(err, SettingsError::Invalid { field: "base_url", .. }));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "not json").expect("write");
        assert!(matches!(
            Settings::load_file(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn overrides_win_and_are_validated() {
        let mut settings = Settings::default();
        settings.apply_overrides(&SettingsOverrides {
            compile_debounce_ms: Some(9_000),
            base_url: Some("http://localhost:4000/playground".into()),
            ..Default::default()
        });
        assert_eq!(settings.base_url, "http://localhost:4000/playground");
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "compile_debounce_ms", .. })
        ));
    }

    #[test]
    fn resolve_prefers_file_then_stored_then_defaults() {
        let stored = Settings {
            font_size: 18.0,
            ..Settings::default()
        };
        let file = Settings {
            font_size: 12.0,
            ..Settings::default()
        };
        let cli = SettingsOverrides {
            share_link_debounce_ms: Some(10),
            ..Default::default()
        };

        let resolved = resolve(Some(file), Some(stored.clone()), &cli).expect("valid");
        assert_eq!(resolved.font_size, 12.0);
        assert_eq!(resolved.share_link_debounce_ms, 10);

        let resolved = resolve(None, Some(stored), &SettingsOverrides::default()).expect("valid");
        assert_eq!(resolved.font_size, 18.0);

        let broken = Settings {
            font_size: 0.0,
            ..Settings::default()
        };
        let resolved = resolve(None, Some(broken), &SettingsOverrides::default()).expect("valid");
        assert_eq!(resolved, Settings::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = Settings::load_file(&path).expect_err("missing");
        assert!(err.to_string().contains("absent.json"));
    }
}
