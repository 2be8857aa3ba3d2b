mod app_state;
mod autocomplete;
mod code_panel;
mod codec;
mod compiler;
mod console_panel;
mod controller;
mod logging;
mod modals;
mod output_panel;
mod pipeline;
mod settings;
mod share;
mod states;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::logging::LogLevel;
use crate::settings::{Settings, SettingsOverrides};

/// Desktop Sass playground: edit SCSS or indented Sass, see the compiled CSS,
/// share the session as a link.
#[derive(Debug, Parser)]
#[command(name = "sass-playground", version, about)]
struct Cli {
    /// Playground link (or bare fragment) to open.
    link: Option<String>,

    /// JSON settings file; replaces the settings stored by the last run.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of generated share links.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Quiet period before recompiling, in milliseconds.
    #[arg(long, value_name = "MS")]
    compile_debounce_ms: Option<u64>,

    /// Quiet period before the share link is rewritten, in milliseconds.
    #[arg(long, value_name = "MS")]
    share_link_debounce_ms: Option<u64>,

    /// Ignore the session and settings stored by the last run.
    #[arg(long)]
    fresh: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            compile_debounce_ms: self.compile_debounce_ms,
            share_link_debounce_ms: self.share_link_debounce_ms,
            base_url: self.base_url.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level)?;

    let file_settings = cli
        .config
        .as_deref()
        .map(Settings::load_file)
        .transpose()
        .context("loading --config")?;

    // Reject bad flags before a window opens
    let overrides = cli.overrides();
    let mut probe = file_settings.clone().unwrap_or_default();
    probe.apply_overrides(&overrides);
    probe.validate().context("invalid command-line settings")?;

    let launch = ui::LaunchOptions {
        link: cli.link,
        file_settings,
        overrides,
        fresh: cli.fresh,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Sass Playground")
            .with_inner_size([1200.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sass Playground",
        native_options,
        Box::new(move |cc| Box::new(ui::PlaygroundApp::new(cc, launch))),
    )
    .map_err(|err| anyhow::anyhow!("window closed with an error: {err}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::parse_from([
            "sass-playground",
            "--base-url",
            "http://localhost:4000/playground",
            "--compile-debounce-ms",
            "50",
            "#abc",
        ]);
        assert_eq!(cli.link.as_deref(), Some("#abc"));
        assert_eq!(cli.log_level, LogLevel::Info);
        let overrides = cli.overrides();
        assert_eq!(overrides.compile_debounce_ms, Some(50));
        assert_eq!(overrides.share_link_debounce_ms, None);
        assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:4000/playground"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
