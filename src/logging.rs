//! `tracing` setup for the binary.
//!
//! `RUST_LOG` wins when set; otherwise the playground logs at the level given
//! by `--log-level` and the windowing/GPU stack stays at `warn`.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

pub fn init_logging(level: LogLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}

fn default_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(default_directives(level))
}

fn default_directives(level: LogLevel) -> String {
    let level = Level::from(level).as_str().to_lowercase();
    format!("warn,sass_playground={level},grass=warn")
}
