//! Logging setup: console mirror on stderr plus an optional rotating file sink.
//!
//! The file sink writes `<dir>/main.log.<date>`, rotates daily and keeps the
//! seven most recent files. `RUST_LOG` overrides the configured level.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter};

/// Rotated log files kept on disk.
pub const LOG_RETENTION: usize = 7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, clap::Args)]
pub struct LogConfig {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,
    /// Directory for the rotating `main.log` file; console only when absent
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

/// Keeps the file writer alive; logs are flushed when dropped.
pub struct LogHandle {
    _file_guard: Option<WorkerGuard>,
}

/// Install the process subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<LogHandle> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    let console = tfmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("main")
                .filename_suffix("log")
                .max_log_files(LOG_RETENTION)
                .build(dir)
                .with_context(|| format!("opening log file in {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tfmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(LogHandle { _file_guard: guard })
}
