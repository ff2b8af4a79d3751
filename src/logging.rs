//! File logging for host applications
//!
//! The library only emits `tracing` events. Applications without their own
//! subscriber can route those events to a file with [`init_file_logging`].

use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Default log file location
pub fn default_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("openshift-client").join("openshift-client.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".openshift-client").join("openshift-client.log");
    }
    PathBuf::from("openshift-client.log")
}

/// Install a global subscriber appending to `path`.
///
/// Returns `None` for [`LogLevel::Off`], when the file cannot be opened, or
/// when a global subscriber is already installed. Keep the guard alive for
/// as long as events should be flushed.
pub fn init_file_logging(
    level: LogLevel,
    path: &Path,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .ok()?;

    tracing::info!("openshift-client logging at {:?} to {:?}", level, path);

    Some(guard)
}
