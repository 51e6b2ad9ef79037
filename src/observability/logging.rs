//! Structured logging.
//!
//! Development logs human-readable lines to stdout. Production appends JSON
//! lines to `Common.LogOutPath`. `RUST_LOG` overrides `Common.LogLevel`.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CommonConfig, Mode};

/// Error type for logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into())
}

/// Install the global subscriber for the given mode.
pub fn init(common: &CommonConfig, mode: Mode) -> Result<(), LoggingError> {
    let (stdout_layer, file_layer) = if mode.is_production() {
        let file = open_log_file(&common.log_out_path)?;
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        (None, Some(layer))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter(&common.log_level))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

/// Stdout logging used before a configuration is available, so fatal
/// configuration errors are still logged.
pub fn init_fallback() {
    let _ = tracing_subscriber::registry()
        .with(filter("info"))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    let to_error = |source| LoggingError::LogFile {
        path: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}
