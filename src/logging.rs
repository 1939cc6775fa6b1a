use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, OutputKind};
use crate::errors::{AppError, Result};

const DEFAULT_FILTER: &str = "info";

/// Where log lines go for a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The terminal UI owns stdout and a daemon has no terminal, so both log to a file.
    File,
    Stderr,
}

impl LogTarget {
    pub fn for_config(config: &AppConfig) -> Self {
        if config.output == OutputKind::Terminal || config.daemon_mode {
            LogTarget::File
        } else {
            LogTarget::Stderr
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = match LogTarget::for_config(config) {
        LogTarget::File => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .map_err(|e| {
                    AppError::logging(&format!(
                        "Failed to open log file {}: {}",
                        config.log_file.display(),
                        e
                    ))
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_target(false)
                .try_init()
        }
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| AppError::logging(&format!("Logging init failed: {}", e)))
}
