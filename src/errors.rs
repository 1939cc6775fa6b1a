use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Multiplexer error: {0}")]
    Multiplexer(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Daemon error: {0}")]
    Daemon(String),

    #[error("Panel error: {0}")]
    Panel(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Panel(format!("{:#}", err))
    }
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, AppError>;

// Helper functions for creating errors
impl AppError {
    pub fn display(msg: &str) -> Self {
        AppError::Display(msg.to_string())
    }

    pub fn multiplexer(msg: &str) -> Self {
        AppError::Multiplexer(msg.to_string())
    }

    pub fn daemon(msg: &str) -> Self {
        AppError::Daemon(msg.to_string())
    }

    pub fn logging(msg: &str) -> Self {
        AppError::Logging(msg.to_string())
    }
}

/// Failure while fetching or decoding data for a panel.
///
/// Callers never branch on the variant: every kind is logged and the panel
/// keeps what it last showed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid feed: {0}")]
    Feed(String),

    #[error("response is missing {0}")]
    Missing(&'static str),
}

// Helper trait for converting display driver errors, which only implement Debug
pub trait DisplayErrorExt<T> {
    fn display_err(self, context: &str) -> Result<T>;
}

impl<T, E: fmt::Debug> DisplayErrorExt<T> for std::result::Result<T, E> {
    fn display_err(self, context: &str) -> Result<T> {
        self.map_err(|e| AppError::display(&format!("{}: {:?}", context, e)))
    }
}
