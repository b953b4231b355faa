//! Unified error types for the notification engine.

use thiserror::Error;

/// Result type alias using NotifyError.
pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    // Authorization errors
    #[error("Notification authorization denied")]
    AuthorizationDenied,

    // Scheduling errors
    #[error("Scheduling failed: {0}")]
    SchedulingFailed(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Unknown notification category: {0}")]
    CategoryNotFound(String),

    #[error("Too many pending notifications ({pending} scheduled, max {max})")]
    TooManyNotifications { pending: usize, max: usize },

    // Store errors
    #[error("Notification store unavailable: {0}")]
    SystemUnavailable(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    pub fn scheduling(msg: impl Into<String>) -> Self {
        Self::SchedulingFailed(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SystemUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
