use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScreenshotError {
    #[error("No URLs given; at least one URL or hostname is required")]
    NoUrls,

    #[error("Invalid size format: {0:?} (expected WIDTHxHEIGHT, e.g. 1440x1080)")]
    InvalidSizeFormat(String),

    #[error("Cannot create output directory {path}: {reason}")]
    OutputDirectory { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Browser shutdown failed: {0}")]
    BrowserCloseFailed(String),

    #[error("Navigation timeout of {0:?} exceeded")]
    NavigationTimeout(Duration),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Page evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Task deadline of {0:?} exceeded")]
    TaskDeadlineExceeded(Duration),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ScreenshotError {
    /// Startup errors abort the run before any capture begins; everything
    /// else is confined to the task that raised it.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            ScreenshotError::NoUrls
                | ScreenshotError::InvalidSizeFormat(_)
                | ScreenshotError::OutputDirectory { .. }
                | ScreenshotError::ConfigurationError(_)
                | ScreenshotError::SerializationError(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ScreenshotError::NavigationTimeout(_) | ScreenshotError::TaskDeadlineExceeded(_)
        )
    }
}

impl From<std::io::Error> for ScreenshotError {
    fn from(err: std::io::Error) -> Self {
        ScreenshotError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ScreenshotError {
    fn from(err: serde_json::Error) -> Self {
        ScreenshotError::SerializationError(err.to_string())
    }
}
