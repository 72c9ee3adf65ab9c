//! Error types module
//!
//! `AppError` is the error surfaced at the service boundary. Pipeline stage failures
//! are carried as `Pipeline { stage, cause }` so the boundary can tell which stage
//! failed; a malformed trigger is `BadTrigger` and never reaches the orchestrator.

use std::io;

use crate::models::{InvalidSourceId, Stage};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like malformed triggers
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DOWNLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether redelivering the same trigger could succeed
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad trigger: {0}")]
    BadTrigger(String),

    #[error("{stage} stage failed: {cause}")]
    Pipeline { stage: Stage, cause: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<InvalidSourceId> for AppError {
    fn from(err: InvalidSourceId) -> Self {
        AppError::BadTrigger(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadTrigger(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::BadTrigger(_) => (400, "BAD_TRIGGER", false, LogLevel::Debug),
        AppError::Pipeline {
            stage: Stage::Download,
            ..
        } => (500, "DOWNLOAD_FAILED", true, LogLevel::Warn),
        AppError::Pipeline {
            stage: Stage::Convert,
            ..
        } => (500, "CONVERSION_FAILED", false, LogLevel::Error),
        AppError::Pipeline {
            stage: Stage::Upload,
            ..
        } => (500, "UPLOAD_FAILED", true, LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::BadTrigger(_) => "BadTrigger",
            AppError::Pipeline {
                stage: Stage::Download,
                ..
            } => "DownloadFailure",
            AppError::Pipeline {
                stage: Stage::Convert,
                ..
            } => "ConversionFailure",
            AppError::Pipeline {
                stage: Stage::Upload,
                ..
            } => "UploadFailure",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Stage the failure belongs to, when it came out of the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;
        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadTrigger(msg) => format!("Bad Request: {}", msg),
            AppError::Pipeline { stage, cause } => {
                format!("Processing failed at {} stage: {}", stage, cause)
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}
