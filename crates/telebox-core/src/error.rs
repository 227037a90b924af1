//! Error types module
//!
//! All server-side failures are unified under [`AppError`]. Each variant
//! describes its own HTTP presentation through [`ErrorMetadata`], so the API
//! crate can render every error with the same body shape.

use crate::models::RelayReport;
use crate::validation::{Rejection, ValidationError};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
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

    /// Machine-readable error code (e.g., "NO_FILES")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    /// At least one file of the batch was not delivered. The report carries the
    /// outcome of every file, delivered ones included.
    #[error("Relay failed: {details}")]
    RelayFailed { details: String, report: RelayReport },

    /// Holds a client-safe reason; paths stay in the server log.
    #[error("Staging error: {0}")]
    Staging(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ValidationError::InvalidContentType { .. } => AppError::InvalidInput(err.to_string()),
        }
    }
}

/// Same mapping as [`ValidationError`], with the file named in the message.
impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        let message = rejection.message();
        match rejection.error {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(message),
            ValidationError::InvalidContentType { .. } => AppError::InvalidInput(message),
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::NoFiles => (400, "NO_FILES", false, LogLevel::Debug),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::RelayFailed { .. } => (500, "RELAY_FAILED", true, LogLevel::Error),
        AppError::Staging(_) => (500, "STAGING_ERROR", true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::NoFiles => "NoFiles",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::RelayFailed { .. } => "RelayFailed",
            AppError::Staging(_) => "Staging",
        }
    }

    /// Detail string shown next to the client message. Only relay and
    /// staging failures have one; for the rest the message says it all.
    pub fn details(&self) -> Option<String> {
        match self {
            AppError::RelayFailed { details, .. } => Some(details.clone()),
            AppError::Staging(reason) => Some(reason.clone()),
            AppError::NoFiles | AppError::InvalidInput(_) | AppError::PayloadTooLarge(_) => None,
        }
    }

    /// Per-file outcomes, when the error happened after relaying started.
    pub fn relay_report(&self) -> Option<&RelayReport> {
        match self {
            AppError::RelayFailed { report, .. } => Some(report),
            _ => None,
        }
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

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NoFiles => "No files uploaded".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::RelayFailed { .. } => "Upload failed".to_string(),
            AppError::Staging(_) => "Upload failed".to_string(),
        }
    }
}
