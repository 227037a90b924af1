//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; every `AppError` renders with
//! the same body shape, status code, and log line.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use telebox_core::models::FileOutcome;
use telebox_core::{AppError, ErrorMetadata, LogLevel};
use telebox_staging::StagingError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Per-file outcomes when relaying had started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FileOutcome>>,
}

/// `AppError` as an axum response.
///
/// `production` comes from [`telebox_core::Config::is_production`] and hides
/// the error type from the body.
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    pub production: bool,
}

impl HttpAppError {
    pub fn new(error: AppError, production: bool) -> Self {
        Self { error, production }
    }
}

/// Staging failures are logged with their path; the client only gets the reason.
pub fn staging_error(err: StagingError) -> AppError {
    tracing::error!(error = %err, "Staging failed");
    AppError::Staging(err.reason())
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse {
            error: app_error.client_message(),
            details: app_error.details(),
            error_type: (!self.production).then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            results: app_error.relay_report().map(|r| r.outcomes.clone()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;
    use telebox_core::models::{DeliveryStatus, RelayReport};

    async fn render_with(err: AppError, production: bool) -> (StatusCode, Value) {
        let response = HttpAppError::new(err, production).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn render(err: AppError) -> (StatusCode, Value) {
        render_with(err, false).await
    }

    #[tokio::test]
    async fn test_no_files_body() {
        let (status, body) = render(AppError::NoFiles).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No files uploaded");
        assert!(body.get("details").is_none());
        assert!(body.get("results").is_none());
    }

    #[tokio::test]
    async fn test_relay_failed_body_carries_results() {
        let report = RelayReport::new(vec![FileOutcome {
            index: 0,
            filename: "a.png".to_string(),
            status: DeliveryStatus::Failed,
            error: Some("timeout".to_string()),
        }]);
        let (status, body) = render(AppError::RelayFailed {
            details: "timeout".to_string(),
            report,
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert_eq!(body["details"], "timeout");
        assert_eq!(body["results"][0]["status"], "failed");
    }

    #[tokio::test]
    async fn test_invalid_input_has_no_details() {
        let (status, body) = render(AppError::InvalidInput(
            "notes.pdf: Invalid file type".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "notes.pdf: Invalid file type");
        assert!(body.get("details").is_none());
        assert_eq!(body["error_type"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_production_hides_error_type() {
        let (status, body) = render_with(
            AppError::Staging("Failed to write staged file: permission denied".to_string()),
            true,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert_eq!(body["details"], "Failed to write staged file: permission denied");
        assert!(body.get("error_type").is_none());
    }

    #[test]
    fn test_staging_error_drops_path() {
        let err = staging_error(StagingError::CreateDir {
            path: "/var/lib/telebox/uploads/2024-05-01T12-00-00-000Z-deadbeef".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        let details = err.details().unwrap();
        assert!(details.starts_with("Failed to create staging directory"));
        assert!(!details.contains("/var/lib/telebox"));
    }
}
