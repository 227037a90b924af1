//! Upload request against the relay.
//!
//! Response types come from `telebox_core::models`; the error body is parsed
//! here.

use crate::preview::SelectedFile;
use crate::ApiClient;
use bytes::Bytes;
use futures::Stream;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use telebox_core::constants::{CAPTION_FIELD, FILES_FIELD, UPLOAD_PATH};
use telebox_core::models::{FileOutcome, UploadResponse};
use tokio::sync::watch;

/// Request bodies are streamed in chunks of this size so progress can be reported.
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The relay answered with a non-success status.
    #[error("Upload rejected with status {status}")]
    Server {
        status: u16,
        /// The body's `error` field.
        message: Option<String>,
        details: Option<String>,
        results: Vec<FileOutcome>,
    },

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),
}

impl UploadError {
    /// The server's own error message, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            UploadError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Per-file outcomes reported by the server, empty when unknown.
    pub fn results(&self) -> &[FileOutcome] {
        match self {
            UploadError::Server { results, .. } => results,
            _ => &[],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    results: Vec<FileOutcome>,
}

/// Publishes upload progress as a percentage (0 to 100).
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<u8>>,
}

impl ProgressReporter {
    pub fn new(tx: Arc<watch::Sender<u8>>) -> Self {
        Self { tx }
    }

    /// A reporter nobody listens to.
    pub fn detached() -> Self {
        let (tx, _) = watch::channel(0);
        Self::new(Arc::new(tx))
    }

    pub fn report(&self, percent: u8) {
        self.tx.send_replace(percent.min(100));
    }
}

/// Counts bytes handed to the HTTP client across every part of one request.
#[derive(Clone)]
struct ProgressTracker {
    sent: Arc<AtomicU64>,
    total: u64,
    reporter: ProgressReporter,
}

impl ProgressTracker {
    fn new(total: u64, reporter: ProgressReporter) -> Self {
        Self {
            sent: Arc::new(AtomicU64::new(0)),
            total,
            reporter,
        }
    }

    fn advance(&self, n: u64) {
        let sent = self.sent.fetch_add(n, Ordering::Relaxed) + n;
        self.reporter.report(percent(sent, self.total));
    }

    fn stream(&self, data: Bytes) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let tracker = self.clone();
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
            .collect();

        futures::stream::iter(chunks.into_iter().map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok::<_, std::io::Error>(chunk)
        }))
    }
}

/// Rounded percentage; an empty upload is complete.
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100 + total / 2) / total) as u8
}

impl ApiClient {
    /// `POST /api/upload` with one `files` part per file and an optional caption.
    pub async fn upload_files(
        &self,
        files: &[SelectedFile],
        caption: Option<&str>,
        progress: ProgressReporter,
    ) -> Result<UploadResponse, UploadError> {
        let total: u64 = files.iter().map(|f| f.data.len() as u64).sum();
        let tracker = ProgressTracker::new(total, progress.clone());
        progress.report(0);

        let mut form = Form::new();
        for file in files {
            let body = reqwest::Body::wrap_stream(tracker.stream(file.data.clone()));
            let part = Part::stream_with_length(body, file.data.len() as u64)
                .file_name(file.name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(FILES_FIELD, part);
        }

        if let Some(caption) = caption {
            form = form.text(CAPTION_FIELD, caption.to_string());
        }

        tracing::debug!(file_count = files.len(), total_bytes = total, "Sending upload");

        let response = self
            .client
            .post(self.build_url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| UploadError::InvalidResponse(e.to_string()));
        }

        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        Err(UploadError::Server {
            status: status.as_u16(),
            message: parsed.error,
            details: parsed.details,
            results: parsed.results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(100, 200), 50);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[tokio::test]
    async fn test_tracker_reports_across_parts() {
        use futures::StreamExt;

        let (tx, rx) = watch::channel(0u8);
        let tracker = ProgressTracker::new(
            (CHUNK_SIZE * 3) as u64,
            ProgressReporter::new(Arc::new(tx)),
        );

        let first: Vec<_> = tracker
            .stream(Bytes::from(vec![0u8; CHUNK_SIZE * 2]))
            .collect()
            .await;
        assert_eq!(first.len(), 2);
        assert_eq!(*rx.borrow(), 67);

        let _: Vec<_> = tracker.stream(Bytes::from(vec![0u8; CHUNK_SIZE])).collect().await;
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_error_accessors() {
        let err = UploadError::Server {
            status: 400,
            message: Some("No files uploaded".to_string()),
            details: None,
            results: Vec::new(),
        };
        assert_eq!(err.server_message(), Some("No files uploaded"));
        assert!(err.results().is_empty());

        let err = UploadError::InvalidResponse("eof".to_string());
        assert_eq!(err.server_message(), None);
    }
}
