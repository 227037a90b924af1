//! Upload form controller
//!
//! Owns the current selection (files, previews, caption) and walks it
//! through `Idle -> Selecting -> Ready -> Submitting -> Success | Failure`.
//! A failed submission goes back to `Ready` with the error set; files the
//! server reports as delivered are dropped first so a retry only resends the
//! rest. Both outcomes are recorded in the history.

use crate::api::{ProgressReporter, UploadError};
use crate::history::HistoryStore;
use crate::preview::{prepare_selection, PreviewItem, SelectedFile};
use crate::ApiClient;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use telebox_core::constants::MAX_CAPTION_CHARS;
use telebox_core::models::{HistoryEntry, UploadResponse};
use telebox_core::MediaValidator;
use tokio::sync::watch;

pub const NO_FILES_MESSAGE: &str = "Please select at least one file";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Sends a batch to the relay.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(
        &self,
        files: &[SelectedFile],
        caption: Option<&str>,
        progress: ProgressReporter,
    ) -> Result<UploadResponse, UploadError>;
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload(
        &self,
        files: &[SelectedFile],
        caption: Option<&str>,
        progress: ProgressReporter,
    ) -> Result<UploadResponse, UploadError> {
        self.upload_files(files, caption, progress).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Nothing selected.
    Idle,
    /// Previews are being generated.
    Selecting,
    /// At least one file selected.
    Ready,
    Submitting,
    /// Last submission succeeded; the selection was cleared.
    Success,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub file_count: usize,
    pub response: UploadResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{}", NO_FILES_MESSAGE)]
    NoFiles,

    /// The upload failed; `remaining` files are still selected.
    #[error("{message}")]
    Failed {
        message: String,
        remaining: usize,
        #[source]
        source: UploadError,
    },
}

pub struct UploadForm<T> {
    transport: T,
    history: HistoryStore,
    validator: MediaValidator,
    files: Vec<SelectedFile>,
    previews: Vec<PreviewItem>,
    caption: String,
    error: String,
    state: FormState,
    progress: Arc<watch::Sender<u8>>,
}

impl<T: UploadTransport> UploadForm<T> {
    pub fn new(transport: T, history: HistoryStore) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            transport,
            history,
            validator: MediaValidator::default(),
            files: Vec::new(),
            previews: Vec::new(),
            caption: String::new(),
            error: String::new(),
            state: FormState::Idle,
            progress: Arc::new(progress),
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn previews(&self) -> &[PreviewItem] {
        &self.previews
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Current error string; empty when there is none.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Upload progress in percent, observable while a submission is in flight.
    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Validate `candidates` and append the accepted ones to the selection.
    ///
    /// The error string is replaced by this batch's rejections (or cleared).
    pub async fn add_files(&mut self, candidates: Vec<SelectedFile>) -> Result<()> {
        self.state = FormState::Selecting;

        let selection = match prepare_selection(&self.validator, candidates).await {
            Ok(selection) => selection,
            Err(e) => {
                self.state = self.resting_state();
                return Err(e);
            }
        };

        self.files.extend(selection.accepted);
        self.previews.extend(selection.previews);
        self.error = selection.error;
        self.state = self.resting_state();
        Ok(())
    }

    /// Remove the file and preview at `index`.
    pub fn remove_file(&mut self, index: usize) -> Option<SelectedFile> {
        if index >= self.files.len() {
            return None;
        }
        self.previews.remove(index);
        let removed = self.files.remove(index);
        self.state = self.resting_state();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.previews.clear();
        self.caption.clear();
        self.error.clear();
        self.state = FormState::Idle;
    }

    pub fn set_caption(&mut self, caption: &str) {
        self.caption = caption.chars().take(MAX_CAPTION_CHARS).collect();
    }

    pub async fn submit(&mut self) -> Result<Confirmation, SubmitError> {
        if self.files.is_empty() {
            self.error = NO_FILES_MESSAGE.to_string();
            return Err(SubmitError::NoFiles);
        }

        self.state = FormState::Submitting;
        self.error.clear();

        let reporter = ProgressReporter::new(self.progress.clone());
        reporter.report(0);

        let caption = self.caption.trim().to_string();
        let file_count = self.files.len();

        let result = self
            .transport
            .upload(
                &self.files,
                (!caption.is_empty()).then_some(caption.as_str()),
                reporter.clone(),
            )
            .await;

        match result {
            Ok(response) => {
                self.record_history(file_count, &caption, true).await;
                tracing::info!(file_count, "Upload succeeded");

                self.clear();
                self.state = FormState::Success;
                Ok(Confirmation {
                    file_count,
                    response,
                })
            }
            Err(source) => {
                self.record_history(file_count, &caption, false).await;

                let message = source
                    .server_message()
                    .unwrap_or(UPLOAD_FAILED_MESSAGE)
                    .to_string();
                tracing::warn!(file_count, error = %source, "Upload failed");

                self.drop_delivered(&source);
                reporter.report(0);
                self.error = message.clone();
                self.state = self.resting_state();

                Err(SubmitError::Failed {
                    message,
                    remaining: self.files.len(),
                    source,
                })
            }
        }
    }

    fn resting_state(&self) -> FormState {
        if self.files.is_empty() {
            FormState::Idle
        } else {
            FormState::Ready
        }
    }

    fn drop_delivered(&mut self, error: &UploadError) {
        let delivered: HashSet<usize> = error
            .results()
            .iter()
            .filter(|o| o.is_delivered())
            .map(|o| o.index)
            .collect();

        if delivered.is_empty() {
            return;
        }

        let mut index = 0;
        self.files.retain(|_| {
            let keep = !delivered.contains(&index);
            index += 1;
            keep
        });

        let mut index = 0;
        self.previews.retain(|_| {
            let keep = !delivered.contains(&index);
            index += 1;
            keep
        });
    }

    // History is best effort: a failed write must not change the upload outcome.
    async fn record_history(&self, file_count: usize, caption: &str, success: bool) {
        let entry = HistoryEntry::new(Utc::now(), file_count, caption, success);
        if let Err(e) = self.history.record(entry).await {
            tracing::warn!(error = %e, "Failed to record upload history");
        }
    }
}
