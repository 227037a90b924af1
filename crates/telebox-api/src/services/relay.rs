//! Upload relay: stage, send, clean up.
//!
//! A batch gets its own [`StagingDir`]. Every file is written there before
//! the first send, then removed right after its own attempt whatever the
//! outcome. The directory is removed once it is empty.

use bytes::Bytes;
use futures::future::join_all;
use telebox_core::models::{DeliveryStatus, FileOutcome, RelayReport};
use telebox_core::{AppError, FileLike, RelayPolicy};
use telebox_services::{Messenger, OutgoingDocument};
use telebox_staging::{StagedFile, StagingArea, StagingDir};

use crate::error::staging_error;

/// A file received from the client, held in memory until staged.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileLike for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }
    fn content_type(&self) -> &str {
        &self.content_type
    }
    fn size(&self) -> usize {
        self.data.len()
    }
}

pub struct RelayService<'a> {
    staging: &'a StagingArea,
    messenger: &'a dyn Messenger,
    chat_id: &'a str,
    policy: RelayPolicy,
}

impl<'a> RelayService<'a> {
    pub fn new(
        staging: &'a StagingArea,
        messenger: &'a dyn Messenger,
        chat_id: &'a str,
        policy: RelayPolicy,
    ) -> Self {
        Self {
            staging,
            messenger,
            chat_id,
            policy,
        }
    }

    /// Relay a non-empty batch. The caption is attached to the first file only.
    ///
    /// Returns the report when every file was delivered, otherwise
    /// `AppError::RelayFailed` carrying the same report.
    pub async fn relay_batch(
        &self,
        files: Vec<UploadedFile>,
        caption: Option<&str>,
    ) -> Result<RelayReport, AppError> {
        let dir = self
            .staging
            .open_request_dir()
            .await
            .map_err(staging_error)?;

        let staged = match stage_all(&dir, files).await {
            Ok(staged) => staged,
            Err(err) => {
                remove_dir(&dir).await;
                return Err(err);
            }
        };

        let outcomes = match self.policy {
            RelayPolicy::Continue => self.relay_concurrently(&staged, caption).await,
            RelayPolicy::Abort => self.relay_in_order(&staged, caption).await,
        };

        remove_dir(&dir).await;

        let report = RelayReport::new(outcomes);
        tracing::info!(
            total = report.outcomes.len(),
            delivered = report.delivered_count(),
            policy = %self.policy,
            "Relay finished"
        );

        if report.all_delivered() {
            return Ok(report);
        }

        let details = report
            .first_error()
            .unwrap_or("Relay failed")
            .to_string();
        Err(AppError::RelayFailed { details, report })
    }

    async fn relay_concurrently(
        &self,
        staged: &[StagedFile],
        caption: Option<&str>,
    ) -> Vec<FileOutcome> {
        join_all(
            staged
                .iter()
                .enumerate()
                .map(|(index, file)| self.relay_one(index, file, caption_for(index, caption))),
        )
        .await
    }

    async fn relay_in_order(&self, staged: &[StagedFile], caption: Option<&str>) -> Vec<FileOutcome> {
        let mut outcomes = Vec::with_capacity(staged.len());
        let mut failed = false;

        for (index, file) in staged.iter().enumerate() {
            if failed {
                remove_staged(file).await;
                tracing::info!(index, filename = %file.original_name, "Skipped after earlier failure");
                outcomes.push(FileOutcome {
                    index,
                    filename: file.original_name.clone(),
                    status: DeliveryStatus::Skipped,
                    error: None,
                });
                continue;
            }

            let outcome = self.relay_one(index, file, caption_for(index, caption)).await;
            failed = !outcome.is_delivered();
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn relay_one(&self, index: usize, file: &StagedFile, caption: Option<&str>) -> FileOutcome {
        let document = OutgoingDocument {
            path: &file.path,
            filename: &file.original_name,
            content_type: &file.content_type,
        };

        let result = self
            .messenger
            .send_document(self.chat_id, document, caption)
            .await;

        remove_staged(file).await;

        match result {
            Ok(()) => {
                tracing::info!(
                    index,
                    filename = %file.original_name,
                    size = file.size,
                    "File relayed"
                );
                FileOutcome {
                    index,
                    filename: file.original_name.clone(),
                    status: DeliveryStatus::Delivered,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    index,
                    filename = %file.original_name,
                    path = %file.path.display(),
                    error = %e,
                    "File relay failed"
                );
                FileOutcome {
                    index,
                    filename: file.original_name.clone(),
                    status: DeliveryStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn caption_for(index: usize, caption: Option<&str>) -> Option<&str> {
    if index == 0 {
        caption
    } else {
        None
    }
}

/// Write every file to `dir`. On failure the files already written are removed.
async fn stage_all(dir: &StagingDir, files: Vec<UploadedFile>) -> Result<Vec<StagedFile>, AppError> {
    let mut staged = Vec::with_capacity(files.len());

    for file in files {
        match dir.stage(&file.name, &file.content_type, &file.data).await {
            Ok(s) => staged.push(s),
            Err(e) => {
                for s in &staged {
                    remove_staged(s).await;
                }
                return Err(staging_error(e));
            }
        }
    }

    Ok(staged)
}

async fn remove_staged(file: &StagedFile) {
    if let Err(e) = file.remove().await {
        tracing::warn!(path = %file.path.display(), error = %e, "Failed to remove staged file");
    }
}

async fn remove_dir(dir: &StagingDir) {
    if let Err(e) = dir.remove_if_empty().await {
        tracing::warn!(path = %dir.path().display(), error = %e, "Failed to remove staging directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_only_on_first_file() {
        assert_eq!(caption_for(0, Some("hi")), Some("hi"));
        assert_eq!(caption_for(1, Some("hi")), None);
        assert_eq!(caption_for(0, None), None);
    }
}
