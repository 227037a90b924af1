//! Multipart extraction for the upload endpoint

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use telebox_core::constants::{CAPTION_FIELD, FILES_FIELD, MAX_CAPTION_CHARS};
use telebox_core::validation::{content_type_for_filename, sanitize_filename, Rejection};
use telebox_core::{AppError, MediaValidator};

use crate::services::relay::UploadedFile;

/// Everything the client sent in one upload request.
#[derive(Debug, Default)]
pub struct UploadBatch {
    pub files: Vec<UploadedFile>,
    /// As received. See [`UploadBatch::caption`].
    pub raw_caption: Option<String>,
}

impl UploadBatch {
    /// The caption to relay: `None` when absent or blank, an error when too long.
    pub fn caption(&self) -> Result<Option<String>, AppError> {
        match &self.raw_caption {
            Some(text) => normalize_caption(text),
            None => Ok(None),
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", err.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Read every `files` part plus the optional `caption` part.
///
/// Each file is checked against `validator` as soon as its headers arrive and
/// again while its body is read, so an invalid upload fails before anything
/// is written to disk. Unknown fields are ignored.
pub async fn extract_upload_batch(
    mut multipart: Multipart,
    validator: &MediaValidator,
) -> Result<UploadBatch, AppError> {
    let mut batch = UploadBatch::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == FILES_FIELD {
            let file = read_file_field(field, validator).await?;
            batch.files.push(file);
        } else if field_name == CAPTION_FIELD {
            batch.raw_caption = Some(field.text().await.map_err(multipart_error)?);
        }
    }

    tracing::debug!(
        file_count = batch.files.len(),
        has_caption = batch.raw_caption.is_some(),
        "Extracted upload batch"
    );

    Ok(batch)
}

async fn read_file_field(
    mut field: Field<'_>,
    validator: &MediaValidator,
) -> Result<UploadedFile, AppError> {
    let name = sanitize_filename(field.file_name().unwrap_or("file"));
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| content_type_for_filename(&name).to_string());

    let reject = |error| {
        AppError::from(Rejection {
            name: name.clone(),
            error,
        })
    };

    validator.validate_content_type(&content_type).map_err(reject)?;

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        validator
            .validate_file_size(data.len() + chunk.len())
            .map_err(reject)?;
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        name,
        content_type,
        data: data.into(),
    })
}

/// Blank captions count as absent. Longer than the limit is rejected.
fn normalize_caption(text: &str) -> Result<Option<String>, AppError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    if text.chars().count() > MAX_CAPTION_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Caption too long (max {} characters)",
            MAX_CAPTION_CHARS
        )));
    }
    Ok(Some(text.to_string()))
}
