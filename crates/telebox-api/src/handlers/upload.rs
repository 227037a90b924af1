use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use telebox_core::models::UploadResponse;
use telebox_core::AppError;

use crate::error::HttpAppError;
use crate::services::RelayService;
use crate::state::AppState;
use crate::utils::upload::extract_upload_batch;

/// Upload handler
///
/// Validates the whole request, stages the files in a directory owned by this
/// request, relays them to the configured chat and answers with the per-file
/// results.
///
/// # Errors
/// - `AppError::NoFiles` - no `files` part (or not a multipart request)
/// - `AppError::InvalidInput` - disallowed file type or caption too long
/// - `AppError::PayloadTooLarge` - file or body over the limit
/// - `AppError::Staging` - staged copy could not be written
/// - `AppError::RelayFailed` - at least one file was not delivered
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_files"))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    relay_upload(&state, multipart)
        .await
        .map(Json)
        .map_err(|error| HttpAppError::new(error, state.config.is_production()))
}

async fn relay_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadResponse, AppError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(rejection = %rejection, "Request is not multipart");
        AppError::NoFiles
    })?;

    let batch = extract_upload_batch(multipart, &state.validator).await?;

    // Checked before the caption so an empty request always reads as no files.
    if batch.files.is_empty() {
        return Err(AppError::NoFiles);
    }
    let caption = batch.caption()?;

    let relay = RelayService::new(
        &state.staging,
        state.messenger.as_ref(),
        &state.config.telegram_chat_id,
        state.config.relay_policy,
    );

    let report = relay.relay_batch(batch.files, caption.as_deref()).await?;

    Ok(UploadResponse::from_report(report))
}
