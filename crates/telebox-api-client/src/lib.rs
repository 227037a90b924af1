//! Client for the TeleBox upload relay.
//!
//! Holds everything a front-end needs: file validation and previews, the
//! locally persisted upload history, the upload form controller and the HTTP
//! client for `POST /api/upload`. The CLI drives it from a terminal.

pub mod api;
pub mod form;
pub mod history;
pub mod preview;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub use api::{ProgressReporter, UploadError};
pub use form::{Confirmation, FormState, SubmitError, UploadForm, UploadTransport};
pub use history::{relative_time, HistoryStore};
pub use preview::{prepare_selection, PreviewItem, SelectedFile, Selection};

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// HTTP client for the relay server.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: TELEBOX_API_URL, default `http://localhost:5000`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("TELEBOX_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
