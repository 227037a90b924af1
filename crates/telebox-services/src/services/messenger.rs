use async_trait::async_trait;
use std::path::Path;

/// A staged file ready to be sent.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingDocument<'a> {
    /// Location of the staged copy on disk.
    pub path: &'a Path,
    /// Name shown to the recipient.
    pub filename: &'a str,
    pub content_type: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// The staged copy could not be read. Only the error kind is shown so
    /// server paths never reach clients.
    #[error("Failed to read staged file: {}", .0.kind())]
    Io(#[source] std::io::Error),

    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    /// The provider answered but refused the message.
    #[error("{0}")]
    Rejected(String),
}

// Request URLs embed the bot token, so they are stripped from the error.
impl From<reqwest::Error> for MessengerError {
    fn from(err: reqwest::Error) -> Self {
        MessengerError::Request(err.without_url())
    }
}

/// Delivers documents to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_document(
        &self,
        chat_id: &str,
        document: OutgoingDocument<'_>,
        caption: Option<&str>,
    ) -> Result<(), MessengerError>;
}
