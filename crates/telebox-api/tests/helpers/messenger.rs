//! Messenger double that records every call.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telebox_services::{Messenger, MessengerError, OutgoingDocument};
use tokio::sync::Barrier;

/// How long a send waits for the others when sends must overlap.
const RENDEZVOUS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SentDocument {
    pub chat_id: String,
    pub filename: String,
    pub content_type: String,
    pub caption: Option<String>,
    /// Content read from the staged copy at send time.
    pub bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct RecordingMessenger {
    sent: Arc<Mutex<Vec<SentDocument>>>,
    failing: HashSet<String>,
    rendezvous: Option<Arc<Barrier>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send of a document with one of these filenames.
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Every send blocks until `parties` sends are in flight at once, and
    /// fails if that does not happen in time.
    pub fn requiring_overlap(parties: usize) -> Self {
        Self {
            rendezvous: Some(Arc::new(Barrier::new(parties))),
            ..Self::default()
        }
    }

    /// Every attempted send, failed ones included, sorted by filename.
    pub fn sent(&self) -> Vec<SentDocument> {
        let mut sent = self.sent.lock().unwrap().clone();
        sent.sort_by(|a, b| a.filename.cmp(&b.filename));
        sent
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_document(
        &self,
        chat_id: &str,
        document: OutgoingDocument<'_>,
        caption: Option<&str>,
    ) -> Result<(), MessengerError> {
        let bytes = tokio::fs::read(document.path)
            .await
            .map_err(MessengerError::Io)?;

        if let Some(barrier) = &self.rendezvous {
            if tokio::time::timeout(RENDEZVOUS_TIMEOUT, barrier.wait())
                .await
                .is_err()
            {
                return Err(MessengerError::Rejected(format!(
                    "{} was sent alone",
                    document.filename
                )));
            }
        }

        self.sent.lock().unwrap().push(SentDocument {
            chat_id: chat_id.to_string(),
            filename: document.filename.to_string(),
            content_type: document.content_type.to_string(),
            caption: caption.map(str::to_string),
            bytes,
        });

        if self.failing.contains(document.filename) {
            return Err(MessengerError::Rejected(format!(
                "Bad Request: could not send {}",
                document.filename
            )));
        }

        Ok(())
    }
}
