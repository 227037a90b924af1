use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NO_CAPTION_PLACEHOLDER;

/// One past submission as remembered by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// When the submission finished (ISO-8601).
    pub date: DateTime<Utc>,
    pub file_count: usize,
    pub caption: String,
    pub success: bool,
}

impl HistoryEntry {
    /// Record a submission at `date`. An empty caption is stored as the placeholder.
    pub fn new(date: DateTime<Utc>, file_count: usize, caption: &str, success: bool) -> Self {
        let caption = if caption.is_empty() {
            NO_CAPTION_PLACEHOLDER.to_string()
        } else {
            caption.to_string()
        };
        Self {
            date,
            file_count,
            caption,
            success,
        }
    }
}
