use serde::{Deserialize, Serialize};

/// Result of relaying a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    /// Not attempted because an earlier file failed under the abort policy.
    Skipped,
}

/// Outcome of one file of a batch, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Position of the file in the request.
    pub index: usize,
    /// Original filename as sent by the client.
    pub filename: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

/// Per-file outcomes of one relay request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReport {
    pub outcomes: Vec<FileOutcome>,
}

impl RelayReport {
    /// Build a report, ordering outcomes by request position.
    pub fn new(mut outcomes: Vec<FileOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.index);
        Self { outcomes }
    }

    pub fn all_delivered(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_delivered)
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    /// Error message of the first failed file, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|o| o.status == DeliveryStatus::Failed)
            .and_then(|o| o.error.as_deref())
    }
}

/// Body of a successful `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    #[serde(default)]
    pub results: Vec<FileOutcome>,
}

impl UploadResponse {
    pub fn from_report(report: RelayReport) -> Self {
        Self {
            success: true,
            message: "Files uploaded successfully".to_string(),
            count: report.delivered_count(),
            results: report.outcomes,
        }
    }
}
