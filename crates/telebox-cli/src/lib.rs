use chrono::{DateTime, Utc};
use telebox_api_client::relative_time;
use telebox_core::models::{DeliveryStatus, FileOutcome, HistoryEntry};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line of `telebox history`. `position` is 1-based.
pub fn format_history_line(position: usize, entry: &HistoryEntry, now: DateTime<Utc>) -> String {
    let status = if entry.success { "ok" } else { "failed" };
    let files = if entry.file_count == 1 { "file" } else { "files" };
    format!(
        "{:>2}. [{}] {} {} - {} - {}",
        position,
        status,
        entry.file_count,
        files,
        relative_time(entry.date, now),
        truncate_string(&entry.caption, 60)
    )
}

/// One line per file of a failed batch.
pub fn format_outcome(outcome: &FileOutcome) -> String {
    match (outcome.status, outcome.error.as_deref()) {
        (DeliveryStatus::Delivered, _) => format!("  sent     {}", outcome.filename),
        (DeliveryStatus::Failed, Some(error)) => format!("  failed   {}: {}", outcome.filename, error),
        (DeliveryStatus::Failed, None) => format!("  failed   {}", outcome.filename),
        (DeliveryStatus::Skipped, _) => format!("  skipped  {}", outcome.filename),
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
