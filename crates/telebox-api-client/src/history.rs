//! Locally persisted upload history
//!
//! A JSON array of [`HistoryEntry`] in a single file, newest first, capped at
//! [`HISTORY_LIMIT`] entries. The format matches what the browser client keeps
//! under its `uploadHistory` key.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use std::path::{Path, PathBuf};
use telebox_core::constants::HISTORY_LIMIT;
use telebox_core::models::HistoryEntry;

const HISTORY_FILE: &str = "uploadHistory.json";

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `TELEBOX_HISTORY_PATH`, else `<data dir>/telebox/uploadHistory.json`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("TELEBOX_HISTORY_PATH") {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let data_dir = dirs::data_dir()
            .context("Could not determine a data directory. Set TELEBOX_HISTORY_PATH")?;
        Ok(data_dir.join("telebox").join(HISTORY_FILE))
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, newest first. A missing file is an empty history; so is an
    /// unreadable one, which is logged and left to be overwritten.
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt history file");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_vec(entries).context("Failed to serialize history")?;

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    /// Prepend `entry`, dropping the oldest entries beyond the limit.
    pub async fn record(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load().await?;
        entries.insert(0, entry);
        entries.truncate(HISTORY_LIMIT);
        self.save(&entries).await?;
        Ok(entries)
    }

    /// Remove the entry at `index`. Returns it, or `None` when out of range.
    pub async fn delete(&self, index: usize) -> Result<Option<HistoryEntry>> {
        let mut entries = self.load().await?;
        if index >= entries.len() {
            return Ok(None);
        }
        let removed = entries.remove(index);
        self.save(&entries).await?;
        Ok(Some(removed))
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// Human-readable age of `date` as seen at `now`.
///
/// "Just now", "N minute(s) ago", "N hour(s) ago" and "N day(s) ago" up to a
/// week; older dates read like "May 1", with the year added when it differs
/// from `now`'s.
pub fn relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(date);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return ago(minutes, "minute");
    }
    if hours < 24 {
        return ago(hours, "hour");
    }
    if days < 7 {
        return ago(days, "day");
    }

    if date.year() == now.year() {
        date.format("%b %-d").to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

fn ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(caption: &str) -> HistoryEntry {
        HistoryEntry::new(Utc::now(), 1, caption, true)
    }

    fn store(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("nested").join(HISTORY_FILE))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_prepends() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.record(entry("first")).await.unwrap();
        store.record(entry("second")).await.unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries[0].caption, "second");
        assert_eq!(entries[1].caption, "first");
    }

    #[tokio::test]
    async fn test_history_capped_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        for i in 0..=HISTORY_LIMIT {
            store.record(entry(&format!("upload {}", i))).await.unwrap();
        }

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0].caption, format!("upload {}", HISTORY_LIMIT));
        // The very first upload was the one dropped.
        assert!(entries.iter().all(|e| e.caption != "upload 0"));
    }

    #[tokio::test]
    async fn test_delete_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        for caption in ["c", "b", "a"] {
            store.record(entry(caption)).await.unwrap();
        }

        let removed = store.delete(1).await.unwrap().unwrap();
        assert_eq!(removed.caption, "b");

        let captions: Vec<String> = store.load().await.unwrap().into_iter().map(|e| e.caption).collect();
        assert_eq!(captions, vec!["a", "c"]);

        assert!(store.delete(5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.record(entry("x")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        std::fs::write(&path, b"not json").unwrap();

        let store = HistoryStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());
        store.record(entry("fresh")).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        assert_eq!(relative_time(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(6), now), "6 days ago");
        assert_eq!(relative_time(now - Duration::days(14), now), "Jun 1");
        assert_eq!(
            relative_time(Utc.with_ymd_and_hms(2023, 12, 24, 9, 0, 0).unwrap(), now),
            "Dec 24, 2023"
        );
    }
}
