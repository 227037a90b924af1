use crate::{StagingError, StagingResult};
use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Root directory under which per-request staging directories are created.
#[derive(Clone, Debug)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Create a new StagingArea, creating the root directory if absent.
    pub async fn new(root: impl Into<PathBuf>) -> StagingResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: root.display().to_string(),
                source,
            })?;

        Ok(StagingArea { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a directory owned by a single request.
    pub async fn open_request_dir(&self) -> StagingResult<StagingDir> {
        let path = self.root.join(request_dir_name());

        // `create_dir` rather than `create_dir_all`: an existing directory means
        // a name collision and must not be shared.
        fs::create_dir(&path)
            .await
            .map_err(|source| StagingError::CreateDir {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "Opened staging directory");
        Ok(StagingDir { path })
    }
}

/// `2024-05-01T12-30-00-123Z-1a2b3c4d`
fn request_dir_name() -> String {
    let timestamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", timestamp, &suffix[..8])
}

/// Extension used for the generated name; only short alphanumeric extensions
/// are carried over.
fn staged_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

/// A per-request staging directory.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one uploaded file under a generated unique name.
    pub async fn stage(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> StagingResult<StagedFile> {
        let stored_name = format!("{}.{}", Uuid::new_v4(), staged_extension(original_name));
        let path = self.path.join(stored_name);

        let mut file = fs::File::create(&path)
            .await
            .map_err(|source| StagingError::Write {
                path: path.display().to_string(),
                source,
            })?;

        file.write_all(data)
            .await
            .map_err(|source| StagingError::Write {
                path: path.display().to_string(),
                source,
            })?;

        file.sync_all()
            .await
            .map_err(|source| StagingError::Write {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            original_name = %original_name,
            size = data.len(),
            "Staged file"
        );

        Ok(StagedFile {
            path,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len(),
        })
    }

    /// Remove the directory if nothing is left in it. Returns whether it was removed.
    pub async fn remove_if_empty(&self) -> StagingResult<bool> {
        let mut entries = match fs::read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StagingError::Io(e)),
        };

        if entries.next_entry().await?.is_some() {
            return Ok(false);
        }

        fs::remove_dir(&self.path)
            .await
            .map_err(|source| StagingError::Remove {
                path: self.path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), "Removed empty staging directory");
        Ok(true)
    }
}

/// A file persisted in a staging directory, waiting to be relayed.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Name the client sent; used as the document name when relaying.
    pub original_name: String,
    pub content_type: String,
    pub size: usize,
}

impl StagedFile {
    /// Delete the staged copy. A file that is already gone is not an error.
    pub async fn remove(&self) -> StagingResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StagingError::Remove {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}
