//! File selection: validation and previews
//!
//! [`prepare_selection`] runs a batch of candidate files through the shared
//! [`MediaValidator`] and renders a preview for every accepted file. Previews
//! are generated concurrently and handed back together, in the order of the
//! accepted files.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use futures::future::try_join_all;
use rand::Rng;
use std::path::Path;
use telebox_core::validation::content_type_for_filename;
use telebox_core::{FileLike, MediaValidator};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// A file picked by the user, held in memory until submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk. The MIME type is derived from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid file name: {}", path.display()))?;

        let content_type = content_type_for_filename(&name);
        Ok(Self::new(name, content_type, data))
    }
}

impl FileLike for SelectedFile {
    fn name(&self) -> &str {
        &self.name
    }
    fn content_type(&self) -> &str {
        &self.content_type
    }
    fn size(&self) -> usize {
        self.data.len()
    }
}

/// Display data for one accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
    /// 9 random base-36 characters.
    pub id: String,
    pub name: String,
    /// e.g. `"12.50 KB"`
    pub size: String,
    /// `data:<mime>;base64,<payload>`
    pub url: String,
}

impl PreviewItem {
    fn render(file: &SelectedFile) -> Self {
        Self {
            id: random_id(),
            name: file.name.clone(),
            size: format_size(file.data.len()),
            url: format!("data:{};base64,{}", file.content_type, STANDARD.encode(&file.data)),
        }
    }
}

/// Result of selecting a batch of files.
#[derive(Debug, Default)]
pub struct Selection {
    pub accepted: Vec<SelectedFile>,
    /// One per accepted file, same order.
    pub previews: Vec<PreviewItem>,
    /// Rejection messages joined with `", "`; empty when every file was accepted.
    pub error: String,
}

pub async fn prepare_selection(
    validator: &MediaValidator,
    candidates: Vec<SelectedFile>,
) -> Result<Selection> {
    let validation = validator.partition(candidates);
    let error = validation.error_message();

    for rejection in &validation.rejections {
        tracing::debug!(file = %rejection.name, error = %rejection.error, "File rejected");
    }

    let previews = generate_previews(&validation.accepted).await?;

    Ok(Selection {
        accepted: validation.accepted,
        previews,
        error,
    })
}

/// Encode every file on the blocking pool and wait for all of them.
async fn generate_previews(files: &[SelectedFile]) -> Result<Vec<PreviewItem>> {
    let tasks = files.iter().cloned().map(|file| async move {
        tokio::task::spawn_blocking(move || PreviewItem::render(&file))
            .await
            .context("Preview task failed")
    });

    try_join_all(tasks).await
}

fn random_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

fn format_size(bytes: usize) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use telebox_core::constants::MAX_FILE_SIZE_BYTES;

    fn png(name: &str, data: &[u8]) -> SelectedFile {
        SelectedFile::new(name, "image/png", data.to_vec())
    }

    #[tokio::test]
    async fn test_all_valid_files_accepted_in_order() {
        let candidates = vec![png("a.png", b"a"), png("b.png", b"bb"), png("c.png", b"ccc")];
        let selection = prepare_selection(&MediaValidator::default(), candidates.clone())
            .await
            .unwrap();

        assert_eq!(selection.accepted, candidates);
        assert_eq!(selection.error, "");
        let names: Vec<&str> = selection.previews.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_rejected_file_named_in_error() {
        let candidates = vec![
            png("keep.png", b"ok"),
            SelectedFile::new("doc.pdf", "application/pdf", b"%PDF".to_vec()),
            SelectedFile::new("huge.jpg", "image/jpeg", vec![0u8; MAX_FILE_SIZE_BYTES + 1]),
        ];
        let selection = prepare_selection(&MediaValidator::default(), candidates)
            .await
            .unwrap();

        assert_eq!(selection.accepted.len(), 1);
        assert_eq!(selection.previews.len(), 1);
        assert_eq!(
            selection.error,
            "doc.pdf: Invalid file type, huge.jpg: File too large (max 10MB)"
        );
    }

    #[tokio::test]
    async fn test_preview_contents() {
        let selection = prepare_selection(&MediaValidator::default(), vec![png("dot.png", &[0u8; 2048])])
            .await
            .unwrap();
        let preview = &selection.previews[0];

        assert_eq!(preview.size, "2.00 KB");
        assert!(preview.url.starts_with("data:image/png;base64,AAAA"));
        assert_eq!(preview.id.len(), 9);
        assert!(preview
            .id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
    }

    #[tokio::test]
    async fn test_from_path_detects_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, b"jpeg").unwrap();

        let file = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "photo.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.data.as_ref(), b"jpeg");
    }
}
