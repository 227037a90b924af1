//! Upload validation rules
//!
//! The same [`MediaValidator`] runs in the client before anything is sent and
//! in the relay server before anything is staged.

use crate::constants::{ALLOWED_CONTENT_TYPES, MAX_FILE_SIZE_BYTES};

/// Why a single file was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file type")]
    InvalidContentType { content_type: String },

    #[error("File too large (max {}MB)", .max / 1024 / 1024)]
    FileTooLarge { size: usize, max: usize },
}

/// Anything that has a name, a declared MIME type and a size.
pub trait FileLike {
    fn name(&self) -> &str;
    fn content_type(&self) -> &str;
    fn size(&self) -> usize;
}

/// A refused file together with the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub error: ValidationError,
}

impl Rejection {
    /// Human-readable message naming the file, e.g. `"a.pdf: Invalid file type"`.
    pub fn message(&self) -> String {
        format!("{}: {}", self.name, self.error)
    }
}

/// Outcome of validating a batch: accepted files keep their input order.
#[derive(Debug)]
pub struct BatchValidation<T> {
    pub accepted: Vec<T>,
    pub rejections: Vec<Rejection>,
}

impl<T> BatchValidation<T> {
    /// All rejection messages joined with `", "`; empty when nothing was refused.
    pub fn error_message(&self) -> String {
        self.rejections
            .iter()
            .map(Rejection::message)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }
}

/// Image upload validator (content-type allowlist and size limit).
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self::new(
            MAX_FILE_SIZE_BYTES,
            ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    /// Default allowlist with a custom size limit.
    pub fn with_max_file_size(max_file_size: usize) -> Self {
        Self {
            max_file_size,
            ..Self::default()
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate content type. Parameters such as `; charset=...` are ignored.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(content_type).to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct.eq_ignore_ascii_case(&normalized))
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Type is checked before size, so a file breaking both rules reports its type.
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_file_size(size)?;
        Ok(())
    }

    /// Split a batch into accepted files and rejections. A rejection never
    /// affects the other files.
    pub fn partition<T: FileLike>(&self, files: impl IntoIterator<Item = T>) -> BatchValidation<T> {
        let mut accepted = Vec::new();
        let mut rejections = Vec::new();

        for file in files {
            match self.validate(file.content_type(), file.size()) {
                Ok(()) => accepted.push(file),
                Err(error) => rejections.push(Rejection {
                    name: file.name().to_string(),
                    error,
                }),
            }
        }

        BatchValidation {
            accepted,
            rejections,
        }
    }
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// MIME type implied by a filename's extension, for files read from disk.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Reduce a client-supplied filename to its final path component.
///
/// Browsers send bare names, but nothing stops a client from sending
/// `../../etc/passwd`; only the last component is kept.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let sanitized: String = last
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILENAME_LENGTH)
        .collect();

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return "file".to_string();
    }

    sanitized
}
