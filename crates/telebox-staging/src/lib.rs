//! TeleBox Staging Library
//!
//! Uploaded files are written to disk before they are relayed and deleted
//! right after. This crate owns that temporary area.
//!
//! # Layout
//!
//! ```text
//! {root}/{timestamp}-{suffix}/{uuid}.{ext}
//! ```
//!
//! - One directory per request. The name is the request timestamp with `:` and
//!   `.` replaced by `-`, followed by a random suffix, so two requests arriving
//!   in the same millisecond still get different directories.
//! - Files are stored under a generated name. The original filename travels in
//!   [`StagedFile`] as metadata only, so duplicates within a request never
//!   overwrite each other.

pub mod area;

pub use area::{StagedFile, StagingArea, StagingDir};

use thiserror::Error;

/// Staging operation errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write staged file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// What went wrong, without any filesystem path. Safe to show to clients.
    pub fn reason(&self) -> String {
        match self {
            StagingError::CreateDir { source, .. } => {
                format!("Failed to create staging directory: {}", source.kind())
            }
            StagingError::Write { source, .. } => {
                format!("Failed to write staged file: {}", source.kind())
            }
            StagingError::Remove { source, .. } => {
                format!("Failed to remove staged file: {}", source.kind())
            }
            StagingError::Io(source) => format!("Staging IO error: {}", source.kind()),
        }
    }
}

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;
