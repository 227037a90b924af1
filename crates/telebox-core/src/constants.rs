//! Shared limits and wire names.

/// Maximum size of a single uploaded image (10 MiB).
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Captions longer than this are truncated by the client.
pub const MAX_CAPTION_CHARS: usize = 500;

/// Number of history entries kept by the client.
pub const HISTORY_LIMIT: usize = 20;

/// Multipart field carrying each uploaded file.
pub const FILES_FIELD: &str = "files";

/// Multipart field carrying the optional caption.
pub const CAPTION_FIELD: &str = "caption";

/// Caption recorded in history when the user left it empty.
pub const NO_CAPTION_PLACEHOLDER: &str = "No caption";

pub const UPLOAD_PATH: &str = "/api/upload";

/// Content types accepted for upload. `image/jpg` is not registered but some
/// browsers still send it.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];
