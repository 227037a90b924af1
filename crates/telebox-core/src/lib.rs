//! TeleBox Core Library
//!
//! This crate provides the domain models, error types, configuration, and file
//! validation rules shared by the relay server and the upload client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, RelayPolicy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use validation::{BatchValidation, FileLike, MediaValidator, Rejection, ValidationError};
