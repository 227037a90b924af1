//! TeleBox API Library
//!
//! HTTP surface of the relay: the upload endpoint, health probe, optional
//! static client, and the setup code that wires them to the staging area and
//! the messenger.

mod handlers;
mod telemetry;
mod utils;

pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
