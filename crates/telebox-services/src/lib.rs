//! TeleBox Services Layer
//!
//! Outbound integrations of the relay. The API crate only sees the
//! [`Messenger`] trait; [`TelegramClient`] is the production implementation.

pub mod services;

pub use services::telegram;
pub use services::{Messenger, MessengerError, OutgoingDocument, TelegramClient};
