pub mod messenger;
pub mod telegram;

pub use messenger::{Messenger, MessengerError, OutgoingDocument};
pub use telegram::TelegramClient;
