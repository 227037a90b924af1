//! Data models shared by the relay server and the upload client.

mod history;
mod upload;

pub use history::*;
pub use upload::*;
