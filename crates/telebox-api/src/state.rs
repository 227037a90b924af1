//! Application state shared by all handlers.

use std::sync::Arc;
use telebox_core::{Config, MediaValidator};
use telebox_services::Messenger;
use telebox_staging::StagingArea;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub staging: StagingArea,
    pub messenger: Arc<dyn Messenger>,
    /// Same rules the client applies before sending.
    pub validator: MediaValidator,
}

impl AppState {
    pub fn new(config: Config, staging: StagingArea, messenger: Arc<dyn Messenger>) -> Self {
        let validator = MediaValidator::with_max_file_size(config.max_file_size_bytes);
        Self {
            config,
            staging,
            messenger,
            validator,
        }
    }
}
