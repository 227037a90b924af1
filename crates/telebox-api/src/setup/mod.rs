//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use telebox_core::Config;
use telebox_services::TelegramClient;
use telebox_staging::StagingArea;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry()?;

    tracing::info!(config = ?config, "Configuration loaded and validated successfully");

    let staging = StagingArea::new(&config.staging_dir)
        .await
        .with_context(|| format!("Failed to prepare staging root {}", config.staging_dir.display()))?;

    let messenger = TelegramClient::from_config(&config)?;

    let state = Arc::new(AppState::new(config.clone(), staging, Arc::new(messenger)));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
