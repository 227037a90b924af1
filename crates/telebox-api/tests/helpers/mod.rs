//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p telebox-api`.

pub mod messenger;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use messenger::RecordingMessenger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use telebox_api::setup::routes;
use telebox_api::AppState;
use telebox_core::{Config, RelayPolicy};
use telebox_staging::StagingArea;
use tempfile::TempDir;

pub const TEST_CHAT_ID: &str = "-1001234567890";

/// Test application: server, recording messenger and the staging root.
pub struct TestApp {
    pub server: TestServer,
    pub messenger: Arc<RecordingMessenger>,
    pub staging_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Total number of entries (files and directories) left under the staging root.
    pub fn staging_entries(&self) -> usize {
        count_entries(&self.staging_root)
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        1 + count_entries(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

pub fn create_test_config(staging_dir: &Path, policy: RelayPolicy) -> Config {
    Config {
        telegram_bot_token: "123456:test-token".to_string(),
        telegram_chat_id: TEST_CHAT_ID.to_string(),
        staging_dir: staging_dir.to_path_buf(),
        relay_policy: policy,
        ..Config::default()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(RecordingMessenger::new(), RelayPolicy::Continue).await
}

pub async fn setup_test_app_with(messenger: RecordingMessenger, policy: RelayPolicy) -> TestApp {
    setup_test_app_in("development", messenger, policy).await
}

pub async fn setup_test_app_in(
    environment: &str,
    messenger: RecordingMessenger,
    policy: RelayPolicy,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let staging_root = temp_dir.path().join("uploads");

    let config = Config {
        environment: environment.to_string(),
        ..create_test_config(&staging_root, policy)
    };
    config.validate().expect("Test config must be valid");

    let staging = StagingArea::new(&staging_root)
        .await
        .expect("Failed to create staging area");

    let messenger = Arc::new(messenger);
    let state = Arc::new(AppState::new(config.clone(), staging, messenger.clone()));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        messenger,
        staging_root,
        _temp_dir: temp_dir,
    }
}

pub fn image_part(name: &str, content_type: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_type(content_type.to_string())
}

/// Multipart form with one `files` part per `(name, content)` pair, all PNG.
pub fn png_form(files: &[(&str, &str)]) -> MultipartForm {
    files.iter().fold(MultipartForm::new(), |form, (name, content)| {
        form.add_part("files", image_part(name, "image/png", content.as_bytes()))
    })
}
