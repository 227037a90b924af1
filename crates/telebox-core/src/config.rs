//! Configuration module
//!
//! Server configuration is read from the environment (a `.env` file is loaded
//! first when present). Every value except the Telegram credentials has a default.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::MAX_FILE_SIZE_BYTES;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STAGING_DIR: &str = "uploads";
const DEFAULT_MAX_REQUEST_SIZE_BYTES: usize = 100 * 1024 * 1024;

/// What the relay does with the rest of a batch once one file fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelayPolicy {
    /// Attempt every file concurrently and aggregate the results.
    #[default]
    Continue,
    /// Attempt files in order and skip everything after the first failure.
    Abort,
}

impl FromStr for RelayPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(RelayPolicy::Continue),
            "abort" => Ok(RelayPolicy::Abort),
            other => Err(anyhow::anyhow!(
                "Invalid RELAY_FAILURE_POLICY '{}'. Must be 'continue' or 'abort'",
                other
            )),
        }
    }
}

impl fmt::Display for RelayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayPolicy::Continue => f.write_str("continue"),
            RelayPolicy::Abort => f.write_str("abort"),
        }
    }
}

/// Relay server configuration.
#[derive(Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub telegram_api_url: String,
    pub telegram_timeout_secs: u64,
    pub staging_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub max_request_size_bytes: usize,
    pub relay_policy: RelayPolicy,
    /// Pre-built client served as a single-page app when set.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            telegram_timeout_secs: DEFAULT_TELEGRAM_TIMEOUT_SECS,
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            max_request_size_bytes: DEFAULT_MAX_REQUEST_SIZE_BYTES,
            relay_policy: RelayPolicy::default(),
            static_dir: None,
        }
    }
}

// The bot token is a credential; keep it out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("cors_origins", &self.cors_origins)
            .field("telegram_bot_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("telegram_timeout_secs", &self.telegram_timeout_secs)
            .field("staging_dir", &self.staging_dir)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("max_request_size_bytes", &self.max_request_size_bytes)
            .field("relay_policy", &self.relay_policy)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if any) and read the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let relay_policy = match var("RELAY_FAILURE_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.relay_policy,
        };

        let config = Config {
            server_port: var("PORT")
                .or_else(|| var("SERVER_PORT"))
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or(defaults.environment),
            cors_origins: var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            telegram_bot_token: var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            telegram_api_url: var("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),
            telegram_timeout_secs: var("TELEGRAM_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.telegram_timeout_secs),
            staging_dir: var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            max_file_size_bytes: var("MAX_FILE_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_file_size_bytes),
            max_request_size_bytes: var("MAX_REQUEST_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_request_size_bytes),
            relay_policy,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.telegram_bot_token.is_empty() {
            return Err(anyhow::anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        if self.telegram_chat_id.is_empty() {
            return Err(anyhow::anyhow!("TELEGRAM_CHAT_ID must be set"));
        }

        if !self.telegram_api_url.starts_with("http://")
            && !self.telegram_api_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "TELEGRAM_API_URL must be an http(s) URL"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES cannot be 0"));
        }

        if self.max_request_size_bytes < self.max_file_size_bytes {
            return Err(anyhow::anyhow!(
                "MAX_REQUEST_SIZE_BYTES must be at least MAX_FILE_SIZE_BYTES"
            ));
        }

        if self.telegram_timeout_secs == 0 {
            return Err(anyhow::anyhow!("TELEGRAM_TIMEOUT_SECS cannot be 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
