//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so a local session starts with no
//! configuration beyond a username.

use std::path::PathBuf;
use std::time::Duration;

use messenger_net::TransportConfig;
use messenger_shared::constants::{DEFAULT_SERVER_ADDR, DEFAULT_TYPING_TIMEOUT_SECS};
use messenger_shared::Auth;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat server `host:port`.
    /// Env: `MESSENGER_SERVER_ADDR`
    /// Default: `127.0.0.1:3000`
    pub server_addr: String,

    /// Authenticated user of this session.
    /// Env: `MESSENGER_USERNAME`
    pub username: String,

    /// Session token presented in the hello frame.
    /// Env: `MESSENGER_TOKEN`
    /// Default: none.
    pub token: Option<String>,

    /// Preferences file.
    /// Env: `MESSENGER_PREFERENCES_PATH`
    /// Default: none, meaning the platform data directory.
    pub preferences_path: Option<PathBuf>,

    /// How long a typing signal stays visible.
    /// Env: `MESSENGER_TYPING_TIMEOUT_SECS`
    /// Default: 5 seconds.
    pub typing_timeout: Duration,

    /// Re-fetch users and conversations after every (re)connect.
    /// Env: `MESSENGER_SYNC_ON_CONNECT` (true/false)
    /// Default: `true`
    pub sync_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            username: String::new(),
            token: None,
            preferences_path: None,
            typing_timeout: Duration::from_secs(DEFAULT_TYPING_TIMEOUT_SECS),
            sync_on_connect: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = var("MESSENGER_SERVER_ADDR") {
            config.server_addr = addr;
        }

        if let Some(username) = var("MESSENGER_USERNAME") {
            config.username = username.trim().to_string();
        }

        if let Some(token) = var("MESSENGER_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }

        if let Some(path) = var("MESSENGER_PREFERENCES_PATH") {
            config.preferences_path = Some(PathBuf::from(path));
        }

        if let Some(val) = var("MESSENGER_TYPING_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => config.typing_timeout = Duration::from_secs(secs),
                Err(_) => {
                    tracing::warn!(
                        value = %val,
                        "Invalid MESSENGER_TYPING_TIMEOUT_SECS, using default"
                    );
                }
            }
        }

        if let Some(val) = var("MESSENGER_SYNC_ON_CONNECT") {
            config.sync_on_connect = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    pub fn auth(&self) -> Auth {
        Auth::new(self.username.clone(), self.token.clone().unwrap_or_default())
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            username: self.username.clone(),
            token: self.token.clone(),
        }
    }
}
