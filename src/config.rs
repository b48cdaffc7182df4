//! Configuration loading and persistence.
//!
//! Reads and writes `config.json` in the feed client's config directory and
//! layers `FEED_*` environment variables on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};

use crate::channel::{ChannelConfig, ReconnectPolicy};
use crate::constants::{CONNECT_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_ICON};
use crate::ws::http_to_ws_scheme;

const CONFIG_FILE: &str = "config.json";

/// Configuration for the feed client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// WebSocket endpoint of the push channel.
    pub endpoint: String,
    /// Icon reference passed to desktop notifications.
    pub icon: String,
    /// What the channel does after a connection ends.
    pub reconnect: ReconnectPolicy,
    /// WebSocket handshake timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            icon: DEFAULT_ICON.to_string(),
            reconnect: ReconnectPolicy::Never,
            connect_timeout_secs: CONNECT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `#[cfg(test)]` (unit tests): `tmp/feed-test`
    /// 2. `FEED_CONFIG_DIR` env var: explicit override
    /// 3. `FEED_ENV=test`: `tmp/feed-test` (integration tests)
    /// 4. Default: platform config dir + `notification-feed`
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/feed-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(dir) = std::env::var("FEED_CONFIG_DIR") {
                    PathBuf::from(dir)
                } else if crate::env::is_test_mode() {
                    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/feed-test")
                } else {
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("notification-feed")
                }
            }
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from the config directory, with environment
    /// variable overrides. A missing or unreadable file falls back to defaults.
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let mut config = match Self::load_from(&dir) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config: {e:#}");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads `config.json` from `dir` without applying overrides.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            anyhow::bail!("Config file not found at {}", path.display());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Applies `FEED_WS_URL`, `FEED_ICON` and `FEED_RECONNECT`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("FEED_WS_URL") {
            self.endpoint = http_to_ws_scheme(&url);
        }

        if let Some(icon) = var("FEED_ICON") {
            self.icon = icon;
        }

        if let Some(mode) = var("FEED_RECONNECT") {
            match mode.as_str() {
                "never" => self.reconnect = ReconnectPolicy::Never,
                "backoff" => {
                    if !matches!(self.reconnect, ReconnectPolicy::Backoff { .. }) {
                        self.reconnect = ReconnectPolicy::backoff();
                    }
                }
                other => log::warn!("Ignoring FEED_RECONNECT={other}; expected never or backoff"),
            }
        }
    }

    /// Persists the configuration to the config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?)
    }

    /// Persists the configuration as `config.json` in `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Handshake timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Push-channel settings derived from this config.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            endpoint: self.endpoint.clone(),
            connect_timeout: self.connect_timeout(),
            reconnect: self.reconnect,
        }
    }
}
