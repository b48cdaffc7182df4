//! Integration tests for `FEED_*` environment variable handling.

use std::env;
use std::sync::Mutex;

use notification_feed::{Config, ReconnectPolicy};
use tempfile::TempDir;

// Global lock to prevent env var pollution between tests
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();

    env::remove_var("FEED_WS_URL");
    env::remove_var("FEED_ICON");
    env::remove_var("FEED_RECONNECT");
    env::set_var("FEED_CONFIG_DIR", temp_dir.path());

    (temp_dir, guard)
}

#[test]
fn test_config_dir_honors_override() {
    let (temp_dir, _guard) = setup_test_env();
    assert_eq!(Config::config_dir().unwrap(), temp_dir.path());
}

#[test]
fn test_load_without_file_uses_defaults() {
    let (_temp_dir, _guard) = setup_test_env();
    assert_eq!(Config::load().unwrap(), Config::default());
}

#[test]
fn test_env_overrides_saved_file() {
    let (_temp_dir, _guard) = setup_test_env();
    Config {
        endpoint: "ws://saved.example.com/ws".to_string(),
        icon: "/saved.png".to_string(),
        ..Config::default()
    }
    .save()
    .unwrap();

    env::set_var("FEED_WS_URL", "http://override.example.com/ws");
    env::set_var("FEED_RECONNECT", "backoff");
    let config = Config::load().unwrap();
    env::remove_var("FEED_WS_URL");
    env::remove_var("FEED_RECONNECT");

    assert_eq!(config.endpoint, "ws://override.example.com/ws");
    assert_eq!(config.icon, "/saved.png");
    assert_eq!(config.reconnect, ReconnectPolicy::backoff());
}
