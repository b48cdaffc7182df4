//! Feed session: a [`NotificationFeed`] wired to a live [`PushChannel`].
//!
//! [`FeedBuilder`] collects the collaborators (endpoint, desktop notifier,
//! icon, reconnect policy, starting settings). [`FeedBuilder::build`] gives a
//! disconnected feed for callers that deliver frames themselves;
//! [`FeedBuilder::connect`] also spawns the push channel and returns a
//! [`FeedSession`] that pumps channel events into the feed.
//!
//! # Example
//!
//! ```no_run
//! use notification_feed::FeedBuilder;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut session = FeedBuilder::new()
//!     .endpoint("ws://localhost:8080/ws")
//!     .connect()?;
//! while session.next_event().await {
//!     println!("{} unread", session.feed().unread_count());
//! }
//! # Ok(())
//! # }
//! ```

// Rust guideline compliant 2026-02

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::channel::{ChannelConfig, PushChannel, ReconnectPolicy};
use crate::config::Config;
use crate::constants::{DEFAULT_ENDPOINT, DEFAULT_ICON};
use crate::desktop::{self, DesktopNotifier, Permission, Unsupported};
use crate::feed::NotificationFeed;
use crate::settings::Settings;
use crate::ws::http_to_ws_scheme;

/// Builder for a feed and, optionally, its push channel.
#[derive(Debug)]
pub struct FeedBuilder {
    channel: ChannelConfig,
    notifier: Arc<dyn DesktopNotifier>,
    icon: String,
    settings: Settings,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::new(DEFAULT_ENDPOINT),
            notifier: Arc::new(Unsupported),
            icon: DEFAULT_ICON.to_string(),
            settings: Settings::default(),
        }
    }
}

impl FeedBuilder {
    /// Builder with crate defaults and no desktop support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a loaded [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self {
            channel: config.channel_config(),
            icon: config.icon.clone(),
            ..Self::default()
        }
    }

    /// Push-channel endpoint. `http(s)://` is rewritten to `ws(s)://`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.channel.endpoint = http_to_ws_scheme(&endpoint.into());
        self
    }

    /// Desktop notification capability.
    pub fn notifier(mut self, notifier: Arc<dyn DesktopNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Icon reference for desktop notifications.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Behavior after the connection ends.
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.channel.reconnect = policy;
        self
    }

    /// Starting settings instead of the defaults.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// WebSocket handshake timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.channel.connect_timeout = timeout;
        self
    }

    /// A disconnected feed.
    pub fn build(self) -> NotificationFeed {
        NotificationFeed::with_settings(self.notifier, self.settings).icon(self.icon)
    }

    /// A feed plus its running push channel.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a `ws://` or `wss://` URL.
    pub fn connect(self) -> Result<FeedSession> {
        let endpoint = &self.channel.endpoint;
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            anyhow::bail!("push endpoint must be a ws:// or wss:// URL, got {endpoint}");
        }

        let channel_config = self.channel.clone();
        log::info!(
            "Starting notification feed on {} (reconnect: {:?})",
            channel_config.endpoint,
            channel_config.reconnect
        );
        let channel = PushChannel::spawn(channel_config);
        Ok(FeedSession {
            feed: self.build(),
            channel,
        })
    }
}

/// A feed and the push channel that feeds it.
///
/// All channel events are applied through [`next_event`](Self::next_event),
/// so the feed only ever changes from one context, in delivery order.
#[derive(Debug)]
pub struct FeedSession {
    feed: NotificationFeed,
    channel: PushChannel,
}

impl FeedSession {
    /// The feed.
    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    /// The feed, for user operations (mark read, delete, settings).
    pub fn feed_mut(&mut self) -> &mut NotificationFeed {
        &mut self.feed
    }

    /// Endpoint of the push channel.
    pub fn endpoint(&self) -> &str {
        self.channel.endpoint()
    }

    /// Wait for one channel event and apply it.
    ///
    /// Returns `false` once the session is disposed or the channel has
    /// stopped for good.
    pub async fn next_event(&mut self) -> bool {
        if self.feed.is_disposed() {
            return false;
        }
        match self.channel.recv().await {
            Some(event) => {
                self.feed.handle_channel_event(event);
                true
            }
            None => false,
        }
    }

    /// Pump events until `shutdown` resolves or the channel stops, then
    /// dispose.
    ///
    /// `on_event` sees the feed after each applied event.
    pub async fn run_until<F, C>(&mut self, shutdown: F, mut on_event: C)
    where
        F: Future<Output = ()>,
        C: FnMut(&NotificationFeed),
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                more = self.next_event() => {
                    if !more {
                        break;
                    }
                    on_event(&self.feed);
                }
            }
        }
        self.dispose();
    }

    /// Ask for desktop permission once and apply the outcome to the feed.
    pub async fn request_push_permission(&mut self) -> Permission {
        let notifier = self.feed.notifier();
        let outcome = desktop::request_push_permission(notifier.as_ref()).await;
        self.feed.apply_permission_outcome(outcome);
        outcome
    }

    /// Close the channel and dispose the feed. Idempotent.
    pub fn dispose(&mut self) {
        self.channel.close();
        self.feed.dispose();
    }

    /// Dispose and wait for the channel task to finish.
    pub async fn shutdown(mut self) {
        self.dispose();
        self.channel.join().await;
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ConnectionState;
    use crate::desktop::MemoryNotifier;
    use crate::settings::SettingsPatch;

    #[test]
    fn test_build_applies_settings_and_icon() {
        let mut settings = Settings::default();
        settings.merge(SettingsPatch::new().push_enabled(false));
        let feed = FeedBuilder::new().settings(settings).icon("/bell.svg").build();
        assert!(!feed.settings().push_enabled);
        assert!(feed.is_empty());
        assert!(!feed.is_connected());
    }

    #[test]
    fn test_endpoint_scheme_rewrite() {
        let builder = FeedBuilder::new().endpoint("https://feed.example.com/ws");
        assert_eq!(builder.channel.endpoint, "wss://feed.example.com/ws");
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            endpoint: "ws://10.0.0.1:9000/ws".to_string(),
            reconnect: ReconnectPolicy::backoff(),
            connect_timeout_secs: 2,
            ..Config::default()
        };
        let builder = FeedBuilder::from_config(&config);
        assert_eq!(builder.channel.endpoint, "ws://10.0.0.1:9000/ws");
        assert_eq!(builder.channel.reconnect, ReconnectPolicy::backoff());
        assert_eq!(builder.channel.connect_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connect_rejects_non_ws_endpoint() {
        let result = FeedBuilder::new().endpoint("ftp://example.com").connect();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_stops_events() {
        let mut session = FeedBuilder::new()
            .endpoint("ws://127.0.0.1:1/ws")
            .connect()
            .unwrap();
        session.dispose();
        session.dispose();
        assert!(session.feed().is_disposed());
        assert!(!session.next_event().await);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_until_disposes_when_channel_ends() {
        let mut session = FeedBuilder::new()
            .endpoint("ws://127.0.0.1:1/ws")
            .connect()
            .unwrap();

        let mut seen = Vec::new();
        tokio::time::timeout(
            Duration::from_secs(10),
            session.run_until(std::future::pending(), |feed| {
                seen.push(feed.connection_state().clone());
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            seen,
            vec![ConnectionState::Connecting, ConnectionState::Closed]
        );
        assert!(session.feed().is_disposed());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_until_disposes_on_shutdown() {
        // Accepted by the kernel but never upgraded, so the handshake hangs.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let mut session = FeedBuilder::new()
            .endpoint(url)
            .connect_timeout(Duration::from_secs(30))
            .connect()
            .unwrap();

        let mut events = 0;
        tokio::time::timeout(
            Duration::from_secs(10),
            session.run_until(tokio::time::sleep(Duration::from_millis(100)), |_| {
                events += 1;
            }),
        )
        .await
        .unwrap();

        assert_eq!(events, 1);
        assert!(session.feed().is_disposed());
        assert_eq!(session.feed().connection_state(), &ConnectionState::Connecting);
        assert!(!session.next_event().await);
        session.shutdown().await;
        drop(listener);
    }

    #[tokio::test]
    async fn test_request_push_permission_enables_push() {
        let notifier = Arc::new(MemoryNotifier::with_answer(
            Permission::Default,
            Permission::Granted,
        ));
        let mut settings = Settings::default();
        settings.merge(SettingsPatch::new().push_enabled(false));

        let mut session = FeedBuilder::new()
            .endpoint("ws://127.0.0.1:1/ws")
            .notifier(notifier)
            .settings(settings)
            .connect()
            .unwrap();

        assert_eq!(session.request_push_permission().await, Permission::Granted);
        assert!(session.feed().settings().push_enabled);
        session.shutdown().await;
    }
}
