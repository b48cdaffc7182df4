//! Notification Feed - live, session-scoped notification inbox.
//!
//! This crate keeps a deduplicated, newest-first list of notifications
//! delivered over a WebSocket push channel, and exposes read, delete and
//! settings operations to whatever presentation layer sits on top.
//!
//! # Architecture
//!
//! - **Feed** - [`NotificationFeed`], the synchronous core that owns all state
//! - **Channel** - [`PushChannel`], a tokio task that owns the WebSocket and
//!   reports lifecycle events
//! - **Session** - [`FeedSession`], wires one channel to one feed and
//!   disposes both exactly once
//! - **Desktop** - [`DesktopNotifier`], the injected notification capability
//!
//! # Modules
//!
//! - [`feed`] - The notification list and its operations
//! - [`settings`] - User settings and partial updates
//! - [`channel`] - Push channel lifecycle and reconnect policy
//! - [`config`] - Configuration loading/saving

// Library modules
pub mod channel;
pub mod config;
pub mod constants;
pub mod desktop;
pub mod env;
pub mod feed;
pub mod filter;
pub mod session;
pub mod settings;
pub mod types;
pub mod ws;

// Re-export commonly used types
pub use channel::{ChannelEvent, ConnectionState, PushChannel, ReconnectPolicy};
pub use config::Config;
pub use desktop::{DesktopNotifier, MemoryNotifier, Permission};
pub use feed::NotificationFeed;
pub use filter::FeedFilter;
pub use session::{FeedBuilder, FeedSession};
pub use settings::{Settings, SettingsPatch};
pub use types::{Category, NotificationKind, NotificationRecord, Priority};
