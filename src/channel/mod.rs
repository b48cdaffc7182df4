//! Push channel: connection lifecycle and the events it reports.
//!
//! The channel task owns the WebSocket. It never touches feed state; it
//! reports what happened as [`ChannelEvent`]s over an `mpsc` queue and the
//! session applies them to the feed one at a time, in delivery order.
//!
//! # State machine
//!
//! ```text
//! [Unconnected] --connect--> [Connecting] --Open--> [Open]
//! [Connecting | Open] --Closed / Error--> [Closed]
//! [Closed] --Reconnecting--> [Reconnecting] --Connecting--> [Connecting]
//! ```
//!
//! `Closed` is terminal for one connection. Under [`ReconnectPolicy::Never`]
//! (the default) it is terminal for the whole channel; under
//! [`ReconnectPolicy::Backoff`] the task reports `Reconnecting` and then
//! starts a brand new connection.

// Rust guideline compliant 2026-02

pub mod connection;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{CONNECT_TIMEOUT, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS};

pub use connection::PushChannel;

/// Connection state as observed by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection has been started.
    #[default]
    Unconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected; messages may arrive.
    Open,
    /// Waiting before a fresh connection attempt.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
        /// Milliseconds until the attempt starts.
        next_retry_ms: u64,
    },
    /// Connection ended (normal close, network failure or error).
    Closed,
}

impl ConnectionState {
    /// `true` only while the connection is open.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// State after `event`, or `None` if the event does not move this state.
    ///
    /// `Message` never changes state. `Open` is only accepted while
    /// connecting, and a closed connection only leaves `Closed` through
    /// `Reconnecting`.
    pub fn transition(&self, event: &ChannelEvent) -> Option<Self> {
        match (self, event) {
            (_, ChannelEvent::Message(_)) => None,
            (Self::Unconnected | Self::Reconnecting { .. }, ChannelEvent::Connecting) => {
                Some(Self::Connecting)
            }
            (Self::Connecting, ChannelEvent::Open) => Some(Self::Open),
            (
                Self::Connecting | Self::Open,
                ChannelEvent::Closed { .. } | ChannelEvent::Error(_),
            ) => Some(Self::Closed),
            (
                Self::Closed,
                ChannelEvent::Reconnecting {
                    attempt,
                    next_retry_ms,
                },
            ) => Some(Self::Reconnecting {
                attempt: *attempt,
                next_retry_ms: *next_retry_ms,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconnected => write!(f, "unconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Reconnecting {
                attempt,
                next_retry_ms,
            } => write!(f, "reconnecting (attempt {attempt} in {next_retry_ms}ms)"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Something the channel task observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A connection attempt has started.
    Connecting,
    /// The handshake completed.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The connection closed.
    Closed {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The connection failed or broke.
    Error(String),
    /// A new attempt is scheduled.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
        /// Milliseconds until the attempt starts.
        next_retry_ms: u64,
    },
}

/// What the channel does after a connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Stay closed. A new feed session is needed to reconnect.
    #[default]
    Never,
    /// Retry with exponential backoff and jitter.
    Backoff {
        /// First delay in milliseconds.
        initial_ms: u64,
        /// Delay ceiling in milliseconds.
        max_ms: u64,
    },
}

impl ReconnectPolicy {
    /// Backoff with the crate defaults.
    pub fn backoff() -> Self {
        Self::Backoff {
            initial_ms: INITIAL_BACKOFF_MS,
            max_ms: MAX_BACKOFF_MS,
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    ///
    /// Returns `None` when the policy does not retry.
    pub fn base_delay(&self, attempt: u32) -> Option<Duration> {
        match *self {
            Self::Never => None,
            Self::Backoff { initial_ms, max_ms } => {
                let shift = attempt.saturating_sub(1).min(20);
                let delay = initial_ms.saturating_mul(1_u64 << shift).min(max_ms);
                Some(Duration::from_millis(delay))
            }
        }
    }
}

/// Settings for one push channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint.
    pub endpoint: String,
    /// Handshake timeout.
    pub connect_timeout: Duration,
    /// Behavior after a connection ends.
    pub reconnect: ReconnectPolicy,
}

impl ChannelConfig {
    /// Config for `endpoint` with default timeout and no reconnection.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::Never,
        }
    }
}
