//! Named defaults for the feed client.
//!
//! Constants are grouped by concern so the few magic numbers in the crate
//! live in one place.

use std::time::Duration;

// ============================================================================
// Push channel
// ============================================================================

/// Endpoint used when neither the config file nor `FEED_WS_URL` sets one.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Upper bound on the WebSocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the channel-task → session event queue.
///
/// The session drains events as fast as the feed can apply them, so this
/// only has to absorb short bursts.
pub const EVENT_BUFFER: usize = 256;

/// First reconnect delay under the backoff policy.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Reconnect delay ceiling under the backoff policy.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Close code reported when the stream ends without a close frame.
pub const CLOSE_CODE_ABNORMAL: u16 = 1006;

/// Close code reported when the peer sent a close frame without a code.
pub const CLOSE_CODE_NO_STATUS: u16 = 1005;

// ============================================================================
// Desktop side channel
// ============================================================================

/// Icon reference passed to the desktop notifier.
pub const DEFAULT_ICON: &str = "/icon.png";
