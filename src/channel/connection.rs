//! Background connection task for the push channel.
//!
//! [`PushChannel::spawn`] starts one tokio task per channel. The task
//! connects, forwards frames as [`ChannelEvent`]s, and depending on the
//! [`ReconnectPolicy`] either stops after the first connection ends or
//! retries with exponential backoff.
//!
//! # Shutdown
//!
//! [`PushChannel::close`] fires a oneshot exactly once. The task answers by
//! sending a close frame (if connected) and exiting without emitting further
//! events. Dropping the `PushChannel` has the same effect.

// Rust guideline compliant 2026-02

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{ChannelConfig, ChannelEvent};
use crate::constants::{CLOSE_CODE_ABNORMAL, EVENT_BUFFER};
use crate::ws::{self, WsMessage, WsReader};

/// How a single connection ended.
enum LoopExit {
    /// Shutdown was requested; stop for good.
    Shutdown,
    /// The connection ended on its own; report this event.
    Ended(ChannelEvent),
}

/// Handle to a running push-channel task.
#[derive(Debug)]
pub struct PushChannel {
    endpoint: String,
    events_rx: mpsc::Receiver<ChannelEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PushChannel {
    /// Start the connection task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ChannelConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let endpoint = config.endpoint.clone();

        let task = tokio::spawn(run_connection_loop(config, events_tx, shutdown_rx));

        Self {
            endpoint,
            events_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Endpoint this channel connects to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Next event, or `None` once the task has stopped and the queue is empty.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events_rx.recv().await
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shutdown_tx.is_none()
    }

    /// Stop the connection task.
    ///
    /// Returns `true` on the call that actually closed the channel and
    /// `false` on every later call.
    pub fn close(&mut self) -> bool {
        let Some(tx) = self.shutdown_tx.take() else {
            return false;
        };
        log::info!("Closing push channel to {}", self.endpoint);
        // The task may already have exited on its own.
        let _ = tx.send(());
        self.events_rx.close();
        true
    }

    /// Wait for the task to finish. Call after [`close`](Self::close).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Push channel task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connect, pump, and reconnect per policy until shutdown or give-up.
async fn run_connection_loop(
    config: ChannelConfig,
    events_tx: mpsc::Sender<ChannelEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut attempt: u32 = 0;

    loop {
        if events_tx.send(ChannelEvent::Connecting).await.is_err() {
            return;
        }

        let connected = tokio::select! {
            result = ws::connect(&config.endpoint, config.connect_timeout) => result,
            _ = &mut shutdown_rx => {
                log::info!("Push channel shutdown during connect");
                return;
            }
        };

        let ended = match connected {
            Ok((mut writer, mut reader)) => {
                log::info!("Push channel connected to {}", config.endpoint);
                attempt = 0;
                if events_tx.send(ChannelEvent::Open).await.is_err() {
                    return;
                }
                match run_message_loop(&mut reader, &events_tx, &mut shutdown_rx).await {
                    LoopExit::Shutdown => {
                        if let Err(e) = writer.close().await {
                            log::debug!("Close frame not delivered: {e:#}");
                        }
                        return;
                    }
                    LoopExit::Ended(event) => event,
                }
            }
            Err(e) => {
                log::warn!("Push channel connect failed: {e:#}");
                ChannelEvent::Error(format!("{e:#}"))
            }
        };

        if events_tx.send(ended).await.is_err() {
            return;
        }

        attempt = attempt.saturating_add(1);
        let Some(base) = config.reconnect.base_delay(attempt) else {
            log::info!("Push channel to {} closed; reconnect disabled", config.endpoint);
            return;
        };

        let wait = base + jitter(base);
        let wait_ms = wait.as_millis() as u64;
        if events_tx
            .send(ChannelEvent::Reconnecting {
                attempt,
                next_retry_ms: wait_ms,
            })
            .await
            .is_err()
        {
            return;
        }

        log::info!(
            "Reconnecting to {} in {:.1}s (attempt {attempt})",
            config.endpoint,
            wait_ms as f64 / 1000.0
        );

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            _ = &mut shutdown_rx => {
                log::info!("Push channel shutdown during reconnect backoff");
                return;
            }
        }
    }
}

/// Forward frames until the connection ends or shutdown is requested.
async fn run_message_loop(
    reader: &mut WsReader,
    events_tx: &mpsc::Sender<ChannelEvent>,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> LoopExit {
    loop {
        tokio::select! {
            frame = reader.recv() => {
                let event = match frame {
                    Some(Ok(WsMessage::Text(text))) => ChannelEvent::Message(text),
                    Some(Ok(WsMessage::Binary(data))) => {
                        ChannelEvent::Message(String::from_utf8_lossy(&data).into_owned())
                    }
                    Some(Ok(WsMessage::Control)) => continue,
                    Some(Ok(WsMessage::Close { code, reason })) => {
                        log::info!("Push channel closed by server ({code}) {reason}");
                        return LoopExit::Ended(ChannelEvent::Closed { code, reason });
                    }
                    Some(Err(e)) => {
                        log::warn!("Push channel error: {e:#}");
                        return LoopExit::Ended(ChannelEvent::Error(format!("{e:#}")));
                    }
                    None => {
                        return LoopExit::Ended(ChannelEvent::Closed {
                            code: CLOSE_CODE_ABNORMAL,
                            reason: "stream ended".to_string(),
                        });
                    }
                };
                if events_tx.send(event).await.is_err() {
                    return LoopExit::Shutdown;
                }
            }
            _ = &mut *shutdown_rx => {
                return LoopExit::Shutdown;
            }
        }
    }
}

/// Up to a quarter of `base`, capped at one second.
fn jitter(base: Duration) -> Duration {
    let span = (base.as_millis() as u64 / 4).min(1_000);
    if span == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::random::<u64>() % span)
}
