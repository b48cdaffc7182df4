//! WebSocket transport for the push channel.
//!
//! Thin wrapper around `tokio-tungstenite` that hands back split
//! reader/writer halves, so the channel task can `select!` on incoming
//! frames and its shutdown signal without touching tungstenite types.

// Rust guideline compliant 2026-02

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use crate::constants::CLOSE_CODE_NO_STATUS;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Received WebSocket frame.
#[derive(Debug, PartialEq, Eq)]
pub enum WsMessage {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Ping or pong. Tungstenite answers pings itself.
    Control,
    /// Close frame.
    Close {
        /// Close code (1000 = normal, 1005 = none given).
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// Write half of a push-channel connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send a close frame and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer is already gone.
    pub async fn close(&mut self) -> Result<()> {
        self.sink
            .send(tungstenite::Message::Close(None))
            .await
            .context("WebSocket close frame failed")?;
        self.sink.close().await.context("WebSocket close failed")
    }
}

/// Read half of a push-channel connection.
#[derive(Debug)]
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Next frame, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<WsMessage>> {
        let frame = self.stream.next().await?;
        Some(match frame {
            Ok(tungstenite::Message::Text(text)) => Ok(WsMessage::Text(text)),
            Ok(tungstenite::Message::Binary(data)) => Ok(WsMessage::Binary(data)),
            Ok(
                tungstenite::Message::Ping(_)
                | tungstenite::Message::Pong(_)
                | tungstenite::Message::Frame(_),
            ) => Ok(WsMessage::Control),
            Ok(tungstenite::Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|cf| (cf.code.into(), cf.reason.to_string()))
                    .unwrap_or((CLOSE_CODE_NO_STATUS, String::new()));
                Ok(WsMessage::Close { code, reason })
            }
            Err(e) => Err(anyhow::anyhow!("WebSocket read error: {e}")),
        })
    }
}

/// Open a push-channel connection, giving up after `timeout`.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the handshake fails, or it does
/// not finish in time.
pub async fn connect(url: &str, timeout: Duration) -> Result<(WsWriter, WsReader)> {
    use tungstenite::client::IntoClientRequest;

    let request = url
        .into_client_request()
        .with_context(|| format!("invalid WebSocket URL: {url}"))?;

    let (ws_stream, _response) =
        tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
            .await
            .with_context(|| format!("WebSocket connect to {url} timed out"))?
            .with_context(|| format!("WebSocket connect to {url} failed"))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}

/// Rewrite an HTTP(S) endpoint to the matching WS(S) scheme.
///
/// `ws://` and `wss://` pass through unchanged.
#[must_use]
pub fn http_to_ws_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_to_ws_scheme() {
        assert_eq!(http_to_ws_scheme("https://feed.example.com/ws"), "wss://feed.example.com/ws");
        assert_eq!(http_to_ws_scheme("http://localhost:8080/ws"), "ws://localhost:8080/ws");
        assert_eq!(http_to_ws_scheme("ws://localhost:8080/ws"), "ws://localhost:8080/ws");
        assert_eq!(http_to_ws_scheme("wss://feed.example.com"), "wss://feed.example.com");
    }

    #[test]
    fn test_http_to_ws_scheme_only_rewrites_prefix() {
        assert_eq!(
            http_to_ws_scheme("https://proxy.example.com/?next=http://inner"),
            "wss://proxy.example.com/?next=http://inner"
        );
    }

    #[tokio::test]
    async fn test_connect_invalid_url_returns_error() {
        let result = connect("not-a-url", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_refused_returns_error() {
        let result = connect("ws://127.0.0.1:1/ws", Duration::from_secs(2)).await;
        assert!(result.is_err());
    }
}
