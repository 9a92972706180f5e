//! WebSocket source
//!
//! Streams records from a websocket feed (certificate-transparency streams
//! and similar firehoses). Each text or binary frame becomes one raw
//! record. Feeds like these buffer poorly under slow consumers; production
//! deployments should land them in a sharded queue and read that instead.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SourceError};
use crate::source::Source;

pub struct WebSocketSource {
    url: String,
}

impl WebSocketSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Source for WebSocketSource {
    async fn init(&mut self) -> Result<()> {
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(SourceError::init(format!(
                "not a websocket url: {}",
                self.url
            )));
        }
        Ok(())
    }

    async fn retrieve(self: Box<Self>, out: mpsc::Sender<Bytes>, cancel: CancellationToken) {
        let stream = tokio::select! {
            _ = cancel.cancelled() => return,
            connected = connect_async(self.url.as_str()) => match connected {
                Ok((stream, _response)) => stream,
                Err(e) => {
                    tracing::error!(url = %self.url, error = %e, "websocket connect failed");
                    return;
                }
            },
        };
        tracing::info!(url = %self.url, "websocket source connected");

        let (_write, mut read) = stream.split();
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = read.next() => frame,
            };
            let payload = match frame {
                Some(Ok(Message::Text(text))) => Bytes::from(text.to_string()),
                Some(Ok(Message::Binary(payload))) => payload,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::error!(url = %self.url, error = %e, "websocket read failed");
                    break;
                }
            };
            if out.send(payload).await.is_err() {
                break;
            }
        }
        tracing::info!(url = %self.url, "websocket source closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_rejects_non_websocket_url() {
        let mut source = WebSocketSource::new("https://example.com/feed");
        assert!(source.init().await.is_err());

        let mut source = WebSocketSource::new("wss://example.com/feed");
        assert!(source.init().await.is_ok());
    }
}
