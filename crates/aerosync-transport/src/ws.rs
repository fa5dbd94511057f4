use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Result, TransportError};
use crate::link::{Connector, Link, LinkEvent, LinkPeer};

/// Connects to the engine's preview endpoint over a WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for `url` (e.g. `ws://127.0.0.1:8000/ws/preview`).
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> impl Future<Output = Result<Link>> + Send {
        let url = self.url.clone();
        async move {
            let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|source| TransportError::Connect {
                    url: url.clone(),
                    source: Box::new(source),
                })?;
            tracing::debug!(url = %url, "websocket open");

            let (link, peer) = Link::pair();
            let LinkPeer { mut sent, events } = peer;
            let (mut sink, mut source) = stream.split();

            tokio::spawn(async move {
                while let Some(text) = sent.recv().await {
                    if let Err(err) = sink.send(Message::Text(text.into())).await {
                        tracing::debug!(error = %err, "websocket write failed");
                        break;
                    }
                }
                let _ = sink.close().await;
            });

            tokio::spawn(async move {
                let reason = loop {
                    match source.next().await {
                        Some(Ok(Message::Binary(data))) => {
                            if events.send(LinkEvent::Binary(data)).is_err() {
                                return;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            break frame.map(|f| f.reason.as_str().to_owned());
                        }
                        Some(Ok(Message::Text(text))) => {
                            tracing::trace!(len = text.len(), "ignoring text message");
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => break Some(err.to_string()),
                        None => break None,
                    }
                };
                let _ = events.send(LinkEvent::Closed { reason });
            });

            Ok(link)
        }
    }
}
