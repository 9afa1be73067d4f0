//! `tokio-tungstenite` backed connector.
//!
//! Each call to [`WsConnector::open`] spawns one background task that owns the
//! socket for its whole life:
//!
//! ```text
//! open() ──validate──▶ spawn ──connect_async──▶ Open
//!                                 │               │
//!                                 ▼               ▼
//!                          Error, Close     Message* ── Close
//! ```

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{ConnectError, Connector, TransportEvent, TransportSink};

/// Connector that opens real WebSocket connections
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }

    /// Validate `url` and build the handshake request without touching the network
    pub fn request_for(url: &str) -> Result<Request, ConnectError> {
        let parsed = Url::parse(url).map_err(|e| ConnectError::invalid_url(url, e))?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ConnectError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        }

        url.into_client_request()
            .map_err(|e| ConnectError::invalid_url(url, e))
    }
}

impl Connector for WsConnector {
    fn open(
        &self,
        url: &str,
        sink: TransportSink,
        cancel: CancellationToken,
    ) -> Result<(), ConnectError> {
        let request = Self::request_for(url)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConnectError::NoRuntime)?;

        debug!(
            "transport {}: connecting to {}",
            sink.transport_id(),
            url
        );
        runtime.spawn(run_transport(request, sink, cancel));
        Ok(())
    }
}

/// Drive one connection from handshake to close.
///
/// Always finishes by reporting `Close`, unless the receiver is already gone.
async fn run_transport(request: Request, sink: TransportSink, cancel: CancellationToken) {
    let id = sink.transport_id();

    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("transport {}: cancelled during handshake", id);
            sink.send(TransportEvent::Close);
            return;
        }
        result = connect_async(request) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _response)) => ws_stream,
        Err(err) => {
            warn!("transport {}: handshake failed: {}", id, err);
            sink.send(TransportEvent::Error(err.to_string()));
            sink.send(TransportEvent::Close);
            return;
        }
    };

    info!("transport {}: connected", id);
    if !sink.send(TransportEvent::Open) {
        return;
    }

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("transport {}: closing on request", id);
                let _ = ws_sink.send(WsMessage::Close(None)).await;
                let _ = ws_sink.close().await;
                break;
            }

            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if !sink.send(TransportEvent::Message(text.as_str().to_owned())) {
                            // Nobody is listening any more
                            let _ = ws_sink.close().await;
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => {
                        debug!("transport {}: ignoring {} byte binary frame", id, bytes.len());
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        debug!("transport {}: received Close frame", id);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/raw frames
                    }
                    Some(Err(err)) => {
                        warn!("transport {}: read error: {}", id, err);
                        sink.send(TransportEvent::Error(err.to_string()));
                        break;
                    }
                    None => {
                        debug!("transport {}: stream ended", id);
                        break;
                    }
                }
            }
        }
    }

    sink.send(TransportEvent::Close);
}
