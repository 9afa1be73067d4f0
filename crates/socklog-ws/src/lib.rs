//! WebSocket transport for socklog
//!
//! This crate opens WebSocket connections and reports their lifecycle as a
//! flat stream of [`TransportEvent`]s, leaving state handling to the caller.

mod client;
mod error;
mod transport;

pub use client::WsConnector;
pub use error::ConnectError;
pub use transport::{Connector, TransportEvent, TransportFrame, TransportSink};

// Re-export so callers can hand out cancel tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;
