use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ConnectError;

/// Lifecycle and data events of a single transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Open,
    /// One inbound text frame
    Message(String),
    /// Transport-level failure; a `Close` may or may not follow
    Error(String),
    /// Transport is gone; no further events for this id
    Close,
}

/// A transport event tagged with the transport that produced it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportFrame {
    pub transport_id: u64,
    pub event: TransportEvent,
}

/// Sending half handed to a [`Connector`] for one transport
#[derive(Clone, Debug)]
pub struct TransportSink {
    transport_id: u64,
    tx: mpsc::UnboundedSender<TransportFrame>,
}

impl TransportSink {
    pub fn new(transport_id: u64, tx: mpsc::UnboundedSender<TransportFrame>) -> Self {
        Self { transport_id, tx }
    }

    pub fn transport_id(&self) -> u64 {
        self.transport_id
    }

    /// Report an event. Returns `false` once the receiving side is gone.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(TransportFrame {
                transport_id: self.transport_id,
                event,
            })
            .is_ok()
    }
}

/// Opens transports on behalf of a connection manager
///
/// `open` must return quickly: it validates what it can synchronously and
/// reports everything else through `sink`. Cancelling `cancel` asks the
/// transport to close, which it acknowledges with [`TransportEvent::Close`].
pub trait Connector: Send + Sync {
    fn open(
        &self,
        url: &str,
        sink: TransportSink,
        cancel: CancellationToken,
    ) -> Result<(), ConnectError>;
}
