use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use socklog_types::{ArcLogEntry, ConnectionStatus, WebSocketConfig};
use socklog_ws::{
    CancellationToken, Connector, TransportEvent, TransportFrame, TransportSink, WsConnector,
};

use crate::LogParser;
use crate::emitter::{Emitter, Subscription, SubscriptionId};

/// Notifications published by [`ConnectionManager`]
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionEvent {
    StatusChanged(ConnectionStatus),
    Log(ArcLogEntry),
}

/// The single live transport
struct Transport {
    id: u64,
    cancel: CancellationToken,
    open: bool,
}

/// Owns one WebSocket connection and reconnects it on close
///
/// All state changes happen on the task that calls [`connect`],
/// [`disconnect`] and [`process`]; transports and reconnect timers only
/// ever wake that task through channels.
///
/// [`connect`]: ConnectionManager::connect
/// [`disconnect`]: ConnectionManager::disconnect
/// [`process`]: ConnectionManager::process
pub struct ConnectionManager {
    config: WebSocketConfig,
    connector: Arc<dyn Connector>,

    status: ConnectionStatus,
    reconnect_attempts: u32,
    transport: Option<Transport>,
    next_transport_id: u64,

    /// Bumped by `disconnect`; timers scheduled under an older epoch are no-ops
    retry_epoch: u64,

    frame_tx: mpsc::UnboundedSender<TransportFrame>,
    frame_rx: mpsc::UnboundedReceiver<TransportFrame>,
    retry_tx: mpsc::UnboundedSender<u64>,
    retry_rx: mpsc::UnboundedReceiver<u64>,

    events: Emitter<ConnectionEvent>,
}

impl ConnectionManager {
    /// Create a manager that opens real WebSocket connections
    pub fn new(config: WebSocketConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector::new()))
    }

    pub fn with_connector(config: WebSocketConfig, connector: Arc<dyn Connector>) -> Self {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();

        Self {
            config,
            connector,
            status: ConnectionStatus::Disconnected,
            reconnect_attempts: 0,
            transport: None,
            next_transport_id: 0,
            retry_epoch: 0,
            frame_tx,
            frame_rx,
            retry_tx,
            retry_rx,
            events: Emitter::new(),
        }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Whether a transport is currently open
    pub fn is_open(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.open)
    }

    pub fn subscribe(&self) -> Subscription<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open a transport unless one is already open
    ///
    /// A synchronous open failure leaves the manager in `Error` and does not
    /// schedule a retry.
    pub fn connect(&mut self) {
        if self.is_open() {
            return;
        }

        self.set_status(ConnectionStatus::Connecting);

        if let Some(previous) = self.transport.take() {
            debug!("replacing pending transport {}", previous.id);
            previous.cancel.cancel();
        }

        let id = self.next_transport_id;
        self.next_transport_id += 1;
        let sink = TransportSink::new(id, self.frame_tx.clone());
        let cancel = CancellationToken::new();

        match self.connector.open(&self.config.url, sink, cancel.clone()) {
            Ok(()) => {
                self.transport = Some(Transport {
                    id,
                    cancel,
                    open: false,
                });
            }
            Err(err) => {
                warn!("failed to open connection to {}: {}", self.config.url, err);
                self.set_status(ConnectionStatus::Error);
            }
        }
    }

    /// Close the transport and stop reconnecting
    ///
    /// Timers already scheduled still fire, but do nothing.
    pub fn disconnect(&mut self) {
        self.reconnect_attempts = self.config.max_reconnect_attempts;
        self.retry_epoch += 1;

        if let Some(transport) = &self.transport {
            debug!("closing transport {}", transport.id);
            transport.cancel.cancel();
        }
    }

    /// Wait for the next transport event or reconnect timer and handle it
    pub async fn process(&mut self) {
        // Both senders live in `self`, so neither channel ever closes
        tokio::select! {
            Some(frame) = self.frame_rx.recv() => self.handle_frame(frame),
            Some(epoch) = self.retry_rx.recv() => self.handle_retry(epoch),
        }
    }

    /// Process events forever
    pub async fn run(&mut self) {
        loop {
            self.process().await;
        }
    }

    fn handle_frame(&mut self, frame: TransportFrame) {
        let is_current = self
            .transport
            .as_ref()
            .is_some_and(|t| t.id == frame.transport_id);
        if !is_current {
            debug!(
                "ignoring {:?} from stale transport {}",
                frame.event, frame.transport_id
            );
            return;
        }

        match frame.event {
            TransportEvent::Open => {
                if let Some(transport) = &mut self.transport {
                    transport.open = true;
                }
                info!("connected to {}", self.config.url);
                self.reconnect_attempts = 0;
                self.set_status(ConnectionStatus::Connected);
            }
            TransportEvent::Message(raw) => {
                let entry = LogParser::parse(&raw);
                self.events.emit(ConnectionEvent::Log(Arc::new(entry)));
            }
            TransportEvent::Error(reason) => {
                warn!("connection error: {}", reason);
                self.set_status(ConnectionStatus::Error);
            }
            TransportEvent::Close => {
                self.transport = None;
                self.set_status(ConnectionStatus::Disconnected);
                self.attempt_reconnect();
            }
        }
    }

    fn handle_retry(&mut self, epoch: u64) {
        if epoch != self.retry_epoch {
            debug!("reconnect timer invalidated by disconnect, ignoring");
            return;
        }
        self.connect();
    }

    fn attempt_reconnect(&mut self) {
        if !self.config.reconnect {
            return;
        }

        let max = self.config.max_reconnect_attempts;
        if self.reconnect_attempts >= max {
            info!("giving up on {} after {} reconnect attempts", self.config.url, max);
            return;
        }

        self.reconnect_attempts += 1;
        let delay = self.config.reconnect_interval();
        info!(
            "reconnecting in {:?} (attempt {}/{})",
            delay, self.reconnect_attempts, max
        );

        let retry_tx = self.retry_tx.clone();
        let epoch = self.retry_epoch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = retry_tx.send(epoch);
        });
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        debug!("connection status: {} -> {}", self.status, status);
        self.status = status;
        self.events.emit(ConnectionEvent::StatusChanged(status));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.cancel.cancel();
        }
    }
}
